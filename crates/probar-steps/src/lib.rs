//! Probar Steps: Gherkin-style step definitions for browser-driven acceptance tests
//!
//! Feature files describe behaviour in phrases such as
//! `When I set the "Name" to "Hammer"`. This crate binds those phrases to
//! browser actions and checks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PROBAR STEPS Architecture                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Step line  │    │ Step       │    │ WebDriver  │            │
//! │   │ (Gherkin)  │───►│ Registry   │───►│ (chromium  │            │
//! │   │            │    │ + Context  │    │  or mock)  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use probar_steps::prelude::*;
//!
//! # async fn scenario() -> StepResult<()> {
//! let driver = MockDriver::new().with_element("product_name", MockElement::input());
//! let mut ctx = StepContext::new(driver, "http://localhost:8080");
//! let steps = web_steps()?;
//! steps.run(&mut ctx, StepKind::When, r#"I set the "Name" to "Hammer""#).await?;
//! steps.run(&mut ctx, StepKind::Then, r#"I should see "Hammer" in the "Name" field"#).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Chromium session over CDP (feature `browser`) and its launch options
pub mod browser;

/// Step configuration from defaults, YAML and environment
pub mod config;

/// Per-scenario state shared by steps
pub mod context;

/// Browser session trait and the in-memory mock
pub mod driver;

/// Element locators and id derivation
pub mod locator;

/// Tracing subscriber setup
pub mod logging;

/// Phrase patterns and dispatch
pub mod registry;

/// Step errors
pub mod result;

/// The web step definitions
pub mod steps;

/// Bounded explicit waits
pub mod wait;

pub use browser::BrowserConfig;
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::StepConfig;
pub use context::{ClickSettle, StepContext};
pub use driver::{ElementHandle, MockDom, MockDriver, MockElement, WebDriver};
pub use locator::{button_id, field_id, Locator};
pub use logging::{init_tracing, LogFormat};
pub use registry::{
    StepArgs, StepDefinition, StepFn, StepFuture, StepKind, StepMatch, StepPattern, StepRegistry,
};
pub use result::{FailureKind, StepError, StepResult};
pub use steps::{register_web_steps, web_steps};
pub use wait::{Condition, TextMatch, WaitOptions, WaitResult, Waiter};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::context::*;
    pub use super::driver::*;
    pub use super::locator::*;
    pub use super::logging::*;
    pub use super::registry::*;
    pub use super::result::*;
    pub use super::steps::*;
    pub use super::wait::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_exports() {
        let _ = StepConfig::default();
        let _ = WaitOptions::default();
        assert_eq!(Locator::button("Create"), Locator::id("create-btn"));
    }

    #[tokio::test]
    async fn test_config_to_scenario() {
        let config = StepConfig::new().with_wait_seconds(0).with_click_settle_ms(0);
        let driver = MockDriver::new().with_title("Product Catalog Administration");
        let mut ctx = StepContext::from_config(driver, &config);
        let steps = web_steps().unwrap();
        steps
            .run(&mut ctx, StepKind::When, r#"I visit the "Home Page""#)
            .await
            .unwrap();
        steps
            .run(&mut ctx, StepKind::Then, r#"I should see "Product Catalog" in the title"#)
            .await
            .unwrap();
        assert_eq!(ctx.driver().history(), ["navigate:http://localhost:8080"]);
    }
}
