//! Per-scenario step context.
//!
//! One [`StepContext`] is built at the start of a scenario and handed by
//! `&mut` to every step of that scenario. It is the only state steps share:
//! the browser session, where "home" is, how long to wait, and the clipboard.

use crate::config::StepConfig;
use crate::driver::WebDriver;
use crate::locator::{Locator, DEFAULT_ID_PREFIX};
use crate::wait::{WaitOptions, Waiter};
use std::time::Duration;

/// What happens after a button click before the next step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickSettle {
    /// Continue immediately; later steps rely on their own bounded waits
    None,
    /// Sleep for a fixed interval
    Fixed(Duration),
}

impl From<Duration> for ClickSettle {
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            Self::None
        } else {
            Self::Fixed(duration)
        }
    }
}

/// State threaded through every step of one scenario
#[derive(Debug)]
pub struct StepContext<D: WebDriver> {
    driver: D,
    base_url: String,
    waiter: Waiter,
    id_prefix: String,
    click_settle: ClickSettle,
    clipboard: String,
}

impl<D: WebDriver> StepContext<D> {
    /// Context with default wait, prefix and settle policy
    pub fn new(driver: D, base_url: impl Into<String>) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            waiter: Waiter::new(),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            click_settle: ClickSettle::Fixed(Duration::from_millis(
                crate::config::DEFAULT_CLICK_SETTLE_MS,
            )),
            clipboard: String::new(),
        }
    }

    /// Context configured from a [`StepConfig`]
    pub fn from_config(driver: D, config: &StepConfig) -> Self {
        Self::new(driver, config.base_url.clone())
            .with_wait_options(config.wait_options())
            .with_id_prefix(config.id_prefix.clone())
            .with_click_settle(config.click_settle())
    }

    /// Set bounded-wait options
    #[must_use]
    pub fn with_wait_options(mut self, options: WaitOptions) -> Self {
        self.waiter = Waiter::with_options(options);
        self
    }

    /// Set field id prefix
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Set post-click behaviour
    #[must_use]
    pub fn with_click_settle(mut self, settle: impl Into<ClickSettle>) -> Self {
        self.click_settle = settle.into();
        self
    }

    /// Browser session
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Browser session, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Consume the context and return the session
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// URL of the home page
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bounded waiter
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Post-click behaviour
    pub const fn click_settle(&self) -> ClickSettle {
        self.click_settle
    }

    /// Field id prefix
    pub fn id_prefix(&self) -> &str {
        &self.id_prefix
    }

    /// Locator for a field named in a step phrase
    pub fn field(&self, element_name: &str) -> Locator {
        Locator::field(&self.id_prefix, element_name)
    }

    /// Clipboard contents (empty before the first copy)
    pub fn clipboard(&self) -> &str {
        &self.clipboard
    }

    /// Replace the clipboard contents
    pub fn set_clipboard(&mut self, text: impl Into<String>) {
        self.clipboard = text.into();
    }
}
