//! Web step definitions.
//!
//! Each handler performs one browser primitive and optionally asserts a
//! postcondition. Two lookup policies are used:
//!
//! - **Immediate**: for state that should already be stable, such as a field
//!   the scenario filled in a moment ago. A missing element fails at once.
//! - **Bounded wait**: for state produced by an asynchronous page update
//!   (after navigation or a form submit). The step polls up to the context's
//!   wait timeout.
//!
//! | Phrase | Policy |
//! |--------|--------|
//! | `I set the "{element_name}" to "{text_string}"` | immediate |
//! | `I copy the "{element_name}" field` | bounded |
//! | `I should see the message "{message}"` | bounded |
//! | `I should not see "{name}" in the results` | immediate |

use crate::context::{ClickSettle, StepContext};
use crate::driver::WebDriver;
use crate::locator::Locator;
use crate::registry::{StepArgs, StepFuture, StepRegistry};
use crate::result::{StepError, StepResult};
use crate::wait::{pause, Condition, TextMatch, WaitResult};

/// Add every web step to `registry`
pub fn register_web_steps<D: WebDriver>(registry: &mut StepRegistry<D>) -> StepResult<()> {
    registry
        .when(r#"I visit the "Home Page""#, visit_home_page)?
        .then(r#"I should see "{message}" in the title"#, title_contains)?
        .then(r#"I should not see "{text_string}""#, text_not_on_page)?
        .when(r#"I set the "{element_name}" to "{text_string}""#, set_field)?
        .when(r#"I select "{text}" in the "{element_name}" dropdown"#, select_option)?
        .then(r#"I should see "{text}" in the "{element_name}" dropdown"#, dropdown_shows)?
        .then(r#"the "{element_name}" field should be empty"#, field_is_empty)?
        .when(r#"I copy the "{element_name}" field"#, copy_field)?
        .when(r#"I paste the "{element_name}" field"#, paste_field)?
        .when(r#"I press the "{button}" button"#, press_button)?
        .then(r#"I should see the message "{message}""#, see_message)?
        .then(r#"I should see "{text_string}" in the "{element_name}" field"#, field_shows)?
        .when(r#"I change "{element_name}" to "{text_string}""#, change_field)?
        .then(r#"I should see "{name}" in the results"#, name_in_results)?
        .then(r#"I should not see "{name}" in the results"#, name_not_in_results)?;
    Ok(())
}

/// A registry holding only the web steps
pub fn web_steps<D: WebDriver>() -> StepResult<StepRegistry<D>> {
    let mut registry = StepRegistry::new();
    register_web_steps(&mut registry)?;
    Ok(registry)
}

// =============================================================================
// HELPERS
// =============================================================================

/// Bounded wait whose expiry is a lookup failure
async fn wait_for<D: WebDriver>(
    ctx: &StepContext<D>,
    condition: Condition,
) -> StepResult<WaitResult> {
    ctx.waiter().until(ctx.driver(), &condition).await
}

/// Bounded wait whose expiry is an assertion failure
async fn expect_within<D: WebDriver>(ctx: &StepContext<D>, condition: Condition) -> StepResult<()> {
    match wait_for(ctx, condition).await {
        Ok(_) => Ok(()),
        Err(StepError::Timeout { ms, waited_for }) => Err(StepError::assertion(format!(
            "expected {waited_for} within {ms}ms"
        ))),
        Err(err) => Err(err),
    }
}

async fn clear_and_type<D: WebDriver>(
    ctx: &mut StepContext<D>,
    locator: &Locator,
    text: &str,
) -> StepResult<()> {
    let driver = ctx.driver_mut();
    driver.clear(locator).await?;
    driver.send_keys(locator, text).await
}

// =============================================================================
// NAVIGATION AND PAGE TEXT
// =============================================================================

fn visit_home_page<D: WebDriver>(ctx: &mut StepContext<D>, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let url = ctx.base_url().to_string();
        tracing::info!(%url, "visiting home page");
        ctx.driver_mut().navigate(&url).await
    })
}

fn title_contains<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let message = args.get(0)?;
        let title = ctx.driver().title().await?;
        if title.contains(message) {
            Ok(())
        } else {
            Err(StepError::assertion(format!(
                "expected title to contain {message:?}, title is {title:?}"
            )))
        }
    })
}

fn text_not_on_page<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let text = args.get(0)?;
        let body = ctx.driver().require_element(&Locator::body()).await?;
        if body.text.contains(text) {
            Err(StepError::assertion(format!("{text:?} is on the page")))
        } else {
            Ok(())
        }
    })
}

// =============================================================================
// FORM FIELDS
// =============================================================================

fn set_field<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let locator = ctx.field(args.get(0)?);
        let text = args.get(1)?;
        ctx.driver().require_element(&locator).await?;
        clear_and_type(ctx, &locator, text).await
    })
}

fn select_option<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let text = args.get(0)?;
        let locator = ctx.field(args.get(1)?);
        ctx.driver_mut().select_by_visible_text(&locator, text).await
    })
}

fn dropdown_shows<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let text = args.get(0)?;
        let element_name = args.get(1)?;
        let selected = ctx
            .driver()
            .first_selected_option(&ctx.field(element_name))
            .await?;
        if selected == text {
            Ok(())
        } else {
            Err(StepError::assertion(format!(
                "expected {element_name:?} dropdown to show {text:?}, it shows {selected:?}"
            )))
        }
    })
}

fn field_is_empty<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let element_name = args.get(0)?;
        let element = ctx.driver().require_element(&ctx.field(element_name)).await?;
        match element.value.as_deref() {
            Some("") => Ok(()),
            Some(value) => Err(StepError::assertion(format!(
                "expected {element_name:?} to be empty, it contains {value:?}"
            ))),
            None => Err(StepError::assertion(format!(
                "expected {element_name:?} to be empty, it has no value"
            ))),
        }
    })
}

fn field_shows<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let text = args.get(0)?;
        let locator = ctx.field(args.get(1)?);
        expect_within(ctx, Condition::value(locator, TextMatch::Exact, text)).await
    })
}

fn change_field<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let locator = ctx.field(args.get(0)?);
        let text = args.get(1)?;
        wait_for(ctx, Condition::present(locator.clone())).await?;
        clear_and_type(ctx, &locator, text).await
    })
}

// =============================================================================
// CLIPBOARD
// =============================================================================

fn copy_field<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let locator = ctx.field(args.get(0)?);
        let found = wait_for(ctx, Condition::present(locator)).await?;
        ctx.set_clipboard(found.element.value.unwrap_or_default());
        tracing::info!("Clipboard contains: {}", ctx.clipboard());
        Ok(())
    })
}

fn paste_field<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let locator = ctx.field(args.get(0)?);
        wait_for(ctx, Condition::present(locator.clone())).await?;
        let text = ctx.clipboard().to_string();
        clear_and_type(ctx, &locator, &text).await
    })
}

// =============================================================================
// BUTTONS, MESSAGES AND RESULTS
// =============================================================================

fn press_button<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let locator = Locator::button(args.get(0)?);
        ctx.driver_mut().click(&locator).await?;
        // crude synchronization with the page; see ClickSettle
        if let ClickSettle::Fixed(duration) = ctx.click_settle() {
            pause(duration).await;
        }
        Ok(())
    })
}

fn see_message<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let message = args.get(0)?;
        expect_within(
            ctx,
            Condition::text(Locator::flash_message(), TextMatch::Exact, message),
        )
        .await
    })
}

fn name_in_results<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let name = args.get(0)?;
        expect_within(
            ctx,
            Condition::text(Locator::search_results(), TextMatch::Contains, name),
        )
        .await
    })
}

fn name_not_in_results<D: WebDriver>(ctx: &mut StepContext<D>, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let name = args.get(0)?;
        let results = ctx
            .driver()
            .require_element(&Locator::search_results())
            .await?;
        if results.text.contains(name) {
            Err(StepError::assertion(format!("{name:?} is in the results")))
        } else {
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::registry::StepKind;
    use crate::result::FailureKind;
    use crate::wait::WaitOptions;
    use std::time::Duration;

    fn ctx(driver: MockDriver) -> StepContext<MockDriver> {
        StepContext::new(driver, "http://localhost:8080")
            .with_wait_options(WaitOptions::new().with_timeout(100).with_poll_interval(10))
            .with_click_settle(Duration::ZERO)
    }

    fn ctx_with(id: &str, element: MockElement) -> StepContext<MockDriver> {
        ctx(MockDriver::new().with_element(id, element))
    }

    async fn run(ctx: &mut StepContext<MockDriver>, kind: StepKind, text: &str) -> StepResult<()> {
        web_steps().unwrap().run(ctx, kind, text).await
    }

    #[test]
    fn test_all_phrases_registered() {
        let registry = web_steps::<MockDriver>().unwrap();
        assert_eq!(registry.len(), 15);
        assert!(registry
            .catalog()
            .contains(&r#"When I press the "{button}" button"#.to_string()));
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_visit_home_page() {
            let mut ctx = ctx(MockDriver::new());
            run(&mut ctx, StepKind::When, r#"I visit the "Home Page""#)
                .await
                .unwrap();
            assert_eq!(ctx.driver().dom.url, "http://localhost:8080");
        }

        #[tokio::test]
        async fn test_visit_unreachable_surfaces_navigation_error() {
            let mut ctx = ctx(MockDriver::new().with_unreachable("http://localhost:8080"));
            let err = run(&mut ctx, StepKind::When, r#"I visit the "Home Page""#)
                .await
                .unwrap_err();
            assert!(matches!(err, StepError::NavigationError { .. }));
            assert_eq!(err.kind(), FailureKind::Infrastructure);
        }

        #[tokio::test]
        async fn test_title() {
            let mut ctx = ctx(MockDriver::new().with_title("Product Catalog Administration"));
            run(&mut ctx, StepKind::Then, r#"I should see "Catalog Admin" in the title"#)
                .await
                .unwrap();
            let err = run(&mut ctx, StepKind::Then, r#"I should see "404" in the title"#)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Assertion);
        }

        #[tokio::test]
        async fn test_text_not_on_page() {
            let mut ctx = ctx(MockDriver::new().with_body_text("Product Catalog"));
            run(&mut ctx, StepKind::Then, r#"I should not see "404 Not Found""#)
                .await
                .unwrap();
            let err = run(&mut ctx, StepKind::Then, r#"I should not see "Catalog""#)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Assertion);
        }
    }

    mod field_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_field_replaces_value() {
            let mut ctx = ctx_with("product_name", MockElement::input_with("old"));
            run(&mut ctx, StepKind::When, r#"I set the "Name" to "Hammer""#)
                .await
                .unwrap();
            assert_eq!(ctx.driver().dom.value("product_name"), Some("Hammer"));
        }

        #[tokio::test]
        async fn test_set_field_missing_is_immediate_lookup_failure() {
            let mut driver = MockDriver::new();
            driver
                .dom
                .insert_after("product_name", MockElement::input(), Duration::from_millis(20));
            let mut ctx = ctx(driver);
            let err = run(&mut ctx, StepKind::When, r#"I set the "Name" to "Hammer""#)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
            assert!(!ctx.driver().was_called("send_keys"));
        }

        #[tokio::test]
        async fn test_field_is_empty_boundaries() {
            let driver = MockDriver::new()
                .with_element("product_id", MockElement::input())
                .with_element("product_name", MockElement::input_with(" "))
                .with_element("product_note", MockElement::text("div", ""));
            let mut ctx = ctx(driver);
            run(&mut ctx, StepKind::Then, r#"the "Id" field should be empty"#)
                .await
                .unwrap();
            for name in ["Name", "Note"] {
                let line = format!(r#"the "{name}" field should be empty"#);
                let err = run(&mut ctx, StepKind::Then, &line)
                    .await
                    .unwrap_err();
                assert_eq!(err.kind(), FailureKind::Assertion, "{name}");
            }
        }

        #[tokio::test]
        async fn test_field_shows_waits_then_asserts() {
            let mut ctx = ctx_with("product_name", MockElement::input_with("Hammer"));
            run(&mut ctx, StepKind::Then, r#"I should see "Hammer" in the "Name" field"#)
                .await
                .unwrap();
            let err = run(&mut ctx, StepKind::Then, r#"I should see "Ham" in the "Name" field"#)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Assertion);
        }

        #[tokio::test]
        async fn test_change_field_waits_for_element() {
            let mut driver = MockDriver::new();
            driver.dom.insert_after(
                "product_description",
                MockElement::input_with("old"),
                Duration::from_millis(20),
            );
            let mut ctx = ctx(driver);
            run(&mut ctx, StepKind::When, r#"I change "Description" to "new""#)
                .await
                .unwrap();
            assert_eq!(ctx.driver().dom.value("product_description"), Some("new"));
        }

        #[tokio::test]
        async fn test_change_field_times_out() {
            let mut ctx = ctx(MockDriver::new());
            let err = run(&mut ctx, StepKind::When, r#"I change "Description" to "new""#)
                .await
                .unwrap_err();
            assert!(matches!(err, StepError::Timeout { ms: 100, .. }));
            assert_eq!(err.kind(), FailureKind::Lookup);
        }
    }

    mod dropdown_tests {
        use super::*;

        fn with_category() -> StepContext<MockDriver> {
            ctx(MockDriver::new().with_element(
                "product_category",
                MockElement::select(["UNKNOWN", "CLOTHS", "TOOLS"]),
            ))
        }

        #[tokio::test]
        async fn test_select_then_check() {
            let mut ctx = with_category();
            run(&mut ctx, StepKind::When, r#"I select "TOOLS" in the "Category" dropdown"#)
                .await
                .unwrap();
            run(&mut ctx, StepKind::Then, r#"I should see "TOOLS" in the "Category" dropdown"#)
                .await
                .unwrap();
            let line = r#"I should see "CLOTHS" in the "Category" dropdown"#;
            let err = run(&mut ctx, StepKind::Then, line)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Assertion);
        }

        #[tokio::test]
        async fn test_select_missing_option_fails() {
            let mut ctx = with_category();
            let err = run(&mut ctx, StepKind::When, r#"I select "FOOD" in the "Category" dropdown"#)
                .await
                .unwrap_err();
            assert!(matches!(err, StepError::OptionNotFound { .. }));
            assert_eq!(
                ctx.driver().dom.get("product_category").unwrap().selected,
                Some(0)
            );
        }

        #[tokio::test]
        async fn test_select_missing_dropdown_fails() {
            let mut ctx = ctx(MockDriver::new());
            let err = run(&mut ctx, StepKind::When, r#"I select "TOOLS" in the "Category" dropdown"#)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }
    }

    mod clipboard_tests {
        use super::*;

        #[tokio::test]
        async fn test_copy_paste() {
            let driver = MockDriver::new()
                .with_element("product_id", MockElement::input_with("42"))
                .with_element("product_search", MockElement::input_with("junk"));
            let mut ctx = ctx(driver);
            run(&mut ctx, StepKind::When, r#"I copy the "Id" field"#)
                .await
                .unwrap();
            assert_eq!(ctx.clipboard(), "42");
            run(&mut ctx, StepKind::When, r#"I paste the "Search" field"#)
                .await
                .unwrap();
            assert_eq!(ctx.driver().dom.value("product_search"), Some("42"));
        }

        #[tokio::test]
        async fn test_copy_missing_field_times_out() {
            let mut ctx = ctx(MockDriver::new());
            let err = run(&mut ctx, StepKind::When, r#"I copy the "Id" field"#)
                .await
                .unwrap_err();
            assert!(matches!(err, StepError::Timeout { .. }));
            assert_eq!(ctx.clipboard(), "");
        }

        #[tokio::test]
        async fn test_paste_before_copy_types_nothing() {
            let mut ctx = ctx_with("product_name", MockElement::input_with("x"));
            run(&mut ctx, StepKind::When, r#"I paste the "Name" field"#)
                .await
                .unwrap();
            assert_eq!(ctx.driver().dom.value("product_name"), Some(""));
        }
    }

    mod button_tests {
        use super::*;

        #[tokio::test]
        async fn test_press_button_clicks_derived_id() {
            let mut ctx = ctx_with("search-btn", MockElement::button("Search"));
            run(&mut ctx, StepKind::When, r#"I press the "Search" button"#)
                .await
                .unwrap();
            assert!(ctx.driver().was_called("click:#search-btn"));
        }

        #[tokio::test]
        async fn test_press_missing_button() {
            let mut ctx = ctx(MockDriver::new());
            let err = run(&mut ctx, StepKind::When, r#"I press the "Delete" button"#)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn test_press_button_settles() {
            let driver = MockDriver::new().with_element("clear-btn", MockElement::button("Clear"));
            let mut ctx = ctx(driver).with_click_settle(Duration::from_millis(30));
            let start = std::time::Instant::now();
            run(&mut ctx, StepKind::When, r#"I press the "Clear" button"#)
                .await
                .unwrap();
            assert!(start.elapsed() >= Duration::from_millis(30));
        }
    }

    mod message_tests {
        use super::*;

        #[tokio::test]
        async fn test_broken_session_is_not_an_assertion() {
            let mut ctx = ctx(MockDriver::new().with_broken_session());
            let err = run(&mut ctx, StepKind::Then, r#"I should see the message "Success""#)
                .await
                .unwrap_err();
            assert!(matches!(err, StepError::DriverError { .. }));
            assert_eq!(err.kind(), FailureKind::Infrastructure);
        }

        #[tokio::test]
        async fn test_flash_message_exact() {
            let mut ctx = ctx_with("flash_message", MockElement::text("div", "Success"));
            run(&mut ctx, StepKind::Then, r#"I should see the message "Success""#)
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_flash_message_expires_as_assertion() {
            let mut ctx = ctx(MockDriver::new().with_element(
                "flash_message",
                MockElement::text("div", "Success!"),
            ));
            let start = std::time::Instant::now();
            let err = run(&mut ctx, StepKind::Then, r#"I should see the message "Success""#)
                .await
                .unwrap_err();
            assert!(start.elapsed() >= Duration::from_millis(100));
            assert_eq!(err.kind(), FailureKind::Assertion);
            assert!(err.to_string().contains("flash_message"));
        }

        #[tokio::test]
        async fn test_results_contain_and_absent() {
            let mut ctx = ctx(MockDriver::new().with_element(
                "search_results",
                MockElement::text("table", "Hammer\nShirt"),
            ));
            run(&mut ctx, StepKind::Then, r#"I should see "Hammer" in the results"#)
                .await
                .unwrap();
            run(&mut ctx, StepKind::Then, r#"I should not see "Wrench" in the results"#)
                .await
                .unwrap();
            let err = run(&mut ctx, StepKind::Then, r#"I should not see "Shirt" in the results"#)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Assertion);
        }

        #[tokio::test]
        async fn test_results_absent_needs_container() {
            let mut ctx = ctx(MockDriver::new());
            let err = run(&mut ctx, StepKind::Then, r#"I should not see "Wrench" in the results"#)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }
    }
}
