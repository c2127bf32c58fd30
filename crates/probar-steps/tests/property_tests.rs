//! Property-based tests for probar-steps.
//!
//! Uses proptest to check the id naming rules and phrase capture for
//! arbitrary field names and values.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use probar_steps::prelude::*;
use proptest::prelude::*;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(future)
}

// === Naming Property Tests ===

proptest! {
    /// Field ids are the prefix plus the lowercased, underscored name.
    #[test]
    fn prop_field_id_shape(name in "[A-Za-z][A-Za-z ]{0,20}") {
        let id = field_id(DEFAULT_ID_PREFIX, &name);
        prop_assert!(id.starts_with("product_"));
        prop_assert!(!id.contains(' '), "space left in {}", id);
        prop_assert_eq!(&id[DEFAULT_ID_PREFIX.len()..], name.to_lowercase().replace(' ', "_"));
    }

    /// Derivation ignores the case of the phrase.
    #[test]
    fn prop_field_id_case_insensitive(name in "[a-z ]{1,20}") {
        prop_assert_eq!(
            field_id(DEFAULT_ID_PREFIX, &name),
            field_id(DEFAULT_ID_PREFIX, &name.to_uppercase())
        );
    }

    /// Button ids are the lowercased label plus "-btn"; spaces are kept.
    #[test]
    fn prop_button_id_shape(label in "[A-Za-z][A-Za-z ]{0,15}") {
        let id = button_id(&label);
        prop_assert!(id.ends_with(BUTTON_SUFFIX));
        prop_assert_eq!(id.matches(' ').count(), label.matches(' ').count());
        prop_assert_eq!(id.to_lowercase(), id);
    }
}

// === Phrase Capture Property Tests ===

proptest! {
    /// Quoted placeholders capture exactly the quoted text.
    #[test]
    fn prop_quoted_capture(
        element in "[A-Za-z ]{0,12}",
        value in "[A-Za-z0-9 .,!-]{0,20}"
    ) {
        let pattern = StepPattern::compile(r#"I set the "{element_name}" to "{text_string}""#).unwrap();
        let line = format!(r#"I set the "{element}" to "{value}""#);
        let args = pattern.captures(&line).unwrap();
        prop_assert_eq!(args.len(), 2);
        prop_assert_eq!(args.get(0).unwrap(), element.as_str());
        prop_assert_eq!(args.get(1).unwrap(), value.as_str());
    }

    /// Lines with a different kind never match.
    #[test]
    fn prop_kind_strict(name in "[A-Za-z]{1,10}") {
        let registry = web_steps::<MockDriver>().unwrap();
        let line = format!(r#"I should see "{name}" in the results"#);
        prop_assert!(registry.find(StepKind::Then, &line).is_ok());
        prop_assert!(registry.find(StepKind::When, &line).is_err());
    }
}

// === Scenario Property Tests ===

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Setting a field is idempotent and replaces any earlier value.
    #[test]
    fn prop_set_field_replaces(old in "[a-z]{0,8}", value in "[A-Za-z0-9 ]{0,16}") {
        let driver = MockDriver::new().with_element("product_name", MockElement::input_with(old));
        let mut ctx = StepContext::new(driver, "http://localhost:8080")
            .with_wait_options(WaitOptions::new().with_timeout(0));
        let steps = web_steps().unwrap();
        let line = format!(r#"I set the "Name" to "{value}""#);
        block_on(async {
            steps.run(&mut ctx, StepKind::When, &line).await.unwrap();
            steps.run(&mut ctx, StepKind::When, &line).await.unwrap();
        });
        prop_assert_eq!(ctx.driver().dom.value("product_name"), Some(value.as_str()));
    }

    /// Copy then paste transfers the value unchanged.
    #[test]
    fn prop_copy_paste_round_trip(value in "[A-Za-z0-9 ]{0,16}") {
        let driver = MockDriver::new()
            .with_element("product_id", MockElement::input_with(value.clone()))
            .with_element("product_search", MockElement::input_with("stale"));
        let mut ctx = StepContext::new(driver, "http://localhost:8080")
            .with_wait_options(WaitOptions::new().with_timeout(0));
        let steps = web_steps().unwrap();
        block_on(async {
            steps.run(&mut ctx, StepKind::When, r#"I copy the "Id" field"#).await.unwrap();
            steps.run(&mut ctx, StepKind::When, r#"I paste the "Search" field"#).await.unwrap();
        });
        prop_assert_eq!(ctx.clipboard(), value.as_str());
        prop_assert_eq!(ctx.driver().dom.value("product_search"), Some(value.as_str()));
    }
}
