//! Element locators and the id naming convention of the application under test.
//!
//! Step phrases name fields the way a person reads them ("Category",
//! "Available Date"). The page addresses the same fields by id. The functions
//! here are the only place that mapping lives:
//!
//! | Phrase            | Derived id              |
//! |-------------------|-------------------------|
//! | `Available Date`  | `product_available_date` |
//! | `Search` (button) | `search-btn`            |

use std::fmt;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Prefix applied to every form field id
pub const DEFAULT_ID_PREFIX: &str = "product_";

/// Suffix applied to every button id
pub const BUTTON_SUFFIX: &str = "-btn";

/// Id of the status element that shows flash messages
pub const FLASH_MESSAGE_ID: &str = "flash_message";

/// Id of the container that lists search results
pub const SEARCH_RESULTS_ID: &str = "search_results";

// =============================================================================
// NAMING
// =============================================================================

/// Derive a field id from its human-readable name.
///
/// Lowercases the name and replaces every space with an underscore, then
/// prepends `prefix`. Other whitespace is left alone.
#[must_use]
pub fn field_id(prefix: &str, element_name: &str) -> String {
    format!("{prefix}{}", element_name.to_lowercase().replace(' ', "_"))
}

/// Derive a button id from its label.
#[must_use]
pub fn button_id(button: &str) -> String {
    format!("{}{BUTTON_SUFFIX}", button.to_lowercase())
}

// =============================================================================
// LOCATOR
// =============================================================================

/// How a step addresses an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Element with the given id attribute
    Id(String),
    /// First element with the given tag name
    TagName(String),
}

impl Locator {
    /// Locate by id
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Locate by tag name
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::TagName(name.into())
    }

    /// The document body
    #[must_use]
    pub fn body() -> Self {
        Self::tag("body")
    }

    /// Form field by human-readable name
    #[must_use]
    pub fn field(prefix: &str, element_name: &str) -> Self {
        Self::Id(field_id(prefix, element_name))
    }

    /// Button by label
    #[must_use]
    pub fn button(label: &str) -> Self {
        Self::Id(button_id(label))
    }

    /// The flash message status element
    #[must_use]
    pub fn flash_message() -> Self {
        Self::id(FLASH_MESSAGE_ID)
    }

    /// The search results container
    #[must_use]
    pub fn search_results() -> Self {
        Self::id(SEARCH_RESULTS_ID)
    }

    /// CSS selector for this locator.
    ///
    /// Ids use an attribute selector so that ids which are not valid CSS
    /// identifiers (leading digits, dots) still resolve.
    #[must_use]
    pub fn to_css(&self) -> String {
        match self {
            Self::Id(id) => format!("[id=\"{}\"]", id.replace('\\', "\\\\").replace('"', "\\\"")),
            Self::TagName(name) => name.clone(),
        }
    }

    /// JavaScript expression that evaluates to the element or `null`
    #[must_use]
    pub fn to_js(&self) -> String {
        // serde_json string encoding doubles as JS string literal escaping
        let quote = |s: &str| serde_json::Value::from(s).to_string();
        match self {
            Self::Id(id) => format!("document.getElementById({})", quote(id)),
            Self::TagName(name) => {
                format!("(document.getElementsByTagName({})[0] || null)", quote(name))
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::TagName(name) => write!(f, "<{name}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod naming_tests {
        use super::*;

        #[test]
        fn test_field_id_single_word() {
            assert_eq!(field_id(DEFAULT_ID_PREFIX, "Name"), "product_name");
        }

        #[test]
        fn test_field_id_multiple_spaces_and_mixed_case() {
            assert_eq!(
                field_id(DEFAULT_ID_PREFIX, "Available  Date NOW"),
                "product_available__date_now"
            );
        }

        #[test]
        fn test_field_id_custom_prefix() {
            assert_eq!(field_id("pet_", "Birth Day"), "pet_birth_day");
            assert_eq!(field_id("", "Id"), "id");
        }

        #[test]
        fn test_field_id_keeps_tabs() {
            assert_eq!(field_id("p_", "A\tB"), "p_a\tb");
        }

        #[test]
        fn test_button_id() {
            assert_eq!(button_id("Search"), "search-btn");
            assert_eq!(button_id("CLEAR"), "clear-btn");
        }

        #[test]
        fn test_button_id_keeps_spaces() {
            assert_eq!(button_id("Log Out"), "log out-btn");
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_field_locator() {
            assert_eq!(
                Locator::field(DEFAULT_ID_PREFIX, "Category"),
                Locator::Id("product_category".into())
            );
        }

        #[test]
        fn test_fixed_locators() {
            assert_eq!(Locator::flash_message(), Locator::id("flash_message"));
            assert_eq!(Locator::search_results(), Locator::id("search_results"));
            assert_eq!(Locator::body(), Locator::TagName("body".into()));
        }

        #[test]
        fn test_display() {
            assert_eq!(Locator::button("Create").to_string(), "#create-btn");
            assert_eq!(Locator::body().to_string(), "<body>");
        }

        #[test]
        fn test_to_css_escapes_quotes() {
            assert_eq!(Locator::id("a\"b").to_css(), r#"[id="a\"b"]"#);
            assert_eq!(Locator::body().to_css(), "body");
        }

        #[test]
        fn test_to_js() {
            assert_eq!(
                Locator::id("product_name").to_js(),
                r#"document.getElementById("product_name")"#
            );
            assert_eq!(
                Locator::body().to_js(),
                r#"(document.getElementsByTagName("body")[0] || null)"#
            );
        }

        #[test]
        fn test_to_js_escapes() {
            let js = Locator::id("x\");alert(1);//").to_js();
            assert!(js.starts_with("document.getElementById(\"x\\\")"));
        }
    }
}
