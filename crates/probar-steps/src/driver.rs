//! WebDriver - Abstract Browser Session Trait
//!
//! Step handlers never talk to a browser directly. They go through the
//! [`WebDriver`] trait, which exposes exactly the primitives the steps need:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  WebDriver (Abstract Trait)                                    │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐        ┌─────────────────────┐       │
//! │  │  ChromiumDriver     │        │  MockDriver         │       │
//! │  │  (feature=browser)  │        │  (in-memory DOM)    │       │
//! │  │  CDP via            │        │  scenario tests     │       │
//! │  │  chromiumoxide      │        │  without a browser  │       │
//! │  └─────────────────────┘        └─────────────────────┘       │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Element reads return an [`ElementHandle`] snapshot rather than a live
//! reference, so a stale handle can never be acted on by a later step.

use crate::locator::Locator;
use crate::result::{StepError, StepResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

/// Snapshot of an element at the time it was read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Element id attribute (empty when the element has none)
    pub id: String,
    /// Lowercase tag name
    pub tag_name: String,
    /// Rendered text, as a user would read it
    pub text: String,
    /// Current `value` of form controls, `None` for elements without one
    pub value: Option<String>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text: String::new(),
            value: None,
        }
    }

    /// Set rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Abstract browser session used by every step handler
///
/// Methods that take a [`Locator`] and act on an element fail with
/// [`StepError::ElementNotFound`] when nothing matches. They never wait;
/// waiting is the job of [`crate::Waiter`].
#[async_trait]
pub trait WebDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> StepResult<()>;

    /// Current document title
    async fn title(&self) -> StepResult<String>;

    /// Query element, `None` if absent
    async fn find_element(&self, locator: &Locator) -> StepResult<Option<ElementHandle>>;

    /// Clear the value of a form control
    async fn clear(&mut self, locator: &Locator) -> StepResult<()>;

    /// Type text into element
    async fn send_keys(&mut self, locator: &Locator, text: &str) -> StepResult<()>;

    /// Click element
    async fn click(&mut self, locator: &Locator) -> StepResult<()>;

    /// Choose the `<option>` whose visible text equals `text`
    async fn select_by_visible_text(&mut self, locator: &Locator, text: &str) -> StepResult<()>;

    /// Visible text of the first selected `<option>`
    async fn first_selected_option(&self, locator: &Locator) -> StepResult<String>;

    /// Close the session
    async fn close(&mut self) -> StepResult<()>;

    /// Query element, failing when absent
    async fn require_element(&self, locator: &Locator) -> StepResult<ElementHandle> {
        self.find_element(locator)
            .await?
            .ok_or_else(|| StepError::ElementNotFound {
                locator: locator.to_string(),
            })
    }
}

// =============================================================================
// MOCK DRIVER
// =============================================================================

/// Element in the mock DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Lowercase tag name
    pub tag_name: String,
    /// Rendered text
    pub text: String,
    /// Form value, `None` for non-form elements
    pub value: Option<String>,
    /// Option texts of a `<select>`
    pub options: Vec<String>,
    /// Index of the selected option
    pub selected: Option<usize>,
}

impl MockElement {
    /// Empty text input
    #[must_use]
    pub fn input() -> Self {
        Self {
            tag_name: "input".to_string(),
            text: String::new(),
            value: Some(String::new()),
            options: Vec::new(),
            selected: None,
        }
    }

    /// Text input holding `value`
    #[must_use]
    pub fn input_with(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::input()
        }
    }

    /// `<select>` with the first option selected
    #[must_use]
    pub fn select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let selected = if options.is_empty() { None } else { Some(0) };
        let mut element = Self {
            tag_name: "select".to_string(),
            text: String::new(),
            value: None,
            options,
            selected,
        };
        element.sync_select();
        element
    }

    /// Non-form element with text
    #[must_use]
    pub fn text(tag_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            text: text.into(),
            value: None,
            options: Vec::new(),
            selected: None,
        }
    }

    /// `<button>` with a label
    #[must_use]
    pub fn button(label: impl Into<String>) -> Self {
        Self::text("button", label)
    }

    fn sync_select(&mut self) {
        self.text = self.options.join("\n");
        self.value = self
            .selected
            .and_then(|i| self.options.get(i))
            .cloned()
            .or_else(|| Some(String::new()));
    }

    fn handle(&self, id: &str) -> ElementHandle {
        ElementHandle {
            id: id.to_string(),
            tag_name: self.tag_name.clone(),
            text: self.text.clone(),
            value: self.value.clone(),
        }
    }
}

/// Page state of the mock browser
///
/// Click actions receive `&mut MockDom` so tests can script how the
/// application reacts to a button.
#[derive(Debug, Default)]
pub struct MockDom {
    /// Current URL
    pub url: String,
    /// Document title
    pub title: String,
    /// Body text outside any addressed element
    pub body_text: String,
    /// Elements by id
    pub elements: BTreeMap<String, MockElement>,
    delayed: Vec<(Instant, String, MockElement)>,
}

impl MockDom {
    /// Insert or replace an element, cancelling any pending delayed one
    pub fn insert(&mut self, id: impl Into<String>, element: MockElement) {
        let id = id.into();
        self.delayed.retain(|(_, delayed_id, _)| *delayed_id != id);
        self.elements.insert(id, element);
    }

    /// Insert an element that only becomes visible after `delay`
    pub fn insert_after(&mut self, id: impl Into<String>, element: MockElement, delay: Duration) {
        self.delayed.push((Instant::now() + delay, id.into(), element));
    }

    /// Remove an element, cancelling any pending delayed one
    pub fn remove(&mut self, id: &str) -> Option<MockElement> {
        self.delayed.retain(|(_, delayed_id, _)| delayed_id != id);
        self.elements.remove(id)
    }

    /// Replace the text of an existing element, creating a `<div>` if absent
    pub fn set_text(&mut self, id: &str, text: impl Into<String>) {
        let text = text.into();
        self.promote_delayed();
        match self.elements.get_mut(id) {
            Some(element) => element.text = text,
            None => self.insert(id, MockElement::text("div", text)),
        }
    }

    /// Current value of a form element
    #[must_use]
    pub fn value(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|e| e.value.as_deref())
    }

    /// Element lookup that honours delayed elements.
    ///
    /// A due delayed element shadows the current one, matching what
    /// `promote_delayed` will store.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MockElement> {
        let now = Instant::now();
        self.delayed
            .iter()
            .rev()
            .find(|(at, delayed_id, _)| delayed_id == id && *at <= now)
            .map(|(_, _, element)| element)
            .or_else(|| self.elements.get(id))
    }

    /// Whole-body text: free body text followed by every element's text
    #[must_use]
    pub fn body(&self) -> String {
        let visible = self.visible();
        std::iter::once(self.body_text.as_str())
            .chain(visible.iter().map(|(_, e)| e.text.as_str()))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Elements currently on the page, ordered by id
    fn visible(&self) -> Vec<(&str, &MockElement)> {
        let now = Instant::now();
        let mut ids: BTreeSet<&str> = self.elements.keys().map(String::as_str).collect();
        ids.extend(
            self.delayed
                .iter()
                .filter(|(at, _, _)| *at <= now)
                .map(|(_, id, _)| id.as_str()),
        );
        ids.into_iter()
            .filter_map(|id| self.get(id).map(|element| (id, element)))
            .collect()
    }

    fn promote_delayed(&mut self) {
        let now = Instant::now();
        let (ready, pending): (Vec<_>, Vec<_>) =
            self.delayed.drain(..).partition(|(at, _, _)| *at <= now);
        self.delayed = pending;
        for (_, id, element) in ready {
            self.elements.insert(id, element);
        }
    }

    fn element_mut(&mut self, locator: &Locator) -> StepResult<&mut MockElement> {
        self.promote_delayed();
        let not_found = || StepError::ElementNotFound {
            locator: locator.to_string(),
        };
        match locator {
            Locator::Id(id) => self.elements.get_mut(id).ok_or_else(not_found),
            Locator::TagName(name) => self
                .elements
                .values_mut()
                .find(|e| &e.tag_name == name)
                .ok_or_else(not_found),
        }
    }
}

type ClickAction = Box<dyn Fn(&mut MockDom) + Send + Sync>;

/// Mock driver for unit and scenario testing
#[derive(Default)]
pub struct MockDriver {
    /// Page state
    pub dom: MockDom,
    /// Call history for verification
    pub call_history: Vec<String>,
    actions: HashMap<String, ClickAction>,
    unreachable: HashSet<String>,
    broken: bool,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("dom", &self.dom)
            .field("call_history", &self.call_history)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("broken", &self.broken)
            .finish_non_exhaustive()
    }
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.dom.title = title.into();
        self
    }

    /// Set free body text
    #[must_use]
    pub fn with_body_text(mut self, text: impl Into<String>) -> Self {
        self.dom.body_text = text.into();
        self
    }

    /// Add an element
    #[must_use]
    pub fn with_element(mut self, id: impl Into<String>, element: MockElement) -> Self {
        self.dom.insert(id, element);
        self
    }

    /// Make navigation to `url` fail
    #[must_use]
    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.unreachable.insert(url.into());
        self
    }

    /// Make every page read fail as if the browser session had died
    #[must_use]
    pub fn with_broken_session(mut self) -> Self {
        self.broken = true;
        self
    }

    fn session(&self) -> StepResult<()> {
        if self.broken {
            Err(StepError::driver("browser session disconnected"))
        } else {
            Ok(())
        }
    }

    /// Run `action` against the DOM whenever the element `id` is clicked
    pub fn on_click<F>(&mut self, id: impl Into<String>, action: F)
    where
        F: Fn(&mut MockDom) + Send + Sync + 'static,
    {
        self.actions.insert(id.into(), Box::new(action));
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn form_value_mut<'a>(
        element: &'a mut MockElement,
        locator: &Locator,
    ) -> StepResult<&'a mut String> {
        if element.tag_name == "select" {
            return Err(StepError::driver(format!(
                "{locator} is a <select>, it cannot be typed into"
            )));
        }
        element.value.as_mut().ok_or_else(|| {
            StepError::driver(format!("{locator} is not an editable element"))
        })
    }
}

#[async_trait]
impl WebDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> StepResult<()> {
        self.call_history.push(format!("navigate:{url}"));
        if self.unreachable.contains(url) {
            return Err(StepError::NavigationError {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        self.dom.url = url.to_string();
        Ok(())
    }

    async fn title(&self) -> StepResult<String> {
        self.session()?;
        Ok(self.dom.title.clone())
    }

    async fn find_element(&self, locator: &Locator) -> StepResult<Option<ElementHandle>> {
        self.session()?;
        Ok(match locator {
            Locator::Id(id) => self.dom.get(id).map(|e| e.handle(id)),
            Locator::TagName(name) if name == "body" => Some(
                ElementHandle::new("", "body").with_text(self.dom.body()),
            ),
            Locator::TagName(name) => self
                .dom
                .visible()
                .into_iter()
                .find(|(_, e)| &e.tag_name == name)
                .map(|(id, e)| e.handle(id)),
        })
    }

    async fn clear(&mut self, locator: &Locator) -> StepResult<()> {
        self.call_history.push(format!("clear:{locator}"));
        let element = self.dom.element_mut(locator)?;
        Self::form_value_mut(element, locator)?.clear();
        Ok(())
    }

    async fn send_keys(&mut self, locator: &Locator, text: &str) -> StepResult<()> {
        self.call_history.push(format!("send_keys:{locator}:{text}"));
        let element = self.dom.element_mut(locator)?;
        Self::form_value_mut(element, locator)?.push_str(text);
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> StepResult<()> {
        self.call_history.push(format!("click:{locator}"));
        self.dom.element_mut(locator)?;
        if let Locator::Id(id) = locator {
            if let Some(action) = self.actions.get(id) {
                action(&mut self.dom);
            }
        }
        Ok(())
    }

    async fn select_by_visible_text(&mut self, locator: &Locator, text: &str) -> StepResult<()> {
        self.call_history.push(format!("select:{locator}:{text}"));
        let element = self.dom.element_mut(locator)?;
        if element.tag_name != "select" {
            return Err(StepError::driver(format!(
                "{locator} is a <{}>, not a <select>",
                element.tag_name
            )));
        }
        let index = element
            .options
            .iter()
            .position(|o| o == text)
            .ok_or_else(|| StepError::OptionNotFound {
                locator: locator.to_string(),
                text: text.to_string(),
            })?;
        element.selected = Some(index);
        element.sync_select();
        Ok(())
    }

    async fn first_selected_option(&self, locator: &Locator) -> StepResult<String> {
        let Locator::Id(id) = locator else {
            return Err(StepError::driver(format!("{locator} is not a <select>")));
        };
        let element = self.dom.get(id).ok_or_else(|| StepError::ElementNotFound {
            locator: locator.to_string(),
        })?;
        if element.tag_name != "select" {
            return Err(StepError::driver(format!(
                "{locator} is a <{}>, not a <select>",
                element.tag_name
            )));
        }
        element
            .selected
            .and_then(|i| element.options.get(i))
            .cloned()
            .ok_or_else(|| StepError::ElementNotFound {
                locator: format!("{locator} option:checked"),
            })
    }

    async fn close(&mut self) -> StepResult<()> {
        self.call_history.push("close".to_string());
        Ok(())
    }
}
