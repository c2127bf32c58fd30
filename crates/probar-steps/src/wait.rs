//! Explicit waits.
//!
//! A bounded polling loop that re-evaluates a DOM [`Condition`] until it
//! holds or the timeout elapses. There is exactly one wait per step and no
//! retry after it expires.

use crate::driver::{ElementHandle, WebDriver};
use crate::locator::Locator;
use crate::result::{StepError, StepResult};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (60 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 60_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// How observed text is compared with the expected text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Whole string equality
    Exact,
    /// Substring
    Contains,
}

impl TextMatch {
    /// Compare `actual` against `expected`
    #[must_use]
    pub fn matches(self, actual: &str, expected: &str) -> bool {
        match self {
            Self::Exact => actual == expected,
            Self::Contains => actual.contains(expected),
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::Exact => "equal",
            Self::Contains => "contain",
        }
    }
}

/// A DOM condition a step can wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Element exists in the DOM
    Present(Locator),
    /// Element's rendered text matches
    Text {
        /// Element to read
        locator: Locator,
        /// Comparison
        matcher: TextMatch,
        /// Expected text
        expected: String,
    },
    /// Element's `value` matches
    Value {
        /// Element to read
        locator: Locator,
        /// Comparison
        matcher: TextMatch,
        /// Expected value
        expected: String,
    },
}

impl Condition {
    /// Presence of an element
    #[must_use]
    pub const fn present(locator: Locator) -> Self {
        Self::Present(locator)
    }

    /// Rendered text matching
    #[must_use]
    pub fn text(locator: Locator, matcher: TextMatch, expected: impl Into<String>) -> Self {
        Self::Text {
            locator,
            matcher,
            expected: expected.into(),
        }
    }

    /// Form value matching
    #[must_use]
    pub fn value(locator: Locator, matcher: TextMatch, expected: impl Into<String>) -> Self {
        Self::Value {
            locator,
            matcher,
            expected: expected.into(),
        }
    }

    /// Element the condition reads
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        match self {
            Self::Present(locator) | Self::Text { locator, .. } | Self::Value { locator, .. } => {
                locator
            }
        }
    }

    /// Evaluate once. `Ok(None)` means "not yet".
    ///
    /// A missing element is "not yet", never an error.
    pub async fn check<D: WebDriver + ?Sized>(
        &self,
        driver: &D,
    ) -> StepResult<Option<ElementHandle>> {
        let element = match driver.find_element(self.locator()).await {
            Ok(element) => element,
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };
        Ok(element.filter(|el| match self {
            Self::Present(_) => true,
            Self::Text {
                matcher, expected, ..
            } => matcher.matches(&el.text, expected),
            Self::Value {
                matcher, expected, ..
            } => el
                .value
                .as_deref()
                .is_some_and(|value| matcher.matches(value, expected)),
        }))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(locator) => write!(f, "presence of {locator}"),
            Self::Text {
                locator,
                matcher,
                expected,
            } => write!(f, "text of {locator} to {} {expected:?}", matcher.verb()),
            Self::Value {
                locator,
                matcher,
                expected,
            } => write!(f, "value of {locator} to {} {expected:?}", matcher.verb()),
        }
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// The element as it was when the condition held
    pub element: ElementHandle,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of evaluations
    pub polls: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Bounded polling wait
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Poll until `condition` holds.
    ///
    /// The condition is always evaluated at least once, even with a zero
    /// timeout. Fails with [`StepError::Timeout`] once the timeout has elapsed.
    pub async fn until<D: WebDriver + ?Sized>(
        &self,
        driver: &D,
        condition: &Condition,
    ) -> StepResult<WaitResult> {
        let start = Instant::now();
        let timeout = self.options.timeout();
        let mut polls = 0_u32;

        loop {
            polls = polls.saturating_add(1);
            if let Some(element) = condition.check(driver).await? {
                let elapsed = start.elapsed();
                tracing::debug!(%condition, ?elapsed, polls, "wait satisfied");
                return Ok(WaitResult {
                    element,
                    elapsed,
                    polls,
                    waited_for: condition.to_string(),
                });
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                tracing::debug!(%condition, polls, "wait expired");
                return Err(StepError::Timeout {
                    ms: self.options.timeout_ms,
                    waited_for: condition.to_string(),
                });
            }
            let remaining = timeout.saturating_sub(elapsed);
            tokio::time::sleep(self.options.poll_interval().min(remaining)).await;
        }
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Wait for a fixed duration (discouraged - use wait conditions instead)
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
