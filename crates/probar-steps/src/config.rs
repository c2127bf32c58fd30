//! Step configuration.
//!
//! Values come from, in increasing precedence: defaults, a YAML file, and the
//! process environment. The environment names match what test suites
//! already export in CI (`BASE_URL`, `WAIT_SECONDS`).

use crate::browser::BrowserConfig;
use crate::locator::DEFAULT_ID_PREFIX;
use crate::result::{StepError, StepResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default application URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default bounded-wait timeout in seconds
pub const DEFAULT_WAIT_SECONDS: u64 = 60;

/// Default pause after a button click in milliseconds
pub const DEFAULT_CLICK_SETTLE_MS: u64 = 1000;

/// Step configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// URL visited by the home page step
    pub base_url: String,
    /// Bounded-wait timeout in seconds
    pub wait_seconds: u64,
    /// Polling interval for bounded waits
    pub poll_interval_ms: u64,
    /// Prefix of form field ids
    pub id_prefix: String,
    /// Pause after clicking a button (0 = no pause)
    pub click_settle_ms: u64,
    /// Browser launch options
    pub browser: BrowserConfig,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            wait_seconds: DEFAULT_WAIT_SECONDS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            click_settle_ms: DEFAULT_CLICK_SETTLE_MS,
            browser: BrowserConfig::default(),
        }
    }
}

impl StepConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set wait timeout in seconds
    #[must_use]
    pub const fn with_wait_seconds(mut self, seconds: u64) -> Self {
        self.wait_seconds = seconds;
        self
    }

    /// Set poll interval
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set field id prefix
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Set the post-click pause
    #[must_use]
    pub const fn with_click_settle_ms(mut self, ms: u64) -> Self {
        self.click_settle_ms = ms;
        self
    }

    /// Set browser options
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Options for bounded waits
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.wait_seconds.saturating_mul(1000),
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Post-click pause
    #[must_use]
    pub const fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    /// Parse YAML
    pub fn from_yaml_str(yaml: &str) -> StepResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> StepResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> StepResult<Self> {
        Self::default().merge_env(|key| std::env::var(key).ok())
    }

    /// Override fields from environment-style lookups.
    ///
    /// Recognised keys: `BASE_URL`, `WAIT_SECONDS`, `POLL_INTERVAL_MS`,
    /// `ID_PREFIX`, `CLICK_SETTLE_MS`, `HEADLESS`, `CHROMIUM_PATH`.
    pub fn merge_env<F>(mut self, lookup: F) -> StepResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BASE_URL") {
            self.base_url = url;
        }
        if let Some(raw) = lookup("WAIT_SECONDS") {
            self.wait_seconds = parse_var("WAIT_SECONDS", &raw)?;
        }
        if let Some(raw) = lookup("POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_var("POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(prefix) = lookup("ID_PREFIX") {
            self.id_prefix = prefix;
        }
        if let Some(raw) = lookup("CLICK_SETTLE_MS") {
            self.click_settle_ms = parse_var("CLICK_SETTLE_MS", &raw)?;
        }
        if let Some(raw) = lookup("HEADLESS") {
            self.browser.headless = parse_bool("HEADLESS", &raw)?;
        }
        if let Some(path) = lookup("CHROMIUM_PATH") {
            self.browser.chromium_path = Some(path);
        }
        Ok(self)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> StepResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| StepError::Config {
        message: format!("{key}={raw:?}: {e}"),
    })
}

fn parse_bool(key: &str, raw: &str) -> StepResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(StepError::Config {
            message: format!("{key}={raw:?}: expected a boolean"),
        }),
    }
}
