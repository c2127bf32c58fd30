//! Browser control for step execution.
//!
//! `BrowserConfig` is always available so it can live in [`crate::StepConfig`].
//! With the `browser` feature, [`ChromiumDriver`] implements
//! [`WebDriver`](crate::WebDriver) over the Chrome `DevTools` Protocol using
//! chromiumoxide. Element reads run a small DOM script and return a JSON
//! snapshot; typing and clicking go through real CDP input events.

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{ElementHandle, WebDriver};
    use crate::locator::Locator;
    use crate::result::{StepError, StepResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;

    /// Chromium session driven over CDP
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: CdpBrowser,
        page: CdpPage,
        handle: tokio::task::JoinHandle<()>,
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: &BrowserConfig) -> StepResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| StepError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                StepError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            // Spawn handler task
            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(StepError::driver)?;

            tracing::info!(headless = config.headless, "chromium session started");

            Ok(Self {
                browser,
                page,
                handle,
            })
        }

        /// Evaluate a script whose result is a JSON string and decode it
        async fn eval_json<T: DeserializeOwned>(&self, script: String) -> StepResult<T> {
            let encoded: String = self
                .page
                .evaluate_expression(script)
                .await
                .map_err(StepError::driver)?
                .into_value()?;
            Ok(serde_json::from_str(&encoded)?)
        }

        /// Run `body` with `el` bound to the located element.
        /// The script yields `"__missing__"` when nothing matches.
        async fn with_element<T: DeserializeOwned>(
            &self,
            locator: &Locator,
            body: &str,
        ) -> StepResult<T> {
            let script = format!(
                "(function() {{ const el = {}; if (!el) {{ return JSON.stringify(\"__missing__\"); }} {body} }})()",
                locator.to_js()
            );
            let value: serde_json::Value = self.eval_json(script).await?;
            if value.as_str() == Some("__missing__") {
                return Err(StepError::ElementNotFound {
                    locator: locator.to_string(),
                });
            }
            Ok(serde_json::from_value(value)?)
        }
    }

    const SNAPSHOT: &str = "return JSON.stringify({ \
        id: el.id || '', \
        tag_name: el.tagName.toLowerCase(), \
        text: el.innerText ?? el.textContent ?? '', \
        value: ('value' in el) ? String(el.value) : null });";

    const CLEAR: &str = "el.value = ''; \
        el.dispatchEvent(new Event('input', { bubbles: true })); \
        el.dispatchEvent(new Event('change', { bubbles: true })); \
        return JSON.stringify(true);";

    const SELECTED: &str = "if (el.tagName !== 'SELECT') { return JSON.stringify({ error: 'not-select' }); } \
        const opt = el.selectedOptions[0]; \
        return JSON.stringify(opt ? { text: opt.text } : { error: 'none' });";

    #[derive(serde::Deserialize)]
    struct SelectOutcome {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    #[async_trait]
    impl WebDriver for ChromiumDriver {
        async fn navigate(&mut self, url: &str) -> StepResult<()> {
            tracing::debug!(url, "navigate");
            self.page
                .goto(url)
                .await
                .map_err(|e| StepError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn title(&self) -> StepResult<String> {
            Ok(self
                .page
                .get_title()
                .await
                .map_err(StepError::driver)?
                .unwrap_or_default())
        }

        async fn find_element(&self, locator: &Locator) -> StepResult<Option<ElementHandle>> {
            match self.with_element(locator, SNAPSHOT).await {
                Ok(handle) => Ok(Some(handle)),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        }

        async fn clear(&mut self, locator: &Locator) -> StepResult<()> {
            let _: bool = self.with_element(locator, CLEAR).await?;
            Ok(())
        }

        async fn send_keys(&mut self, locator: &Locator, text: &str) -> StepResult<()> {
            self.require_element(locator).await?;
            self.page
                .find_element(locator.to_css())
                .await
                .map_err(StepError::driver)?
                .focus()
                .await
                .map_err(StepError::driver)?
                .type_str(text)
                .await
                .map_err(StepError::driver)?;
            Ok(())
        }

        async fn click(&mut self, locator: &Locator) -> StepResult<()> {
            self.require_element(locator).await?;
            self.page
                .find_element(locator.to_css())
                .await
                .map_err(StepError::driver)?
                .click()
                .await
                .map_err(StepError::driver)?;
            Ok(())
        }

        async fn select_by_visible_text(
            &mut self,
            locator: &Locator,
            text: &str,
        ) -> StepResult<()> {
            let body = format!(
                "if (el.tagName !== 'SELECT') {{ return JSON.stringify('not-select'); }} \
                 const opt = Array.from(el.options).find(o => o.text === {}); \
                 if (!opt) {{ return JSON.stringify('no-option'); }} \
                 opt.selected = true; \
                 el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                 return JSON.stringify('ok');",
                serde_json::Value::from(text)
            );
            let outcome: String = self.with_element(locator, &body).await?;
            match outcome.as_str() {
                "ok" => Ok(()),
                "no-option" => Err(StepError::OptionNotFound {
                    locator: locator.to_string(),
                    text: text.to_string(),
                }),
                _ => Err(StepError::driver(format!("{locator} is not a <select>"))),
            }
        }

        async fn first_selected_option(&self, locator: &Locator) -> StepResult<String> {
            let outcome: SelectOutcome = self.with_element(locator, SELECTED).await?;
            match (outcome.text, outcome.error) {
                (Some(text), _) => Ok(text),
                (None, Some(error)) if error == "none" => Err(StepError::ElementNotFound {
                    locator: format!("{locator} option:checked"),
                }),
                _ => Err(StepError::driver(format!("{locator} is not a <select>"))),
            }
        }

        async fn close(&mut self) -> StepResult<()> {
            self.browser.close().await.map_err(StepError::driver)?;
            self.handle.abort();
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;
