use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde_json::Value;
use tracing::{debug, info};

use crate::core::{BrowserConfig, PageDriver};
use crate::errors::{HarvestError, Result};

/// Chrome-backed page driver.
///
/// Element handles store a selector and a match index and re-resolve on every
/// interaction, so no raw CDP node reference is held across a page swap.
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    session_id: String,
}

#[derive(Debug, Clone)]
pub struct ChromeElement {
    css: String,
    index: usize,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| HarvestError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| HarvestError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| HarvestError::LaunchFailed(e.to_string()))?;

        let session_id = uuid::Uuid::new_v4().to_string();
        info!(session = %session_id, "chrome session launched");

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn tab(&self) -> Result<&Arc<Tab>> {
        self.tab
            .as_ref()
            .ok_or_else(|| HarvestError::NavigationFailed("no active tab".to_string()))
    }

    fn eval(&self, script: &str) -> Result<Value> {
        let result = self
            .tab()?
            .evaluate(script, false)
            .map_err(|e| HarvestError::ScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    fn resolve<'a>(&self, tab: &'a Tab, element: &ChromeElement) -> Result<Element<'a>> {
        let mut found = tab.find_elements(&element.css).map_err(|e| {
            HarvestError::ElementNotFound(format!("{} ({})", element.css, e))
        })?;

        if element.index >= found.len() {
            return Err(HarvestError::ElementNotFound(format!(
                "{} (match {} of {})",
                element.css,
                element.index,
                found.len()
            )));
        }

        Ok(found.swap_remove(element.index))
    }

    fn fingerprint_script(css: &str) -> Result<String> {
        let selector = serde_json::to_string(css)?;
        Ok(format!(
            r#"
            (function() {{
                const el = document.querySelector({selector});
                if (!el) return "";
                const links = el.querySelectorAll("a");
                const first = links.length ? links[0].href : "";
                const last = links.length ? links[links.length - 1].href : "";
                return links.length + "|" + first + "|" + last;
            }})()
        "#
        ))
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    type Element = ChromeElement;

    async fn open(&mut self, url: &str) -> Result<()> {
        let tab = self.tab()?;

        tab.navigate_to(url)
            .map_err(|e| HarvestError::NavigationFailed(e.to_string()))?;

        tab.wait_until_navigated()
            .map_err(|e| HarvestError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn await_element(&self, css: &str, timeout: Duration) -> Result<Self::Element> {
        self.tab()?
            .wait_for_element_with_custom_timeout(css, timeout)
            .map_err(|_| HarvestError::Timeout(css.to_string()))?;

        Ok(ChromeElement {
            css: css.to_string(),
            index: 0,
        })
    }

    async fn query_all(&self, scope: &Self::Element, css: &str) -> Result<Vec<Self::Element>> {
        let combined = format!("{} {}", scope.css, css);
        let selector = serde_json::to_string(&combined)?;
        let count = self
            .eval(&format!("document.querySelectorAll({selector}).length"))?
            .as_u64()
            .unwrap_or(0) as usize;

        Ok((0..count)
            .map(|index| ChromeElement {
                css: combined.clone(),
                index,
            })
            .collect())
    }

    async fn inner_text(&self, element: &Self::Element) -> Result<String> {
        let tab = self.tab()?;
        let el = self.resolve(tab, element)?;

        el.get_inner_text()
            .map_err(|e| HarvestError::ChromeError(e.to_string()))
    }

    async fn click(&self, element: &Self::Element) -> Result<()> {
        let tab = self.tab()?;
        let el = self.resolve(tab, element)?;

        el.scroll_into_view()
            .and_then(|el| el.move_mouse_over())
            .and_then(|el| el.click())
            .map_err(|e| HarvestError::ChromeError(e.to_string()))?;

        debug!(selector = %element.css, index = element.index, "clicked");
        Ok(())
    }

    async fn collect_row_links(
        &self,
        container: &Self::Element,
        row: &str,
        link: &str,
    ) -> Result<Vec<Option<String>>> {
        let container_sel = serde_json::to_string(&container.css)?;
        let row_sel = serde_json::to_string(row)?;
        let link_sel = serde_json::to_string(link)?;

        let script = format!(
            r#"
            (function() {{
                const container = document.querySelector({container_sel});
                if (!container) return null;
                return Array.from(container.querySelectorAll({row_sel})).map(r => {{
                    const a = r.querySelector({link_sel});
                    return a ? a.href : null;
                }});
            }})()
        "#
        );

        match self.eval(&script)? {
            Value::Array(values) => Ok(values
                .into_iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect()),
            Value::Null => Err(HarvestError::ElementNotFound(container.css.clone())),
            other => Err(HarvestError::ScriptFailed(format!(
                "unexpected row extraction result: {other}"
            ))),
        }
    }

    async fn fingerprint(&self, css: &str) -> Result<String> {
        let script = Self::fingerprint_script(css)?;
        Ok(self.eval(&script)?.as_str().unwrap_or("").to_string())
    }

    async fn await_refresh(&self, css: &str, previous: &str, timeout: Duration) -> Result<()> {
        let start = Instant::now();

        while start.elapsed() < timeout {
            let current = self.fingerprint(css).await?;
            if !current.is_empty() && current != previous {
                debug!(selector = %css, "container refreshed");
                return Ok(());
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        Err(HarvestError::Timeout(format!("refresh of {}", css)))
    }

    async fn close(&mut self) -> Result<()> {
        self.tab = None;
        self.browser = None;
        debug!(session = %self.session_id, "chrome session closed");
        Ok(())
    }
}
