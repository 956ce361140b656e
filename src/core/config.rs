use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    pub listing_url: String,
    pub output_path: PathBuf,
    /// Stop after this many pages even if the listing reports more
    pub page_cap: Option<u32>,
    pub selectors: SelectorConfig,
    pub timeouts: TimeoutConfig,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub consent_button: String,
    pub rows_container: String,
    pub company_row: String,
    pub row_link: String,
    pub pagination: String,
    pub page_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub consent_ms: u64,
    pub pagination_ms: u64,
    pub rows_ms: u64,
    pub refresh_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl TimeoutConfig {
    pub fn consent(&self) -> Duration {
        Duration::from_millis(self.consent_ms)
    }

    pub fn pagination(&self) -> Duration {
        Duration::from_millis(self.pagination_ms)
    }

    pub fn rows(&self) -> Duration {
        Duration::from_millis(self.rows_ms)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.sustainalytics.com/esg-ratings".to_string(),
            output_path: PathBuf::from("sustainalytics_links.txt"),
            page_cap: None,
            selectors: SelectorConfig::default(),
            timeouts: TimeoutConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            consent_button: "#hs-eu-confirmation-button".to_string(),
            rows_container: "#company_ratings".to_string(),
            company_row: ".company-row".to_string(),
            row_link: "a".to_string(),
            pagination: "#victor-pagination".to_string(),
            page_link: "a".to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            consent_ms: 100_000,
            pagination_ms: 10_000,
            rows_ms: 100_000,
            refresh_ms: 100_000,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            args: vec![],
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}
