//! Optional RON configuration for the harvester.
//!
//! ```ron
//! (
//!     retry: (max_scroll_failures: 5, settle_ms: 2000),
//!     feed_selector: "div[role=\"feed\"]",
//! )
//! ```
//!
//! Every key may be left out; missing keys keep the built-in defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::engine_info;
use harvester_core::RetryPolicy;
use harvester_engine::{locators, HarvestSettings, Locator};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub retry: RetryConfig,
    pub feed_selector: String,
    pub ad_selector: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_scroll_failures: u32,
    pub max_load_failures: u32,
    pub settle_ms: u64,
    pub load_retry_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            feed_selector: locators::FEED.as_str().to_string(),
            ad_selector: locators::SIDEBAR_AD.as_str().to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_scroll_failures: policy.max_scroll_failures,
            max_load_failures: policy.max_load_failures,
            settle_ms: duration_ms(policy.settle),
            load_retry_ms: duration_ms(policy.load_retry_interval),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = ron::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        engine_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Harvest settings with selectors checked up front, so a typo fails
    /// before any browser work starts.
    pub fn harvest_settings(&self) -> Result<HarvestSettings> {
        let feed_locator = checked_locator("feed_selector", &self.feed_selector)?;
        let ad_locator = checked_locator("ad_selector", &self.ad_selector)?;
        Ok(HarvestSettings {
            retry: RetryPolicy {
                max_scroll_failures: self.retry.max_scroll_failures,
                max_load_failures: self.retry.max_load_failures,
                settle: Duration::from_millis(self.retry.settle_ms),
                load_retry_interval: Duration::from_millis(self.retry.load_retry_ms),
            },
            feed_locator,
            ad_locator,
        })
    }
}

fn checked_locator(key: &str, css: &str) -> Result<Locator> {
    let locator = Locator::css(css);
    locator.selector().with_context(|| format!("config key {key}"))?;
    Ok(locator)
}
