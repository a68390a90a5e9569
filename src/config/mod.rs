use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Catalogue directory; pages are `{base_url}page-{n}.html`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_page_count")]
    pub page_count: u32,

    /// No timeout unless set.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default)]
    pub jitter_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Where the dataset is written
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

/// Reporting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default = "default_bins")]
    pub histogram_bins: usize,

    #[serde(default = "default_chart_width")]
    pub chart_width: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "http://books.toscrape.com/catalogue/".to_string()
}
fn default_page_count() -> u32 {
    50
}
fn default_request_delay_ms() -> u64 {
    1000
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}
fn default_output_path() -> PathBuf {
    PathBuf::from("books_data.csv")
}
fn default_bins() -> usize {
    20
}
fn default_chart_width() -> usize {
    50
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_count: default_page_count(),
            timeout_secs: None,
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            histogram_bins: default_bins(),
            chart_width: default_chart_width(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("BOOKS").separator("__"))
            .build()?;

        cfg.try_deserialize()
            .context("Invalid configuration (config/*.toml or BOOKS__* variables)")
    }
}
