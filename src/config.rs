// src/config.rs

use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};
use url::Url;

use crate::error::ConfigError;
use crate::statement::{Category, RaggedRowPolicy, Ticker};

/// File picked up from the working directory when `FINSCRAPER_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "finscraper.yaml";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, wie Gecko) Chrome/91.0.4472.124 Safari/537.36";

/* ────────────────────────── sections ───────────────────────── */

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub base_url: String,
    /// Joined onto `base_url` after `{ticker}` and `{category}` are filled in.
    pub path_template: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://de.finance.yahoo.com/".into(),
            path_template: "quote/{ticker}/{category}/".into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// CSS selectors locating the statement table on a quote page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub container: String,
    pub row: String,
    pub cell: String,
    pub header: String,
    /// Label given to the first column, ahead of the page's own header labels.
    pub label_column: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            container: "div.tableContainer".into(),
            row: "div.row".into(),
            cell: "div.column".into(),
            header: "div.tableHeader".into(),
            label_column: "Description".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Columns kept in the CSV, in order.
    pub columns: Vec<String>,
    /// Rows without a value here are dropped before writing. The default is
    /// the German site's "breakdown" header.
    pub required_column: String,
    pub file_pattern: String,
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            columns: vec!["Description".into(), "Aufschlüsselung".into()],
            required_column: "Aufschlüsselung".into(),
            file_pattern: "{ticker}_financial_data.csv".into(),
            dir: PathBuf::from("."),
        }
    }
}

impl OutputConfig {
    pub fn path_for(&self, ticker: &Ticker) -> PathBuf {
        self.dir
            .join(self.file_pattern.replace("{ticker}", ticker.as_str()))
    }
}

/* ─────────────────────────── config ─────────────────────────── */

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub categories: Vec<String>,
    pub layout: PageLayout,
    pub ragged_rows: RaggedRowPolicy,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            categories: vec![
                Category::BALANCE_SHEET.into(),
                Category::CASH_FLOW.into(),
                Category::FINANCIALS.into(),
            ],
            layout: PageLayout::default(),
            ragged_rows: RaggedRowPolicy::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then the YAML file (if any), then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var_os("FINSCRAPER_CONFIG")
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.is_file().then_some(local)
            });

        let mut config = match path {
            Some(p) => Self::from_file(&p)?,
            None => {
                debug!("no config file; using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded config file");
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply `FINSCRAPER_*` overrides through `lookup` (normally `env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FINSCRAPER_BASE_URL") {
            self.http.base_url = url;
        }
        if let Some(raw) = lookup("FINSCRAPER_TIMEOUT_SECS") {
            self.http.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "FINSCRAPER_TIMEOUT_SECS",
                value: raw.clone(),
                reason: "expected a whole number of seconds",
            })?;
        }
        if let Some(raw) = lookup("FINSCRAPER_CATEGORIES") {
            self.categories = raw
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(dir) = lookup("FINSCRAPER_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        for placeholder in ["{ticker}", "{category}"] {
            if !self.http.path_template.contains(placeholder) {
                return Err(ConfigError::Invalid {
                    key: "http.path_template",
                    value: self.http.path_template.clone(),
                    reason: "must contain {ticker} and {category}",
                });
            }
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "http.timeout_secs",
                value: "0".into(),
                reason: "must be greater than zero",
            });
        }
        if self.output.columns.is_empty() {
            return Err(ConfigError::Invalid {
                key: "output.columns",
                value: "[]".into(),
                reason: "at least one column is required",
            });
        }
        if !self.output.columns.contains(&self.output.required_column) {
            return Err(ConfigError::Invalid {
                key: "output.required_column",
                value: self.output.required_column.clone(),
                reason: "must be one of output.columns",
            });
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.http.base_url).map_err(|source| ConfigError::BaseUrl {
            url: self.http.base_url.clone(),
            source,
        })
    }

    /// Configured categories, falling back to [`Category::default_set`].
    pub fn categories(&self) -> Vec<Category> {
        if self.categories.is_empty() {
            return Category::default_set();
        }
        self.categories.iter().map(|c| Category::new(c.as_str())).collect()
    }
}
