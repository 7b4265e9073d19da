// src/error.rs

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::statement::{Category, Ticker};

/// Failure to obtain a page for one category.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: Url, status: u16 },

    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid statement URL: {0}")]
    Url(#[from] url::ParseError),
}

/// The page arrived but holds nothing we can turn into a table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no statement table found; the content may be loaded dynamically")]
    MissingContainer,

    #[error("statement table has no data rows")]
    NoRows,
}

/// Why a single category is absent from the combined result.
#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("{category}: {source}")]
    Transport {
        category: Category,
        #[source]
        source: TransportError,
    },

    #[error("{category}: {source}")]
    Parse {
        category: Category,
        #[source]
        source: ParseError,
    },
}

impl CategoryError {
    pub fn category(&self) -> &Category {
        match self {
            Self::Transport { category, .. } | Self::Parse { category, .. } => category,
        }
    }
}

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("no statement data retrieved for {ticker} (tried: {tried})")]
    NoData { ticker: Ticker, tried: String },
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed CSV record {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid base URL `{url}`: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid CSS selector `{selector}` for {field}: {reason}")]
    Selector {
        field: &'static str,
        selector: String,
        reason: String,
    },

    #[error("invalid value `{value}` for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("ticker symbol is empty")]
    EmptyTicker,

    #[error("ticker symbol `{0}` contains unsupported characters")]
    InvalidTicker(String),
}
