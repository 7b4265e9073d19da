// src/fetch/mod.rs

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;
use crate::error::TransportError;

pub mod urls;

/// A fetched page. The body is only read for `200 OK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }
}

/// Where statement pages come from. Implemented over HTTP by [`HttpSource`];
/// tests substitute canned pages.
pub trait PageSource {
    /// GET `url`. A non-200 status is a `Page`, not an error; only failures
    /// to get any response at all are errors.
    fn get(&self, url: &Url) -> Result<Page, TransportError>;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn get(&self, url: &Url) -> Result<Page, TransportError> {
        (**self).get(url)
    }
}

/// Blocking reqwest client carrying a browser-like User-Agent, a request
/// timeout and a cookie jar.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .cookie_store(true)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    fn get(&self, url: &Url) -> Result<Page, TransportError> {
        debug!(%url, "GET");
        let request_failed = |source| TransportError::Request {
            url: url.clone(),
            source,
        };
        let resp = self.client.get(url.clone()).send().map_err(request_failed)?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Ok(Page::status(status.as_u16()));
        }
        let body = resp.text().map_err(request_failed)?;
        Ok(Page::ok(body))
    }
}
