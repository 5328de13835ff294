use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Endpoint layout and paging knobs for the remote service.
///
/// The service moves its API under new path segments without notice, so
/// every version-sensitive value lives here rather than in the request code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Segment spliced into article URLs, e.g. `api/w5`.
    pub article_prefix: String,
    pub search_prefix: String,
    /// Stocks and social counters.
    pub misc_prefix: String,
    pub push_prefix: String,
    /// Older article segments rewritten to `article_prefix`.
    pub legacy_prefixes: Vec<String>,
    pub page_size: u32,
    /// Upper bound on search pages fetched by one listing. `None` disables it.
    pub max_pages: Option<u32>,
    /// Tag listings scan `count * tag_scan_factor` articles per batch.
    pub tag_scan_factor: usize,
    /// Fetch reaction counts for every materialized listing article.
    pub fetch_reactions: bool,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://meduza.io".to_string(),
            article_prefix: "api/w5".to_string(),
            search_prefix: "api/w5".to_string(),
            misc_prefix: "api/misc".to_string(),
            push_prefix: "api/v3".to_string(),
            legacy_prefixes: vec!["api/v3".to_string()],
            page_size: 24,
            max_pages: Some(50),
            tag_scan_factor: 10,
            fetch_reactions: false,
            timeout_ms: None,
            user_agent: format!("mz_client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON document. Missing keys fall back to the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_reactions(mut self, fetch_reactions: bool) -> Self {
        self.fetch_reactions = fetch_reactions;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Base URL without a trailing slash.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<()> {
        if self.origin().is_empty() {
            return Err(Error::Config("base_url must not be empty".to_string()));
        }
        if url::Url::parse(self.origin()).is_err() {
            return Err(Error::Config(format!("base_url is not a valid URL: {}", self.base_url)));
        }
        if self.page_size == 0 {
            return Err(Error::Config("page_size must be positive".to_string()));
        }
        if self.tag_scan_factor == 0 {
            return Err(Error::Config("tag_scan_factor must be positive".to_string()));
        }
        if self.timeout_ms == Some(0) {
            return Err(Error::Config("timeout must be positive".to_string()));
        }
        if self.article_prefix.trim_matches('/').is_empty() {
            return Err(Error::Config("article_prefix must not be empty".to_string()));
        }
        Ok(())
    }
}
