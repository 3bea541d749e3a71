//! Brave Search API client. Queries go out as plain GETs; results come back
//! in server order, untouched. Ranking and filtering are the service's job.

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_ENCODING};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::research::SearchResult;
use crate::retry::Transient;

pub const BRAVE_API_BASE: &str = "https://api.search.brave.com/res/v1";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// The service caps `count` at 20 per request.
const MAX_COUNT: u32 = 20;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search transport failure: {0}")]
    Transport(String),
    #[error("search API key rejected (HTTP 401)")]
    InvalidApiKey,
    #[error("search rate limit hit (HTTP 429)")]
    RateLimited,
    #[error("search service returned HTTP {0}")]
    Http(u16),
    #[error("search protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Transport(err.to_string())
    }
}

impl Transient for SearchError {
    fn is_transient(&self) -> bool {
        matches!(self, SearchError::Transport(_) | SearchError::RateLimited)
    }
}

/// One web search. Defaults match the service's own.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub count: u32,
    pub offset: u32,
    pub country: String,
    pub safesearch: String,
    /// `pd`/`pw`/`pm`/`py` to restrict result age.
    pub freshness: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: 10,
            offset: 0,
            country: "US".into(),
            safesearch: "moderate".into(),
            freshness: None,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_freshness(mut self, freshness: impl Into<String>) -> Self {
        self.freshness = Some(freshness.into());
        self
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WebSearchResponse {
    #[serde(default)]
    web: Option<WebResults>,
}

#[derive(Debug, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<RawResult>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    title: String,
    url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    age: Option<String>,
}

// ── SearchClient ─────────────────────────────────────────────────────────────

pub struct SearchClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl SearchClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let http = Client::builder().timeout(SEARCH_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Run one query and return its hits in server order.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/web/search", self.base_url.trim_end_matches('/'));
        let count = query.count.clamp(1, MAX_COUNT);

        let mut params: Vec<(&str, String)> = vec![
            ("q", query.query.clone()),
            ("count", count.to_string()),
            ("offset", query.offset.to_string()),
            ("country", query.country.clone()),
            ("search_lang", "en".into()),
            ("ui_lang", "en-US".into()),
            ("safesearch", query.safesearch.clone()),
        ];
        if let Some(freshness) = &query.freshness {
            params.push(("freshness", freshness.clone()));
        }

        debug!("search: querying {:?}", query.query);
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_ENCODING, "gzip")
            .header("X-Subscription-Token", &self.api_key)
            .query(&params)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(SearchError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(SearchError::RateLimited),
            status if !status.is_success() => return Err(SearchError::Http(status.as_u16())),
            _ => {}
        }

        let body: WebSearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Protocol(format!("search response: {e}")))?;

        let raw = body.web.map(|w| w.results).unwrap_or_default();
        Ok(raw
            .into_iter()
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                description: r.description.unwrap_or_default(),
                age: r.age,
                score: None,
            })
            .collect())
    }
}
