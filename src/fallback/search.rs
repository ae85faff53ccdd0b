//! External search providers
//!
//! Providers hand back raw JSON. The payload is normalized into text right at
//! the boundary, whatever its shape: DuckDuckGo answers with an object,
//! the Wikipedia search endpoint with a list of hits.

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DUCKDUCKGO: &str = "duckduckgo";
pub const WIKIPEDIA: &str = "wikipedia";

pub const KNOWN_PROVIDERS: &[&str] = &[DUCKDUCKGO, WIKIPEDIA];

const DUCKDUCKGO_URL: &str = "https://api.duckduckgo.com/";
const WIKIPEDIA_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Fields that carry answer text, strongest first
const TEXT_FIELDS: &[&str] = &[
    "Answer", "answer", "AbstractText", "Abstract", "abstract", "Definition", "extract",
    "snippet", "Text", "text", "summary", "description",
];

/// Fields that nest further results
const NESTED_FIELDS: &[&str] = &["RelatedTopics", "Topics", "results", "items", "data", "hits"];

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("html tag pattern");
}

/// External search collaborator
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Raw provider payload. `timeout` bounds the provider's own I/O; the
    /// fallback chain enforces it again around the whole call.
    async fn search(&self, query: &str, timeout: Duration) -> Result<Value>;
}

/// Successful provider shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProviderPayload {
    List(Vec<Value>),
    Object(Map<String, Value>),
}

impl ProviderPayload {
    /// Parse a raw payload; scalars and nulls are malformed
    pub fn parse(provider: &str, raw: Value) -> Result<Self> {
        serde_json::from_value(raw).map_err(|e| {
            RouterError::provider_fault(provider, format!("malformed response: {}", e))
        })
    }

    /// First usable answer text, if any
    pub fn into_text(self) -> Option<String> {
        match self {
            ProviderPayload::Object(map) => text_from_object(&map),
            ProviderPayload::List(items) => items.iter().find_map(text_from_value),
        }
    }
}

fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_text(s),
        Value::Object(map) => text_from_object(map),
        Value::Array(items) => items.iter().find_map(text_from_value),
        _ => None,
    }
}

fn text_from_object(map: &Map<String, Value>) -> Option<String> {
    let direct = TEXT_FIELDS
        .iter()
        .filter_map(|field| map.get(*field).and_then(Value::as_str))
        .find_map(clean_text);

    if direct.is_some() {
        return direct;
    }

    NESTED_FIELDS
        .iter()
        .filter_map(|field| map.get(*field))
        .find_map(text_from_value)
}

/// Strip markup, decode the usual entities and collapse whitespace
fn clean_text(raw: &str) -> Option<String> {
    let stripped = HTML_TAG.replace_all(raw, "");
    let decoded = stripped
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    let text = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// HTTP client for providers.
///
/// Idle pooling is disabled: a pooled connection is bound to the runtime that
/// opened it, and every request runs on its own short-lived runtime.
pub fn build_http_client(user_agent: &str) -> Result<Client> {
    let client = Client::builder()
        .pool_max_idle_per_host(0)
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

async fn get_json(
    client: &Client,
    provider: &str,
    base_url: &str,
    params: &[(&str, &str)],
    timeout: Duration,
) -> Result<Value> {
    let url = Url::parse_with_params(base_url, params)
        .map_err(|e| RouterError::provider_fault(provider, format!("invalid url: {}", e)))?;

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| RouterError::provider_fault(provider, format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RouterError::provider_fault(
            provider,
            format!("returned HTTP {}", status),
        ));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| RouterError::provider_fault(provider, format!("invalid JSON: {}", e)))
}

/// DuckDuckGo Instant Answer API (object-shaped)
pub struct DuckDuckGoProvider {
    client: Client,
    base_url: String,
}

impl DuckDuckGoProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DUCKDUCKGO_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        DUCKDUCKGO
    }

    async fn search(&self, query: &str, timeout: Duration) -> Result<Value> {
        debug!(provider = DUCKDUCKGO, "Searching");
        get_json(
            &self.client,
            DUCKDUCKGO,
            &self.base_url,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
            timeout,
        )
        .await
    }
}

/// Wikipedia full-text search (list of hits)
pub struct WikipediaProvider {
    client: Client,
    base_url: String,
}

impl WikipediaProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, WIKIPEDIA_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl SearchProvider for WikipediaProvider {
    fn name(&self) -> &str {
        WIKIPEDIA
    }

    async fn search(&self, query: &str, timeout: Duration) -> Result<Value> {
        debug!(provider = WIKIPEDIA, "Searching");
        let body = get_json(
            &self.client,
            WIKIPEDIA,
            &self.base_url,
            &[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "3"),
                ("format", "json"),
                ("utf8", "1"),
            ],
            timeout,
        )
        .await?;

        // Hand back the hit list itself when the envelope is as expected
        Ok(body
            .get("query")
            .and_then(|q| q.get("search"))
            .cloned()
            .unwrap_or(body))
    }
}

/// Providers in configured order
pub fn create_providers(config: &RouterConfig) -> Result<Vec<Arc<dyn SearchProvider>>> {
    if config.search_providers.is_empty() {
        return Ok(Vec::new());
    }

    let client = build_http_client(&config.search_user_agent)?;

    config
        .search_providers
        .iter()
        .map(|name| -> Result<Arc<dyn SearchProvider>> {
            match name.as_str() {
                DUCKDUCKGO => Ok(Arc::new(DuckDuckGoProvider::new(client.clone()))),
                WIKIPEDIA => Ok(Arc::new(WikipediaProvider::new(client.clone()))),
                other => Err(RouterError::ConfigError(format!(
                    "unknown search provider: {}",
                    other
                ))),
            }
        })
        .collect()
}
