//! Reference Finder — web-search API client.
//!
//! Queries a custom-search endpoint for candidate reference links for a
//! topic keyword, filters out links already cited in previous runs, and
//! truncates to the requested count. Any transport failure, non-2xx
//! response, or malformed body degrades to an empty result (logged, never
//! raised); the pipeline falls back to its static reference list.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use postsmith_shared::{PostsmithError, Result};

/// Timeout for search requests.
const SEARCH_TIMEOUT_SECS: u64 = 20;

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("postsmith/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Search API response body (only the fields we consume).
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

/// A single search hit.
#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// Client for the web-search API.
pub struct SearchClient {
    client: Client,
    endpoint: String,
    engine_id: String,
    api_key: String,
    locale: String,
    result_count: u32,
}

impl SearchClient {
    /// Create a new search client.
    pub fn new(
        endpoint: impl Into<String>,
        engine_id: impl Into<String>,
        api_key: impl Into<String>,
        locale: impl Into<String>,
        result_count: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| PostsmithError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            engine_id: engine_id.into(),
            api_key: api_key.into(),
            locale: locale.into(),
            result_count,
        })
    }

    /// Find fresh reference links for `keyword`.
    ///
    /// Links present in `used` are skipped; at most `limit` links are
    /// returned. Every failure mode yields an empty vec; the caller decides
    /// on a fallback, not this client.
    #[instrument(skip_all, fields(keyword = %keyword))]
    pub async fn find_references(
        &self,
        keyword: &str,
        used: &[String],
        limit: usize,
    ) -> Vec<String> {
        match self.query(keyword).await {
            Ok(items) => {
                let mut links = Vec::new();
                for item in items {
                    let Some(link) = item.link else { continue };
                    if used.iter().any(|u| u == &link) {
                        debug!(%link, "skipping already-used reference");
                        continue;
                    }
                    links.push(link);
                    if links.len() >= limit {
                        break;
                    }
                }
                info!(count = links.len(), "fresh reference links found");
                links
            }
            Err(e) => {
                warn!(error = %e, "reference search failed, returning no links");
                Vec::new()
            }
        }
    }

    /// One GET against the search endpoint. No retry.
    async fn query(&self, keyword: &str) -> Result<Vec<SearchItem>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", keyword),
                ("cx", &self.engine_id),
                ("key", &self.api_key),
                ("num", &self.result_count.to_string()),
                ("hl", &self.locale),
            ])
            .send()
            .await
            .map_err(|e| classify(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostsmithError::upstream(format!(
                "search API: HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PostsmithError::upstream(format!("search API: invalid body: {e}")))?;

        debug!(count = body.items.len(), "search results received");
        Ok(body.items)
    }
}

/// Classify a reqwest error as transport or upstream.
fn classify(context: &str, e: reqwest::Error) -> PostsmithError {
    if e.is_timeout() || e.is_connect() {
        PostsmithError::Transport(format!("{context}: {e}"))
    } else {
        PostsmithError::upstream(format!("{context}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SearchClient {
        SearchClient::new(
            format!("{}/customsearch/v1", server.uri()),
            "engine-1",
            "test-key",
            "en",
            5,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn filters_used_and_truncates() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "items": [
                {"link": "https://a.example/one"},
                {"link": "https://b.example/two"},
                {"link": "https://c.example/three"},
                {"link": "https://d.example/four"},
            ]
        });

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("q", "magnesium benefits"))
            .and(query_param("cx", "engine-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let used = vec!["https://a.example/one".to_string()];
        let links = client_for(&server)
            .find_references("magnesium benefits", &used, 2)
            .await;

        assert_eq!(
            links,
            vec![
                "https://b.example/two".to_string(),
                "https://c.example/three".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn non_2xx_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let links = client_for(&server).find_references("zinc", &[], 2).await;
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn missing_items_field_yields_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let links = client_for(&server).find_references("zinc", &[], 2).await;
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn items_without_links_are_skipped() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "items": [
                {"title": "no link here"},
                {"link": "https://a.example/one"},
            ]
        });

        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let links = client_for(&server).find_references("zinc", &[], 2).await;
        assert_eq!(links, vec!["https://a.example/one".to_string()]);
    }
}
