//! Article Generator — generative-language API client.
//!
//! Builds a deterministic prompt for a topic keyword, sends it to a
//! `generateContent`-style endpoint, and parses the model's marker-delimited
//! answer into a [`GeneratedArticle`]. A transport failure, non-2xx status,
//! or malformed response envelope is an error the caller must check; the
//! pipeline converts it into a per-keyword skip, never a crash.

pub mod parser;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use postsmith_shared::{GeneratedArticle, PostsmithError, Result};

pub use parser::{ParsedArticle, SeoDefaults, parse_model_output};

/// Timeout for generation requests. Generation is by far the slowest call.
const GENERATE_TIMEOUT_SECS: u64 = 120;

/// Bodies shorter than this are suspicious enough to log, but not fatal.
const MIN_BODY_CHARS: usize = 100;

/// Titles shorter than this are suspicious enough to log, but not fatal.
const MIN_TITLE_CHARS: usize = 10;

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("postsmith/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body: a single prompt string.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response envelope: `candidates[0].content.parts[0].text`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

// ---------------------------------------------------------------------------
// GeneratorClient
// ---------------------------------------------------------------------------

/// Client for the generative-language API.
pub struct GeneratorClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeneratorClient {
    /// Create a new generator client for a full `generateContent` endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(GENERATE_TIMEOUT_SECS))
            .build()
            .map_err(|e| PostsmithError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Generate one article for `keyword`, citing `references`.
    ///
    /// One POST, no retry. On success the parsed fields are merged with the
    /// invariant tag set and the reference list into a [`GeneratedArticle`].
    #[instrument(skip_all, fields(keyword = %keyword))]
    pub async fn generate(
        &self,
        keyword: &str,
        brand: &str,
        site_name: &str,
        references: &[String],
        tags: &[String],
        defaults: &SeoDefaults<'_>,
    ) -> Result<GeneratedArticle> {
        let prompt = build_prompt(keyword, brand, site_name, references, defaults.brand_suffix);
        let text = self.request_text(&prompt).await?;

        info!(chars = text.len(), "model response received");

        let parsed = parse_model_output(&text, defaults)?;

        if parsed.seo_title.chars().count() < MIN_TITLE_CHARS {
            warn!(title = %parsed.seo_title, "generated SEO title is very short");
        }
        if parsed.body_html.len() < MIN_BODY_CHARS {
            warn!(chars = parsed.body_html.len(), "generated body is very short");
        }

        Ok(GeneratedArticle {
            seo_title: parsed.seo_title,
            meta_description: parsed.meta_description,
            focus_keyword: parsed.focus_keyword,
            body_html: parsed.body_html,
            references: references.to_vec(),
            tags: tags.to_vec(),
        })
    }

    /// POST the prompt and unwrap the candidate envelope.
    async fn request_text(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    PostsmithError::Transport(format!("generation API: {e}"))
                } else {
                    PostsmithError::upstream(format!("generation API: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostsmithError::upstream(format!(
                "generation API: HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let envelope: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PostsmithError::upstream(format!("generation API: invalid body: {e}")))?;

        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PostsmithError::upstream("generation API: no candidate text in response")
            })?;

        debug!(chars = text.len(), "candidate text extracted");
        Ok(text)
    }
}

/// Build the generation prompt. Deterministic given its inputs.
pub fn build_prompt(
    keyword: &str,
    brand: &str,
    site_name: &str,
    references: &[String],
    brand_suffix: &str,
) -> String {
    let refs_text = if references.is_empty() {
        "(no specific references)".to_string()
    } else {
        references
            .iter()
            .map(|r| format!("- {r}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Topic: {keyword}

Produce the following four parts:
1. SEO title (70 characters max)
2. SEO description (150 characters max)
3. Focus keyword (1-3 terms)
4. Article body (HTML)

Requirements:
- Mention the brand "{brand}" and the site "{site_name}" naturally once, near the start or the end
- HTML markup with <h2>/<h3>/<p> sections
- Close the article with this reference list:
{refs_text}

Output exactly in this format:
---
SEO_TITLE: [SEO title, 70 chars max, ending with the brand suffix "{brand_suffix}"]
SEO_DESC: [SEO description, 150 chars max, written to attract clicks]
SEO_KEYWORD: [focus keywords, 1-3 terms, comma separated]
---
ARTICLE:
[article body, HTML, 800-1200 words]
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEYWORDS: &[String] = &[];

    fn defaults() -> SeoDefaults<'static> {
        SeoDefaults {
            keyword: "magnesium benefits",
            brand_suffix: "| Vitality Journal",
            default_keywords: KEYWORDS,
        }
    }

    fn model_answer() -> String {
        "SEO_TITLE: Magnesium Benefits | Vitality Journal\n\
         SEO_DESC: What magnesium does and how much you need.\n\
         SEO_KEYWORD: magnesium\n\
         ARTICLE:\n<h2>Overview</h2><p>Magnesium supports hundreds of enzymatic reactions.</p>"
            .to_string()
    }

    fn envelope(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": text}]}}
            ]
        })
    }

    #[tokio::test]
    async fn generates_article_from_valid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/generate"))
            .and(header("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&model_answer())))
            .mount(&server)
            .await;

        let client =
            GeneratorClient::new(format!("{}/v1beta/generate", server.uri()), "secret").unwrap();

        let refs = vec!["https://a.example/1".to_string()];
        let tags = vec!["health".to_string()];
        let article = client
            .generate(
                "magnesium benefits",
                "Vitality Lab",
                "vitality.example",
                &refs,
                &tags,
                &defaults(),
            )
            .await
            .unwrap();

        assert_eq!(article.seo_title, "Magnesium Benefits | Vitality Journal");
        assert_eq!(article.references, refs);
        assert_eq!(article.tags, tags);
        assert!(article.body_html.contains("<h2>Overview</h2>"));
    }

    #[tokio::test]
    async fn server_error_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let client = GeneratorClient::new(server.uri(), "secret").unwrap();
        let err = client
            .generate("zinc", "B", "s.example", &[], &[], &defaults())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn empty_candidates_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let client = GeneratorClient::new(server.uri(), "secret").unwrap();
        let err = client
            .generate("zinc", "B", "s.example", &[], &[], &defaults())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no candidate text"));
    }

    #[tokio::test]
    async fn unparseable_text_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope("sorry, I cannot help with that")),
            )
            .mount(&server)
            .await;

        let client = GeneratorClient::new(server.uri(), "secret").unwrap();
        let err = client
            .generate("zinc", "B", "s.example", &[], &[], &defaults())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[tokio::test]
    async fn short_title_is_logged_not_fatal() {
        let server = MockServer::start().await;

        let text = "SEO_TITLE: Zinc\nSEO_DESC: D\nSEO_KEYWORD: zinc\nARTICLE:\n<p>body</p>";
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(text)))
            .mount(&server)
            .await;

        let client = GeneratorClient::new(server.uri(), "secret").unwrap();
        let article = client
            .generate("zinc", "B", "s.example", &[], &[], &defaults())
            .await
            .unwrap();
        assert_eq!(article.seo_title, "Zinc");
    }

    #[test]
    fn prompt_is_deterministic_and_embeds_inputs() {
        let refs = vec!["https://a.example/1".to_string()];
        let p1 = build_prompt("zinc", "Brand", "site.example", &refs, "| S");
        let p2 = build_prompt("zinc", "Brand", "site.example", &refs, "| S");
        assert_eq!(p1, p2);
        assert!(p1.contains("Topic: zinc"));
        assert!(p1.contains("\"Brand\""));
        assert!(p1.contains("- https://a.example/1"));
        assert!(p1.contains("SEO_TITLE:"));
    }

    #[test]
    fn prompt_handles_empty_references() {
        let p = build_prompt("zinc", "Brand", "site.example", &[], "| S");
        assert!(p.contains("(no specific references)"));
    }
}
