//! CMS Publisher — WordPress-compatible REST API client.
//!
//! Creates published posts over the `wp/v2/posts` endpoint with SEO plugin
//! meta attached. Handles slug collisions by probing numbered variants and
//! degrades gracefully when the CMS rejects custom meta fields.

pub mod slug;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use postsmith_shared::{PostsmithError, PublishResult, Result};

pub use slug::slugify;

/// Timeout for the slug-collision probe. Cheap read, fail fast.
const DUP_CHECK_TIMEOUT_SECS: u64 = 15;

/// Timeout for post creation.
const PUBLISH_TIMEOUT_SECS: u64 = 60;

/// Maximum numeric suffix tried when a slug collides.
const MAX_SLUG_SUFFIX: u32 = 5;

/// Excerpt length cap, in characters.
const EXCERPT_MAX_CHARS: usize = 150;

/// User-Agent string for CMS requests.
const USER_AGENT: &str = concat!("postsmith/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A fully assembled post, ready to send to the CMS.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub slug: String,
    pub meta_description: String,
    pub focus_keyword: String,
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    title: &'a str,
    content: &'a str,
    status: &'static str,
    slug: &'a str,
    excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<SeoMeta<'a>>,
}

/// SEO plugin meta fields, keyed the way the Yoast plugin registers them.
#[derive(Debug, Serialize)]
struct SeoMeta<'a> {
    #[serde(rename = "_yoast_wpseo_title")]
    title: &'a str,
    #[serde(rename = "_yoast_wpseo_metadesc")]
    metadesc: &'a str,
    #[serde(rename = "_yoast_wpseo_focuskw", skip_serializing_if = "Option::is_none")]
    focuskw: Option<&'a str>,
}

/// Created-post response (only the fields we consume).
#[derive(Debug, Deserialize)]
struct CreatedPost {
    link: Option<String>,
    #[serde(default)]
    slug: String,
}

/// One entry from the slug-collision probe.
#[derive(Debug, Deserialize)]
struct PostSummary {
    #[serde(default)]
    slug: String,
}

// ---------------------------------------------------------------------------
// CmsClient
// ---------------------------------------------------------------------------

/// Client for a WordPress-compatible CMS REST API.
pub struct CmsClient {
    client: Client,
    posts_url: Url,
    username: String,
    password: String,
    category_id: u64,
}

impl CmsClient {
    /// Create a new CMS client rooted at `base_url`.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        category_id: u64,
    ) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| PostsmithError::config(format!("invalid CMS base URL {base_url:?}: {e}")))?;
        let posts_url = base
            .join("/wp-json/wp/v2/posts")
            .map_err(|e| PostsmithError::config(format!("invalid CMS base URL {base_url:?}: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PostsmithError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            posts_url,
            username: username.into(),
            password: password.into(),
            category_id,
        })
    }

    /// Check whether a post with exactly `slug` already exists.
    ///
    /// A failed probe (transport error or non-2xx) is treated as no
    /// collision; the CMS is the final authority at publish time anyway.
    #[instrument(skip(self))]
    pub async fn slug_exists(&self, slug: &str) -> bool {
        let response = self
            .client
            .get(self.posts_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("search", slug), ("per_page", "3")])
            .timeout(Duration::from_secs(DUP_CHECK_TIMEOUT_SECS))
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(status = %r.status(), "slug probe failed, assuming no collision");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "slug probe failed, assuming no collision");
                return false;
            }
        };

        match response.json::<Vec<PostSummary>>().await {
            Ok(posts) => posts.iter().any(|p| p.slug == slug),
            Err(e) => {
                warn!(error = %e, "slug probe body unreadable, assuming no collision");
                false
            }
        }
    }

    /// Find a free slug, starting from `base`.
    ///
    /// Collisions are resolved with a numeric suffix on the base slug
    /// (`base-1`, `base-2`, ...), never compounding suffixes. After five
    /// suffixed attempts the last candidate is used as-is and the CMS gets
    /// the final say.
    #[instrument(skip(self))]
    pub async fn unique_slug(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        for n in 1..=MAX_SLUG_SUFFIX {
            if !self.slug_exists(&candidate).await {
                return candidate;
            }
            debug!(%candidate, "slug taken, trying numbered variant");
            candidate = format!("{base}-{n}");
        }
        warn!(%candidate, "no free slug found after {MAX_SLUG_SUFFIX} probes, using last candidate");
        candidate
    }

    /// Publish `draft` as a live post.
    ///
    /// If the CMS rejects the request with 403 and the response mentions
    /// meta fields, the post is retried once without the SEO meta block
    /// (some hosts lock down custom meta over REST).
    #[instrument(skip_all, fields(slug = %draft.slug))]
    pub async fn publish(&self, draft: &PostDraft) -> Result<PublishResult> {
        let (status, body) = self.create_post(draft, true).await?;

        if status == StatusCode::FORBIDDEN && mentions_meta_restriction(&body) {
            warn!("CMS rejected SEO meta fields, retrying without meta");
            let (status, body) = self.create_post(draft, false).await?;
            return self.finish(draft, status, body);
        }

        self.finish(draft, status, body)
    }

    async fn create_post(&self, draft: &PostDraft, with_meta: bool) -> Result<(StatusCode, String)> {
        let meta = with_meta.then(|| SeoMeta {
            title: &draft.title,
            metadesc: &draft.meta_description,
            focuskw: (!draft.focus_keyword.is_empty()).then_some(draft.focus_keyword.as_str()),
        });

        let payload = NewPost {
            title: &draft.title,
            content: &draft.content,
            status: "publish",
            slug: &draft.slug,
            excerpt: draft.meta_description.chars().take(EXCERPT_MAX_CHARS).collect(),
            categories: (self.category_id > 0).then(|| vec![self.category_id]),
            meta,
        };

        let response = self
            .client
            .post(self.posts_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .json(&payload)
            .timeout(Duration::from_secs(PUBLISH_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    PostsmithError::Transport(format!("CMS posts endpoint: {e}"))
                } else {
                    PostsmithError::publish(format!("CMS posts endpoint: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    fn finish(&self, draft: &PostDraft, status: StatusCode, body: String) -> Result<PublishResult> {
        if status != StatusCode::CREATED {
            return Err(PostsmithError::publish(format!(
                "CMS returned HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let created: CreatedPost = serde_json::from_str(&body).map_err(|e| {
            PostsmithError::publish(format!("CMS returned 201 but an unreadable body: {e}"))
        })?;

        let Some(link) = created.link else {
            return Err(PostsmithError::publish(
                "CMS returned 201 without a post link",
            ));
        };

        let slug = if created.slug.is_empty() {
            draft.slug.clone()
        } else {
            created.slug
        };

        info!(%link, %slug, "post published");
        Ok(PublishResult {
            success: true,
            post_url: Some(link),
            slug,
        })
    }
}

/// Heuristic for hosts that reject custom meta over REST.
fn mentions_meta_restriction(body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains("meta") || lowered.contains("forbidden")
}
