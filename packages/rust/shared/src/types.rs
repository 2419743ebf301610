//! Core domain types shared across the postsmith crates.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GeneratedArticle
// ---------------------------------------------------------------------------

/// A fully generated article with its SEO metadata.
///
/// Produced by the generator from parsed model output merged with the
/// configured tag set and the reference list; consumed once by the
/// publishing pipeline. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    /// SEO title, including any brand suffix the model was asked for.
    pub seo_title: String,
    /// Meta description (capped at excerpt length by the publisher).
    pub meta_description: String,
    /// Focus keyword(s), comma-separated.
    pub focus_keyword: String,
    /// Article body as HTML markup (trusted as produced).
    pub body_html: String,
    /// Reference URLs cited in the article, in prompt order.
    pub references: Vec<String>,
    /// Tags appended to the article.
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// PublishResult
// ---------------------------------------------------------------------------

/// Outcome of a single publish attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    /// Whether the post was created.
    pub success: bool,
    /// Public URL of the created post, when the CMS returned one.
    pub post_url: Option<String>,
    /// Slug the post was published under (after deduplication).
    pub slug: String,
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Aggregate counts for a full pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Keywords that ended in a published post.
    pub succeeded: usize,
    /// Keywords skipped due to a component failure.
    pub failed: usize,
}

impl RunSummary {
    /// Total keywords processed.
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_result_serialization() {
        let result = PublishResult {
            success: true,
            post_url: Some("https://blog.example.com/magnesium-benefits".into()),
            slug: "magnesium-benefits".into(),
        };

        let json = serde_json::to_string(&result).expect("serialize");
        let parsed: PublishResult = serde_json::from_str(&json).expect("deserialize");
        assert!(parsed.success);
        assert_eq!(parsed.slug, "magnesium-benefits");
    }

    #[test]
    fn run_summary_totals() {
        let summary = RunSummary {
            succeeded: 2,
            failed: 1,
        };
        assert_eq!(summary.total(), 3);
    }
}
