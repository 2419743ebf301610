//! Marker-delimited model-output parser.
//!
//! The generative model is asked to answer in a fixed layout:
//!
//! ```text
//! SEO_TITLE: ...
//! SEO_DESC: ...
//! SEO_KEYWORD: ...
//! ARTICLE:
//! <h2>...</h2>...
//! ```
//!
//! Each field's value is the text between its marker and the next marker
//! (or end of text for the last one). An empty between-markers value gets
//! a secondary extraction: everything after the marker to the end of the
//! text, so a field only counts as missing when its marker is absent or
//! terminates the text. A literal marker string appearing
//! inside generated prose terminates the preceding field; no escaping is
//! attempted, and that fragility is accepted rather than papered over.
//!
//! Models sometimes embed the layout in a JSON object instead; that format
//! is a documented alternative and is deliberately not parsed. The marker
//! contract degrades more gracefully on malformed output.

use tracing::{debug, warn};

use postsmith_shared::{PostsmithError, Result};

/// Field markers, in the order the model is asked to emit them.
const MARKER_TITLE: &str = "SEO_TITLE:";
const MARKER_DESC: &str = "SEO_DESC:";
const MARKER_KEYWORD: &str = "SEO_KEYWORD:";
const MARKER_ARTICLE: &str = "ARTICLE:";

/// Fallback policy for optional SEO fields.
///
/// Only a missing title or body is fatal; description and keyword fall back
/// to configured defaults (policy preserved from the original integration).
#[derive(Debug, Clone)]
pub struct SeoDefaults<'a> {
    /// The topic keyword of the article being generated.
    pub keyword: &'a str,
    /// Brand suffix appended to the fallback description.
    pub brand_suffix: &'a str,
    /// Configured fallback focus keywords; the first three are used.
    pub default_keywords: &'a [String],
}

/// SEO fields extracted from one model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArticle {
    pub seo_title: String,
    pub meta_description: String,
    pub focus_keyword: String,
    pub body_html: String,
}

/// Parse raw model text into article fields, applying fallback policy.
///
/// Fails with [`PostsmithError::Parse`] iff the title or the article body is
/// empty after extraction, the only fatal parse condition.
pub fn parse_model_output(text: &str, defaults: &SeoDefaults<'_>) -> Result<ParsedArticle> {
    let cleaned = strip_code_fences(text);

    let seo_title = extract_field(cleaned, MARKER_TITLE, Some(MARKER_DESC));
    let mut meta_description = extract_field(cleaned, MARKER_DESC, Some(MARKER_KEYWORD));
    let mut focus_keyword = extract_field(cleaned, MARKER_KEYWORD, Some(MARKER_ARTICLE));
    let body_html = extract_field(cleaned, MARKER_ARTICLE, None);

    if seo_title.is_empty() || body_html.is_empty() {
        return Err(PostsmithError::parse(format!(
            "missing required field: title present={}, body present={}",
            !seo_title.is_empty(),
            !body_html.is_empty()
        )));
    }

    if meta_description.is_empty() {
        meta_description = format!("{} {}", defaults.keyword, defaults.brand_suffix)
            .trim()
            .to_string();
        warn!("model omitted SEO description, using default");
    }

    if focus_keyword.is_empty() {
        focus_keyword = defaults
            .default_keywords
            .iter()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .join(",");
        warn!("model omitted focus keyword, using defaults");
    }

    debug!(
        title_len = seo_title.len(),
        body_len = body_html.len(),
        "parsed model output"
    );

    Ok(ParsedArticle {
        seo_title,
        meta_description,
        focus_keyword,
        body_html,
    })
}

/// Strip leading/trailing markdown code-fence markers, if present.
fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

/// Extract a field value: text between `start` and `end`, trimmed.
///
/// When the between-markers value comes up empty, a secondary extraction
/// takes everything after `start` to the end of the text. A field is only
/// truly empty when its marker is absent or nothing follows it.
fn extract_field(text: &str, start: &str, end: Option<&str>) -> String {
    let between = match end {
        Some(end_marker) => extract_between(text, start, end_marker),
        None => extract_after(text, start),
    };
    if !between.is_empty() {
        return between;
    }
    extract_after(text, start)
}

/// Text between `start_marker` and the next occurrence of `end_marker`,
/// trimmed. Runs to the end of the text when `end_marker` never follows.
fn extract_between(text: &str, start_marker: &str, end_marker: &str) -> String {
    let Some(start_idx) = text.find(start_marker) else {
        return String::new();
    };
    let after = &text[start_idx + start_marker.len()..];
    match after.find(end_marker) {
        Some(end_idx) => after[..end_idx].trim().to_string(),
        None => after.trim().to_string(),
    }
}

/// Text after `marker` to end of text, trimmed. Empty when absent.
fn extract_after(text: &str, marker: &str) -> String {
    match text.find(marker) {
        Some(idx) => text[idx + marker.len()..].trim().to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults<'a>(keywords: &'a [String]) -> SeoDefaults<'a> {
        SeoDefaults {
            keyword: "magnesium benefits",
            brand_suffix: "| Vitality Journal",
            default_keywords: keywords,
        }
    }

    const FULL_RESPONSE: &str = "\
SEO_TITLE: Magnesium Benefits Explained | Vitality Journal
SEO_DESC: Everything you need to know about magnesium, backed by research.
SEO_KEYWORD: magnesium, sleep, recovery
ARTICLE:
<h2>Why magnesium matters</h2><p>Body text.</p>";

    #[test]
    fn extracts_fields_between_markers_in_order() {
        let parsed = parse_model_output(FULL_RESPONSE, &defaults(&[])).unwrap();
        assert_eq!(
            parsed.seo_title,
            "Magnesium Benefits Explained | Vitality Journal"
        );
        assert_eq!(
            parsed.meta_description,
            "Everything you need to know about magnesium, backed by research."
        );
        assert_eq!(parsed.focus_keyword, "magnesium, sleep, recovery");
        assert_eq!(
            parsed.body_html,
            "<h2>Why magnesium matters</h2><p>Body text.</p>"
        );
    }

    #[test]
    fn article_marker_runs_to_end_of_text() {
        let text = "SEO_TITLE: T\nSEO_DESC: D\nSEO_KEYWORD: K\nARTICLE:\n<p>one</p>\n<p>two</p>\n";
        let parsed = parse_model_output(text, &defaults(&[])).unwrap();
        assert_eq!(parsed.body_html, "<p>one</p>\n<p>two</p>");
    }

    #[test]
    fn code_fences_are_stripped() {
        let fenced = format!("```json\n{FULL_RESPONSE}\n```");
        let parsed = parse_model_output(&fenced, &defaults(&[])).unwrap();
        assert!(parsed.seo_title.starts_with("Magnesium"));
    }

    #[test]
    fn missing_title_is_fatal() {
        let text = "SEO_DESC: D\nSEO_KEYWORD: K\nARTICLE:\n<p>body</p>";
        let err = parse_model_output(text, &defaults(&[])).unwrap_err();
        assert!(err.to_string().contains("missing required field"));
    }

    #[test]
    fn missing_body_is_fatal() {
        let text = "SEO_TITLE: T\nSEO_DESC: D\nSEO_KEYWORD: K";
        assert!(parse_model_output(text, &defaults(&[])).is_err());
    }

    #[test]
    fn missing_description_falls_back_to_keyword_and_suffix() {
        let text = "SEO_TITLE: T\nSEO_KEYWORD: K\nARTICLE:\n<p>body</p>";
        let parsed = parse_model_output(text, &defaults(&[])).unwrap();
        assert_eq!(
            parsed.meta_description,
            "magnesium benefits | Vitality Journal"
        );
    }

    #[test]
    fn missing_keyword_falls_back_to_first_three_defaults() {
        let kw: Vec<String> = ["health", "wellness", "nutrition", "extra"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let text = "SEO_TITLE: T\nSEO_DESC: D\nARTICLE:\n<p>body</p>";
        let parsed = parse_model_output(text, &defaults(&kw)).unwrap();
        assert_eq!(parsed.focus_keyword, "health,wellness,nutrition");
    }

    #[test]
    fn empty_between_markers_value_takes_rest_of_text() {
        // Secondary extraction: a marker followed immediately by the next
        // marker yields the tail of the text, not an empty field.
        let text = "SEO_TITLE:\nSEO_DESC: D\nSEO_KEYWORD: K\nARTICLE:\n<p>b</p>";
        let parsed = parse_model_output(text, &defaults(&[])).unwrap();
        assert!(parsed.seo_title.starts_with("SEO_DESC: D"));
    }

    #[test]
    fn empty_description_value_is_not_defaulted() {
        // The default only applies when the marker is absent entirely;
        // an empty value gets the secondary extraction instead.
        let text = "SEO_TITLE: T\nSEO_DESC:\nSEO_KEYWORD: K\nARTICLE:\n<p>body</p>";
        let parsed = parse_model_output(text, &defaults(&[])).unwrap();
        assert!(parsed.meta_description.starts_with("SEO_KEYWORD: K"));
    }

    #[test]
    fn absent_next_marker_takes_rest_of_text() {
        // SEO_DESC's terminator is missing entirely; the value runs on.
        let text = "SEO_TITLE: T\nSEO_DESC: tail of the response\nARTICLE:\n<p>b</p>";
        let parsed = parse_model_output(text, &defaults(&[])).unwrap();
        assert!(parsed.meta_description.starts_with("tail of the response"));
    }

    #[test]
    fn literal_marker_inside_prose_terminates_preceding_field() {
        // Documented fragility: the first ARTICLE: wins, even mid-sentence.
        let text =
            "SEO_TITLE: T\nSEO_DESC: D\nSEO_KEYWORD: quoting ARTICLE: early\nARTICLE:\n<p>b</p>";
        let parsed = parse_model_output(text, &defaults(&[])).unwrap();
        assert_eq!(parsed.focus_keyword, "quoting");
    }
}
