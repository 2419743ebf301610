//! URL slug derivation.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum slug length, in characters.
const MAX_SLUG_CHARS: usize = 90;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\-]+").unwrap());
static DASH_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// Derive a URL slug from a post title.
///
/// Lowercases, replaces runs of non-word characters with a single dash,
/// collapses consecutive dashes, trims leading/trailing dashes, and caps the
/// result at 90 characters (on a char boundary, so multi-byte titles are
/// never split mid-character).
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let dashed = NON_WORD.replace_all(&lowered, "-");
    let collapsed = DASH_RUNS.replace_all(&dashed, "-");
    collapsed
        .trim_matches('-')
        .chars()
        .take(MAX_SLUG_CHARS)
        .collect()
}
