//! Final post HTML assembly.
//!
//! Takes the generated article body and appends the reference list, the tag
//! line, and the attribution paragraph. The body arrives as model-generated
//! HTML and is passed through untouched; only the appended reference URLs
//! are escaped, since they are interpolated into attributes and link text.

/// Escape a string for use in HTML attribute values and text nodes.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Assemble the final post HTML from its parts.
///
/// Layout: body, separator, reference list (omitted when empty), tag line
/// (omitted when empty), attribution paragraph.
pub fn assemble(
    body_html: &str,
    references: &[String],
    brand: &str,
    site_name: &str,
    tags: &[String],
) -> String {
    let mut html = String::from(body_html.trim());

    if !references.is_empty() {
        html.push_str("\n<hr>\n<h3>References</h3>\n<ul>\n");
        for url in references {
            let escaped = escape_html(url);
            html.push_str(&format!(
                "<li><a href=\"{escaped}\" target=\"_blank\" rel=\"nofollow noopener\">{escaped}</a></li>\n"
            ));
        }
        html.push_str("</ul>\n");
    }

    if !tags.is_empty() {
        let joined = tags
            .iter()
            .map(|t| escape_html(t))
            .collect::<Vec<_>>()
            .join(" · ");
        html.push_str(&format!("<p><em>Tags:</em> {joined}</p>\n"));
    }

    html.push_str(&format!(
        "<p><em>Prepared by the {} editorial team for {}.</em></p>",
        escape_html(brand),
        escape_html(site_name)
    ));

    html
}
