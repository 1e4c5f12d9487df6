use once_cell::sync::Lazy;
use regex::Regex;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new("<[^>]*>").expect("valid tag pattern"));

/// Strip HTML tags and decode the small set of entities the feed emits,
/// then trim surrounding whitespace. Idempotent: sanitized text contains
/// no tags or entity escapes, so a second pass is a no-op.
pub fn sanitize(input: &str) -> String {
    let text = TAG_PATTERN.replace_all(input, "");
    text.replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_decodes_entities() {
        assert_eq!(sanitize("<p>Hello &amp; welcome</p>"), "Hello & welcome");
        assert_eq!(
            sanitize("<a href=\"x\">link</a> &lt;tag&gt; &quot;quoted&quot;"),
            "link <tag> \"quoted\""
        );
    }

    #[test]
    fn test_no_tags_survive() {
        let out = sanitize("<div><span class=\"a\">text</span><br/></div>");
        assert!(!TAG_PATTERN.is_match(&out));
        assert_eq!(out, "text");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize("  <p> padded </p>  "), "padded");
        assert_eq!(sanitize("<p></p>"), "");
    }

    #[test]
    fn test_idempotent() {
        let raw = "  <p>Tariffs &amp; &quot;deals&quot;</p> ";
        let once = sanitize(raw);
        assert_eq!(sanitize(&once), once);
    }
}
