use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Built once, shared across threads
static MARKUP_CHARS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("static escape patterns are valid")
});

const ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"];

/// Escape the five XML special characters.
///
/// The result is safe inside both element content and double-quoted
/// attribute values.
///
/// # Examples
///
/// ```
/// use liturgy_deck::common::xml::escape_xml;
/// assert_eq!(escape_xml("Fish & Chips"), "Fish &amp; Chips");
/// assert_eq!(escape_xml("{NAME}"), "{NAME}");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    if !s.bytes().any(|b| matches!(b, b'&' | b'<' | b'>' | b'"' | b'\'')) {
        return s.to_string();
    }
    MARKUP_CHARS.replace_all(s, &ENTITIES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_all_specials() {
        assert_eq!(
            escape_xml(r#"<a href="x">'it' & more</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&apos;it&apos; &amp; more&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_xml("Psalm 23: The Lord is my shepherd"), "Psalm 23: The Lord is my shepherd");
        assert_eq!(escape_xml(""), "");
    }
}
