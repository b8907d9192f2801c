use std::borrow::Cow;

/// Truncates a string to at most `max_chars` Unicode scalar values.
///
/// No ellipsis is appended; the site's cards clip long descriptions on their own.
/// Returns `Cow::Borrowed` when the string already fits.
///
/// # Examples
///
/// ```
/// use glean::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Hello World", 5), "Hello");
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("añoñú", 3), "año");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((byte_end, _)) => Cow::Owned(s[..byte_end].to_string()),
        None => Cow::Borrowed(s),
    }
}

/// Removes every `<` and the text up to the next `>`, the way a global
/// `<[^>]*>` replace would.
///
/// A `<` with no `>` after it is not a tag and is kept, as is the text after
/// it (`I <3 Kotlin` stays intact). Entities are left alone.
pub fn strip_html_tags(s: &str) -> Cow<'_, str> {
    if !s.contains('<') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Finds the `src` of the first `<img>` tag in an HTML fragment.
///
/// Uses simple string scanning (no HTML parser dependency). Attribute order and
/// quote style do not matter; the tag name and attribute name are matched
/// case-insensitively while the returned value keeps its original case.
pub fn first_img_src(html: &str) -> Option<&str> {
    let html_lower = html.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(img_start) = html_lower[search_from..].find("<img") {
        let abs_start = search_from + img_start;

        let tag_end = match html_lower[abs_start..].find('>') {
            Some(pos) => pos,
            None => break,
        };

        // "<imgfoo" is not an img tag
        let after_name = html_lower.as_bytes().get(abs_start + 4).copied();
        if matches!(after_name, Some(b) if b.is_ascii_whitespace() || b == b'/') {
            let original_tag = &html[abs_start..=abs_start + tag_end];
            if let Some(src) = extract_attr_value(original_tag, "src") {
                if !src.is_empty() {
                    return Some(src);
                }
            }
        }

        search_from = abs_start + tag_end + 1;
    }

    None
}

/// Extracts the value of an attribute from a tag string (case-preserving).
fn extract_attr_value<'a>(tag: &'a str, attr_name: &str) -> Option<&'a str> {
    let tag_lower = tag.to_ascii_lowercase();
    let mut search_from = 0;

    loop {
        let found = tag_lower[search_from..].find(attr_name)? + search_from;
        search_from = found + attr_name.len();

        // Must be a whole attribute name: preceded by whitespace, followed by '='
        let preceded_by_space = tag_lower[..found]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        let rest = tag[search_from..].trim_start();
        if !preceded_by_space || !rest.starts_with('=') {
            continue;
        }

        let rest = rest[1..].trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }

        let inner = &rest[1..];
        let end = inner.find(quote)?;
        return Some(&inner[..end]);
    }
}

/// Strip terminal control characters and ANSI escape sequences from text.
///
/// Upstream titles and descriptions end up in console summaries, so anything
/// that could manipulate terminal behavior is removed before it is stored.
///
/// Strips:
/// - ASCII control chars: 0x00-0x08, 0x0B-0x0C, 0x0E-0x1F, 0x7F
/// - ANSI CSI sequences: `\x1b[` ... (terminal byte 0x40-0x7E)
/// - ANSI OSC sequences: `\x1b]` ... (until BEL 0x07 or ST `\x1b\\`)
/// - Bare ESC (0x1b) not followed by `[` or `]`
///
/// Preserves: tab (0x09), newline (0x0A), carriage return (0x0D).
///
/// Returns `Cow::Borrowed` when the input contains no control characters (common case).
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let len = bytes.len();

    let needs_strip = bytes.iter().any(|&b| is_stripped_byte(b));

    if !needs_strip {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];

        if b == 0x1b {
            if i + 1 < len && bytes[i + 1] == b'[' {
                // CSI: skip parameter/intermediate bytes until the final byte
                i += 2;
                while i < len {
                    let c = bytes[i];
                    i += 1;
                    if (0x40..=0x7e).contains(&c) {
                        break;
                    }
                }
            } else if i + 1 < len && bytes[i + 1] == b']' {
                // OSC: skip until BEL or ST (\x1b\\)
                i += 2;
                while i < len {
                    if bytes[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if bytes[i] == 0x1b && i + 1 < len && bytes[i + 1] == b'\\' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            } else {
                i += 1;
            }
        } else if is_stripped_byte(b) {
            i += 1;
        } else {
            let start = i;
            i += 1;
            while i < len && !is_stripped_byte(bytes[i]) {
                i += 1;
            }
            // SAFETY: we only break on ASCII control bytes, which cannot appear
            // mid-codepoint in valid UTF-8, so s[start..i] is valid UTF-8.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

fn is_stripped_byte(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != 0x09 && b != 0x0a && b != 0x0d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_ascii() {
        assert_eq!(truncate_chars("Hello World", 5), "Hello");
        assert_eq!(truncate_chars("Hello", 5), "Hello");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_truncate_chars_counts_scalars_not_bytes() {
        let s = "ñandú ".repeat(50);
        let truncated = truncate_chars(&s, 200);
        assert_eq!(truncated.chars().count(), 200);
    }

    #[test]
    fn test_truncate_chars_borrows_when_fitting() {
        assert!(matches!(truncate_chars("fits", 200), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(
            strip_html_tags("<p>Hello <strong>world</strong></p>"),
            "Hello world"
        );
        assert_eq!(strip_html_tags("no tags here"), "no tags here");
        assert_eq!(strip_html_tags("a <br/>b"), "a b");
    }

    #[test]
    fn test_strip_html_tags_unterminated_is_kept() {
        assert_eq!(strip_html_tags("text <img src="), "text <img src=");
        assert_eq!(strip_html_tags("I <3 Kotlin"), "I <3 Kotlin");
        assert_eq!(strip_html_tags("<b>I</b> <3 Kotlin"), "I <3 Kotlin");
    }

    #[test]
    fn test_strip_html_tags_spans_to_next_close() {
        // No `>` of its own, so the match runs to the close of the next tag
        assert_eq!(strip_html_tags("a < b <i>c</i>"), "a c");
    }

    #[test]
    fn test_first_img_src_double_quotes() {
        let html = r#"<figure><img alt="x" src="https://cdn-images-1.medium.com/a.png"></figure>"#;
        assert_eq!(
            first_img_src(html),
            Some("https://cdn-images-1.medium.com/a.png")
        );
    }

    #[test]
    fn test_first_img_src_single_quotes_and_case() {
        let html = "<IMG SRC='https://example.com/Photo.JPG' />";
        assert_eq!(first_img_src(html), Some("https://example.com/Photo.JPG"));
    }

    #[test]
    fn test_first_img_src_picks_first() {
        let html = r#"<p>x</p><img src="https://a.example/1.png"><img src="https://a.example/2.png">"#;
        assert_eq!(first_img_src(html), Some("https://a.example/1.png"));
    }

    #[test]
    fn test_first_img_src_ignores_data_src() {
        let html = r#"<img data-src="https://lazy.example/x.png" src="https://real.example/y.png">"#;
        assert_eq!(first_img_src(html), Some("https://real.example/y.png"));
    }

    #[test]
    fn test_first_img_src_none() {
        assert_eq!(first_img_src("<p>no images</p>"), None);
        assert_eq!(first_img_src("<imgur>not an image</imgur>"), None);
        assert_eq!(first_img_src("<img alt=\"no source\">"), None);
    }

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let input = "Hello, world! This is clean text.";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_preserves_tabs_newlines_cr() {
        let input = "line1\nline2\ttabbed\r\nwindows";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_control_chars_removes_controls() {
        let input = "he\x00ll\x07o\x08 w\x0bor\x0cld\x01!";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Owned(_)));
        assert_eq!(result, "hello world!");
    }

    #[test]
    fn test_strip_ansi_color_codes() {
        let input = "\x1b[31mRed text\x1b[0m";
        assert_eq!(strip_control_chars(input), "Red text");
    }

    #[test]
    fn test_strip_osc_with_bel() {
        let input = "\x1b]0;malicious title\x07safe text";
        assert_eq!(strip_control_chars(input), "safe text");
    }

    #[test]
    fn test_strip_osc_with_st() {
        let input = "\x1b]0;malicious title\x1b\\safe text";
        assert_eq!(strip_control_chars(input), "safe text");
    }

    #[test]
    fn test_strip_unicode_preserved() {
        let input = "Episodio \x1b[1mnuevo\x1b[0m: año";
        assert_eq!(strip_control_chars(input), "Episodio nuevo: año");
    }
}
