use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns (CJK and emoji count 2).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates a string to fit within `max_width` terminal columns.
///
/// When the string does not fit, as much of it as fits in
/// `max_width - 3` columns is kept and `...` appended. Widths of 3 or less
/// leave no room for the ellipsis, so the string is simply cut.
///
/// ```
/// use blogview::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("富士山の旅", 7), "富士...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(s[..cut_index(s, max_width)].to_string());
    }

    let cut = cut_index(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{}{}", s[..cut].trim_end(), ELLIPSIS))
}

/// Byte index of the longest prefix of `s` that fits in `width` columns.
fn cut_index(s: &str, width: usize) -> usize {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + char_width > width {
            return idx;
        }
        used += char_width;
    }
    s.len()
}

/// Strips terminal control characters and ANSI escape sequences.
///
/// Feed titles and bodies are printed to the terminal verbatim otherwise.
/// Tab, newline and carriage return are kept. CSI sequences (`ESC [`) are
/// removed up to their final byte, OSC sequences (`ESC ]`) up to BEL or
/// `ESC \`. Clean input is returned borrowed.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    fn is_control(c: char) -> bool {
        (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r')) || ('\u{80}'..='\u{9f}').contains(&c)
    }

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_control(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

/// Reduces an HTML fragment to plain text for excerpts.
///
/// Tags are dropped (block-level boundaries become spaces), the common
/// character entities are decoded and runs of whitespace collapse to a
/// single space. Script and style bodies are not special-cased: post bodies
/// come from the blog itself.
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => text.push(c),
        }
    }

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    const ENTITIES: [(&str, &str); 7] = [
        ("&nbsp;", " "),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        // Last, so `&amp;lt;` decodes to `&lt;` rather than `<`
        ("&amp;", "&"),
    ];

    let mut out = s.to_string();
    for (entity, replacement) in ENTITIES {
        out = out.replace(entity, replacement);
    }
    Cow::Owned(out)
}

/// Plain-text excerpt of an HTML body fitting in `max_width` columns.
pub fn excerpt(html: &str, max_width: usize) -> String {
    let text = html_to_text(html);
    truncate_to_width(&text, max_width).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("Hello"), 5);
        assert_eq!(display_width("富士山"), 6);
    }

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Short", 10), "Short");
    }

    #[test]
    fn test_exact_fit_is_borrowed() {
        let result = truncate_to_width("12345", 5);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "12345");
    }

    #[test]
    fn test_cjk_truncation() {
        // 10 columns; 7 leaves 4 columns (two chars) before the ellipsis
        assert_eq!(truncate_to_width("富士山の旅", 7), "富士...");
        // 5 leaves 2 columns
        assert_eq!(truncate_to_width("富士山の旅", 5), "富...");
    }

    #[test]
    fn test_truncation_trims_trailing_space() {
        assert_eq!(truncate_to_width("Mount Fuji guide", 9), "Mount...");
    }

    #[test]
    fn test_narrow_widths() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
        // A 2-column char does not fit in 1 column
        assert_eq!(truncate_to_width("富士", 1), "");
        assert_eq!(truncate_to_width("富士", 3), "富");
    }

    #[test]
    fn test_strip_clean_text_returns_borrowed() {
        let input = "Mount Fuji\tguide\r\n";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_strip_control_chars() {
        assert_eq!(strip_control_chars("he\x00ll\x07o\x7f!"), "hello!");
    }

    #[test]
    fn test_strip_ansi_sequences() {
        assert_eq!(strip_control_chars("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(
            strip_control_chars("\x1b]0;evil title\x07safe"),
            "safe"
        );
        assert_eq!(
            strip_control_chars("\x1b]0;evil title\x1b\\safe"),
            "safe"
        );
        assert_eq!(strip_control_chars("a\x1bb"), "ab");
    }

    #[test]
    fn test_strip_c1_controls() {
        assert_eq!(strip_control_chars("a\u{9b}31mb"), "a31mb");
    }

    #[test]
    fn test_strip_unicode_preserved() {
        assert_eq!(
            strip_control_chars("富士山 \x1b[1m登山\x1b[0m"),
            "富士山 登山"
        );
    }

    #[test]
    fn test_html_to_text() {
        let html = "<p>A journey to <b>Japan</b>'s icon.</p>\n<p>Second&nbsp;paragraph &amp; more</p>";
        assert_eq!(
            html_to_text(html),
            "A journey to Japan 's icon. Second paragraph & more"
        );
    }

    #[test]
    fn test_html_to_text_entities_decoded_once() {
        assert_eq!(html_to_text("&amp;lt;tag&amp;gt;"), "&lt;tag&gt;");
        assert_eq!(html_to_text("1 &lt; 2"), "1 < 2");
    }

    #[test]
    fn test_html_to_text_image_only() {
        assert_eq!(html_to_text(r#"<img src="/a.jpg">"#), "");
    }

    #[test]
    fn test_excerpt() {
        let html = "<p>Mount Fuji stands as one of Japan's most recognizable symbols.</p>";
        assert_eq!(excerpt(html, 20), "Mount Fuji stands...");
        assert_eq!(excerpt("<p>Short</p>", 20), "Short");
    }
}
