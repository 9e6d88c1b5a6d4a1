//! Feed entry to [`Post`] mapping.
//!
//! Everything here is pure except the last-resort identifier, which is
//! random when an entry carries neither an id nor a published timestamp.
use crate::blog::post::{
    Author, Post, DEFAULT_AUTHOR_IMAGE, DEFAULT_AUTHOR_NAME, DEFAULT_TITLE, MISSING_PERMALINK,
};
use crate::feed::RawEntry;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

/// Maps raw feed entries to posts, resolving relative URLs against the
/// feed's origin.
#[derive(Debug, Clone)]
pub struct PostAdapter {
    origin: Url,
}

impl PostAdapter {
    pub fn new(origin: Url) -> Self {
        Self { origin }
    }

    pub fn adapt(&self, entry: &RawEntry) -> Post {
        let content = entry.content.clone().unwrap_or_default();
        let url = entry
            .alternate_link()
            .unwrap_or(MISSING_PERMALINK)
            .to_string();
        let image = extract_first_image(&content).map(|src| absolutize_url(src, &self.origin));

        let author = entry.primary_author();
        let author = Author {
            display_name: author
                .and_then(|a| a.name.clone())
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            url: author.and_then(|a| a.uri.clone()).unwrap_or_default(),
            image: author
                .and_then(|a| a.image.as_deref())
                .map(|src| absolutize_url(src, &self.origin))
                .unwrap_or_else(|| DEFAULT_AUTHOR_IMAGE.to_string()),
        };

        Post {
            id: entry_id(entry),
            slug: derive_slug(&url),
            title: entry
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            content,
            published: entry.published.clone().unwrap_or_default(),
            updated: entry.updated.clone().unwrap_or_default(),
            url,
            author,
            categories: entry.categories.clone(),
            image,
        }
    }
}

/// Derives a post slug from its permalink.
///
/// Takes the last non-empty path segment and strips one trailing `.html`:
/// `https://x/2024/06/foo.html` → `foo`. An unparsable permalink is used
/// verbatim.
pub fn derive_slug(permalink: &str) -> String {
    let Ok(url) = Url::parse(permalink) else {
        return permalink.to_string();
    };

    let last = url
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or("");

    last.strip_suffix(".html").unwrap_or(last).to_string()
}

/// Returns the `src` of the first `<img>` tag in `html`.
///
/// Uses simple string scanning (no HTML parser dependency). The tag name is
/// matched case-insensitively; `<img>` tags without a quoted, non-empty
/// `src` are passed over.
pub fn extract_first_image(html: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets valid for slicing `html`
    let html_lower = html.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(found) = html_lower[search_from..].find("<img") {
        let attrs_start = search_from + found + "<img".len();
        let attrs_end = html_lower[attrs_start..]
            .find('>')
            .map_or(html.len(), |pos| attrs_start + pos);

        // `<img` must be the whole tag name, not a prefix of e.g. `<imgur>`
        let is_img_tag = html_lower[attrs_start..]
            .starts_with(|c: char| c.is_ascii_whitespace() || c == '/');

        if is_img_tag {
            if let Some(src) = extract_attr_value(&html[attrs_start..attrs_end], "src") {
                if !src.is_empty() {
                    return Some(src);
                }
            }
        }

        search_from = attrs_start;
    }

    None
}

/// Extracts a quoted attribute value from the attribute section of a tag.
///
/// The attribute name must start after whitespace or `/`, so `src` does not
/// match inside `data-src`.
fn extract_attr_value<'a>(attrs: &'a str, attr_name: &str) -> Option<&'a str> {
    let attrs_lower = attrs.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(found) = attrs_lower[search_from..].find(attr_name) {
        let name_start = search_from + found;
        search_from = name_start + attr_name.len();

        let at_boundary = attrs_lower[..name_start]
            .ends_with(|c: char| c.is_ascii_whitespace() || c == '/');
        if !at_boundary {
            continue;
        }

        let Some(rest) = attrs[search_from..].trim_start().strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();

        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }

        let inner = &rest[1..];
        let end = inner.find(quote)?;
        return Some(&inner[..end]);
    }

    None
}

/// Makes an image reference absolute.
///
/// - absolute URLs are returned unchanged
/// - `//host/path` becomes `https://host/path`
/// - `/path` is appended to `origin`
/// - other relative references are joined against `origin`
pub fn absolutize_url(src: &str, origin: &Url) -> String {
    if let Some(rest) = src.strip_prefix("//") {
        return format!("https://{rest}");
    }

    if src.starts_with('/') {
        return format!("{}{}", origin.as_str().trim_end_matches('/'), src);
    }

    if Url::parse(src).is_ok() {
        return src.to_string();
    }

    origin
        .join(src)
        .map(String::from)
        .unwrap_or_else(|_| src.to_string())
}

/// Feed id, else the published timestamp, else a random id.
///
/// The random case breaks id stability across fetches for that entry.
fn entry_id(entry: &RawEntry) -> String {
    if let Some(id) = entry.id.as_deref().or(entry.published.as_deref()) {
        return id.to_string();
    }

    let id = random_id();
    tracing::warn!(
        id = %id,
        title = ?entry.title,
        "Feed entry has no id or published timestamp, using a random id"
    );
    id
}

fn random_id() -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let hash = Sha256::digest(format!("{}|{}|{}", nanos, sequence, std::process::id()));
    let hex = format!("{:x}", hash);
    format!("random-{}", &hex[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{RawAuthor, RawLink};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const ORIGIN: &str = "https://ur9group.blogspot.com";

    fn adapter() -> PostAdapter {
        PostAdapter::new(Url::parse(ORIGIN).unwrap())
    }

    fn origin() -> Url {
        Url::parse(ORIGIN).unwrap()
    }

    fn alternate(href: &str) -> RawLink {
        RawLink {
            rel: Some("alternate".into()),
            href: href.into(),
        }
    }

    fn fuji_entry() -> RawEntry {
        RawEntry {
            id: Some("tag:blogger.com,1999:blog-1.post-1".into()),
            title: Some("Mount Fuji".into()),
            content: Some(r#"<p>Intro</p><img src="/img/fuji.jpg"><p>More</p>"#.into()),
            published: Some("2024-06-01T10:00:00.000+07:00".into()),
            updated: Some("2024-06-02T10:00:00.000+07:00".into()),
            authors: vec![RawAuthor {
                name: Some("Jane".into()),
                uri: Some("https://www.blogger.com/profile/1".into()),
                image: None,
            }],
            categories: vec!["Travel".into(), "Japan".into()],
            links: vec![
                RawLink {
                    rel: Some("self".into()),
                    href: "https://www.blogger.com/feeds/1/posts/default/1".into(),
                },
                alternate("https://ur9group.blogspot.com/2024/06/mountains/fuji-guide.html"),
            ],
        }
    }

    // ------------------------------------------------------------------------
    // Slug derivation
    // ------------------------------------------------------------------------

    #[test]
    fn test_slug_strips_html_suffix() {
        assert_eq!(derive_slug("https://x/2024/06/foo.html"), "foo");
    }

    #[test]
    fn test_slug_without_suffix() {
        assert_eq!(derive_slug("https://x/p/about"), "about");
    }

    #[test]
    fn test_slug_ignores_trailing_slash_and_query() {
        assert_eq!(derive_slug("https://x/2024/06/foo.html/"), "foo");
        assert_eq!(derive_slug("https://x/2024/06/foo.html?m=1#top"), "foo");
    }

    #[test]
    fn test_slug_strips_suffix_once() {
        assert_eq!(derive_slug("https://x/a/foo.html.html"), "foo.html");
        assert_eq!(derive_slug("https://x/a/foo.htm"), "foo.htm");
    }

    #[test]
    fn test_slug_root_path_is_empty() {
        assert_eq!(derive_slug("https://x/"), "");
    }

    #[test]
    fn test_slug_unparsable_url_used_verbatim() {
        assert_eq!(derive_slug("#"), "#");
        assert_eq!(derive_slug("not a url"), "not a url");
    }

    proptest! {
        #[test]
        fn prop_slug_strips_exactly_html(segment in "[a-z0-9][a-z0-9-]{0,40}") {
            let permalink = format!("https://example.blogspot.com/2024/06/{}.html", segment);
            prop_assert_eq!(derive_slug(&permalink), segment);
        }

        #[test]
        fn prop_slug_keeps_other_segments(segment in "[a-z0-9][a-z0-9-]{0,40}") {
            let permalink = format!("https://example.blogspot.com/p/{}", segment);
            prop_assert_eq!(derive_slug(&permalink), segment);
        }

        #[test]
        fn prop_slug_is_stable(path in "[a-z0-9/]{0,40}") {
            let permalink = format!("https://example.blogspot.com/{}", path);
            prop_assert_eq!(derive_slug(&permalink), derive_slug(&permalink));
        }
    }

    // ------------------------------------------------------------------------
    // Image extraction
    // ------------------------------------------------------------------------

    #[test]
    fn test_first_image_wins() {
        let html = r#"<p>x</p><img src="https://a.example/1.jpg"><img src="https://a.example/2.jpg">"#;
        assert_eq!(extract_first_image(html), Some("https://a.example/1.jpg"));
    }

    #[test]
    fn test_image_tag_case_insensitive() {
        let html = r#"<IMG ALT="x" SRC='https://a.example/Photo.JPG'>"#;
        assert_eq!(extract_first_image(html), Some("https://a.example/Photo.JPG"));
    }

    #[test]
    fn test_image_attribute_order_and_spacing() {
        let html = "<img\n  alt=\"fuji\"\n  width=\"640\" src = \"/img/fuji.jpg\" />";
        assert_eq!(extract_first_image(html), Some("/img/fuji.jpg"));
    }

    #[test]
    fn test_data_src_not_mistaken_for_src() {
        let html = r#"<img data-src="/lazy.jpg" src="/real.jpg">"#;
        assert_eq!(extract_first_image(html), Some("/real.jpg"));
    }

    #[test]
    fn test_image_without_src_skipped() {
        let html = r#"<img alt="broken"><img src="">
<img src="/second.jpg">"#;
        assert_eq!(extract_first_image(html), Some("/second.jpg"));
    }

    #[test]
    fn test_non_img_tags_ignored() {
        let html = r#"<imgur src="/nope.jpg"><a href="/x.jpg">x</a>"#;
        assert_eq!(extract_first_image(html), None);
    }

    #[test]
    fn test_no_image() {
        assert_eq!(extract_first_image("<p>No pictures here</p>"), None);
        assert_eq!(extract_first_image(""), None);
    }

    #[test]
    fn test_non_ascii_content_before_image() {
        let html = r#"<p>富士山 İstanbul</p><img src="/img/ß.jpg">"#;
        assert_eq!(extract_first_image(html), Some("/img/ß.jpg"));
    }

    #[test]
    fn test_absolutize_protocol_relative() {
        assert_eq!(
            absolutize_url("//blogger.googleusercontent.com/img/a.jpg", &origin()),
            "https://blogger.googleusercontent.com/img/a.jpg"
        );
    }

    #[test]
    fn test_absolutize_root_relative() {
        assert_eq!(
            absolutize_url("/img/fuji.jpg", &origin()),
            "https://ur9group.blogspot.com/img/fuji.jpg"
        );
    }

    #[test]
    fn test_absolutize_keeps_absolute_urls() {
        let src = "https://blogger.googleusercontent.com/img/b/R29v/s1600/a%20b.jpg";
        assert_eq!(absolutize_url(src, &origin()), src);
        let data = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(absolutize_url(data, &origin()), data);
    }

    #[test]
    fn test_absolutize_document_relative() {
        assert_eq!(
            absolutize_url("img/a.jpg", &origin()),
            "https://ur9group.blogspot.com/img/a.jpg"
        );
    }

    // ------------------------------------------------------------------------
    // Whole-entry adaptation
    // ------------------------------------------------------------------------

    #[test]
    fn test_adapt_mount_fuji_scenario() {
        let post = adapter().adapt(&fuji_entry());

        assert_eq!(post.slug, "fuji-guide");
        assert_eq!(
            post.image.as_deref(),
            Some("https://ur9group.blogspot.com/img/fuji.jpg")
        );
        assert_eq!(post.categories, vec!["Travel", "Japan"]);
        assert_eq!(post.title, "Mount Fuji");
        assert_eq!(post.id, "tag:blogger.com,1999:blog-1.post-1");
        assert_eq!(
            post.url,
            "https://ur9group.blogspot.com/2024/06/mountains/fuji-guide.html"
        );
        assert_eq!(post.author.display_name, "Jane");
        assert_eq!(post.author.url, "https://www.blogger.com/profile/1");
        assert_eq!(post.author.image, DEFAULT_AUTHOR_IMAGE);
    }

    #[test]
    fn test_adapt_is_deterministic() {
        let entry = fuji_entry();
        assert_eq!(adapter().adapt(&entry), adapter().adapt(&entry));
    }

    #[test]
    fn test_adapt_fallbacks_for_empty_entry() {
        let entry = RawEntry {
            published: Some("2024-01-01T00:00:00Z".into()),
            ..RawEntry::default()
        };
        let post = adapter().adapt(&entry);

        assert_eq!(post.title, DEFAULT_TITLE);
        assert_eq!(post.author.display_name, DEFAULT_AUTHOR_NAME);
        assert_eq!(post.author.image, DEFAULT_AUTHOR_IMAGE);
        assert_eq!(post.author.url, "");
        assert_eq!(post.content, "");
        assert_eq!(post.image, None);
        assert_eq!(post.url, MISSING_PERMALINK);
        assert_eq!(post.slug, MISSING_PERMALINK);
        assert!(post.categories.is_empty());
    }

    #[test]
    fn test_adapt_keeps_duplicate_categories() {
        let entry = RawEntry {
            id: Some("1".into()),
            categories: vec!["A".into(), "B".into(), "A".into()],
            ..RawEntry::default()
        };
        assert_eq!(adapter().adapt(&entry).categories, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_adapt_author_image_absolutized() {
        let entry = RawEntry {
            id: Some("1".into()),
            authors: vec![RawAuthor {
                name: None,
                uri: None,
                image: Some("//blogger.googleusercontent.com/img/me.png".into()),
            }],
            ..RawEntry::default()
        };
        let post = adapter().adapt(&entry);
        assert_eq!(post.author.display_name, DEFAULT_AUTHOR_NAME);
        assert_eq!(
            post.author.image,
            "https://blogger.googleusercontent.com/img/me.png"
        );
    }

    #[test]
    fn test_id_falls_back_to_published() {
        let entry = RawEntry {
            published: Some("2024-06-01T10:00:00Z".into()),
            ..RawEntry::default()
        };
        assert_eq!(adapter().adapt(&entry).id, "2024-06-01T10:00:00Z");
    }

    #[test]
    fn test_id_random_when_nothing_to_derive_from() {
        let entry = RawEntry::default();
        let first = adapter().adapt(&entry).id;
        let second = adapter().adapt(&entry).id;

        assert!(first.starts_with("random-"));
        assert_eq!(first.len(), "random-".len() + 16);
        assert_ne!(first, second);
    }
}
