use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::raw::{non_empty, RawAuthor, RawEntry, RawLink};

#[derive(Debug, Error)]
pub enum ParseError {
    /// Body looked like JSON but was not valid JSON
    #[error("Invalid JSON feed: {0}")]
    Json(#[from] serde_json::Error),
    /// Body was neither JSON nor a parsable Atom/RSS document
    #[error("Invalid XML feed: {0}")]
    Xml(String),
}

/// Entries recovered from a feed body.
#[derive(Debug, Default)]
pub struct ParseResult {
    pub entries: Vec<RawEntry>,
    /// Entries dropped because they did not have the expected shape
    pub skipped: usize,
}

/// Parses a feed body into raw entries.
///
/// Bodies starting with `{` or `[` are read as Blogger's JSON export
/// (`alt=json`, entries under `feed.entry`) or a Blogger API v3 post list
/// (entries under `items`). Anything else goes through `feed-rs` as
/// Atom/RSS. A JSON document with neither array is a valid, empty feed.
pub fn parse_feed(bytes: &[u8]) -> Result<ParseResult, ParseError> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    match first {
        Some(b'{') | Some(b'[') => parse_json(bytes),
        _ => parse_xml(bytes),
    }
}

// ============================================================================
// Blogger JSON
// ============================================================================

/// Blogger wraps text values as `{"$t": "..."}`; plain strings are
/// accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextNode {
    Wrapped {
        #[serde(rename = "$t")]
        text: String,
    },
    Plain(String),
}

impl TextNode {
    fn into_text(self) -> Option<String> {
        match self {
            TextNode::Wrapped { text } | TextNode::Plain(text) => non_empty(text),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonEntry {
    #[serde(default)]
    id: Option<TextNode>,
    #[serde(default)]
    title: Option<TextNode>,
    #[serde(default)]
    content: Option<TextNode>,
    #[serde(default)]
    published: Option<TextNode>,
    #[serde(default)]
    updated: Option<TextNode>,
    #[serde(default)]
    author: Vec<JsonAuthor>,
    #[serde(default)]
    category: Vec<JsonCategory>,
    #[serde(default)]
    link: Vec<JsonLink>,
}

#[derive(Debug, Deserialize)]
struct JsonAuthor {
    #[serde(default)]
    name: Option<TextNode>,
    #[serde(default)]
    uri: Option<TextNode>,
    #[serde(default, rename = "gd$image")]
    image: Option<JsonImage>,
}

#[derive(Debug, Deserialize)]
struct JsonImage {
    #[serde(default)]
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonCategory {
    #[serde(default)]
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonLink {
    #[serde(default)]
    rel: Option<String>,
    #[serde(default)]
    href: Option<String>,
}

impl From<JsonEntry> for RawEntry {
    fn from(entry: JsonEntry) -> Self {
        RawEntry {
            id: entry.id.and_then(TextNode::into_text),
            title: entry.title.and_then(TextNode::into_text),
            content: entry.content.and_then(TextNode::into_text),
            published: entry.published.and_then(TextNode::into_text),
            updated: entry.updated.and_then(TextNode::into_text),
            authors: entry
                .author
                .into_iter()
                .map(|a| RawAuthor {
                    name: a.name.and_then(TextNode::into_text),
                    uri: a.uri.and_then(TextNode::into_text),
                    image: a.image.and_then(|i| i.src).and_then(non_empty),
                })
                .collect(),
            categories: entry.category.into_iter().filter_map(|c| c.term).collect(),
            links: entry
                .link
                .into_iter()
                .filter_map(|l| {
                    Some(RawLink {
                        rel: l.rel,
                        href: l.href?,
                    })
                })
                .collect(),
        }
    }
}

fn parse_json(bytes: &[u8]) -> Result<ParseResult, ParseError> {
    let mut document: Value = serde_json::from_slice(bytes)?;

    if let Some(Value::Array(items)) = document
        .get_mut("feed")
        .and_then(|feed| feed.get_mut("entry"))
        .map(Value::take)
    {
        return Ok(collect_entries::<JsonEntry>(items));
    }

    if let Some(Value::Array(items)) = document.get_mut("items").map(Value::take) {
        return Ok(collect_entries::<ApiPost>(items));
    }

    tracing::debug!("Feed document has no entry array");
    Ok(ParseResult::default())
}

fn collect_entries<T>(items: Vec<Value>) -> ParseResult
where
    T: DeserializeOwned + Into<RawEntry>,
{
    let mut result = ParseResult::default();
    for item in items {
        match serde_json::from_value::<T>(item) {
            Ok(entry) => result.entries.push(entry.into()),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed feed entry");
                result.skipped += 1;
            }
        }
    }
    result
}

// ============================================================================
// Blogger API v3 (`blogger#postList`)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPost {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    author: Option<ApiAuthor>,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAuthor {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image: Option<ApiImage>,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    #[serde(default)]
    url: Option<String>,
}

impl From<ApiPost> for RawEntry {
    fn from(post: ApiPost) -> Self {
        RawEntry {
            id: post.id.and_then(non_empty),
            title: post.title.and_then(non_empty),
            content: post.content.and_then(non_empty),
            published: post.published.and_then(non_empty),
            updated: post.updated.and_then(non_empty),
            authors: post
                .author
                .map(|a| RawAuthor {
                    name: a.display_name.and_then(non_empty),
                    uri: a.url.and_then(non_empty),
                    image: a.image.and_then(|i| i.url).and_then(non_empty),
                })
                .into_iter()
                .collect(),
            categories: post.labels,
            links: post
                .url
                .and_then(non_empty)
                .map(|href| RawLink {
                    rel: Some("alternate".to_string()),
                    href,
                })
                .into_iter()
                .collect(),
        }
    }
}

// ============================================================================
// Atom / RSS
// ============================================================================

/// Atom/RSS through feed-rs. feed-rs normalizes timestamps to UTC, so the
/// blog's own offset is lost and dates near midnight can shift by a day.
fn parse_xml(bytes: &[u8]) -> Result<ParseResult, ParseError> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| ParseError::Xml(e.to_string()))?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let content = entry
                .content
                .and_then(|c| c.body)
                .or_else(|| entry.summary.map(|s| s.content))
                .and_then(non_empty);

            RawEntry {
                id: non_empty(entry.id),
                title: entry.title.and_then(|t| non_empty(t.content)),
                content,
                published: entry.published.map(|dt| dt.to_rfc3339()),
                updated: entry.updated.map(|dt| dt.to_rfc3339()),
                authors: entry
                    .authors
                    .into_iter()
                    .map(|p| RawAuthor {
                        name: non_empty(p.name),
                        uri: p.uri.and_then(non_empty),
                        image: None,
                    })
                    .collect(),
                categories: entry.categories.into_iter().map(|c| c.term).collect(),
                // Atom: a link without rel is the alternate link
                links: entry
                    .links
                    .into_iter()
                    .map(|l| RawLink {
                        rel: Some(l.rel.unwrap_or_else(|| "alternate".to_string())),
                        href: l.href,
                    })
                    .collect(),
            }
        })
        .collect();

    Ok(ParseResult {
        entries,
        skipped: 0,
    })
}
