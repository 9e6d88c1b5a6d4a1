use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Title used when a feed entry has none.
pub const DEFAULT_TITLE: &str = "Untitled";
/// Author name used when a feed entry names nobody.
pub const DEFAULT_AUTHOR_NAME: &str = "Admin";
/// Author avatar used when the feed provides none.
pub const DEFAULT_AUTHOR_IMAGE: &str = "/placeholder-user.jpg";
/// Permalink recorded for entries without an alternate link.
pub const MISSING_PERMALINK: &str = "#";
/// Image shown for posts whose content carries no `<img>`.
pub const PLACEHOLDER_IMAGE: &str = "https://plus.unsplash.com/premium_photo-1666863909125-3a01f038e71f?fm=jpg&q=60&w=3000";

/// A blog post as displayed. Rebuilt on every fetch and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    /// Trusted HTML, rendered verbatim
    pub content: String,
    pub published: String,
    pub updated: String,
    /// Canonical permalink
    pub url: String,
    pub author: Author,
    /// Labels in feed order, not deduplicated
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub display_name: String,
    pub url: String,
    pub image: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            display_name: DEFAULT_AUTHOR_NAME.to_string(),
            url: String::new(),
            image: DEFAULT_AUTHOR_IMAGE.to_string(),
        }
    }
}

impl Post {
    /// `published` as a timestamp, when the feed delivered RFC 3339.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.published.trim()).ok()
    }

    pub fn has_category(&self, label: &str) -> bool {
        self.categories.iter().any(|c| c == label)
    }

    pub fn image_or_placeholder(&self) -> &str {
        self.image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)
    }
}
