//! Sample posts served while the feed is empty or unreachable.
//!
//! The set is injected into [`PostRepository`](super::PostRepository) at
//! construction: either the built-in samples or a TOML file of posts.
use crate::blog::post::{Author, Post, DEFAULT_AUTHOR_NAME, MISSING_PERMALINK};
use crate::config::{Config, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

const SAMPLE_AVATAR: &str = "/placeholder.svg?height=40&width=40";

/// A non-empty, shared set of fallback posts.
#[derive(Debug, Clone)]
pub struct FallbackPosts {
    posts: Arc<[Post]>,
}

impl FallbackPosts {
    /// Wraps an explicit set of posts, or `None` when `posts` is empty.
    pub fn new(posts: Vec<Post>) -> Option<Self> {
        if posts.is_empty() {
            return None;
        }
        Some(Self {
            posts: posts.into(),
        })
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Loads sample posts from a TOML file of `[[posts]]` tables.
    ///
    /// Posts without a `slug` get one derived from their title; posts
    /// without an `id` are numbered from 1 in file order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is larger than
    /// 1 MiB, is not valid TOML, or contains no posts.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let size = std::fs::metadata(path)?.len();
        if size > Config::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Fallback posts file is {} bytes (max {} bytes)",
                size,
                Config::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let file: SampleFile = toml::from_str(&content)?;

        let posts: Vec<Post> = file
            .posts
            .into_iter()
            .enumerate()
            .map(|(index, sample)| sample.into_post(index + 1))
            .collect();

        let fallback =
            Self::new(posts).ok_or_else(|| ConfigError::EmptyFallback(path.display().to_string()))?;
        tracing::info!(
            path = %path.display(),
            posts = fallback.posts.len(),
            "Loaded fallback posts"
        );
        Ok(fallback)
    }

    /// Six built-in sample posts.
    pub fn builtin() -> Self {
        Self {
            posts: BUILTIN
                .iter()
                .enumerate()
                .map(|(index, sample)| sample.to_post(index + 1))
                .collect(),
        }
    }
}

// ============================================================================
// File format
// ============================================================================

#[derive(Debug, Deserialize)]
struct SampleFile {
    #[serde(default)]
    posts: Vec<SamplePost>,
}

#[derive(Debug, Deserialize)]
struct SamplePost {
    id: Option<String>,
    slug: Option<String>,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    published: String,
    updated: Option<String>,
    author: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    image: Option<String>,
}

impl SamplePost {
    fn into_post(self, position: usize) -> Post {
        let slug = self
            .slug
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| slug::slugify(&self.title));

        Post {
            id: self.id.unwrap_or_else(|| position.to_string()),
            slug,
            updated: self.updated.unwrap_or_else(|| self.published.clone()),
            published: self.published,
            title: self.title,
            content: self.content,
            url: MISSING_PERMALINK.to_string(),
            author: Author {
                display_name: self
                    .author
                    .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
                url: MISSING_PERMALINK.to_string(),
                image: SAMPLE_AVATAR.to_string(),
            },
            categories: self.categories,
            image: self.image,
        }
    }
}

// ============================================================================
// Built-in samples
// ============================================================================

struct Sample {
    slug: &'static str,
    title: &'static str,
    content: &'static str,
    published: &'static str,
    author: &'static str,
    categories: &'static [&'static str],
}

impl Sample {
    fn to_post(&self, position: usize) -> Post {
        Post {
            id: position.to_string(),
            slug: self.slug.to_string(),
            title: self.title.to_string(),
            content: self.content.to_string(),
            published: self.published.to_string(),
            updated: self.published.to_string(),
            url: MISSING_PERMALINK.to_string(),
            author: Author {
                display_name: self.author.to_string(),
                url: MISSING_PERMALINK.to_string(),
                image: SAMPLE_AVATAR.to_string(),
            },
            categories: self.categories.iter().map(|c| c.to_string()).collect(),
            image: None,
        }
    }
}

const BUILTIN: &[Sample] = &[
    Sample {
        slug: "unveiling-the-majestic-beauty-of-mount-fuji",
        title: "Unveiling The Majestic Beauty Of Mount Fuji",
        content: "<p>A journey to Japan's iconic symbol and natural wonder: the history, the landscapes and the cultural significance of the mountain.</p>\n<p>Mount Fuji stands as one of Japan's most recognizable symbols, attracting millions of visitors each year. Its symmetrical cone has inspired artists, poets and travelers for centuries.</p>\n<p>The mountain has been considered sacred for over a thousand years, and climbing it is still seen as a spiritual journey.</p>",
        published: "2024-01-24T10:00:00Z",
        author: "John Smith",
        categories: &["Travel", "Japan", "Mountains"],
    },
    Sample {
        slug: "mountains-and-boat-a-perfect-harmony",
        title: "Mountains and Boat: A Perfect Harmony",
        content: "<p>Exploring the serene places where mountains meet water.</p>\n<p>A mountain lake reflecting snow-capped summits, or a coastal range dropping into the ocean: these meeting points offer some of the most spectacular views on Earth.</p>",
        published: "2024-01-24T08:00:00Z",
        author: "John Smith",
        categories: &["Travel", "Nature", "Photography"],
    },
    Sample {
        slug: "unveiling-the-timeless-charm-of-old-street-buildings",
        title: "Unveiling the Timeless Charm of Old Street Buildings",
        content: "<p>Step back in time with the architecture of vintage street buildings.</p>\n<p>Old street buildings tell stories of bygone eras. Each brick and beam shows the building styles and cultural influences of its period.</p>",
        published: "2024-01-24T06:00:00Z",
        author: "John Smith",
        categories: &["Architecture", "History", "Urban"],
    },
    Sample {
        slug: "whispering-trees-and-the-enchanting-moon",
        title: "Whispering Trees and the Enchanting Moon",
        content: "<p>On the quiet connection between old trees and the moon.</p>\n<p>Under moonlight, trees take on an ethereal quality, their branches reaching toward the sky like ancient guardians.</p>",
        published: "2024-01-24T04:00:00Z",
        author: "John Smith",
        categories: &["Nature", "Poetry", "Night Photography"],
    },
    Sample {
        slug: "the-pulse-of-the-city-unfolds-on-the-fast-lanes",
        title: "The Pulse of the City Unfolds on the Fast Lanes",
        content: "<p>The rhythm of urban life, seen from its highways and streets.</p>\n<p>City highways carry commerce, culture and people. The constant flow of traffic tells the story of a city's heartbeat.</p>",
        published: "2024-01-15T10:00:00Z",
        author: "Christina Wu",
        categories: &["Urban", "City Life", "Transportation"],
    },
    Sample {
        slug: "a-cosmic-adventure-underneath-the-starlit-canopy",
        title: "A Cosmic Adventure Underneath the Starlit Canopy",
        content: "<p>A tour of the night sky and the mysteries of space.</p>\n<p>The night sky was humanity's first window into the cosmos. From ancient astronomers to modern space exploration, the stars, planets and galaxies keep drawing us in.</p>",
        published: "2024-01-17T10:00:00Z",
        author: "Alex Whitney",
        categories: &["Space", "Astronomy", "Science"],
    },
];
