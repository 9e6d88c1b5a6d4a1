//! Blog display model and the repository page renderers read from.
//!
//! - [`Post`] - immutable display value rebuilt on every fetch
//! - [`PostAdapter`] - maps raw feed entries to posts
//! - [`PostRepository`] - `list_posts`, `get_post`, `list_categories`
//! - [`FallbackPosts`] - sample posts served when the feed is empty

mod adapter;
mod fallback;
mod post;
mod repository;

pub use adapter::{absolutize_url, derive_slug, extract_first_image, PostAdapter};
pub use fallback::FallbackPosts;
pub use post::{
    Author, Post, DEFAULT_AUTHOR_IMAGE, DEFAULT_AUTHOR_NAME, DEFAULT_TITLE, MISSING_PERMALINK,
    PLACEHOLDER_IMAGE,
};
pub use repository::PostRepository;
