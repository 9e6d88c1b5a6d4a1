//! Blogger feed front.
//!
//! Fetches a Blogger blog's feed, adapts each entry into a [`blog::Post`]
//! and exposes the posts through [`blog::PostRepository`]. Feed outages
//! never surface as errors: the repository degrades to fallback sample
//! posts instead.

pub mod blog;
pub mod config;
pub mod feed;
pub mod render;
pub mod util;
