//! Terminal and JSON views over repository results.
//!
//! Views borrow the posts they show and never fetch anything themselves.
//! Their [`Display`](fmt::Display) impls produce the text the CLI prints;
//! their [`Serialize`] impls back `--json`. Feed-supplied text is passed
//! through [`strip_control_chars`] before it reaches the terminal.

use crate::blog::{Post, MISSING_PERMALINK};
use crate::util::{excerpt, html_to_text, strip_control_chars, truncate_to_width};
use chrono::DateTime;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// Posts per listing page unless the caller asks otherwise.
pub const DEFAULT_PER_PAGE: usize = 10;

const TOP_STORIES: Range<usize> = 1..4;
const RECENT_POSTS: Range<usize> = 4..8;
const TITLE_WIDTH: usize = 72;
const EXCERPT_WIDTH: usize = 100;

/// Formats a feed timestamp as `Jun 1, 2024`.
///
/// The date is shown in the offset the feed delivered it in. Values that
/// are not RFC 3339 are returned unchanged.
pub fn format_date(published: &str) -> String {
    DateTime::parse_from_rfc3339(published.trim())
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| published.to_string())
}

fn posts_in(posts: &[Post], range: Range<usize>) -> &[Post] {
    let end = range.end.min(posts.len());
    let start = range.start.min(end);
    &posts[start..end]
}

// ============================================================================
// Home
// ============================================================================

/// Home page: one featured post, three top stories, four recent posts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView<'a> {
    pub featured: Option<&'a Post>,
    pub top_stories: &'a [Post],
    pub recent: &'a [Post],
    pub categories: &'a [String],
}

impl<'a> HomeView<'a> {
    pub fn new(posts: &'a [Post], categories: &'a [String]) -> Self {
        Self {
            featured: posts.first(),
            top_stories: posts_in(posts, TOP_STORIES),
            recent: posts_in(posts, RECENT_POSTS),
            categories,
        }
    }
}

impl fmt::Display for HomeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(featured) = self.featured else {
            return writeln!(f, "No posts yet.");
        };

        writeln!(f, "== Featured ==")?;
        write_summary(f, featured)?;

        for (heading, posts) in [("Top stories", self.top_stories), ("Recent posts", self.recent)] {
            if posts.is_empty() {
                continue;
            }
            writeln!(f, "\n== {heading} ==")?;
            write_summaries(f, posts)?;
        }

        if !self.categories.is_empty() {
            writeln!(f, "\n== Categories ==")?;
            writeln!(f, "{}", strip_control_chars(&self.categories.join(", ")))?;
        }
        Ok(())
    }
}

// ============================================================================
// Listing
// ============================================================================

/// One page of a paginated listing. Page numbers start at 1.
///
/// A page past the end has no items but still reports the totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<'a, T> Page<'a, T> {
    /// Page `page` of `all`. Zero for either argument is treated as 1.
    pub fn new(all: &'a [T], page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let start = (page - 1).saturating_mul(per_page).min(all.len());
        let end = start.saturating_add(per_page).min(all.len());

        Self {
            items: &all[start..end],
            page,
            per_page,
            total_items: all.len(),
            total_pages: all.len().div_ceil(per_page),
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl fmt::Display for Page<'_, Post> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Page {} of {} ({} posts)",
            self.page,
            self.total_pages.max(1),
            self.total_items
        )?;

        if self.items.is_empty() {
            return writeln!(f, "No posts on this page.");
        }

        writeln!(f)?;
        write_summaries(f, self.items)?;

        if self.has_next() {
            writeln!(f, "\nNext: --page {}", self.page + 1)?;
        }
        Ok(())
    }
}

// ============================================================================
// Category
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CategoryView<'a> {
    pub label: &'a str,
    pub posts: &'a [Post],
}

impl<'a> CategoryView<'a> {
    pub fn new(label: &'a str, posts: &'a [Post]) -> Self {
        Self { label, posts }
    }

    pub fn heading(&self) -> String {
        format!("Category: {}", self.label)
    }

    /// `"3 posts found"`, `"1 post found"`, or the empty-category notice.
    pub fn summary(&self) -> String {
        match self.posts.len() {
            0 => "No posts found in this category.".to_string(),
            1 => "1 post found".to_string(),
            n => format!("{n} posts found"),
        }
    }
}

impl fmt::Display for CategoryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", strip_control_chars(&self.heading()))?;
        writeln!(f, "{}", self.summary())?;

        if !self.posts.is_empty() {
            writeln!(f)?;
            write_summaries(f, self.posts)?;
        }
        Ok(())
    }
}

// ============================================================================
// Single post and category list
// ============================================================================

/// Full view of one post.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct PostView<'a>(pub &'a Post);

impl fmt::Display for PostView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let post = self.0;

        writeln!(f, "{}", strip_control_chars(&post.title))?;
        writeln!(
            f,
            "By {} | {}",
            strip_control_chars(&post.author.display_name),
            format_date(&post.published)
        )?;
        if !post.categories.is_empty() {
            writeln!(
                f,
                "Categories: {}",
                strip_control_chars(&post.categories.join(", "))
            )?;
        }
        writeln!(f, "Image: {}", post.image_or_placeholder())?;
        if post.url != MISSING_PERMALINK {
            writeln!(f, "Permalink: {}", post.url)?;
        }

        let body = html_to_text(&post.content);
        if !body.is_empty() {
            writeln!(f, "\n{}", strip_control_chars(&body))?;
        }
        Ok(())
    }
}

/// Sorted category labels, one per line.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CategoriesView<'a>(pub &'a [String]);

impl fmt::Display for CategoriesView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No categories.");
        }
        for label in self.0 {
            writeln!(f, "{}", strip_control_chars(label))?;
        }
        Ok(())
    }
}

// ============================================================================
// Shared pieces
// ============================================================================

fn write_summaries(f: &mut fmt::Formatter<'_>, posts: &[Post]) -> fmt::Result {
    for (i, post) in posts.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        write_summary(f, post)?;
    }
    Ok(())
}

/// Title, byline, excerpt and slug of a post in a list.
fn write_summary(f: &mut fmt::Formatter<'_>, post: &Post) -> fmt::Result {
    writeln!(
        f,
        "{}",
        truncate_to_width(&strip_control_chars(&post.title), TITLE_WIDTH)
    )?;

    let mut byline = format!(
        "{} | {}",
        format_date(&post.published),
        post.author.display_name
    );
    if !post.categories.is_empty() {
        byline.push_str(" | ");
        byline.push_str(&post.categories.join(", "));
    }
    writeln!(f, "  {}", strip_control_chars(&byline))?;

    let text = excerpt(&strip_control_chars(&post.content), EXCERPT_WIDTH);
    if !text.is_empty() {
        writeln!(f, "  {text}")?;
    }
    writeln!(f, "  slug: {}", strip_control_chars(&post.slug))
}
