use crate::blog::adapter::PostAdapter;
use crate::blog::fallback::FallbackPosts;
use crate::blog::post::Post;
use crate::config::FeedSettings;
use crate::feed::{EntrySource, FeedClient};
use std::collections::BTreeSet;

/// Read-only facade over the blog feed, consumed by page renderers.
///
/// Each operation performs one [`EntrySource::fetch_entries`] call and
/// derives its answer from that snapshot; the feed client's freshness cache
/// is the only caching. No operation returns an error: an empty or
/// unreachable feed yields the injected fallback posts.
pub struct PostRepository<S = FeedClient> {
    source: S,
    adapter: PostAdapter,
    fallback: FallbackPosts,
}

impl PostRepository<FeedClient> {
    /// Repository backed by the HTTP feed client.
    pub fn from_settings(
        http: reqwest::Client,
        settings: &FeedSettings,
        fallback: FallbackPosts,
    ) -> Self {
        Self::new(
            FeedClient::new(http, settings),
            PostAdapter::new(settings.origin.clone()),
            fallback,
        )
    }
}

impl<S: EntrySource> PostRepository<S> {
    pub fn new(source: S, adapter: PostAdapter, fallback: FallbackPosts) -> Self {
        Self {
            source,
            adapter,
            fallback,
        }
    }

    /// All posts in feed order, or the fallback posts when the feed has none.
    pub async fn list_posts(&self) -> Vec<Post> {
        let entries = self.source.fetch_entries().await;
        let posts: Vec<Post> = entries.iter().map(|e| self.adapter.adapt(e)).collect();

        if posts.is_empty() {
            tracing::debug!(
                fallback = self.fallback.posts().len(),
                "Feed returned no posts, serving fallback posts"
            );
            return self.fallback.posts().to_vec();
        }

        posts
    }

    /// The first post whose slug matches, or `None`.
    pub async fn get_post(&self, slug: &str) -> Option<Post> {
        let post = self
            .list_posts()
            .await
            .into_iter()
            .find(|post| post.slug == slug);

        if post.is_none() {
            tracing::debug!(slug = %slug, "Post not found");
        }
        post
    }

    /// Distinct category labels across all posts, sorted ascending.
    pub async fn list_categories(&self) -> Vec<String> {
        let categories: BTreeSet<String> = self
            .list_posts()
            .await
            .into_iter()
            .flat_map(|post| post.categories)
            .collect();

        categories.into_iter().collect()
    }

    /// Posts carrying exactly `label` among their categories, in feed order.
    pub async fn posts_in_category(&self, label: &str) -> Vec<Post> {
        self.list_posts()
            .await
            .into_iter()
            .filter(|post| post.has_category(label))
            .collect()
    }
}
