//! Blogger feed retrieval and parsing.
//!
//! - [`client`] - HTTP fetch with timeout, size limit and a freshness cache
//! - [`parser`] - Blogger JSON (`alt=json`) and Atom bodies into [`RawEntry`]
//! - [`raw`] - the typed intermediate shared by both formats
//!
//! Nothing in this module returns an error to page-rendering code: the
//! [`EntrySource`] implementation logs failures and yields no entries.
//!
//! ```ignore
//! use blogview::feed::{EntrySource, FeedClient};
//!
//! let client = FeedClient::new(reqwest::Client::new(), &settings);
//! let entries = client.fetch_entries().await; // empty on failure
//! ```

mod cache;
mod client;
mod parser;
mod raw;

pub use cache::FreshnessCache;
pub use client::{build_http_client, EntrySource, FeedClient, FetchError};
pub(crate) use client::is_blogger_api;
pub use parser::{parse_feed, ParseError, ParseResult};
pub use raw::{RawAuthor, RawEntry, RawLink};
