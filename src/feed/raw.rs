/// One feed entry before adaptation.
///
/// Every display field is optional here: the feed may omit any of them and
/// the adapter decides the fallbacks. Empty strings are normalized to `None`
/// during parsing so downstream code only has one "absent" case to handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub authors: Vec<RawAuthor>,
    pub categories: Vec<String>,
    pub links: Vec<RawLink>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAuthor {
    pub name: Option<String>,
    pub uri: Option<String>,
    /// Profile image URL (`gd$image` in Blogger JSON)
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawLink {
    pub rel: Option<String>,
    pub href: String,
}

impl RawEntry {
    /// The entry's permalink: the first link with `rel="alternate"`.
    pub fn alternate_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel.as_deref() == Some("alternate"))
            .map(|link| link.href.as_str())
    }

    /// First listed author, if any.
    pub fn primary_author(&self) -> Option<&RawAuthor> {
        self.authors.first()
    }
}

/// Treats empty (or whitespace-only) text as absent.
pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
