//! Outbound link extraction from Markdown text.
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Inline Markdown link to an http(s) target: `[description](https://...)`.
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]\n]*)\]\((https?://[^)\s]+)\)").expect("link pattern is valid")
});

/// A (URL, description) pair parsed from a Markdown link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub url: String,
    pub description: String,
}

impl LinkEntry {
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: description.into(),
        }
    }

    /// Render as a Markdown list item.
    ///
    /// An empty description is replaced by the URL so the line parses back
    /// to the same link.
    #[must_use]
    pub fn to_list_item(&self) -> String {
        let description = if self.description.is_empty() {
            self.url.as_str()
        } else {
            self.description.as_str()
        };
        format!("- [{description}]({})", self.url)
    }
}

/// All http(s) links in `content`, in document order. Duplicates are kept.
pub fn extract_links(content: &str) -> Vec<LinkEntry> {
    LINK_RE
        .captures_iter(content)
        .map(|caps| LinkEntry::new(&caps[2], caps[1].trim()))
        .collect()
}

/// Link entries keyed by exact URL.
///
/// Inserting a URL that is already present keeps the first description.
/// Iteration is in ascending URL order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    entries: BTreeMap<String, String>,
}

impl LinkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_content(content: &str) -> Self {
        let mut set = Self::new();
        set.extend(extract_links(content));
        set
    }

    /// Returns `true` if the URL was not yet present.
    pub fn insert(&mut self, entry: LinkEntry) -> bool {
        match self.entries.entry(entry.url) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(entry.description);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = LinkEntry>) {
        for entry in entries {
            self.insert(entry);
        }
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose URL is absent from `known`.
    #[must_use]
    pub fn difference(&self, known: &LinkSet) -> LinkSet {
        let entries = self
            .entries
            .iter()
            .filter(|(url, _)| !known.contains(url))
            .map(|(url, desc)| (url.clone(), desc.clone()))
            .collect();
        LinkSet { entries }
    }

    /// Entries sorted by URL.
    pub fn iter(&self) -> impl Iterator<Item = LinkEntry> + '_ {
        self.entries
            .iter()
            .map(|(url, desc)| LinkEntry::new(url.clone(), desc.clone()))
    }
}
