//! Reverse index over a fixed list of known strings.

use std::collections::HashMap;

use crate::digest::{Digest, Hasher};

/// Strings indexed when no corpus is configured.
pub const DEFAULT_CORPUS: &[&str] = &["hello", "test", "123", "flask", "openai", "chatbot"];

/// Immutable digest → string mapping.
///
/// Built once from an ordered list. When two strings share a digest the
/// later one wins.
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    entries: HashMap<Digest, String>,
    collisions: usize,
}

impl CorpusIndex {
    /// Digest every string in order and index it.
    ///
    /// # Example
    ///
    /// ```
    /// use revhash::corpus::CorpusIndex;
    /// use revhash::digest::Hasher;
    ///
    /// let corpus = CorpusIndex::build(["hello", "world"]);
    /// let digest = Hasher::new().digest_str("world");
    /// assert_eq!(corpus.get(&digest), Some("world"));
    /// ```
    pub fn build<I, S>(strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hasher = Hasher::new();
        let mut entries = HashMap::new();
        let mut collisions = 0;

        for s in strings {
            let s = s.into();
            let digest = hasher.digest_str(&s);
            if let Some(previous) = entries.insert(digest, s) {
                collisions += 1;
                log::debug!("Corpus digest {} replaced entry {:?}", digest, previous);
            }
        }

        log::debug!("Corpus index built with {} entries", entries.len());
        Self {
            entries,
            collisions,
        }
    }

    /// Index of [`DEFAULT_CORPUS`].
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::build(DEFAULT_CORPUS.iter().copied())
    }

    /// Original string for `digest`, if any.
    #[must_use]
    pub fn get(&self, digest: &Digest) -> Option<&str> {
        self.entries.get(digest).map(String::as_str)
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries overwritten during construction.
    ///
    /// Repeating a string in the input counts as a collision with itself.
    #[must_use]
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Iterate over `(digest, string)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &str)> {
        self.entries.iter().map(|(d, s)| (d, s.as_str()))
    }
}
