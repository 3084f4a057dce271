//! `find` command construction.

use bson::{Bson, Document, doc};

use crate::constants::{LOOK_AHEAD, SEEK_SKIP};

use super::sort::{SortField, sort_document};

/// Index hint: which index the server must use for the seek.
#[derive(Debug, Clone, PartialEq)]
pub enum Hint {
    /// Index key pattern, e.g. `{ "name": 1, "_id": 1 }`.
    Keys(Document),
    /// Index name, e.g. `"name_1__id_1"`.
    Name(String),
}

impl From<Document> for Hint {
    fn from(keys: Document) -> Self {
        Self::Keys(keys)
    }
}

impl From<&str> for Hint {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Hint {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Hint> for Bson {
    fn from(hint: Hint) -> Self {
        match hint {
            Hint::Keys(keys) => Self::Document(keys),
            Hint::Name(name) => Self::String(name),
        }
    }
}

/// The parts of a query that make up one seek request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FindCommand<'q> {
    pub(crate) collection: &'q str,
    pub(crate) filter: &'q Document,
    pub(crate) sort: &'q [SortField],
    pub(crate) projection: Option<&'q Document>,
    pub(crate) hint: Option<&'q Hint>,
    /// Page size; `None` means unbounded.
    pub(crate) limit: Option<i64>,
    /// Seek boundary: the index entry of the previous page's last document.
    pub(crate) min: Option<&'q Document>,
}

impl FindCommand<'_> {
    /// Number of documents requested: the page plus one look-ahead document.
    pub(crate) fn batch_size(&self) -> Option<i64> {
        self.limit.map(|limit| limit.saturating_add(LOOK_AHEAD))
    }

    /// Render the command document.
    ///
    /// Always `singleBatch`: every page is one self-contained round trip and
    /// no server cursor outlives it.
    pub(crate) fn to_document(&self) -> Document {
        let mut cmd = doc! {
            "find": self.collection,
            "filter": self.filter.clone(),
        };

        if !self.sort.is_empty() {
            cmd.insert("sort", sort_document(self.sort));
        }
        if let Some(projection) = self.projection {
            cmd.insert("projection", projection.clone());
        }
        if let Some(hint) = self.hint {
            cmd.insert("hint", hint.clone());
        }
        if let Some(batch) = self.batch_size() {
            cmd.insert("limit", batch);
            cmd.insert("batchSize", batch);
        }
        cmd.insert("singleBatch", true);

        // A paged boundary was already returned; start one past it
        if let Some(min) = self.min {
            cmd.insert("min", min.clone());
            if self.limit.is_some() {
                cmd.insert("skip", SEEK_SKIP);
            }
        }

        cmd
    }
}
