//! Dotted field path lookup (`boss.name`, `subsidiaries.0`).

use bson::{Bson, Document};

/// Resolve a dotted path against a document.
///
/// Segments descend into embedded documents by key and into arrays by
/// numeric index. Returns `None` when any segment is missing.
pub(crate) fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}
