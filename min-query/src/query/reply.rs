//! Reply interpretation: success check, batch extraction, look-ahead split
//! and cursor entry derivation.

use bson::{Bson, Document};
use tracing::warn;

use crate::codec::IndexEntry;
use crate::error::CommandError;
use crate::path;

use super::sort::strip_direction;

/// Returns `true` when the reply's `ok` field is numerically 1.
fn is_ok(reply: &Document) -> bool {
    match reply.get("ok") {
        Some(Bson::Double(v)) => (*v - 1.0).abs() < f64::EPSILON,
        Some(Bson::Int32(v)) => *v == 1,
        Some(Bson::Int64(v)) => *v == 1,
        Some(Bson::Boolean(b)) => *b,
        _ => false,
    }
}

fn error_code(reply: &Document) -> Option<i32> {
    match reply.get("code")? {
        Bson::Int32(code) => Some(*code),
        Bson::Int64(code) => i32::try_from(*code).ok(),
        Bson::Double(code) => Some(*code as i32),
        _ => None,
    }
}

/// Turn a failed reply into a [`CommandError`].
fn reply_error(reply: &Document) -> CommandError {
    let message = reply.get_str("errmsg").unwrap_or("command failed");
    let mut err = CommandError::new(message);
    if let Some(code) = error_code(reply) {
        err = err.with_code(code);
    }
    if let Ok(name) = reply.get_str("codeName") {
        err = err.with_code_name(name);
    }
    err
}

fn malformed(what: &str) -> CommandError {
    CommandError::new(format!("malformed find reply: {what}"))
}

/// Extract `cursor.firstBatch` from a `find` reply.
pub(crate) fn first_batch(mut reply: Document) -> Result<Vec<Document>, CommandError> {
    if !is_ok(&reply) {
        return Err(reply_error(&reply));
    }

    let Some(Bson::Document(mut cursor)) = reply.remove("cursor") else {
        return Err(malformed("missing cursor document"));
    };
    let Some(Bson::Array(batch)) = cursor.remove("firstBatch") else {
        return Err(malformed("missing cursor.firstBatch"));
    };

    batch
        .into_iter()
        .map(|item| match item {
            Bson::Document(doc) => Ok(doc),
            other => Err(malformed(&format!(
                "batch element is {:?}, not a document",
                other.element_type()
            ))),
        })
        .collect()
}

/// Drop the look-ahead document, if it came back.
///
/// Returns the caller-visible documents and whether more results exist.
/// Without a limit nothing can be detected and `has_more` is `false`.
pub(crate) fn split_look_ahead(
    mut batch: Vec<Document>,
    limit: Option<i64>,
) -> (Vec<Document>, bool) {
    let Some(limit) = limit else {
        return (batch, false);
    };
    let page = usize::try_from(limit).unwrap_or(usize::MAX);

    let has_more = batch.len() > page;
    if has_more {
        batch.truncate(page);
    }
    (batch, has_more)
}

/// Build the cursor index entry from the defining document.
///
/// Field names may carry a `+`/`-` direction marker, which is stripped.
/// Dotted names address embedded documents and array members. A field
/// missing from the document (typically dropped by the projection) is
/// stored as `null`.
pub(crate) fn index_entry<S: AsRef<str>>(doc: &Document, cursor_fields: &[S]) -> IndexEntry {
    let mut entry = IndexEntry::new();

    for name in cursor_fields {
        let name = strip_direction(name.as_ref());
        if name.is_empty() {
            continue;
        }

        let value = if let Some(value) = path::lookup(doc, name) {
            value.clone()
        } else {
            warn!(field = name, "cursor field missing from last document, storing null");
            Bson::Null
        };
        entry.insert(name, value);
    }

    entry
}
