//! In-process command runner for tests and examples.
//!
//! [`MemoryDatabase`] answers the `find` command the way a server does for
//! the subset of options [`MinQuery`](crate::MinQuery) sends:
//!
//! | Option        | Support                                                     |
//! |---------------|-------------------------------------------------------------|
//! | `filter`      | equality, `$eq $ne $gt $gte $lt $lte $in $nin $exists`, `$and $or $nor`, dotted paths |
//! | `sort`        | compound, in server type order                              |
//! | `projection`  | inclusion or exclusion, dotted paths                        |
//! | `hint`        | key pattern, or the name of an index from [`create_index`](MemoryDatabase::create_index) |
//! | `min`         | inclusive lower bound on the hinted (or sort) key pattern   |
//! | `skip`, `limit`, `batchSize`, `singleBatch` | as on a server                |
//!
//! Failures come back as server-style replies (`ok: 0`), not as `Err`, so
//! reply handling is exercised the same way a real deployment exercises it.

mod filter;
mod order;
mod projection;

use std::collections::BTreeMap;

use bson::oid::ObjectId;
use bson::{Bson, Document, doc};
use tracing::trace;

use crate::constants::{
    CODE_BAD_VALUE, CODE_COMMAND_NOT_FOUND, CODE_FAILED_TO_PARSE, CODE_MIN_PATTERN_MISMATCH,
};
use crate::error::CommandError;
use crate::runner::CommandRunner;

use projection::Projection;

/// Default database name used in reply namespaces.
const DEFAULT_DB_NAME: &str = "test";

/// A database held in memory.
///
/// ```
/// use bson::doc;
/// use min_query::CommandRunner;
/// use min_query::memory::MemoryDatabase;
///
/// let mut db = MemoryDatabase::new();
/// db.insert("users", doc! { "_id": 1, "name": "Ed" });
///
/// let reply = db.run_command(doc! { "find": "users", "filter": {} }).unwrap();
/// assert_eq!(reply.get_document("cursor").unwrap().get_str("ns").unwrap(), "test.users");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    name: String,
    collections: BTreeMap<String, Collection>,
}

#[derive(Debug, Clone, Default)]
struct Collection {
    docs: Vec<Document>,
    indexes: Vec<(String, Document)>,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Create an empty database named `test`.
    pub fn new() -> Self {
        Self::named(DEFAULT_DB_NAME)
    }

    /// Create an empty database with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: BTreeMap::new(),
        }
    }

    /// Database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a document, generating an `ObjectId` `_id` if it has none.
    ///
    /// Returns the document's `_id`.
    pub fn insert(&mut self, collection: &str, doc: Document) -> Bson {
        let doc = if doc.contains_key("_id") {
            doc
        } else {
            let mut with_id = doc! { "_id": ObjectId::new() };
            with_id.extend(doc);
            with_id
        };
        let id = doc.get("_id").cloned().unwrap_or(Bson::Null);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .docs
            .push(doc);
        id
    }

    /// Insert several documents. Returns their `_id`s in order.
    pub fn insert_many(
        &mut self,
        collection: &str,
        docs: impl IntoIterator<Item = Document>,
    ) -> Vec<Bson> {
        docs.into_iter()
            .map(|doc| self.insert(collection, doc))
            .collect()
    }

    /// Register an index so it can be hinted by name.
    ///
    /// The name follows the server convention: `{ "name": 1, "_id": -1 }`
    /// becomes `name_1__id_-1`.
    pub fn create_index(&mut self, collection: &str, keys: Document) -> String {
        let name = index_name(&keys);
        let indexes = &mut self
            .collections
            .entry(collection.to_string())
            .or_default()
            .indexes;
        if !indexes.iter().any(|(existing, _)| *existing == name) {
            indexes.push((name.clone(), keys));
        }
        name
    }

    /// Documents stored in a collection, in insertion order.
    pub fn documents(&self, collection: &str) -> &[Document] {
        self.collections
            .get(collection)
            .map_or(&[][..], |c| c.docs.as_slice())
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.documents(collection).len()
    }

    fn find(&self, cmd: &Document) -> Result<Document, CommandError> {
        let collection = cmd
            .get_str("find")
            .map_err(|_| failed_to_parse("collection name has invalid type"))?;
        let filter = optional_document(cmd, "filter")?;
        let sort = optional_document(cmd, "sort")?
            .map(|sort| key_pattern("sort", sort))
            .transpose()?;
        let projection = optional_document(cmd, "projection")?
            .map(Projection::parse)
            .transpose()?;
        let skip = optional_count(cmd, "skip")?;
        let limit = optional_count(cmd, "limit")?.filter(|n| *n > 0);
        let batch_size = optional_count(cmd, "batchSize")?;
        let single_batch = cmd.get_bool("singleBatch").unwrap_or(false);

        let stored = self.collections.get(collection);
        let hinted = match cmd.get("hint") {
            None => None,
            Some(Bson::Document(keys)) => Some(key_pattern("hint", keys)?),
            Some(Bson::String(name)) => {
                let keys = stored
                    .and_then(|c| c.indexes.iter().find(|(n, _)| n == name))
                    .map(|(_, keys)| keys)
                    .ok_or_else(|| {
                        bad_value("hint provided does not correspond to an existing index")
                    })?;
                Some(key_pattern("hint", keys)?)
            }
            Some(_) => return Err(failed_to_parse("hint must be a string or an object")),
        };

        let mut docs: Vec<&Document> = Vec::new();
        for doc in stored.map_or(&[][..], |c| c.docs.as_slice()) {
            if let Some(criteria) = filter {
                if !filter::matches(doc, criteria)? {
                    continue;
                }
            }
            docs.push(doc);
        }

        let scan = sort.as_ref().or(hinted.as_ref());
        if let Some(pattern) = scan {
            docs.sort_by(|a, b| order::compare_by_pattern(a, b, pattern));
        }

        if let Some(min) = optional_document(cmd, "min")? {
            let pattern = hinted.as_ref().or(sort.as_ref()).ok_or_else(|| {
                bad_value("min requires a hint or a sort to define the index key pattern")
            })?;
            let bound = min_bound(min, pattern)?;
            docs.retain(|doc| order::compare_to_bound(doc, &bound, pattern).is_ge());
        }

        let skip = usize::try_from(skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let mut take = limit.map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        if single_batch {
            if let Some(batch) = batch_size.filter(|n| *n > 0) {
                take = take.min(usize::try_from(batch).unwrap_or(usize::MAX));
            }
        }

        let matched = docs.len();
        let batch: Vec<Bson> = docs
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|doc| match &projection {
                Some(projection) => Bson::Document(projection.apply(doc)),
                None => Bson::Document(doc.clone()),
            })
            .collect();

        trace!(collection, matched, returned = batch.len(), "memory find");

        Ok(doc! {
            "cursor": {
                "firstBatch": batch,
                "id": 0_i64,
                "ns": format!("{}.{collection}", self.name),
            },
            "ok": 1.0,
        })
    }
}

impl CommandRunner for MemoryDatabase {
    fn run_command(&self, command: Document) -> Result<Document, CommandError> {
        let name = command.keys().next().map(String::as_str).unwrap_or_default();
        let result = match name {
            "find" => self.find(&command),
            "ping" => Ok(doc! { "ok": 1.0 }),
            other => Err(CommandError::new(format!("no such command: '{other}'"))
                .with_code(CODE_COMMAND_NOT_FOUND)
                .with_code_name("CommandNotFound")),
        };

        Ok(result.unwrap_or_else(|err| error_reply(&err)))
    }
}

fn error_reply(err: &CommandError) -> Document {
    let mut reply = doc! { "ok": 0.0, "errmsg": err.message.as_str() };
    if let Some(code) = err.code {
        reply.insert("code", code);
    }
    if let Some(name) = &err.code_name {
        reply.insert("codeName", name.as_str());
    }
    reply
}

fn bad_value(message: impl Into<String>) -> CommandError {
    CommandError::new(message)
        .with_code(CODE_BAD_VALUE)
        .with_code_name("BadValue")
}

fn failed_to_parse(message: impl Into<String>) -> CommandError {
    CommandError::new(message)
        .with_code(CODE_FAILED_TO_PARSE)
        .with_code_name("FailedToParse")
}

fn optional_document<'a>(
    cmd: &'a Document,
    key: &str,
) -> Result<Option<&'a Document>, CommandError> {
    match cmd.get(key) {
        None => Ok(None),
        Some(Bson::Document(doc)) => Ok(Some(doc)),
        Some(_) => Err(failed_to_parse(format!("'{key}' must be an object"))),
    }
}

fn integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        #[allow(clippy::cast_possible_truncation)]
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

fn optional_count(cmd: &Document, key: &str) -> Result<Option<i64>, CommandError> {
    let Some(value) = cmd.get(key) else {
        return Ok(None);
    };
    let n = integer(value).ok_or_else(|| failed_to_parse(format!("'{key}' must be a number")))?;
    if n < 0 {
        return Err(bad_value(format!("{key} value must be non-negative, but received: {n}")));
    }
    Ok(Some(n))
}

/// Parse `{ field: 1 | -1, ... }` into an ordered key pattern.
fn key_pattern(what: &str, keys: &Document) -> Result<Vec<(String, i64)>, CommandError> {
    keys.iter()
        .map(|(field, dir)| match integer(dir) {
            Some(1) => Ok((field.clone(), 1)),
            Some(-1) => Ok((field.clone(), -1)),
            _ => Err(bad_value(format!("{what} key ordering must be 1 or -1: {field}"))),
        })
        .collect()
}

/// Check that `min` names exactly the key pattern fields, in order.
fn min_bound<'a>(
    min: &'a Document,
    pattern: &[(String, i64)],
) -> Result<Vec<&'a Bson>, CommandError> {
    let names_match = min.len() == pattern.len()
        && min.keys().zip(pattern).all(|(key, (field, _))| key == field);
    if !names_match {
        let expected: Vec<&str> = pattern.iter().map(|(f, _)| f.as_str()).collect();
        return Err(CommandError::new(format!(
            "min() must match the index key pattern ({}) in order, got {min}",
            expected.join(", ")
        ))
        .with_code(CODE_MIN_PATTERN_MISMATCH)
        .with_code_name(format!("Location{CODE_MIN_PATTERN_MISMATCH}")));
    }
    Ok(min.values().collect())
}

fn index_name(keys: &Document) -> String {
    keys.iter()
        .map(|(field, dir)| format!("{field}_{dir}"))
        .collect::<Vec<_>>()
        .join("_")
}
