//! The paginated query builder.

mod command;
mod reply;
mod sort;

use std::fmt;
use std::sync::Arc;

use bson::Document;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::codec::{Base64Codec, CursorCodec, CursorError, IndexEntry};
use crate::error::QueryError;
use crate::page_info::{Page, PageInfo};
use crate::runner::CommandRunner;

use command::FindCommand;

pub use command::Hint;
pub use sort::{SortDir, SortField};

/// A `find` query that pages through results with cursors.
///
/// Instead of `skip`, every page after the first is a range seek: the server
/// starts scanning the index at the entry encoded in the cursor and steps
/// one past it. The cost of a page does not depend on how many pages came
/// before it.
///
/// Configuration methods take `&mut self` and return `&mut Self`, so a
/// query is configured once and re-executed with only the cursor changing.
///
/// ```
/// # #[cfg(feature = "memory")] {
/// use bson::doc;
/// use min_query::MinQuery;
/// use min_query::memory::MemoryDatabase;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// let mut db = MemoryDatabase::new();
/// for name in ["Ed", "Alice", "Chloe"] {
///     db.insert("users", doc! { "name": name });
/// }
///
/// let mut query = MinQuery::new(&db, "users", doc! {});
/// query.sort(&["name", "_id"]).limit(2);
///
/// let mut users: Vec<User> = Vec::new();
/// let page = query.all(&mut users, &["name", "_id"]).unwrap();
/// assert_eq!(users[0].name, "Alice");
/// assert!(page.has_more);
///
/// let page = query.cursor(&page.next_cursor).all(&mut users, &["name", "_id"]).unwrap();
/// assert_eq!(users.len(), 1);
/// assert_eq!(users[0].name, "Ed");
/// assert!(!page.has_more);
/// # }
/// ```
///
/// # Partial Results
///
/// When restricting returned fields with [`select`](Self::select), include
/// every cursor field in the projection. Otherwise the last document lacks
/// the values the next cursor is built from, the cursor stores `null` for
/// them and the next page starts at the wrong position.
pub struct MinQuery<'db, R: ?Sized> {
    db: &'db R,
    collection: String,
    filter: Document,
    sort: Vec<SortField>,
    projection: Option<Document>,
    hint: Option<Hint>,
    limit: Option<i64>,
    cursor: String,
    min: Option<IndexEntry>,
    cursor_error: Option<CursorError>,
    codec: Arc<dyn CursorCodec>,
}

impl<'db, R: CommandRunner + ?Sized> MinQuery<'db, R> {
    /// Create a query over `collection` matching `filter`.
    ///
    /// Uses [`Base64Codec`] until [`codec`](Self::codec) replaces it.
    pub fn new(db: &'db R, collection: impl Into<String>, filter: Document) -> Self {
        Self {
            db,
            collection: collection.into(),
            filter,
            sort: Vec::new(),
            projection: None,
            hint: None,
            limit: None,
            cursor: String::new(),
            min: None,
            cursor_error: None,
            codec: Arc::new(Base64Codec::default()),
        }
    }

    /// Create a query that forces the server to use the given index.
    ///
    /// Servers that require a hint alongside `min` need this; pass the key
    /// pattern matching the sort, e.g. `doc! { "name": 1, "_id": 1 }`.
    pub fn with_hint(
        db: &'db R,
        collection: impl Into<String>,
        filter: Document,
        hint: impl Into<Hint>,
    ) -> Self {
        let mut query = Self::new(db, collection, filter);
        query.hint = Some(hint.into());
        query
    }

    /// Order results by the given fields.
    ///
    /// A `-` prefix sorts descending, a `+` prefix (or none) ascending.
    /// Empty names are ignored. Replaces any previous sort.
    pub fn sort<S: AsRef<str>>(&mut self, fields: &[S]) -> &mut Self {
        self.sort = SortField::parse_all(fields);
        self
    }

    /// Restrict which fields are returned; `None` returns whole documents.
    ///
    /// See [Partial Results](Self#partial-results).
    pub fn select(&mut self, projection: impl Into<Option<Document>>) -> &mut Self {
        self.projection = projection.into();
        self
    }

    /// Set the page size. `n <= 0` removes the limit.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.limit = (n > 0).then_some(n);
        self
    }

    /// Force the server to use the given index.
    pub fn hint(&mut self, hint: impl Into<Hint>) -> &mut Self {
        self.hint = Some(hint.into());
        self
    }

    /// Resume after the position encoded in `token`.
    ///
    /// The token is decoded right away with the current codec. A decode
    /// failure is not reported here: it is kept and returned by the next
    /// [`all`](Self::all). An empty token clears the position and any kept
    /// error.
    pub fn cursor(&mut self, token: &str) -> &mut Self {
        self.cursor = token.to_string();
        self.min = None;
        self.cursor_error = None;

        if !token.is_empty() {
            match self.codec.decode(token) {
                Ok(entry) => self.min = Some(entry),
                Err(err) => self.cursor_error = Some(err),
            }
        }
        self
    }

    /// Replace the codec used by later [`cursor`](Self::cursor) calls and
    /// for the cursors [`all`](Self::all) produces.
    pub fn codec<C: CursorCodec + 'static>(&mut self, codec: C) -> &mut Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Replace the codec with a shared instance.
    pub fn shared_codec(&mut self, codec: Arc<dyn CursorCodec>) -> &mut Self {
        self.codec = codec;
        self
    }

    /// The cursor token currently set.
    pub fn current_cursor(&self) -> &str {
        &self.cursor
    }

    /// The seek boundary decoded from the current cursor.
    pub const fn seek_boundary(&self) -> Option<&IndexEntry> {
        self.min.as_ref()
    }

    /// The `find` command the next [`all`](Self::all) sends.
    pub fn find_command(&self) -> Document {
        self.command().to_document()
    }

    fn command(&self) -> FindCommand<'_> {
        FindCommand {
            collection: &self.collection,
            filter: &self.filter,
            sort: &self.sort,
            projection: self.projection.as_ref(),
            hint: self.hint.as_ref(),
            limit: self.limit,
            min: self.min.as_ref(),
        }
    }

    /// Fetch one page into `results` and return the cursor for the next.
    ///
    /// `cursor_fields` lists, in index order, the fields the next cursor is
    /// built from; `+`/`-` prefixes are accepted and ignored. With no cursor
    /// fields the returned cursor is empty.
    ///
    /// `results` is cleared once the command succeeds, then filled in index
    /// order. When the page is empty the returned cursor is the one this
    /// page was fetched with.
    ///
    /// # Errors
    ///
    /// - [`QueryError::CursorDecoding`] if the cursor set earlier was
    ///   invalid; nothing is sent to the database.
    /// - [`QueryError::Command`] if the round trip fails; `results` is
    ///   untouched.
    /// - [`QueryError::ResultDecoding`] if a document does not fit `T`;
    ///   `results` holds the documents decoded so far.
    /// - [`QueryError::CursorEncoding`] if the codec fails; `results` holds
    ///   the full page.
    pub fn all<T, S>(
        &self,
        results: &mut Vec<T>,
        cursor_fields: &[S],
    ) -> Result<PageInfo, QueryError>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        if let Some(err) = &self.cursor_error {
            warn!(
                collection = %self.collection,
                error = %err,
                "refusing to run query with invalid cursor"
            );
            return Err(QueryError::CursorDecoding(err.clone()));
        }

        let command = self.command();
        let document = command.to_document();
        debug!(
            collection = %self.collection,
            limit = ?self.limit,
            seek = self.min.is_some(),
            "issuing find command"
        );
        trace!(command = %document, "find command");

        let reply = self.db.run_command(document)?;
        let batch = reply::first_batch(reply)?;
        let returned = batch.len();
        let (docs, has_more) = reply::split_look_ahead(batch, self.limit);

        let defining = docs.last().cloned();
        results.clear();
        results.reserve(docs.len());
        for doc in docs {
            results.push(bson::from_document(doc)?);
        }

        let next_cursor = match defining {
            // Nothing new: hand back the cursor we started from
            None => self.cursor.clone(),
            Some(_) if cursor_fields.is_empty() => String::new(),
            Some(last) => {
                let entry = reply::index_entry(&last, cursor_fields);
                self.codec
                    .encode(&entry)
                    .map_err(QueryError::CursorEncoding)?
            }
        };

        debug!(
            collection = %self.collection,
            returned,
            count = results.len(),
            has_more,
            "page fetched"
        );

        Ok(PageInfo::new(results.len(), has_more).with_next_cursor(next_cursor))
    }

    /// Fetch one page into a fresh vector.
    ///
    /// Same as [`all`](Self::all), returning the documents with the page info.
    pub fn page<T, S>(&self, cursor_fields: &[S]) -> Result<Page<T>, QueryError>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        let mut items = Vec::new();
        let info = self.all(&mut items, cursor_fields)?;
        Ok(Page { items, info })
    }
}

impl<R: ?Sized> Clone for MinQuery<'_, R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db,
            collection: self.collection.clone(),
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            projection: self.projection.clone(),
            hint: self.hint.clone(),
            limit: self.limit,
            cursor: self.cursor.clone(),
            min: self.min.clone(),
            cursor_error: self.cursor_error.clone(),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<R: ?Sized> fmt::Debug for MinQuery<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinQuery")
            .field("collection", &self.collection)
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("projection", &self.projection)
            .field("hint", &self.hint)
            .field("limit", &self.limit)
            .field("cursor", &self.cursor)
            .field("cursor_error", &self.cursor_error)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
