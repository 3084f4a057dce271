//! Page results returned by query execution.

/// Outcome of one page fetch.
///
/// # Example
///
/// ```ignore
/// let info = query.all(&mut users, &["name", "_id"])?;
///
/// respond(json!({
///     "data": users,
///     "next_cursor": info.next_cursor,
///     "has_more": info.has_more,
/// }))
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// Cursor to fetch the next page.
    ///
    /// When the page is empty this is the cursor the page was fetched with,
    /// so polling an exhausted stream keeps returning the same token.
    pub next_cursor: String,
    /// Whether more documents exist past this page.
    ///
    /// Always `false` without a limit.
    pub has_more: bool,
    /// Number of documents on this page.
    pub count: usize,
}

impl PageInfo {
    /// Create page info for `count` documents.
    #[must_use]
    pub fn new(count: usize, has_more: bool) -> Self {
        Self {
            next_cursor: String::new(),
            has_more,
            count,
        }
    }

    /// Set the next cursor.
    #[must_use]
    pub fn with_next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = cursor.into();
        self
    }

    /// The next cursor, or `None` when the page produced no cursor.
    pub fn cursor(&self) -> Option<&str> {
        if self.next_cursor.is_empty() {
            None
        } else {
            Some(&self.next_cursor)
        }
    }

    /// Returns `true` if the page is empty.
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// A decoded page together with its [`PageInfo`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Documents in index order.
    pub items: Vec<T>,
    /// Cursor and continuation flag.
    pub info: PageInfo,
}

impl<T> Page<T> {
    /// Cursor for the next page.
    pub fn next_cursor(&self) -> &str {
        &self.info.next_cursor
    }

    /// Whether more documents exist past this page.
    pub const fn has_more(&self) -> bool {
        self.info.has_more
    }
}
