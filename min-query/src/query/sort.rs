//! Sort specifications written as `"+field"` / `"-field"` strings.

use bson::Document;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    /// Ascending (`1`).
    Asc,
    /// Descending (`-1`).
    Desc,
}

impl SortDir {
    /// The index key pattern value for this direction.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

/// Sort field with direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Field name, possibly dotted (`boss.name`).
    pub field: String,
    /// Direction.
    pub dir: SortDir,
}

impl SortField {
    /// Create a new sort field.
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }

    /// Parse one sort token.
    ///
    /// A leading `+` means ascending (the default), a leading `-` means
    /// descending. Returns `None` for empty names.
    pub fn parse(token: &str) -> Option<Self> {
        let (field, dir) = if let Some(stripped) = token.strip_prefix('-') {
            (stripped, SortDir::Desc)
        } else if let Some(stripped) = token.strip_prefix('+') {
            (stripped, SortDir::Asc)
        } else {
            (token, SortDir::Asc)
        };

        if field.is_empty() {
            None
        } else {
            Some(Self::new(field, dir))
        }
    }

    /// Parse a list of sort tokens, skipping empty ones.
    pub fn parse_all<S: AsRef<str>>(tokens: &[S]) -> Vec<Self> {
        tokens
            .iter()
            .filter_map(|token| Self::parse(token.as_ref()))
            .collect()
    }
}

/// Build the ordered `{field: 1 | -1}` sort document.
pub(crate) fn sort_document(fields: &[SortField]) -> Document {
    let mut sort = Document::new();
    for field in fields {
        sort.insert(field.field.clone(), field.dir.as_i32());
    }
    sort
}

/// Strip one leading direction marker from a field name.
///
/// `"-_id"` and `"+_id"` both name the stored field `"_id"`.
pub(crate) fn strip_direction(name: &str) -> &str {
    name.strip_prefix(['+', '-']).unwrap_or(name)
}
