// =============================================================================
// CRATE-LEVEL QUALITY LINTS (following Tokio/Serde standards)
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Field names and BSON keys in docs
#![allow(clippy::missing_errors_doc)] // # Errors sections only where non-obvious
#![allow(clippy::missing_panics_doc)] // # Panics sections - doc-heavy
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::return_self_not_must_use)] // Builder methods return &mut Self
#![allow(clippy::must_use_candidate)] // Fluent API doesn't need must_use
#![allow(clippy::match_same_arms)] // Type rank tables read better one arm per type
#![allow(clippy::float_cmp)] // Server replies carry integral doubles (`ok: 1.0`)

//! # min-query - Cursor Pagination for MongoDB `find`
//!
//! Pages through a collection without `skip`. Each page ends with an opaque
//! cursor token; the next page is a range seek (`min` + `skip: 1`) on the
//! index the query sorts by, so page 1000 costs the same as page 1.
//!
//! ## Quick Start
//!
//! ```
//! # #[cfg(feature = "memory")] {
//! use bson::doc;
//! use min_query::prelude::*;
//!
//! let mut db = MemoryDatabase::new();
//! for (id, name) in [(1, "Chloe"), (2, "Aaron"), (3, "Ed"), (4, "Alice")] {
//!     db.insert("users", doc! { "_id": id, "name": name, "country": "US" });
//! }
//!
//! let mut query = MinQuery::new(&db, "users", doc! { "country": "US" });
//! query.sort(&["name", "_id"]).limit(3);
//!
//! let page: Page<bson::Document> = query.page(&["name", "_id"]).unwrap();
//! assert_eq!(page.items.len(), 3);
//! assert!(page.has_more());
//!
//! // Resume after the last document of the previous page
//! query.cursor(page.next_cursor());
//! let page: Page<bson::Document> = query.page(&["name", "_id"]).unwrap();
//! assert_eq!(page.items[0].get_str("name").unwrap(), "Ed");
//! assert!(!page.has_more());
//! # }
//! ```
//!
//! ## Cursor Fields
//!
//! The fields passed to [`MinQuery::all`] must be the fields of the index
//! being walked, in index order, and should make the position unique (end
//! with `_id`). The values are read from the last document of the page:
//!
//! | Sort                | Index hint                | Cursor fields         |
//! |---------------------|---------------------------|-----------------------|
//! | `["name", "_id"]`   | `{ name: 1, _id: 1 }`     | `["name", "_id"]`     |
//! | `["-created", "_id"]` | `{ created: -1, _id: 1 }` | `["created", "_id"]` |
//! | `["boss.name", "_id"]` | `{ "boss.name": 1, _id: 1 }` | `["boss.name", "_id"]` |
//!
//! ## Codecs
//!
//! Tokens are produced by a [`CursorCodec`]. [`Base64Codec`] (the default)
//! gives URL-safe tokens; [`SignedCodec`] adds an HMAC so clients cannot
//! forge positions; [`HexCodec`] is handy when reading logs.
//!
//! ## Drivers
//!
//! Queries run through any [`CommandRunner`]. With the `mongodb` feature,
//! `mongodb::sync::Database` is one. With the `memory` feature,
//! `memory::MemoryDatabase` is another, for tests and examples.

pub mod codec;
pub mod constants;
mod error;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
mod page_info;
mod path;
mod query;
mod runner;

pub use codec::{Base64Codec, CursorCodec, CursorError, HexCodec, IndexEntry, SignedCodec};
pub use error::{CommandError, QueryError};
pub use page_info::{Page, PageInfo};
pub use query::{Hint, MinQuery, SortDir, SortField};
pub use runner::CommandRunner;

/// Prelude module for convenient imports.
///
/// ```
/// # #[cfg(feature = "memory")] {
/// use min_query::prelude::*;
///
/// let db = MemoryDatabase::new();
/// let query = MinQuery::new(&db, "users", bson::doc! {});
/// assert_eq!(query.current_cursor(), "");
/// # }
/// ```
pub mod prelude {
    #[cfg(any(test, feature = "memory"))]
    pub use crate::memory::MemoryDatabase;
    pub use crate::{
        Base64Codec, CommandError, CommandRunner, CursorCodec, CursorError, HexCodec, Hint,
        IndexEntry, MinQuery, Page, PageInfo, QueryError, SignedCodec, SortDir, SortField,
    };
}
