//! Cursor codecs: turning an index entry into an opaque token and back.
//!
//! A cursor is the index entry of the last document a page returned,
//! serialized so it can travel through a URL, a JSON response or a message
//! queue and come back later as the seek boundary of the next page.
//!
//! # Codecs
//!
//! | Codec            | Token format                                   |
//! |------------------|------------------------------------------------|
//! | [`Base64Codec`]  | BSON bytes, URL-safe base64 without padding    |
//! | [`HexCodec`]     | BSON bytes, lowercase hex                      |
//! | [`SignedCodec`]  | inner token + `.` + HMAC-SHA256 tag            |
//!
//! Implement [`CursorCodec`] to encrypt, compress or otherwise wrap tokens.
//! Every codec must round-trip: `decode(encode(e)) == e` with field order
//! and value types preserved.
//!
//! # Example
//!
//! ```
//! use bson::doc;
//! use min_query::{Base64Codec, CursorCodec};
//!
//! let codec = Base64Codec::default();
//! let entry = doc! { "name": "Alice", "_id": 42 };
//!
//! let token = codec.encode(&entry).unwrap();
//! assert!(!token.contains(['+', '/', '=']));
//! assert_eq!(codec.decode(&token).unwrap(), entry);
//! ```

mod hex_text;
mod signed;
mod url_safe;

use std::fmt;

use thiserror::Error;

pub use hex_text::HexCodec;
pub use signed::SignedCodec;
pub use url_safe::Base64Codec;

/// An ordered sequence of `(field, value)` pairs matching a database index.
///
/// Used both as a sort specification (values are `1` / `-1`) and as a seek
/// boundary (values are taken from a document).
pub type IndexEntry = bson::Document;

/// A symmetric pair of functions converting index entries to cursor tokens.
pub trait CursorCodec: fmt::Debug + Send + Sync {
    /// Produce a cursor token from an index entry.
    fn encode(&self, entry: &IndexEntry) -> Result<String, CursorError>;

    /// Parse a cursor token back into the index entry it was made from.
    ///
    /// Must not have side effects.
    fn decode(&self, token: &str) -> Result<IndexEntry, CursorError>;
}

impl<C: CursorCodec + ?Sized> CursorCodec for &C {
    fn encode(&self, entry: &IndexEntry) -> Result<String, CursorError> {
        (**self).encode(entry)
    }

    fn decode(&self, token: &str) -> Result<IndexEntry, CursorError> {
        (**self).decode(token)
    }
}

impl<C: CursorCodec + ?Sized> CursorCodec for Box<C> {
    fn encode(&self, entry: &IndexEntry) -> Result<String, CursorError> {
        (**self).encode(entry)
    }

    fn decode(&self, token: &str) -> Result<IndexEntry, CursorError> {
        (**self).decode(token)
    }
}

/// Errors produced while encoding or decoding cursor tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CursorError {
    /// The token contains characters outside the codec's alphabet.
    #[error("invalid cursor encoding")]
    InvalidEncoding,
    /// The token decoded to bytes that are not a valid BSON document.
    #[error("invalid cursor document: {0}")]
    InvalidDocument(String),
    /// The token is longer than the codec accepts.
    #[error("cursor exceeds maximum size ({len} > {max} bytes)")]
    TooLarge {
        /// Token length in bytes.
        len: usize,
        /// Configured limit in bytes.
        max: usize,
    },
    /// The token's signature is missing or does not match.
    #[error("cursor signature mismatch")]
    InvalidSignature,
    /// The index entry could not be serialized.
    #[error("failed to serialize cursor: {0}")]
    Encode(String),
    /// Codec-specific failure from a third-party codec.
    #[error("{0}")]
    Custom(String),
}

impl CursorError {
    /// Returns `true` if the token is malformed (bad alphabet or bad document).
    #[inline]
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(self, Self::InvalidEncoding | Self::InvalidDocument(_))
    }

    /// Returns `true` if this is a size limit error.
    #[inline]
    #[must_use]
    pub const fn is_limit_error(&self) -> bool {
        matches!(self, Self::TooLarge { .. })
    }
}

/// Serialize an index entry to BSON bytes.
pub(crate) fn entry_to_bytes(entry: &IndexEntry) -> Result<Vec<u8>, CursorError> {
    bson::to_vec(entry).map_err(|e| CursorError::Encode(e.to_string()))
}

/// Parse BSON bytes into an index entry.
pub(crate) fn entry_from_bytes(bytes: &[u8]) -> Result<IndexEntry, CursorError> {
    bson::from_slice(bytes).map_err(|e| CursorError::InvalidDocument(e.to_string()))
}
