//! Default cursor codec: BSON bytes in URL-safe, unpadded base64.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::constants::max_cursor_size;

use super::{CursorCodec, CursorError, IndexEntry, entry_from_bytes, entry_to_bytes};

/// The default cursor codec.
///
/// Marshals the index entry to BSON, then encodes the bytes with the
/// URL-safe base64 alphabet (`-_` instead of `+/`) and no `=` padding, so
/// tokens go into query strings without escaping.
///
/// # Security Note
///
/// This is encoding, **not encryption**. Anyone holding a token can read the
/// field values of the document it points at. Wrap it in a
/// [`SignedCodec`](super::SignedCodec) to reject tampered tokens, or write a
/// [`CursorCodec`] that encrypts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base64Codec {
    max_size: Option<usize>,
}

impl Base64Codec {
    /// Create a codec with no token length limit.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { max_size: None }
    }

    /// Create a codec whose tokens are at most `max_size` bytes.
    ///
    /// Entries that would encode longer fail with [`CursorError::TooLarge`],
    /// so every token the codec hands out also decodes.
    #[must_use]
    pub const fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size: Some(max_size),
        }
    }

    /// Longest token this codec encodes or decodes, if limited.
    #[must_use]
    pub const fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    fn check_size(&self, len: usize) -> Result<(), CursorError> {
        match self.max_size {
            Some(max) if len > max => Err(CursorError::TooLarge { len, max }),
            _ => Ok(()),
        }
    }
}

impl Default for Base64Codec {
    /// Unlimited unless `MINQUERY_MAX_CURSOR_SIZE` is set, see [`max_cursor_size`].
    fn default() -> Self {
        Self {
            max_size: max_cursor_size(),
        }
    }
}

impl CursorCodec for Base64Codec {
    fn encode(&self, entry: &IndexEntry) -> Result<String, CursorError> {
        let bytes = entry_to_bytes(entry)?;
        let token = URL_SAFE_NO_PAD.encode(bytes);
        self.check_size(token.len())?;
        Ok(token)
    }

    fn decode(&self, token: &str) -> Result<IndexEntry, CursorError> {
        // Check size before decoding
        self.check_size(token.len())?;
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| CursorError::InvalidEncoding)?;
        entry_from_bytes(&bytes)
    }
}
