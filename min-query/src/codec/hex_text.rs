//! Hex cursor codec.

use super::{CursorCodec, CursorError, IndexEntry, entry_from_bytes, entry_to_bytes};

/// Encodes the BSON bytes of an index entry as lowercase hex.
///
/// Tokens are twice the size of the BSON payload, longer than
/// [`Base64Codec`](super::Base64Codec) tokens, but trivially inspectable
/// with standard tools. Useful in logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexCodec;

impl CursorCodec for HexCodec {
    fn encode(&self, entry: &IndexEntry) -> Result<String, CursorError> {
        entry_to_bytes(entry).map(hex::encode)
    }

    fn decode(&self, token: &str) -> Result<IndexEntry, CursorError> {
        let bytes = hex::decode(token).map_err(|_| CursorError::InvalidEncoding)?;
        entry_from_bytes(&bytes)
    }
}
