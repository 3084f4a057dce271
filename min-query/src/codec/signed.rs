//! Tamper-evident cursor tokens.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{CursorCodec, CursorError, IndexEntry};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_SEPARATOR: char = '.';

/// Wraps another codec and appends an HMAC-SHA256 tag to every token.
///
/// Token layout: `<inner token>.<base64url(tag)>`. Decoding verifies the tag
/// in constant time before handing the inner token to the wrapped codec, so
/// a client can hold cursors but cannot forge a seek boundary.
///
/// ```
/// use bson::doc;
/// use min_query::{Base64Codec, CursorCodec, CursorError, SignedCodec};
///
/// let codec = SignedCodec::new(Base64Codec::default(), b"server-secret");
/// let token = codec.encode(&doc! { "_id": 7 }).unwrap();
/// assert_eq!(codec.decode(&token).unwrap(), doc! { "_id": 7 });
///
/// let attacker = SignedCodec::new(Base64Codec::default(), b"guessed");
/// let forged = attacker.encode(&doc! { "_id": 1000 }).unwrap();
/// assert_eq!(codec.decode(&forged), Err(CursorError::InvalidSignature));
/// ```
#[derive(Clone)]
pub struct SignedCodec<C> {
    inner: C,
    key: Vec<u8>,
}

impl<C: CursorCodec> SignedCodec<C> {
    /// Sign tokens produced by `inner` with `key`.
    pub fn new(inner: C, key: impl AsRef<[u8]>) -> Self {
        Self {
            inner,
            key: key.as_ref().to_vec(),
        }
    }

    /// The wrapped codec.
    pub const fn inner(&self) -> &C {
        &self.inner
    }

    fn mac(&self) -> Result<HmacSha256, CursorError> {
        <HmacSha256 as Mac>::new_from_slice(&self.key)
            .map_err(|e| CursorError::Custom(format!("invalid signing key: {e}")))
    }
}

impl<C> fmt::Debug for SignedCodec<C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedCodec")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<C: CursorCodec> CursorCodec for SignedCodec<C> {
    fn encode(&self, entry: &IndexEntry) -> Result<String, CursorError> {
        let token = self.inner.encode(entry)?;
        let mut mac = self.mac()?;
        mac.update(token.as_bytes());
        let tag = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{token}{SIGNATURE_SEPARATOR}{tag}"))
    }

    fn decode(&self, token: &str) -> Result<IndexEntry, CursorError> {
        let (payload, tag) = token
            .rsplit_once(SIGNATURE_SEPARATOR)
            .ok_or(CursorError::InvalidSignature)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| CursorError::InvalidSignature)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| CursorError::InvalidSignature)?;

        self.inner.decode(payload)
    }
}
