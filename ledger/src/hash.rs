//! # Content Ids
//!
//! A content id is the lowercase hex SHA-256 digest of a value's canonical
//! encoding (see [`crate::codec`]). Blocks commit to their contents with
//! one, and children point at their parent through one.
//!
//! Content ids are compared by value, always. Two ids are the same
//! commitment iff their hex strings are equal.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::encode;
use crate::config::{CONTENT_ID_HEX_LENGTH, HASH_OUTPUT_LENGTH};
use crate::error::{LedgerError, Result};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use tally_ledger::hash::sha256;
///
/// let digest = sha256(b"abc");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Hash the canonical encoding of `value`.
///
/// Strings are hashed as-is; everything else goes through
/// [`crate::codec::encode`] first.
pub fn content_id<T: Serialize + ?Sized>(value: &T) -> Result<ContentId> {
    let bytes = encode(value)?;
    Ok(ContentId::from_digest(&sha256(&bytes)))
}

// ---------------------------------------------------------------------------
// ContentId
// ---------------------------------------------------------------------------

/// Hex-encoded SHA-256 digest of a canonical encoding.
///
/// Deserialization goes through [`ContentId::parse`], so a loaded chain can
/// never carry an id of the wrong shape.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Wrap a raw digest.
    pub fn from_digest(digest: &[u8; HASH_OUTPUT_LENGTH]) -> Self {
        ContentId(hex::encode(digest))
    }

    /// Parse a hex content id, normalizing to lowercase.
    ///
    /// # Errors
    ///
    /// [`LedgerError::MalformedInput`] if `hex_id` is not exactly 64 hex
    /// characters.
    pub fn parse(hex_id: &str) -> Result<Self> {
        if hex_id.len() != CONTENT_ID_HEX_LENGTH {
            return Err(LedgerError::MalformedInput(format!(
                "content id must be {} hex characters, got {}",
                CONTENT_ID_HEX_LENGTH,
                hex_id.len()
            )));
        }
        let digest = hex::decode(hex_id)
            .map_err(|e| LedgerError::MalformedInput(format!("content id is not hex: {}", e)))?;
        Ok(ContentId(hex::encode(digest)))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentId {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        ContentId::parse(&value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sha256_known_vector() {
        let digest = sha256(b"");
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn string_ids_hash_the_raw_text() {
        let id = content_id("abc").unwrap();
        assert_eq!(
            id.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn transaction_id_matches_reference_vector() {
        let id = content_id(&json!({"Tom": -1, "Medium": 1})).unwrap();
        assert_eq!(
            id.as_str(),
            "028ee4db8dc991fcc8ef672c70a5a09217b96f5b5978a8286a9362d6a033bd52"
        );
    }

    #[test]
    fn empty_mapping_has_a_stable_id() {
        let id = content_id(&json!({})).unwrap();
        assert_eq!(
            id.as_str(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn ids_are_deterministic_and_content_sensitive() {
        let a = content_id(&json!({"A": 5})).unwrap();
        let b = content_id(&json!({"A": 5})).unwrap();
        let c = content_id(&json!({"A": 6})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), CONTENT_ID_HEX_LENGTH);
    }

    #[test]
    fn parse_normalizes_case() {
        let upper = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        let id = ContentId::parse(upper).unwrap();
        assert_eq!(id, content_id("abc").unwrap());
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(
            ContentId::parse("abc"),
            Err(LedgerError::MalformedInput(_))
        ));
        assert!(matches!(
            ContentId::parse(&"zz".repeat(32)),
            Err(LedgerError::MalformedInput(_))
        ));
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = content_id("abc").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: ContentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn deserialization_rejects_short_ids() {
        assert!(serde_json::from_str::<ContentId>("\"deadbeef\"").is_err());
    }
}
