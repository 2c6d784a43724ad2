//! Content identity and submissions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Length of a hex-encoded SHA-256 digest.
pub const CONTENT_ID_LEN: usize = 64;

/// Hex-encoded 256-bit digest of a submission's bytes.
///
/// Identical bytes always produce the same identifier, so it doubles as the
/// deduplication key and the storage key for a video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ContentId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentIdError {
    #[error("content id must be 64 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("content id contains non-hex character {0:?}")]
    InvalidCharacter(char),
}

impl ContentId {
    /// Build an identifier from raw digest bytes.
    pub fn from_digest(digest: &[u8]) -> Self {
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self(hex)
    }

    /// Parse a hex identifier, normalising to lowercase.
    pub fn parse(s: &str) -> Result<Self, ContentIdError> {
        let s = s.trim();
        if s.len() != CONTENT_ID_LEN {
            return Err(ContentIdError::InvalidLength(s.len()));
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ContentIdError::InvalidCharacter(c));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An uploaded video waiting to be analyzed.
///
/// Owned by the orchestrator for the lifetime of one request. The file at
/// `path` belongs to the transport layer, which removes it afterwards.
#[derive(Debug, Clone)]
pub struct VideoSubmission {
    /// Local path of the uploaded bytes
    pub path: PathBuf,
    /// MIME type declared by the client
    pub mime_type: String,
    /// Byte size of the upload
    pub size: u64,
    /// Client-side file name, if any
    pub original_name: Option<String>,
}

impl VideoSubmission {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            size,
            original_name: None,
        }
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_digest_is_lowercase_hex() {
        let id = ContentId::from_digest(&[0x00, 0xab, 0xff]);
        assert_eq!(id.as_str(), "00abff");
    }

    #[test]
    fn test_parse_roundtrips_and_normalises() {
        let upper = "A".repeat(64);
        let id = ContentId::parse(&upper).unwrap();
        assert_eq!(id.as_str(), "a".repeat(64));
        assert_eq!(id.short().len(), 12);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            ContentId::parse("abc"),
            Err(ContentIdError::InvalidLength(3))
        );
        let bad = format!("{}g", "a".repeat(63));
        assert_eq!(
            ContentId::parse(&bad),
            Err(ContentIdError::InvalidCharacter('g'))
        );
    }

    #[test]
    fn test_serializes_transparently() {
        let id = ContentId::from_digest(&[1, 2]);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0102\"");
    }
}
