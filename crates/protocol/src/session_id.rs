//! Ephemeral session identifiers.

use uuid::Uuid;

/// Length of the canonical hyphenated UUID text form.
pub const SESSION_ID_LEN: usize = 36;

/// Identity assigned by the server to one connection.
///
/// Always the canonical lowercase text form of a random (version 4)
/// UUID. Uniqueness is probabilistic only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Validates an id received from a peer.
    ///
    /// Returns `None` unless `text` is a hyphenated version 4 UUID with
    /// the RFC 4122 variant.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != SESSION_ID_LEN {
            return None;
        }
        let uuid = Uuid::try_parse(text).ok()?;
        if uuid.get_version_num() != 4 || uuid.get_variant() != uuid::Variant::RFC4122 {
            return None;
        }
        Some(Self(text.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
