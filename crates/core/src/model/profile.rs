use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription level governing content access.
///
/// Anything the identity source sends that is not a known tier parses to
/// `Unknown`, which the access policy treats as fully locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    Free,
    Plus,
    Pro,
    #[serde(other)]
    Unknown,
}

impl UserTier {
    /// Lenient parse; never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => UserTier::Free,
            "plus" => UserTier::Plus,
            "pro" => UserTier::Pro,
            _ => UserTier::Unknown,
        }
    }

    #[must_use]
    pub fn is_paid(self) -> bool {
        matches!(self, UserTier::Plus | UserTier::Pro)
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UserTier::Free => "free",
            UserTier::Plus => "plus",
            UserTier::Pro => "pro",
            UserTier::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Read-only profile supplied by the identity source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: Option<String>,
    pub tier: UserTier,
}

impl UserProfile {
    #[must_use]
    pub fn new(uid: impl Into<String>, tier: UserTier) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            tier,
        }
    }
}
