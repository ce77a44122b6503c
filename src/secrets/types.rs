//! Value types shared by store clients and the snapshot.

use chrono::{DateTime, Utc};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret value that redacts itself in Debug and Display output.
///
/// The raw value is reachable only through [`SecretValue::expose`]. Memory is
/// zeroed when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value. Never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED])")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One entry of a store listing. Carries metadata only, never the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretItem {
    /// Store-wide identifier used to fetch the secret; `None` when the store
    /// returned an entry that cannot be addressed
    pub id: Option<String>,
    /// Secret name as shown by the store
    pub name: String,
    /// Disabled secrets are listed but never loaded
    pub enabled: bool,
    /// Last-updated timestamp; absence is a valid state
    pub updated_at: Option<DateTime<Utc>>,
}

impl SecretItem {
    /// Create an enabled item whose identifier is known
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            enabled: true,
            updated_at: None,
        }
    }

    pub fn with_updated_at(mut self, updated_at: Option<DateTime<Utc>>) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn identifier(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// One page of a store listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretPage {
    pub items: Vec<SecretItem>,
    /// Opaque continuation link; `None` on the last page
    pub next_link: Option<String>,
}

/// A fully fetched secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSecret {
    pub id: String,
    pub name: String,
    pub value: SecretValue,
    pub updated_at: Option<DateTime<Utc>>,
}
