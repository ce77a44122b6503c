//! Secret selection and key naming policies.
//!
//! A policy decides which listed secrets get loaded and which configuration key a
//! loaded secret is published under. Secret names use `--` as the hierarchy
//! delimiter since most stores reject `:` in names; it maps to [`KEY_DELIMITER`].

use super::types::{FetchedSecret, SecretItem};

/// Hierarchy delimiter used in published configuration keys
pub const KEY_DELIMITER: &str = ":";

/// Hierarchy delimiter used in secret names
pub const SECRET_NAME_DELIMITER: &str = "--";

/// Decides inclusion and key naming. Implementations should be pure.
pub trait SecretPolicy: Send + Sync + std::fmt::Debug {
    /// Whether a listed secret should be loaded
    fn should_load(&self, item: &SecretItem) -> bool;

    /// Configuration key for a fetched secret
    fn key_for(&self, secret: &FetchedSecret) -> String;
}

/// Loads every secret and maps `--` in its name to `:`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSecretPolicy;

impl SecretPolicy for DefaultSecretPolicy {
    fn should_load(&self, _item: &SecretItem) -> bool {
        true
    }

    fn key_for(&self, secret: &FetchedSecret) -> String {
        secret.name.replace(SECRET_NAME_DELIMITER, KEY_DELIMITER)
    }
}

/// Loads only secrets named `<prefix>--...` and strips the prefix from the key.
///
/// Lets several applications share one store: `billing--Database--Password` is
/// published as `Database:Password` for the `billing` prefix and ignored otherwise.
#[derive(Debug, Clone)]
pub struct PrefixSecretPolicy {
    prefix: String,
}

impl PrefixSecretPolicy {
    pub fn new(prefix: impl AsRef<str>) -> Self {
        Self { prefix: format!("{}{}", prefix.as_ref(), SECRET_NAME_DELIMITER) }
    }
}

impl SecretPolicy for PrefixSecretPolicy {
    fn should_load(&self, item: &SecretItem) -> bool {
        item.name.len() > self.prefix.len() && item.name.starts_with(&self.prefix)
    }

    fn key_for(&self, secret: &FetchedSecret) -> String {
        let name = secret.name.strip_prefix(&self.prefix).unwrap_or(&secret.name);
        name.replace(SECRET_NAME_DELIMITER, KEY_DELIMITER)
    }
}
