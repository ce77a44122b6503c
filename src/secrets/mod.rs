//! Secret store boundary.
//!
//! The mirror never talks to a concrete secret store directly. It consumes two
//! collaborators:
//!
//! - [`SecretStoreClient`]: paginated listing plus single-secret fetch
//! - [`SecretPolicy`]: which listed secrets to load and which configuration key
//!   each one is published under
//!
//! [`InMemorySecretStore`] implements the client for development and tests.
//!
//! # Security Considerations
//!
//! - Secret values travel as [`SecretValue`], which redacts itself when formatted
//! - Listings carry metadata only
//! - Nothing is persisted; values live only in the published snapshot

pub mod client;
pub mod memory;
pub mod policy;
pub mod types;

pub use client::{list_all_secrets, SecretStoreClient, MAX_LIST_PAGES};
pub use memory::InMemorySecretStore;
pub use policy::{
    DefaultSecretPolicy, PrefixSecretPolicy, SecretPolicy, KEY_DELIMITER, SECRET_NAME_DELIMITER,
};
pub use types::{FetchedSecret, SecretItem, SecretPage, SecretValue};
