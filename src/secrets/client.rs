//! Secret store client trait and pagination helper.

use async_trait::async_trait;
use tracing::debug;

use super::types::{FetchedSecret, SecretItem, SecretPage};
use crate::errors::{MirrorError, Result};

/// Upper bound on pages followed in one listing. A store that keeps handing out
/// continuation links past this point is treated as broken.
pub const MAX_LIST_PAGES: usize = 10_000;

/// Read-only client for a remote secret store.
///
/// Implementations must be callable concurrently for distinct identifiers; the
/// refresh engine fetches every changed secret of a cycle at once.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret values
/// - Errors MUST NOT embed secret values
#[async_trait]
pub trait SecretStoreClient: Send + Sync + std::fmt::Debug {
    /// List the first page of secrets in `store`.
    async fn list_secrets(&self, store: &str) -> Result<SecretPage>;

    /// Follow a continuation link returned by a previous page.
    async fn list_secrets_next_page(&self, next_link: &str) -> Result<SecretPage>;

    /// Fetch the current value and timestamp of one secret.
    ///
    /// # Errors
    ///
    /// - [`MirrorError::NotFound`] if the secret vanished since it was listed
    /// - [`MirrorError::Store`] for transport or backend failures
    async fn fetch_secret(&self, id: &str) -> Result<FetchedSecret>;
}

/// List every secret in `store`, following continuation links until exhausted.
///
/// Items are returned in listing order across pages.
pub async fn list_all_secrets(
    client: &dyn SecretStoreClient,
    store: &str,
) -> Result<Vec<SecretItem>> {
    let mut page = client.list_secrets(store).await?;
    let mut items = std::mem::take(&mut page.items);
    let mut pages = 1;

    while let Some(next_link) = page.next_link.take() {
        if pages >= MAX_LIST_PAGES {
            return Err(MirrorError::store(format!(
                "Listing of '{}' exceeded {} pages",
                store, MAX_LIST_PAGES
            )));
        }
        page = client.list_secrets_next_page(&next_link).await?;
        items.append(&mut page.items);
        pages += 1;
    }

    debug!(store = %store, pages, items = items.len(), "Listed secrets");
    Ok(items)
}
