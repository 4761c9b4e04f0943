//! In-process vault client for tests and offline use.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use configator_primitives::VaultRecord;

use crate::reference::{SecretReference, matches_segment};
use crate::traits::{
    ClientMetadata, ItemHandle, VaultClient, VaultError, VaultHandle, VaultResult,
};

#[derive(Debug)]
struct StoredVault {
    handle: VaultHandle,
    items: Vec<(ItemHandle, VaultRecord)>,
}

/// Vault client serving records held in memory.
///
/// Counts dereference calls so tests can assert how many hops a resolution
/// took.
#[derive(Debug)]
pub struct InMemoryVaultClient {
    metadata: ClientMetadata,
    vaults: Vec<StoredVault>,
    dereferences: AtomicUsize,
}

impl Default for InMemoryVaultClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVaultClient {
    /// Creates an empty client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: ClientMetadata::new("in-memory"),
            vaults: Vec::new(),
            dereferences: AtomicUsize::new(0),
        }
    }

    /// Stores `record` as item `item` of vault `vault`, creating the vault on
    /// first use. Ids are derived from insertion order.
    #[must_use]
    pub fn with_item(
        mut self,
        vault: impl Into<String>,
        item: impl Into<String>,
        record: VaultRecord,
    ) -> Self {
        let vault = vault.into();
        let position = match self.vaults.iter().position(|v| v.handle.title() == vault) {
            Some(position) => position,
            None => {
                let id = format!("vault-{}", self.vaults.len() + 1);
                self.vaults.push(StoredVault {
                    handle: VaultHandle::new(id, vault),
                    items: Vec::new(),
                });
                self.vaults.len() - 1
            }
        };

        let stored = &mut self.vaults[position];
        let id = format!("{}-item-{}", stored.handle.id(), stored.items.len() + 1);
        stored.items.push((ItemHandle::new(id, item), record));
        self
    }

    /// Number of dereference calls served so far.
    #[must_use]
    pub fn dereference_count(&self) -> usize {
        self.dereferences.load(Ordering::SeqCst)
    }

    fn vault(&self, id: &str) -> Option<&StoredVault> {
        self.vaults.iter().find(|vault| vault.handle.id() == id)
    }
}

#[async_trait]
impl VaultClient for InMemoryVaultClient {
    fn metadata(&self) -> &ClientMetadata {
        &self.metadata
    }

    async fn resolve_vault(&self, name: &str) -> VaultResult<Option<VaultHandle>> {
        Ok(self
            .vaults
            .iter()
            .find(|vault| vault.handle.title() == name)
            .map(|vault| vault.handle.clone()))
    }

    async fn resolve_item(
        &self,
        vault: &VaultHandle,
        name: &str,
    ) -> VaultResult<Option<ItemHandle>> {
        Ok(self.vault(vault.id()).and_then(|stored| {
            stored
                .items
                .iter()
                .find(|(handle, _)| handle.title() == name)
                .map(|(handle, _)| handle.clone())
        }))
    }

    async fn fetch_record(
        &self,
        vault: &VaultHandle,
        item: &ItemHandle,
    ) -> VaultResult<VaultRecord> {
        self.vault(vault.id())
            .and_then(|stored| stored.items.iter().find(|(handle, _)| handle.id() == item.id()))
            .map(|(_, record)| record.clone())
            .ok_or_else(|| VaultError::not_found(format!("item {item} in vault {vault}")))
    }

    async fn dereference(&self, link: &str) -> VaultResult<String> {
        self.dereferences.fetch_add(1, Ordering::SeqCst);
        let reference = SecretReference::parse(link)?;

        let vault = self
            .vaults
            .iter()
            .find(|vault| matches_segment(vault.handle.id(), vault.handle.title(), reference.vault()))
            .ok_or_else(|| VaultError::not_found(format!("vault `{}`", reference.vault())))?;
        let (_, record) = vault
            .items
            .iter()
            .find(|(handle, _)| matches_segment(handle.id(), handle.title(), reference.item()))
            .ok_or_else(|| {
                VaultError::not_found(format!(
                    "item `{}` in vault `{}`",
                    reference.item(),
                    vault.handle.title()
                ))
            })?;

        reference.value_in(record)
    }
}

#[cfg(test)]
mod tests {
    use configator_primitives::{VaultField, VaultSection};

    use super::*;

    fn client() -> InMemoryVaultClient {
        InMemoryVaultClient::new()
            .with_item(
                "Personal",
                "mixpanel",
                VaultRecord::new().with_field(VaultField::new("token", "mixpanel")),
            )
            .with_item(
                "Personal",
                "api",
                VaultRecord::new()
                    .with_section(VaultSection::new("s1", "APP"))
                    .with_field(VaultField::new("key", "op://Personal/mixpanel/token").in_section("s1")),
            )
    }

    #[tokio::test]
    async fn resolves_vaults_and_items_by_exact_title() {
        let client = client();
        let vault = client.resolve_vault("Personal").await.unwrap().expect("vault");
        assert!(client.resolve_vault("personal").await.unwrap().is_none());

        let item = client.resolve_item(&vault, "api").await.unwrap().expect("item");
        assert_eq!(item.id(), "vault-1-item-2");
        let record = client.fetch_record(&vault, &item).await.unwrap();
        assert_eq!(record.fields().len(), 1);
    }

    #[tokio::test]
    async fn dereference_follows_one_hop_and_counts() {
        let client = client();
        let value = client.dereference("op://Personal/api/APP/key").await.unwrap();
        assert_eq!(value, "op://Personal/mixpanel/token");
        let value = client.dereference(&value).await.unwrap();
        assert_eq!(value, "mixpanel");
        assert_eq!(client.dereference_count(), 2);
    }

    #[tokio::test]
    async fn dereference_unknown_item_is_not_found() {
        let client = client();
        let err = client
            .dereference("op://Personal/missing/token")
            .await
            .expect_err("missing item");
        assert!(matches!(err, VaultError::NotFound { .. }));
    }
}
