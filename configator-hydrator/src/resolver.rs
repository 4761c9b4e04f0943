//! Follows `op://` reference chains to a plain value.

use configator_adapters::reference::is_reference;
use configator_adapters::traits::VaultClient;
use tracing::{debug, error};

use crate::error::{HydrateError, HydrateResult};

/// Maximum number of dereference hops before a chain counts as circular.
pub const MAX_REFERENCE_HOPS: usize = 9;

/// Resolves `raw` by dereferencing it until it is no longer a reference.
///
/// Plain values come back unchanged without touching the client. Nothing is
/// cached; every hop is a fresh call.
///
/// # Errors
///
/// Returns [`HydrateError::ReferenceCycle`] when the value is still a
/// reference after [`MAX_REFERENCE_HOPS`] hops, and propagates client errors.
pub async fn resolve_reference<C>(client: &C, raw: &str) -> HydrateResult<String>
where
    C: VaultClient + ?Sized,
{
    let mut value = raw.to_owned();
    let mut hops = 0;
    while is_reference(&value) {
        if hops == MAX_REFERENCE_HOPS {
            error!(reference = raw, hops, "too many nested op:// references");
            return Err(HydrateError::ReferenceCycle {
                reference: raw.to_owned(),
                hops,
            });
        }
        value = client.dereference(&value).await?;
        hops += 1;
    }
    if hops > 0 {
        debug!(reference = raw, hops, "reference resolved");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use configator_adapters::memory::InMemoryVaultClient;
    use configator_adapters::traits::VaultError;
    use configator_primitives::{VaultField, VaultRecord};

    use super::*;

    /// Builds a chain where resolving `op://chain/hop-0/value` takes `len` hops.
    fn chain(len: usize) -> InMemoryVaultClient {
        (0..len).fold(InMemoryVaultClient::new(), |client, hop| {
            let value = if hop + 1 == len {
                "terminal".to_owned()
            } else {
                format!("op://chain/hop-{}/value", hop + 1)
            };
            client.with_item(
                "chain",
                format!("hop-{hop}"),
                VaultRecord::new().with_field(VaultField::new("value", value)),
            )
        })
    }

    #[tokio::test]
    async fn plain_values_skip_the_client() {
        let client = InMemoryVaultClient::new();
        let value = resolve_reference(&client, "mixpanel").await.unwrap();
        assert_eq!(value, "mixpanel");
        assert_eq!(client.dereference_count(), 0);
    }

    #[tokio::test]
    async fn nine_hops_resolve() {
        let client = chain(9);
        let value = resolve_reference(&client, "op://chain/hop-0/value").await.unwrap();
        assert_eq!(value, "terminal");
        assert_eq!(client.dereference_count(), 9);
    }

    #[tokio::test]
    async fn ten_hops_fail() {
        let client = chain(10);
        let err = resolve_reference(&client, "op://chain/hop-0/value")
            .await
            .expect_err("chain too long");
        assert!(matches!(err, HydrateError::ReferenceCycle { hops: 9, .. }));
        assert_eq!(client.dereference_count(), 9);
    }

    #[tokio::test]
    async fn self_reference_fails() {
        let client = InMemoryVaultClient::new().with_item(
            "loop",
            "item",
            VaultRecord::new().with_field(VaultField::new("value", "op://loop/item/value")),
        );
        let err = resolve_reference(&client, "op://loop/item/value")
            .await
            .expect_err("cycle");
        assert!(matches!(err, HydrateError::ReferenceCycle { ref reference, .. } if reference == "op://loop/item/value"));
    }

    #[tokio::test]
    async fn client_errors_propagate() {
        let client = InMemoryVaultClient::new();
        let err = resolve_reference(&client, "op://nowhere/item/field")
            .await
            .expect_err("unknown vault");
        assert!(matches!(err, HydrateError::Vault(VaultError::NotFound { .. })));
    }
}
