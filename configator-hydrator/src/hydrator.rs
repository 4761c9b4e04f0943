//! Recursive schema hydration.

use configator_adapters::traits::VaultClient;
use configator_primitives::{
    FieldDescriptor, FieldKind, PrimitiveKind, Schema, SchemaDescriptor, Value, ValueMap,
    VaultRecord, VaultSection,
};
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::{HydrateError, HydrateResult};
use crate::matching::{child_path, locate_field, locate_section};
use crate::resolver::resolve_reference;

/// Loads vault item `item` from vault `vault` into a new `S`.
///
/// # Errors
///
/// Returns [`HydrateError::VaultNotFound`] or [`HydrateError::ItemNotFound`]
/// before any field is touched, and otherwise any error from
/// [`hydrate_record`].
pub async fn hydrate<S, C>(client: &C, vault: &str, item: &str) -> HydrateResult<S>
where
    S: Schema,
    C: VaultClient + ?Sized,
{
    let descriptor = S::descriptor();
    let values = hydrate_descriptor(client, &descriptor, vault, item).await?;
    Ok(S::from_values(values)?)
}

/// Loads vault item `item` from vault `vault` following a runtime-built schema.
///
/// # Errors
///
/// See [`hydrate`].
pub async fn hydrate_descriptor<C>(
    client: &C,
    descriptor: &SchemaDescriptor,
    vault: &str,
    item: &str,
) -> HydrateResult<ValueMap>
where
    C: VaultClient + ?Sized,
{
    debug!(
        schema = descriptor.name(),
        provider = client.metadata().provider(),
        "loading configuration"
    );
    descriptor.validate()?;
    let record = fetch_record(client, vault, item).await?;
    hydrate_level(client, descriptor, &record, None, "").await
}

/// Hydrates a schema from an already fetched record.
///
/// The client is only used to follow `op://` references.
///
/// # Errors
///
/// Returns the first section, field, coercion, or reference error met while
/// walking the schema in declaration order.
pub async fn hydrate_record<C>(
    client: &C,
    descriptor: &SchemaDescriptor,
    record: &VaultRecord,
) -> HydrateResult<ValueMap>
where
    C: VaultClient + ?Sized,
{
    descriptor.validate()?;
    hydrate_level(client, descriptor, record, None, "").await
}

async fn fetch_record<C>(client: &C, vault: &str, item: &str) -> HydrateResult<VaultRecord>
where
    C: VaultClient + ?Sized,
{
    let Some(vault_handle) = client.resolve_vault(vault).await? else {
        warn!(vault, "vault not found");
        return Err(HydrateError::VaultNotFound {
            vault: vault.to_owned(),
        });
    };
    let Some(item_handle) = client.resolve_item(&vault_handle, item).await? else {
        warn!(vault, item, "item not found");
        return Err(HydrateError::ItemNotFound {
            item: item.to_owned(),
            vault: vault.to_owned(),
        });
    };
    debug!(vault = %vault_handle, item = %item_handle, "fetching item");
    Ok(client.fetch_record(&vault_handle, &item_handle).await?)
}

fn hydrate_level<'a, C>(
    client: &'a C,
    schema: &'a SchemaDescriptor,
    record: &'a VaultRecord,
    section: Option<&'a VaultSection>,
    path: &'a str,
) -> BoxFuture<'a, HydrateResult<ValueMap>>
where
    C: VaultClient + ?Sized,
{
    Box::pin(async move {
        debug!(
            schema = schema.name(),
            section = section.map(VaultSection::title),
            "hydrating schema"
        );
        let mut values = ValueMap::new();
        for field in schema.fields() {
            let field_path = child_path(path, field.name());
            let value = match field.kind() {
                FieldKind::Section(nested) => {
                    let vault_section =
                        locate_section(record, field.name(), schema.name(), &field_path)?;
                    let nested_values =
                        hydrate_level(client, nested, record, Some(vault_section), &field_path)
                            .await?;
                    Value::Section(nested_values)
                }
                FieldKind::Primitive(kind) => {
                    hydrate_leaf(client, record, schema, field, *kind, section, &field_path).await?
                }
            };
            values.insert(field.name(), value);
        }
        Ok(values)
    })
}

async fn hydrate_leaf<C>(
    client: &C,
    record: &VaultRecord,
    schema: &SchemaDescriptor,
    field: &FieldDescriptor,
    kind: PrimitiveKind,
    section: Option<&VaultSection>,
    path: &str,
) -> HydrateResult<Value>
where
    C: VaultClient + ?Sized,
{
    if let Some(vault_field) = locate_field(record, field.name(), section) {
        debug!(field = path, "hydrating field");
        let resolved = resolve_reference(client, vault_field.value()).await?;
        return kind.parse(&resolved).map_err(|source| HydrateError::Coercion {
            path: path.to_owned(),
            source,
        });
    }

    match field.default_value() {
        Some(default) => {
            debug!(field = path, "using default value");
            Ok(default.clone())
        }
        None => Err(HydrateError::FieldNotFound {
            field: path.to_owned(),
            schema: schema.name().to_owned(),
            section: section.map(|s| s.title().to_owned()),
        }),
    }
}
