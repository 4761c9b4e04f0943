//! JSON shapes shared by the Connect REST API and `op --format json`.

use configator_primitives::{VaultField, VaultRecord, VaultSection};
use serde::Deserialize;

use crate::traits::{ItemHandle, VaultHandle};

#[derive(Debug, Deserialize)]
pub(crate) struct WireVault {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl From<WireVault> for VaultHandle {
    fn from(vault: WireVault) -> Self {
        VaultHandle::new(vault.id, vault.name)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireItemSummary {
    pub(crate) id: String,
    pub(crate) title: String,
}

impl From<WireItemSummary> for ItemHandle {
    fn from(item: WireItemSummary) -> Self {
        ItemHandle::new(item.id, item.title)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireItem {
    #[serde(default)]
    sections: Vec<WireSection>,
    #[serde(default)]
    fields: Vec<WireField>,
}

#[derive(Debug, Deserialize)]
struct WireSection {
    id: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSectionRef {
    id: String,
}

#[derive(Deserialize)]
struct WireField {
    #[serde(default)]
    id: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    section: Option<WireSectionRef>,
}

impl std::fmt::Debug for WireField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireField")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl WireItem {
    /// Maps the wire item onto a record.
    ///
    /// Untitled sections (1Password's implicit "add more" section) are
    /// dropped and their fields become top-level fields. Fields without a
    /// value are skipped; a field without a label is titled by its id.
    pub(crate) fn into_record(self) -> VaultRecord {
        let titled: Vec<VaultSection> = self
            .sections
            .into_iter()
            .filter_map(|section| match section.label {
                Some(label) if !label.trim().is_empty() => Some(VaultSection::new(section.id, label)),
                _ => None,
            })
            .collect();

        let mut record = VaultRecord::new();
        for field in self.fields {
            let Some(value) = field.value else {
                continue;
            };
            let title = field
                .label
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| field.id.clone());
            let mut mapped = VaultField::new(title, value).with_id(field.id);
            if let Some(section) = field.section {
                if titled.iter().any(|candidate| candidate.id() == section.id) {
                    mapped = mapped.in_section(section.id);
                }
            }
            record = record.with_field(mapped);
        }

        titled
            .into_iter()
            .fold(record, VaultRecord::with_section)
    }
}
