//! Vault item records as seen by the hydrator.

use serde::{Deserialize, Serialize};

/// Normalizes a vault or schema title for matching.
///
/// Hyphens become underscores and the result is lower-cased, so a vault
/// field titled `a-string` matches the schema field `a_string`.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title.replace('-', "_").to_lowercase()
}

/// Named grouping of fields inside a vault item.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VaultSection {
    id: String,
    title: String,
}

impl VaultSection {
    /// Creates a section descriptor.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Returns the vault-assigned identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the raw title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Single field of a vault item.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VaultField {
    #[serde(default)]
    id: String,
    title: String,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    section: Option<String>,
}

impl std::fmt::Debug for VaultField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultField")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("section", &self.section)
            .finish_non_exhaustive()
    }
}

impl VaultField {
    /// Creates a top-level field.
    #[must_use]
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: title.clone(),
            title,
            value: value.into(),
            section: None,
        }
    }

    /// Sets the vault-assigned identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Places the field in the section with the supplied identifier.
    #[must_use]
    pub fn in_section(mut self, section_id: impl Into<String>) -> Self {
        self.section = Some(section_id.into());
        self
    }

    /// Returns the vault-assigned identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the raw title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the raw value, which may be an `op://` reference.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the owning section identifier, if any.
    #[must_use]
    pub fn section_id(&self) -> Option<&str> {
        self.section.as_deref()
    }
}

/// Item fetched from a vault: ordered fields plus their sections.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VaultRecord {
    #[serde(default)]
    fields: Vec<VaultField>,
    #[serde(default)]
    sections: Vec<VaultSection>,
}

impl VaultRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section.
    #[must_use]
    pub fn with_section(mut self, section: VaultSection) -> Self {
        self.sections.push(section);
        self
    }

    /// Appends a field; source order is preserved.
    #[must_use]
    pub fn with_field(mut self, field: VaultField) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns the fields in vault order.
    #[must_use]
    pub fn fields(&self) -> &[VaultField] {
        &self.fields
    }

    /// Returns the sections in vault order.
    #[must_use]
    pub fn sections(&self) -> &[VaultSection] {
        &self.sections
    }

    /// Returns the first field whose normalized title equals `name` (already
    /// normalized) and whose owning section equals `section_id`.
    ///
    /// A `section_id` of `None` only matches fields without a section.
    #[must_use]
    pub fn find_field(&self, name: &str, section_id: Option<&str>) -> Option<&VaultField> {
        self.fields
            .iter()
            .find(|field| field.section_id() == section_id && normalize_title(field.title()) == name)
    }

    /// Returns every section whose normalized title equals `name` (already normalized).
    pub fn sections_titled<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a VaultSection> {
        self.sections
            .iter()
            .filter(move |section| normalize_title(section.title()) == name)
    }
}
