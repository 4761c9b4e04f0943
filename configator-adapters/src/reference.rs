//! `op://` secret references.
//!
//! Format: `op://<vault>/<item>[/<section>]/<field>[?attribute=...]`. Each
//! segment matches either the id or the title of the addressed object.

use std::fmt;

use configator_primitives::{VaultField, VaultRecord};

use crate::traits::{VaultError, VaultResult};

/// Scheme prefix marking a value as an indirect reference.
pub const REFERENCE_SCHEME: &str = "op://";

/// Whether the value is an indirect reference rather than a plain value.
#[must_use]
pub fn is_reference(value: &str) -> bool {
    value.starts_with(REFERENCE_SCHEME)
}

/// Whether a vault object with `id` and `title` is addressed by `segment`.
///
/// Ids match exactly, titles case-insensitively.
#[must_use]
pub fn matches_segment(id: &str, title: &str, segment: &str) -> bool {
    id == segment || title.eq_ignore_ascii_case(segment)
}

/// Parsed `op://` reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretReference {
    vault: String,
    item: String,
    section: Option<String>,
    field: String,
}

impl SecretReference {
    /// Parses a reference.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidReference`] when the scheme is missing, a
    /// segment is empty, or the segment count is not three or four.
    pub fn parse(link: &str) -> VaultResult<Self> {
        let invalid = |reason: &str| VaultError::InvalidReference {
            reference: link.to_owned(),
            reason: reason.to_owned(),
        };

        let rest = link
            .strip_prefix(REFERENCE_SCHEME)
            .ok_or_else(|| invalid("missing op:// scheme"))?;
        let path = rest.split_once('?').map_or(rest, |(path, _query)| path);

        let parts: Vec<&str> = path.split('/').collect();
        if parts.iter().any(|part| part.is_empty()) {
            return Err(invalid("reference segments must be non-empty"));
        }

        match parts.as_slice() {
            [vault, item, field] => Ok(Self {
                vault: (*vault).to_owned(),
                item: (*item).to_owned(),
                section: None,
                field: (*field).to_owned(),
            }),
            [vault, item, section, field] => Ok(Self {
                vault: (*vault).to_owned(),
                item: (*item).to_owned(),
                section: Some((*section).to_owned()),
                field: (*field).to_owned(),
            }),
            _ => Err(invalid(
                "expected op://<vault>/<item>[/<section>]/<field>",
            )),
        }
    }

    /// Returns the vault segment.
    #[must_use]
    pub fn vault(&self) -> &str {
        &self.vault
    }

    /// Returns the item segment.
    #[must_use]
    pub fn item(&self) -> &str {
        &self.item
    }

    /// Returns the section segment, if present.
    #[must_use]
    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// Returns the field segment.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Finds the addressed field inside an already fetched item.
    ///
    /// Without a section segment the first field in any section matches.
    #[must_use]
    pub fn locate<'r>(&self, record: &'r VaultRecord) -> Option<&'r VaultField> {
        let section_ids: Option<Vec<&str>> = self.section.as_deref().map(|segment| {
            record
                .sections()
                .iter()
                .filter(|section| matches_segment(section.id(), section.title(), segment))
                .map(|section| section.id())
                .collect()
        });

        record.fields().iter().find(|field| {
            let in_section = match (&section_ids, field.section_id()) {
                (None, _) => true,
                (Some(ids), Some(owner)) => ids.contains(&owner),
                (Some(_), None) => false,
            };
            in_section && matches_segment(field.id(), field.title(), &self.field)
        })
    }

    /// Like [`Self::locate`], but returns the raw value or a not-found error.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::NotFound`] when no field matches.
    pub fn value_in(&self, record: &VaultRecord) -> VaultResult<String> {
        self.locate(record)
            .map(|field| field.value().to_owned())
            .ok_or_else(|| VaultError::not_found(format!("field referenced by `{self}`")))
    }
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REFERENCE_SCHEME}{}/{}/", self.vault, self.item)?;
        if let Some(section) = &self.section {
            write!(f, "{section}/")?;
        }
        f.write_str(&self.field)
    }
}

#[cfg(test)]
mod tests {
    use configator_primitives::VaultSection;

    use super::*;

    #[test]
    fn detects_scheme() {
        assert!(is_reference("op://vault/item/field"));
        assert!(!is_reference("mixpanel"));
        assert!(!is_reference(" op://vault/item/field"));
    }

    #[test]
    fn parses_three_segments() {
        let reference = SecretReference::parse("op://Work/API Key/credential").unwrap();
        assert_eq!(reference.vault(), "Work");
        assert_eq!(reference.item(), "API Key");
        assert_eq!(reference.section(), None);
        assert_eq!(reference.field(), "credential");
    }

    #[test]
    fn parses_section_and_strips_query() {
        let reference = SecretReference::parse("op://v/i/APP/token?attribute=otp").unwrap();
        assert_eq!(reference.section(), Some("APP"));
        assert_eq!(reference.field(), "token");
        assert_eq!(reference.to_string(), "op://v/i/APP/token");
    }

    #[test]
    fn rejects_malformed_references() {
        for link in ["vault/item/field", "op://vault/item", "op://vault//field", "op://a/b/c/d/e"] {
            let err = SecretReference::parse(link).expect_err(link);
            assert!(matches!(err, VaultError::InvalidReference { .. }), "{link}");
        }
    }

    #[test]
    fn locate_honours_section_segment() {
        let record = VaultRecord::new()
            .with_section(VaultSection::new("s1", "APP"))
            .with_section(VaultSection::new("s2", "ENV"))
            .with_field(VaultField::new("token", "app-token").in_section("s1"))
            .with_field(VaultField::new("token", "env-token").in_section("s2"));

        let scoped = SecretReference::parse("op://v/i/env/token").unwrap();
        assert_eq!(scoped.value_in(&record).unwrap(), "env-token");

        let unscoped = SecretReference::parse("op://v/i/token").unwrap();
        assert_eq!(unscoped.value_in(&record).unwrap(), "app-token");

        let missing = SecretReference::parse("op://v/i/APP/password").unwrap();
        assert!(matches!(missing.value_in(&record), Err(VaultError::NotFound { .. })));
    }
}
