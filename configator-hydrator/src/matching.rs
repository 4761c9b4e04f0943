//! Schema-to-vault matching helpers.

use configator_primitives::{VaultField, VaultRecord, VaultSection, normalize_title};

use crate::error::{HydrateError, HydrateResult};

/// Joins a parent path and a field name with `.`.
pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}.{name}")
    }
}

/// Finds the single section titled like the nested field `name`.
pub(crate) fn locate_section<'r>(
    record: &'r VaultRecord,
    name: &str,
    schema: &str,
    path: &str,
) -> HydrateResult<&'r VaultSection> {
    let normalized = normalize_title(name);
    let mut matches = record.sections_titled(&normalized);
    let Some(section) = matches.next() else {
        return Err(HydrateError::SectionNotFound {
            section: name.to_owned(),
            schema: schema.to_owned(),
            path: path.to_owned(),
        });
    };
    let extra = matches.count();
    if extra > 0 {
        return Err(HydrateError::AmbiguousSection {
            section: name.to_owned(),
            count: extra + 1,
            path: path.to_owned(),
        });
    }
    Ok(section)
}

/// Finds the first field titled like `name` inside `section` (top level when `None`).
pub(crate) fn locate_field<'r>(
    record: &'r VaultRecord,
    name: &str,
    section: Option<&VaultSection>,
) -> Option<&'r VaultField> {
    record.find_field(&normalize_title(name), section.map(VaultSection::id))
}
