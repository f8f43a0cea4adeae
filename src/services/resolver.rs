//! Reference resolution.
//!
//! A [`VersionRef`] names a version either by number or by label. An explicit
//! number wins when that version exists; otherwise the reference falls back
//! to the label spelled exactly like the reference, so labels called `"2"` or
//! `"007"` stay reachable when no such version exists.

use crate::models::{VersionRef, validate_prompt_id};
use crate::storage::LedgerStore;
use crate::{Error, Result};

/// Resolves a reference to a concrete version number.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for `Version(0)` or an invalid prompt id,
/// and [`Error::NotFound`] if neither the version nor a label of that name
/// exists.
pub fn resolve(store: &dyn LedgerStore, prompt_id: &str, reference: &VersionRef) -> Result<u32> {
    validate_prompt_id(prompt_id)?;

    match reference {
        VersionRef::Version(0) => Err(Error::InvalidInput(
            "version references must be positive".to_string(),
        )),
        VersionRef::Version(n) => resolve_numeric(store, prompt_id, Some(*n), &n.to_string()),
        VersionRef::Numeric(text) => resolve_numeric(store, prompt_id, reference.as_version(), text),
        VersionRef::Label(name) => {
            let version = store.get_label(prompt_id, name)?;
            tracing::debug!(prompt_id, label = %name, version, "resolved label");
            Ok(version)
        },
    }
}

/// Resolves integer-looking text: the version wins when it exists, else the
/// label spelled exactly like `text`.
fn resolve_numeric(
    store: &dyn LedgerStore,
    prompt_id: &str,
    version: Option<u32>,
    text: &str,
) -> Result<u32> {
    if let Some(n) = version.filter(|&n| n > 0)
        && store.version_exists(prompt_id, n)?
    {
        return Ok(n);
    }
    store.get_label(prompt_id, text).map_err(|e| match e {
        Error::NotFound(_) => Error::NotFound(format!("prompt '{prompt_id}' version {text}")),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewVersion;
    use crate::storage::MemoryLedgerStore;

    fn store_with(versions: usize) -> MemoryLedgerStore {
        let store = MemoryLedgerStore::new();
        for i in 0..versions {
            store
                .append("p", &NewVersion::new(format!("body {i}")))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_explicit_version() {
        let store = store_with(3);
        assert_eq!(resolve(&store, "p", &VersionRef::Version(2)).unwrap(), 2);
    }

    #[test]
    fn test_label() {
        let store = store_with(3);
        store.set_label("p", 3, "prod", None).unwrap();
        assert_eq!(resolve(&store, "p", &VersionRef::label("prod")).unwrap(), 3);
    }

    #[test]
    fn test_numeric_label_falls_back() {
        let store = store_with(3);
        // A label named "2" exists but version 2 also exists: the version wins.
        store.set_label("p", 3, "2", None).unwrap();
        assert_eq!(resolve(&store, "p", &VersionRef::Version(2)).unwrap(), 2);

        // Version 7 does not exist, so the label named "7" is used.
        store.set_label("p", 1, "7", None).unwrap();
        assert_eq!(resolve(&store, "p", &VersionRef::Version(7)).unwrap(), 1);
    }

    #[test]
    fn test_padded_number_prefers_version_then_exact_label() {
        let store = store_with(7);
        store.set_label("p", 2, "007", None).unwrap();
        let padded = VersionRef::parse("007").unwrap();

        // Version 7 exists, so it wins over the label.
        assert_eq!(resolve(&store, "p", &padded).unwrap(), 7);

        // Without version 7 the label is looked up by the caller's spelling.
        let short = store_with(3);
        short.set_label("p", 2, "007", None).unwrap();
        short.set_label("p", 3, "7", None).unwrap();
        assert_eq!(resolve(&short, "p", &padded).unwrap(), 2);
    }

    #[test]
    fn test_number_past_version_range_falls_back_to_label() {
        let store = store_with(2);
        store.set_label("p", 1, "99999999999", None).unwrap();

        let reference = VersionRef::parse("99999999999").unwrap();
        assert_eq!(resolve(&store, "p", &reference).unwrap(), 1);
        assert!(matches!(
            resolve(&store, "p", &VersionRef::parse("88888888888").unwrap()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_missing_references() {
        let store = store_with(1);
        assert!(matches!(
            resolve(&store, "p", &VersionRef::Version(5)),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            resolve(&store, "p", &VersionRef::label("prod")),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            resolve(&store, "p", &VersionRef::Version(0)),
            Err(Error::InvalidInput(_))
        ));
    }
}
