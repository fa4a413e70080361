//! Capability recognition by name.
//!
//! A marker is recognized when the fully-qualified type name reported by the provider equals the expected name. No
//! type identity is involved, so markers from both support-library layouts are recognized even when both are loaded
//! at once.

use attrun_core::markers::{self, ALLOW_DERIVED_TYPES_ARG, EXPECTED_EXCEPTION_TYPE_ARG, MarkerId};
use attrun_core::LifecycleRole;

use crate::metadata::{Marker, MetadataProvider};

/// A marker matched against a known capability.
#[derive(Debug, Clone, Copy)]
pub struct RecognizedMarker<'m> {
    pub id: MarkerId,
    pub marker: &'m Marker,
}

/// Expected-exception specification read from a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedException {
    pub type_name: String,
    pub allow_derived: bool,
}

impl RecognizedMarker<'_> {
    /// Read the expected-exception arguments. `None` if this isn't an expected-exception marker or has no type.
    pub fn expected_exception(&self) -> Option<ExpectedException> {
        if self.id != MarkerId::ExpectedException {
            return None;
        }
        let type_name = self.marker.text_arg(EXPECTED_EXCEPTION_TYPE_ARG)?;
        Some(ExpectedException {
            type_name: type_name.to_string(),
            allow_derived: self.marker.bool_arg(ALLOW_DERIVED_TYPES_ARG).unwrap_or(false),
        })
    }
}

/// Recognize `marker` as the capability named `expected_full_name`.
pub fn recognize<'m>(
    provider: &dyn MetadataProvider,
    marker: &'m Marker,
    expected_full_name: &str,
) -> Option<RecognizedMarker<'m>> {
    let name = provider.fully_qualified_name(marker);
    if name != expected_full_name {
        return None;
    }
    markers::from_str(name).map(|id| RecognizedMarker { id, marker })
}

/// Find the first marker in `found` that is the capability `id`.
pub fn find<'m>(provider: &dyn MetadataProvider, found: &'m [Marker], id: MarkerId) -> Option<RecognizedMarker<'m>> {
    let expected = markers::as_str(id);
    found.iter().find_map(|m| recognize(provider, m, expected))
}

pub fn has(provider: &dyn MetadataProvider, found: &[Marker], id: MarkerId) -> bool {
    find(provider, found, id).is_some()
}

/// Every distinct lifecycle role assigned by `found`, in role order.
pub fn roles(provider: &dyn MetadataProvider, found: &[Marker]) -> Vec<LifecycleRole> {
    LifecycleRole::ALL
        .into_iter()
        .filter(|role| has(provider, found, role.marker()))
        .collect()
}
