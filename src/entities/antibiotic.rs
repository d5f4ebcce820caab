use serde::{Deserialize, Serialize};

use super::ids::{AntibioticId, EucastGroupId, TenantAntibioticId, TenantId};

/// Administration route and clinical indication only apply to variants
/// (spec.md §3 "Antibiotic (global)").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantClinicalContext {
    pub administration_route: String,
    pub indication: String,
}

/// Canonical, tenant-independent drug. `parent.is_some()` is the sole source of
/// truth for "is this a variant" — spec.md §3's `is_variant ⇔ parent is not
/// null` invariant is upheld by construction rather than by a second field that
/// could drift out of sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Antibiotic {
    pub id: AntibioticId,
    pub name: String,
    pub abbreviation: String,
    pub family: String,
    pub parent: Option<AntibioticId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_context: Option<VariantClinicalContext>,
}

impl Antibiotic {
    pub fn is_variant(&self) -> bool {
        self.parent.is_some()
    }

    /// The antibiotic itself if it's a base drug, or its parent if it's a
    /// variant. Breakpoint rules and the intrinsic-resistance set are keyed on
    /// the base drug (spec.md §3, §4.5).
    pub fn base_id(&self) -> AntibioticId {
        self.parent.unwrap_or(self.id)
    }
}

/// Per-tenant materialization of a global `Antibiotic` (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantAntibiotic {
    pub id: TenantAntibioticId,
    pub tenant: TenantId,
    pub antibiotic: AntibioticId,
    pub report_order: i32,
    pub aliases: Vec<String>,
}

/// Bucket used by `EucastGroup` and profile grouping (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EucastGroup {
    pub id: EucastGroupId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Antibiotic {
        Antibiotic {
            id: AntibioticId(1),
            name: "Amoxicillin".into(),
            abbreviation: "AMX".into(),
            family: "Penicillins".into(),
            parent: None,
            variant_context: None,
        }
    }

    #[test]
    fn base_drug_is_its_own_base_id() {
        let amx = base();
        assert!(!amx.is_variant());
        assert_eq!(amx.base_id(), amx.id);
    }

    #[test]
    fn variant_reports_parent_as_base_id() {
        let mut variant = base();
        variant.id = AntibioticId(2);
        variant.parent = Some(AntibioticId(1));
        assert!(variant.is_variant());
        assert_eq!(variant.base_id(), AntibioticId(1));
    }
}
