use serde::{Deserialize, Serialize};

use super::ids::{ScopeId, ServiceId, TenantId};

/// Biological sex as captured on the lab record. A fixed two-value enum: the
/// alias cache (`alias_cache`) maps free text ("m", "varon", "hombre", ...) to
/// one of these; it does not grow new variants per tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

/// Per-tenant catalog entry for "scope" (ambito) — every hospital names its
/// own care settings (inpatient/outpatient/emergency/ICU), so there is no
/// global counterpart; resolution is purely alias-driven (spec.md §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub id: ScopeId,
    pub tenant: TenantId,
    pub name: String,
    pub aliases: Vec<String>,
}

/// Per-tenant catalog entry for "service" (servicio), e.g. Urology, ICU,
/// Internal Medicine. Same rationale as `Scope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub tenant: TenantId,
    pub name: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AgeGroup {
    Under15,
    Between15And70,
    Over70,
}

impl AgeGroup {
    /// Stratification bucket used by aggregation (spec.md §4.7).
    pub fn of(age: f64) -> AgeGroup {
        if age < 15.0 {
            AgeGroup::Under15
        } else if age <= 70.0 {
            AgeGroup::Between15And70
        } else {
            AgeGroup::Over70
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Under15 => "<15",
            AgeGroup::Between15And70 => "15-70",
            AgeGroup::Over70 => ">70",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_group_boundaries_match_spec() {
        assert_eq!(AgeGroup::of(14.9), AgeGroup::Under15);
        assert_eq!(AgeGroup::of(15.0), AgeGroup::Between15And70);
        assert_eq!(AgeGroup::of(70.0), AgeGroup::Between15And70);
        assert_eq!(AgeGroup::of(70.1), AgeGroup::Over70);
    }
}
