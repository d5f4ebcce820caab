use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ids::{AntibioticId, MechanismSubtypeId, ResistanceMechanismId, TenantId};

/// Global resistance mechanism (e.g. ESBL) (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResistanceMechanism {
    pub id: ResistanceMechanismId,
    pub name: String,
}

/// Every subtype has exactly one parent mechanism (e.g. OXA-48 under
/// carbapenemases) (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MechanismSubtype {
    pub id: MechanismSubtypeId,
    pub name: String,
    pub parent: ResistanceMechanismId,
}

/// Per-tenant overlay carrying aliases and the set of antibiotics forced to R
/// when this mechanism is detected (spec.md §3, §4.5 step 5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMechanism {
    pub tenant: TenantId,
    pub mechanism: ResistanceMechanismId,
    pub aliases: Vec<String>,
    pub acquired_resistance: HashSet<AntibioticId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMechanismSubtype {
    pub tenant: TenantId,
    pub subtype: MechanismSubtypeId,
    pub aliases: Vec<String>,
    pub acquired_resistance: HashSet<AntibioticId>,
}
