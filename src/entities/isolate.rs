use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ids::{
    EucastVersionId, IsolateId, MechanismSubtypeId, RecordId, ResistanceMechanismId, TenantId,
    TenantOrganismId,
};

/// One organism recovered from a `Record` (spec.md §3 "Isolate"). Multiple
/// isolates per record are allowed; duplicate isolates (§4.5) never make it
/// this far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Isolate {
    pub id: IsolateId,
    pub tenant: TenantId,
    pub record: RecordId,
    pub tenant_organism: TenantOrganismId,
    pub eucast_version: EucastVersionId,
    /// `BTreeSet` rather than `HashSet` so the duplicate-detection signature
    /// (spec.md §4.5 step 6) is deterministic to serialize and compare.
    pub mechanisms: BTreeSet<ResistanceMechanismId>,
    pub subtypes: BTreeSet<MechanismSubtypeId>,
}
