use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ids::{EucastVersionId, IsolateId, ReinterpretationId, ResultId, TenantAntibioticId};
use super::interpretation::Interpretation;

/// A susceptibility call for one (isolate, antibiotic) pair (spec.md §3
/// "Result"). Named `LabResult` to avoid colliding with `std::result::Result`
/// in every signature that touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub id: ResultId,
    pub isolate: IsolateId,
    pub tenant_antibiotic: TenantAntibioticId,
    pub interpretation: Interpretation,
    pub mic: Option<f64>,
    pub halo: Option<f64>,
}

/// A re-evaluation of a `LabResult` at a chosen EUCAST version (spec.md §3
/// "Reinterpretation"). Unique per (result, version).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reinterpretation {
    pub id: ReinterpretationId,
    pub result: ResultId,
    pub version: EucastVersionId,
    pub new_interpretation: Interpretation,
    pub was_recomputed: bool,
    pub computed_at: NaiveDateTime,
}
