use serde::{Deserialize, Serialize};

use super::ids::{SampleCategoryId, SampleTypeId, TenantId};

/// Global sample-category bucket (e.g. urine, blood, respiratory). Breakpoint
/// rules restrict by category (spec.md §4.3), never by a tenant's raw sample
/// type string — this resolves the ambiguity spec.md §9 flags between
/// "TenantSampleType category" and "a list of TipoMuestra": the engine only
/// ever compares categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCategory {
    pub id: SampleCategoryId,
    pub name: String,
}

/// Per-tenant sample type (tipo_muestra), e.g. "orina de bolsa" -> category
/// Urine. `ignore_min` lets a tenant opt a sample type out of the n < 30
/// stratification floor in aggregation (spec.md §4.7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSampleType {
    pub id: SampleTypeId,
    pub tenant: TenantId,
    pub category: SampleCategoryId,
    pub name: String,
    pub aliases: Vec<String>,
    pub ignore_min: bool,
}
