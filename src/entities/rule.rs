use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::demographics::Sex;
use super::ids::{
    AntibioticId, BreakpointRuleId, EucastGroupId, EucastVersionId, OrganismId,
    SampleCategoryId, TaxonConditionId,
};

/// Yearly EUCAST rulebook release with a validity window (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EucastVersion {
    pub id: EucastVersionId,
    pub year: i32,
    pub label: String,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
}

impl EucastVersion {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && self.valid_until.is_none_or(|end| date <= end)
    }
}

/// The specificity level a `TaxonCondition` predicate is built at (spec.md
/// §4.3). `Custom` means "only exact organism membership, no broader-rank
/// fallback".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxonScope {
    Group,
    Family,
    Genus,
    Species,
    Custom,
}

/// Reusable taxonomic predicate (spec.md §3, §4.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonCondition {
    pub id: TaxonConditionId,
    pub scope: TaxonScope,
    pub include: HashSet<OrganismId>,
    pub exclude: HashSet<OrganismId>,
}

/// (Antibiotic, EucastGroup?, TaxonConditions?, SampleCategory?, age range?,
/// Sex?, breakpoints, version) — spec.md §3 "BreakpointRule". Any numeric
/// field may be null independently; semantics live in `rules::interpret`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointRule {
    pub id: BreakpointRuleId,
    pub antibiotic: AntibioticId,
    pub eucast_group: Option<EucastGroupId>,
    pub taxon_conditions: Vec<TaxonConditionId>,
    pub sample_categories: Vec<SampleCategoryId>,
    pub age_min: Option<f64>,
    pub age_max: Option<f64>,
    pub sex: Option<Sex>,
    pub s_mic_max: Option<f64>,
    pub r_mic_min: Option<f64>,
    pub s_halo_min: Option<f64>,
    pub r_halo_max: Option<f64>,
    pub version: EucastVersionId,
}
