//! Cumulative resistance reporting (spec.md §4.7 C7): first-isolate
//! deduplication, antibiotic-level S/I/R counts with confidence intervals,
//! mechanism-combination aggregation, period-over-period comparison, and
//! single-pass demographic stratification.

pub mod ci;
pub mod compare;
pub mod stratify;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::entities::*;
use crate::error::{EngineError, EngineResult};
use crate::store::Store;

use ci::ConfidenceInterval;

/// Tally of S/I/R outcomes for one antibiotic (or stratum). ND/NA results
/// never enter the denominator (spec.md §4.7 "Count S, I, R from Results").
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SirCounts {
    pub s: usize,
    pub i: usize,
    pub r: usize,
}

impl SirCounts {
    fn add(&mut self, interpretation: Interpretation) {
        match interpretation {
            Interpretation::S => self.s += 1,
            Interpretation::I => self.i += 1,
            Interpretation::R => self.r += 1,
            Interpretation::Nd | Interpretation::Na => {}
        }
    }

    pub fn total(&self) -> usize {
        self.s + self.i + self.r
    }

    pub fn percent_s(&self) -> f64 {
        percent(self.s, self.total())
    }

    pub fn percent_i(&self) -> f64 {
        percent(self.i, self.total())
    }

    pub fn percent_r(&self) -> f64 {
        percent(self.r, self.total())
    }

    /// S and I combined into a single "success" column (spec.md §4.7 "SEI
    /// with S").
    pub fn percent_sei(&self) -> f64 {
        percent(self.s + self.i, self.total())
    }

    pub fn ci_r(&self) -> ConfidenceInterval {
        ci::proportion_ci(self.r, self.total())
    }

    pub fn ci_sei(&self) -> ConfidenceInterval {
        ci::proportion_ci(self.s + self.i, self.total())
    }
}

fn percent(x: usize, n: usize) -> f64 {
    if n == 0 { 0.0 } else { (x as f64 / n as f64) * 100.0 }
}

/// Whether an antibiotic-level report shows base drugs or their variants —
/// the two are mutually exclusive per row (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantView {
    BaseOnly,
    VariantsOnly,
}

pub struct AntibioticAggregateRequest {
    pub tenant: TenantId,
    pub organism_tenant: TenantOrganismId,
    /// The EucastVersion interpretations are read at; an isolate captured
    /// under a different version contributes its Reinterpretation for this
    /// version when one has already been computed, else falls back to its
    /// original Result (see DESIGN.md).
    pub eucast_version: EucastVersionId,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub variant_view: VariantView,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntibioticRow {
    pub tenant_antibiotic: TenantAntibioticId,
    pub counts: SirCounts,
}

/// First-isolate-deduplicated, profile-filtered antibiotic-level counts
/// (spec.md §4.7 "Antibiotic-level aggregation").
pub fn antibiotic_level(store: &impl Store, req: &AntibioticAggregateRequest) -> EngineResult<Vec<AntibioticRow>> {
    let (organism, profile, isolates) = scoped_isolates(store, req.tenant, req.organism_tenant, req.from, req.to)?;

    let mut rows = Vec::new();
    for entry in &profile.entries {
        if !entry.show_in_report {
            continue;
        }
        let Some(ta) = store.get_tenant_antibiotic(entry.tenant_antibiotic) else { continue };
        let Some(antibiotic) = store.get_antibiotic(ta.antibiotic) else { continue };
        if organism.is_intrinsically_resistant(antibiotic) {
            continue;
        }
        let wants_variant = matches!(req.variant_view, VariantView::VariantsOnly);
        if antibiotic.is_variant() != wants_variant {
            continue;
        }

        let mut counts = SirCounts::default();
        for isolate in &isolates {
            if let Some(interpretation) = resolved_interpretation(store, isolate, entry.tenant_antibiotic, req.eucast_version) {
                counts.add(interpretation);
            }
        }
        rows.push(AntibioticRow { tenant_antibiotic: entry.tenant_antibiotic, counts });
    }
    Ok(rows)
}

/// One distinct combination of detected mechanisms, with its isolate count
/// and the frequency of each subtype seen within it (spec.md §4.7
/// "Mechanism aggregation" — "A + B" is a distinct row from "A").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanismCombinationRow {
    pub mechanisms: std::collections::BTreeSet<ResistanceMechanismId>,
    pub isolate_count: usize,
    pub subtype_frequencies: BTreeMap<MechanismSubtypeId, usize>,
}

pub fn mechanism_combinations(isolates: &[Isolate]) -> Vec<MechanismCombinationRow> {
    let mut grouped: BTreeMap<std::collections::BTreeSet<ResistanceMechanismId>, MechanismCombinationRow> = BTreeMap::new();
    for isolate in isolates {
        let row = grouped.entry(isolate.mechanisms.clone()).or_insert_with(|| MechanismCombinationRow {
            mechanisms: isolate.mechanisms.clone(),
            isolate_count: 0,
            subtype_frequencies: BTreeMap::new(),
        });
        row.isolate_count += 1;
        for subtype in &isolate.subtypes {
            *row.subtype_frequencies.entry(*subtype).or_insert(0) += 1;
        }
    }
    grouped.into_values().collect()
}

/// Single-pass stratification across the six dimensions spec.md §4.7 names,
/// for one antibiotic (the granularity every other aggregation row shares).
pub struct StratifiedRows {
    pub by_scope: Vec<(ScopeId, SirCounts)>,
    pub by_service: Vec<(ServiceId, SirCounts)>,
    pub by_sex: Vec<(Sex, SirCounts)>,
    pub by_age_group: Vec<(AgeGroup, SirCounts)>,
    pub by_sample_category: Vec<(SampleCategoryId, SirCounts)>,
    pub by_sex_and_age_group: Vec<((Sex, AgeGroup), SirCounts)>,
}

pub fn stratify_antibiotic(
    store: &impl Store,
    isolates: &[Isolate],
    tenant_antibiotic: TenantAntibioticId,
    version: EucastVersionId,
) -> StratifiedRows {
    let mut scope_entries = Vec::new();
    let mut service_entries = Vec::new();
    let mut sex_entries = Vec::new();
    let mut age_entries = Vec::new();
    let mut category_entries = Vec::new();
    let mut sex_age_entries = Vec::new();
    let mut category_ignore_min: BTreeMap<SampleCategoryId, bool> = BTreeMap::new();

    for isolate in isolates {
        let Some(interpretation) = resolved_interpretation(store, isolate, tenant_antibiotic, version) else { continue };
        let Some(record) = store.get_record(isolate.record) else { continue };
        let Some(sample_type) = store.get_tenant_sample_type(record.sample_type) else { continue };

        scope_entries.push((record.scope, interpretation));
        service_entries.push((record.service, interpretation));
        sex_entries.push((record.sex, interpretation));
        let age_group = AgeGroup::of(record.age);
        age_entries.push((age_group, interpretation));
        category_entries.push((sample_type.category, interpretation));
        sex_age_entries.push(((record.sex, age_group), interpretation));
        category_ignore_min.insert(sample_type.category, sample_type.ignore_min);
    }

    let category_bypass = |category: &SampleCategoryId| category_ignore_min.get(category).copied().unwrap_or(false);

    StratifiedRows {
        by_scope: stratify::stratify(&scope_entries, |_| false),
        by_service: stratify::stratify(&service_entries, |_| false),
        by_sex: stratify::stratify(&sex_entries, |_| false),
        by_age_group: stratify::stratify(&age_entries, |_| false),
        by_sample_category: stratify::stratify(&category_entries, category_bypass),
        by_sex_and_age_group: stratify::stratify(&sex_age_entries, |_| false),
    }
}

/// Exposed for `trend`, which performs the same first-isolate/organism
/// scoping over its own (wider) date range before slicing by period.
pub(crate) fn scoped_isolates(
    store: &impl Store,
    tenant: TenantId,
    organism_tenant: TenantOrganismId,
    from: NaiveDate,
    to: NaiveDate,
) -> EngineResult<(Organism, Profile, Vec<Isolate>)> {
    let tenant_organism =
        store.get_tenant_organism(organism_tenant).cloned().ok_or_else(|| EngineError::Domain("unknown tenant organism".into()))?;
    let organism = store
        .get_organism(tenant_organism.organism)
        .cloned()
        .ok_or_else(|| EngineError::Domain("tenant organism references an unknown global organism".into()))?;
    let profile = store
        .profile_for_group(tenant, organism.eucast_group)
        .cloned()
        .ok_or_else(|| EngineError::Domain(format!("no Profile for EUCAST group {}", organism.eucast_group)))?;

    let isolates = store
        .first_isolate_per_patient_hash(tenant, from, to)
        .into_iter()
        .filter_map(|id| store.get_isolate(id).cloned())
        .filter(|isolate| isolate.tenant_organism == organism_tenant)
        .collect();

    Ok((organism, profile, isolates))
}

/// The interpretation an isolate contributes for one antibiotic at
/// `version`: its own Result when captured at that version, else the
/// Reinterpretation computed for it, falling back to the original
/// interpretation if reinterpretation hasn't run yet (see DESIGN.md).
/// Exposed for `trend`'s per-period antibiotic series, which needs the same
/// Result/Reinterpretation resolution policy isolate-by-isolate.
pub(crate) fn resolved_interpretation(store: &impl Store, isolate: &Isolate, tenant_antibiotic: TenantAntibioticId, version: EucastVersionId) -> Option<Interpretation> {
    let result = store.results_for_isolate(isolate.id).into_iter().find(|r| r.tenant_antibiotic == tenant_antibiotic)?;
    if isolate.eucast_version == version {
        return Some(result.interpretation);
    }
    match store.reinterpretation_for(result.id, version) {
        Some(reinterpretation) => Some(reinterpretation.new_interpretation),
        None => Some(result.interpretation),
    }
}
