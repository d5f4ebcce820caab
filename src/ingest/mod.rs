//! The ingestion pipeline (spec.md §4.5 C5): demographic resolution, Record
//! get-or-create, antibiogram extraction, mechanism detection, acquired-
//! resistance override, duplicate detection, Isolate/Result creation, and
//! orphan Record cleanup.

pub mod row;
pub mod source;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::alias_cache::AliasCache;
use crate::config::Config;
use crate::entities::*;
use crate::error::{EngineError, EngineResult};
use crate::mechanism_detector::{self, DetectionResult};
use crate::parse;
use crate::rules::applicable_rules;
use crate::store::Store;
use crate::text;

use row::Row;

/// Semantic columns the caller maps onto actual sheet/CSV headers (spec.md
/// §6). The organism is not one of these: in the source this pipeline is
/// grounded on, the microorganism is chosen once per upload, not read per
/// row, so `run` takes it as a parameter alongside the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticField {
    Nh,
    Age,
    Date,
    Sex,
    Scope,
    Service,
    SampleType,
    Observations,
}

pub type ColumnMapping = HashMap<SemanticField, String>;

/// One row's failure to become a Record (spec.md §9 `PerRowError`).
#[derive(Debug, Clone)]
pub struct PerRowError {
    pub row: usize,
    pub message: String,
}

/// Outcome of ingesting one sheet/file (spec.md §4.5 "progress counters").
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub isolates_created: usize,
    pub duplicates: usize,
    pub rows_skipped: usize,
    pub errors: Vec<PerRowError>,
}

impl IngestReport {
    fn merge(&mut self, other: IngestReport) {
        self.isolates_created += other.isolates_created;
        self.duplicates += other.duplicates;
        self.rows_skipped += other.rows_skipped;
        self.errors.extend(other.errors);
    }
}

/// Tenant-scoped lookup caches, built once per job and read-only within it
/// (spec.md §5 "Shared-resource policy").
pub struct TenantCatalog {
    pub sex: AliasCache<Sex>,
    pub scope: AliasCache<Scope>,
    pub service: AliasCache<Service>,
    pub sample_type: AliasCache<TenantSampleType>,
    pub antibiotic_alias: AliasCache<TenantAntibioticId>,
    pub interpretation_alias: AliasCache<Interpretation>,
    pub positive_tokens: Vec<String>,
}

impl TenantCatalog {
    /// Builds every alias cache for a tenant from the store's current
    /// snapshot. Intended to run once at job start (spec.md §5).
    pub fn build(store: &impl Store, tenant: TenantId) -> Self {
        let mut sex = AliasCache::new();
        sex.register(Sex::Male, "hombre", &["varon".to_string(), "m".to_string()]);
        sex.register(Sex::Female, "mujer", &["v".to_string(), "f".to_string()]);

        let mut scope = AliasCache::new();
        for s in store.scopes(tenant) {
            scope.register(s.clone(), &s.name, &s.aliases);
        }

        let mut service = AliasCache::new();
        for s in store.services(tenant) {
            service.register(s.clone(), &s.name, &s.aliases);
        }

        let mut sample_type = AliasCache::new();
        for s in store.tenant_sample_types(tenant) {
            sample_type.register(s.clone(), &s.name, &s.aliases);
        }

        let mut antibiotic_alias = AliasCache::new();
        for ta in store.tenant_antibiotics(tenant) {
            let name = store.get_antibiotic(ta.antibiotic).map(|a| a.name.clone()).unwrap_or_default();
            antibiotic_alias.register(ta.id, &name, &ta.aliases);
        }

        let mut interpretation_alias = AliasCache::new();
        for alias in store.interpretation_aliases(tenant) {
            for synonym in &alias.synonyms {
                interpretation_alias.register(alias.category, synonym, &[]);
            }
        }

        let positive_tokens = store.positive_tokens(tenant).into_iter().map(str::to_string).collect();

        TenantCatalog { sex, scope, service, sample_type, antibiotic_alias, interpretation_alias, positive_tokens }
    }
}

struct Demographics {
    patient_hash: String,
    age: Option<f64>,
    date: NaiveDate,
    sex: Sex,
    scope: ScopeId,
    service: ServiceId,
    sample_type: SampleTypeId,
}

/// Resolves the demographic fields of one row (spec.md §4.5 step 1). Any
/// missing mandatory field (date, sex, scope, service, sample type) makes the
/// row unusable.
fn resolve_demographics(
    row: &Row,
    mapping: &ColumnMapping,
    catalog: &TenantCatalog,
    config: &Config,
    load_timestamp: i64,
    row_counter: usize,
    organism_id: u64,
) -> Result<Demographics, String> {
    let date_raw = row.get_mapped(mapping.get(&SemanticField::Date).map(String::as_str));
    let date = parse::parse_date(&date_raw).ok_or_else(|| "unparseable or missing date".to_string())?;

    let nh_raw = row.get_mapped(mapping.get(&SemanticField::Nh).map(String::as_str));
    let patient_hash = if nh_raw.is_empty() {
        text::fallback_hash(load_timestamp, row_counter, organism_id)
    } else {
        text::hash_nh(config, Some(&nh_raw)).expect("nh_raw is non-empty")
    };

    let age_raw = row.get_mapped(mapping.get(&SemanticField::Age).map(String::as_str));
    let age = parse::parse_age(&age_raw);

    let sex_raw = row.get_mapped(mapping.get(&SemanticField::Sex).map(String::as_str));
    let sex = *catalog.sex.lookup_exact(&sex_raw).ok_or_else(|| format!("unrecognized sex '{sex_raw}'"))?;

    let scope_raw = row.get_mapped(mapping.get(&SemanticField::Scope).map(String::as_str));
    let scope = catalog.scope.lookup_exact(&scope_raw).ok_or_else(|| format!("unrecognized scope '{scope_raw}'"))?.id;

    let service_raw = row.get_mapped(mapping.get(&SemanticField::Service).map(String::as_str));
    let service =
        catalog.service.lookup_exact(&service_raw).ok_or_else(|| format!("unrecognized service '{service_raw}'"))?.id;

    let sample_raw = row.get_mapped(mapping.get(&SemanticField::SampleType).map(String::as_str));
    let sample_type = catalog
        .sample_type
        .lookup_exact(&sample_raw)
        .ok_or_else(|| format!("unrecognized sample type '{sample_raw}'"))?
        .id;

    Ok(Demographics { patient_hash, age, date, sex, scope, service, sample_type })
}

/// A final per-antibiotic call before it becomes a `LabResult` row (spec.md
/// §4.5 step 3/5/7).
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingResult {
    interpretation: Interpretation,
    mic: Option<f64>,
    halo: Option<f64>,
}

/// Extracts (interpretation, mic, halo) for one `TenantAntibiotic` by
/// scanning row headers for its aliases, and the `cmi`/`mm` suffixed
/// variants for the numeric columns (spec.md §4.5 step 3, §6).
fn extract_antibiogram_cell(row: &Row, catalog: &TenantCatalog, ta_id: TenantAntibioticId) -> Option<PendingResult> {
    let interpretation_col = row
        .cells
        .iter()
        .find(|(header, value)| !value.trim().is_empty() && catalog.antibiotic_alias.lookup_exact(header) == Some(&ta_id));

    let mic_col = row.cells.iter().find(|(header, value)| {
        !value.trim().is_empty()
            && parse::strip_column_suffix(&crate::text::normalize(header), "cmi")
                .is_some_and(|stripped| catalog.antibiotic_alias.lookup_exact(&stripped) == Some(&ta_id))
    });

    let halo_col = row.cells.iter().find(|(header, value)| {
        !value.trim().is_empty()
            && parse::strip_column_suffix(&crate::text::normalize(header), "mm")
                .is_some_and(|stripped| catalog.antibiotic_alias.lookup_exact(&stripped) == Some(&ta_id))
    });

    if interpretation_col.is_none() && mic_col.is_none() && halo_col.is_none() {
        return None;
    }

    let interpretation = interpretation_col
        .map(|(_, value)| {
            catalog.interpretation_alias.lookup_exact(value).copied().unwrap_or_else(|| Interpretation::from_direct_text(value))
        })
        .unwrap_or(Interpretation::Nd);
    let mic = mic_col.and_then(|(_, value)| parse::parse_mic(value));
    let halo = halo_col.and_then(|(_, value)| parse::parse_halo(value));

    Some(PendingResult { interpretation, mic, halo })
}

/// Builds the final `{antibiotic -> result}` map for one isolate, applying
/// intrinsic resistance, base/variant extraction, and acquired resistance
/// (spec.md §4.5 steps 3-5).
#[allow(clippy::too_many_arguments)]
fn build_antibiogram(
    row: &Row,
    catalog: &TenantCatalog,
    store: &impl Store,
    tenant: TenantId,
    organism: &Organism,
    profile: &Profile,
    version: EucastVersionId,
    detected: &DetectionResult,
) -> BTreeMap<TenantAntibioticId, PendingResult> {
    let mut out: BTreeMap<TenantAntibioticId, PendingResult> = BTreeMap::new();

    for entry in &profile.entries {
        let Some(ta) = store.get_tenant_antibiotic(entry.tenant_antibiotic) else { continue };
        let Some(antibiotic) = store.get_antibiotic(ta.antibiotic) else { continue };
        if antibiotic.is_variant() {
            continue; // variants are derived below from their base's cell
        }

        let Some(cell) = extract_antibiogram_cell(row, catalog, entry.tenant_antibiotic) else { continue };

        if organism.is_intrinsically_resistant(antibiotic) {
            let forced = PendingResult { interpretation: Interpretation::R, mic: cell.mic, halo: cell.halo };
            out.insert(entry.tenant_antibiotic, forced);
            for variant in store.variants_of(antibiotic.id) {
                if let Some(variant_ta) = find_tenant_antibiotic(store, tenant, variant.id) {
                    out.insert(variant_ta, forced);
                }
            }
            continue;
        }

        out.insert(entry.tenant_antibiotic, cell);

        for variant in store.variants_of(antibiotic.id) {
            let Some(variant_ta) = find_tenant_antibiotic(store, tenant, variant.id) else { continue };
            let taxon_conditions: Vec<&TaxonCondition> = store.taxon_conditions();
            let rules: Vec<BreakpointRule> = store.breakpoint_rules_for(variant.id, version).into_iter().cloned().collect();
            let resolve = |id: OrganismId| store.get_organism(id);
            if let Some(rule) = applicable_rules(&rules, variant.id, organism, &taxon_conditions, &resolve, None, None, None, version).next() {
                let interpretation = rule.interpret(cell.mic, cell.halo);
                out.insert(variant_ta, PendingResult { interpretation, mic: cell.mic, halo: cell.halo });
            }
        }
    }

    apply_acquired_resistance(&mut out, store, tenant, detected);
    out
}

pub(crate) fn find_tenant_antibiotic(store: &impl Store, tenant: TenantId, antibiotic: AntibioticId) -> Option<TenantAntibioticId> {
    store.tenant_antibiotics(tenant).into_iter().find(|ta| ta.antibiotic == antibiotic).map(|ta| ta.id)
}

/// The set of base `Antibiotic`s a detected mechanism/subtype's acquired-
/// resistance list names, unioned across everything in `detected` (spec.md
/// §4.5 step 5). Shared with `reinterpret`, which applies the same override
/// against an isolate's already-stored mechanism/subtype sets.
pub(crate) fn acquired_resistance_targets(
    store: &impl Store,
    tenant: TenantId,
    mechanisms: &BTreeSet<ResistanceMechanismId>,
    subtypes: &BTreeSet<MechanismSubtypeId>,
) -> std::collections::HashSet<AntibioticId> {
    let mut targeted = std::collections::HashSet::new();
    for mechanism in store.tenant_mechanisms(tenant) {
        if mechanisms.contains(&mechanism.mechanism) {
            targeted.extend(&mechanism.acquired_resistance);
        }
    }
    for subtype in store.tenant_mechanism_subtypes(tenant) {
        if subtypes.contains(&subtype.subtype) {
            targeted.extend(&subtype.acquired_resistance);
        }
    }
    targeted
}

/// Upgrades S/I to R wherever a detected mechanism/subtype's acquired-
/// resistance set names that antibiotic, preserving mic/halo (spec.md §4.5
/// step 5).
fn apply_acquired_resistance(
    results: &mut BTreeMap<TenantAntibioticId, PendingResult>,
    store: &impl Store,
    tenant: TenantId,
    detected: &DetectionResult,
) {
    let targeted = acquired_resistance_targets(store, tenant, &detected.mechanisms, &detected.subtypes);
    if targeted.is_empty() {
        return;
    }
    for ta in store.tenant_antibiotics(tenant) {
        if !targeted.contains(&ta.antibiotic) {
            continue;
        }
        if let Some(result) = results.get_mut(&ta.id) {
            if !matches!(result.interpretation, Interpretation::R | Interpretation::Na | Interpretation::Nd) {
                result.interpretation = Interpretation::R;
            }
        }
    }
}

/// A deterministic signature over the final antibiogram, used for duplicate
/// detection (spec.md §4.5 step 6).
fn signature(results: &BTreeMap<TenantAntibioticId, PendingResult>) -> Vec<(TenantAntibioticId, &'static str, Option<i64>, Option<i64>)> {
    results
        .iter()
        .map(|(id, r)| {
            (
                *id,
                r.interpretation.as_str(),
                r.mic.map(|v| (v * 1000.0).round() as i64),
                r.halo.map(|v| (v * 1000.0).round() as i64),
            )
        })
        .collect()
}

/// Parameters shared by every row of one ingestion job.
pub struct IngestContext<'a> {
    pub tenant: TenantId,
    pub organism_tenant: TenantOrganismId,
    pub mapping: &'a ColumnMapping,
    pub catalog: &'a TenantCatalog,
    pub config: &'a Config,
    pub load_timestamp: i64,
}

/// Runs the full pipeline over every row of `sheet_rows` (one file or
/// sheet's worth), row counters starting at 1 (spec.md §5 "Ordering").
pub fn run(store: &mut impl Store, ctx: &IngestContext, sheet_rows: &[Row]) -> EngineResult<IngestReport> {
    let mut report = IngestReport::default();

    let tenant_organism =
        store.get_tenant_organism(ctx.organism_tenant).cloned().ok_or_else(|| EngineError::Domain("unknown tenant organism".into()))?;
    let organism = store
        .get_organism(tenant_organism.organism)
        .cloned()
        .ok_or_else(|| EngineError::Domain("tenant organism references an unknown global organism".into()))?;
    let profile = store
        .profile_for_group(ctx.tenant, organism.eucast_group)
        .cloned()
        .ok_or_else(|| EngineError::Domain(format!("no Profile for EUCAST group {}", organism.eucast_group)))?;

    for (index, row) in sheet_rows.iter().enumerate() {
        let row_counter = index + 1;
        let row_report = ingest_one_row(store, ctx, &organism, &profile, row, row_counter);
        match row_report {
            Ok(single) => report.merge(single),
            Err(message) => {
                report.rows_skipped += 1;
                report.errors.push(PerRowError { row: row_counter, message });
            }
        }
    }

    let orphaned = store.records_without_isolates(ctx.tenant);
    for record_id in orphaned {
        store.delete_record(record_id);
    }

    Ok(report)
}

fn ingest_one_row(
    store: &mut impl Store,
    ctx: &IngestContext,
    organism: &Organism,
    profile: &Profile,
    row: &Row,
    row_counter: usize,
) -> Result<IngestReport, String> {
    let demo = resolve_demographics(
        row,
        ctx.mapping,
        ctx.catalog,
        ctx.config,
        ctx.load_timestamp,
        row_counter,
        organism.id.0,
    )?;

    let version = store
        .version_covering(demo.date)
        .map(|v| v.id)
        .ok_or_else(|| format!("no EUCAST version covers {}", demo.date))?;

    let record = Record {
        id: RecordId::new(0),
        tenant: ctx.tenant,
        date: demo.date,
        patient_hash: demo.patient_hash,
        age: demo.age.unwrap_or(0.0),
        sex: demo.sex,
        scope: demo.scope,
        service: demo.service,
        sample_type: demo.sample_type,
    };
    let record_id = store.get_or_create_record(record);

    let observations_col = ctx.mapping.get(&SemanticField::Observations).map(String::as_str);
    let observations = row.get_mapped(observations_col);
    let mechanisms_owned = mechanism_pairs(store, ctx.tenant);
    let mechanisms: Vec<(&TenantMechanism, &str)> = mechanisms_owned.iter().map(|(m, n)| (m, n.as_str())).collect();
    let subtypes_owned = subtype_pairs(store, ctx.tenant);
    let subtypes: Vec<(&TenantMechanismSubtype, &str, ResistanceMechanismId)> =
        subtypes_owned.iter().map(|(s, n, p)| (s, n.as_str(), *p)).collect();
    let detected = mechanism_detector::detect(
        &row.cells,
        &mechanisms,
        &subtypes,
        &ctx.catalog.positive_tokens,
        if observations_col.is_some() { Some(observations.as_str()) } else { None },
    );

    let antibiogram = build_antibiogram(row, ctx.catalog, store, ctx.tenant, organism, profile, version, &detected);

    let sig = signature(&antibiogram);
    let duplicate = store.isolates_for_record(record_id).iter().any(|existing| {
        existing.tenant_organism == ctx.organism_tenant
            && signature(&results_as_pending(store, existing.id)) == sig
    });
    if duplicate {
        return Ok(IngestReport { duplicates: 1, ..Default::default() });
    }

    let isolate = Isolate {
        id: IsolateId::new(0),
        tenant: ctx.tenant,
        record: record_id,
        tenant_organism: ctx.organism_tenant,
        eucast_version: version,
        mechanisms: detected.mechanisms.clone(),
        subtypes: detected.subtypes.clone(),
    };
    let isolate_id = store.put_isolate(isolate);

    for (ta_id, pending) in &antibiogram {
        if pending.interpretation == Interpretation::Nd && pending.mic.is_none() && pending.halo.is_none() {
            continue;
        }
        store.put_result(LabResult {
            id: ResultId::new(0),
            isolate: isolate_id,
            tenant_antibiotic: *ta_id,
            interpretation: pending.interpretation,
            mic: pending.mic,
            halo: pending.halo,
        });
    }

    Ok(IngestReport { isolates_created: 1, ..Default::default() })
}

fn results_as_pending(store: &impl Store, isolate: IsolateId) -> BTreeMap<TenantAntibioticId, PendingResult> {
    store
        .results_for_isolate(isolate)
        .into_iter()
        .map(|r| (r.tenant_antibiotic, PendingResult { interpretation: r.interpretation, mic: r.mic, halo: r.halo }))
        .collect()
}

fn mechanism_pairs(store: &impl Store, tenant: TenantId) -> Vec<(TenantMechanism, String)> {
    store
        .tenant_mechanisms(tenant)
        .into_iter()
        .filter_map(|m| store.resistance_mechanisms().into_iter().find(|rm| rm.id == m.mechanism).map(|rm| (m.clone(), rm.name.clone())))
        .collect()
}

fn subtype_pairs(store: &impl Store, tenant: TenantId) -> Vec<(TenantMechanismSubtype, String, ResistanceMechanismId)> {
    store
        .tenant_mechanism_subtypes(tenant)
        .into_iter()
        .filter_map(|s| {
            store
                .mechanism_subtypes()
                .into_iter()
                .find(|subtype| subtype.id == s.subtype)
                .map(|subtype| (s.clone(), subtype.name.clone(), subtype.parent))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    fn base_store() -> (InMemoryStore, TenantId, TenantOrganismId, EucastVersionId) {
        let mut store = InMemoryStore::new();
        let tenant = TenantId(1);
        store.put_tenant(Tenant { id: tenant, name: "hosp".into(), display_name: "Hospital".into() });

        let version = EucastVersionId(1);
        store.put_eucast_version(EucastVersion {
            id: version,
            year: 2024,
            label: "2024".into(),
            valid_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            valid_until: None,
        });

        let group = EucastGroupId(1);
        store.put_eucast_group(EucastGroup { id: group, name: "Enterobacterales".into() });

        let organism_id = OrganismId(1);
        store.put_organism(Organism {
            id: organism_id,
            taxonomy: Taxonomy { kingdom: "Bacteria".into(), family: "Enterobacteriaceae".into(), genus: "Escherichia".into(), species: "coli".into() },
            eucast_group: group,
            intrinsic_resistance: Default::default(),
        });
        let tenant_organism = TenantOrganismId(1);
        store.put_tenant_organism(TenantOrganism { id: tenant_organism, tenant, organism: organism_id, aliases: vec!["e. coli".into()] });

        let ampicillin = AntibioticId(1);
        store.put_antibiotic(Antibiotic { id: ampicillin, name: "Ampicilina".into(), abbreviation: "AMP".into(), family: "Penicillins".into(), parent: None, variant_context: None });
        let ta_ampicillin = TenantAntibioticId(1);
        store.put_tenant_antibiotic(TenantAntibiotic { id: ta_ampicillin, tenant, antibiotic: ampicillin, report_order: 1, aliases: vec!["ampicilina".into()] });

        store.put_profile(Profile {
            id: ProfileId(1),
            tenant,
            eucast_group: group,
            entries: vec![ProfileAntibiotic { tenant_antibiotic: ta_ampicillin, show_in_report: true }],
        });

        store.put_scope(Scope { id: ScopeId(1), tenant, name: "hospitalizacion".into(), aliases: vec!["inpatient".into()] });
        store.put_service(Service { id: ServiceId(1), tenant, name: "urologia".into(), aliases: vec![] });
        let category = SampleCategoryId(1);
        store.put_sample_category(SampleCategory { id: category, name: "orina".into() });
        store.put_tenant_sample_type(TenantSampleType { id: SampleTypeId(1), tenant, category, name: "orina".into(), aliases: vec![], ignore_min: false });

        (store, tenant, tenant_organism, version)
    }

    #[test]
    fn ingests_a_single_row_into_one_record_one_isolate() {
        let (mut store, tenant, tenant_organism, _version) = base_store();
        let catalog = TenantCatalog::build(&store, tenant);
        let config = Config { hash_salt_pre: "pre".into(), hash_salt_post: "post".into(), fixtures_dir: "fixtures".into() };

        let mut mapping = ColumnMapping::new();
        mapping.insert(SemanticField::Nh, "nh".into());
        mapping.insert(SemanticField::Date, "fecha".into());
        mapping.insert(SemanticField::Age, "edad".into());
        mapping.insert(SemanticField::Sex, "sexo".into());
        mapping.insert(SemanticField::Scope, "ambito".into());
        mapping.insert(SemanticField::Service, "servicio".into());
        mapping.insert(SemanticField::SampleType, "tipo_muestra".into());

        let row = Row::new(vec![
            ("nh".into(), "12345".into()),
            ("fecha".into(), "2024-01-15".into()),
            ("edad".into(), "45".into()),
            ("sexo".into(), "hombre".into()),
            ("ambito".into(), "hospitalizacion".into()),
            ("servicio".into(), "urologia".into()),
            ("tipo_muestra".into(), "orina".into()),
            ("Ampicilina".into(), "R".into()),
        ]);

        let ctx = IngestContext { tenant, organism_tenant: tenant_organism, mapping: &mapping, catalog: &catalog, config: &config, load_timestamp: 1_700_000_000 };
        let report = run(&mut store, &ctx, std::slice::from_ref(&row)).unwrap();

        assert_eq!(report.isolates_created, 1);
        assert_eq!(report.duplicates, 0);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn duplicate_row_is_not_ingested_twice() {
        let (mut store, tenant, tenant_organism, _version) = base_store();
        let catalog = TenantCatalog::build(&store, tenant);
        let config = Config { hash_salt_pre: "pre".into(), hash_salt_post: "post".into(), fixtures_dir: "fixtures".into() };
        let mut mapping = ColumnMapping::new();
        mapping.insert(SemanticField::Nh, "nh".into());
        mapping.insert(SemanticField::Date, "fecha".into());
        mapping.insert(SemanticField::Age, "edad".into());
        mapping.insert(SemanticField::Sex, "sexo".into());
        mapping.insert(SemanticField::Scope, "ambito".into());
        mapping.insert(SemanticField::Service, "servicio".into());
        mapping.insert(SemanticField::SampleType, "tipo_muestra".into());

        let row = Row::new(vec![
            ("nh".into(), "12345".into()),
            ("fecha".into(), "2024-01-15".into()),
            ("edad".into(), "45".into()),
            ("sexo".into(), "hombre".into()),
            ("ambito".into(), "hospitalizacion".into()),
            ("servicio".into(), "urologia".into()),
            ("tipo_muestra".into(), "orina".into()),
            ("Ampicilina".into(), "R".into()),
        ]);

        let ctx = IngestContext { tenant, organism_tenant: tenant_organism, mapping: &mapping, catalog: &catalog, config: &config, load_timestamp: 1_700_000_000 };
        let rows = vec![row.clone(), row];
        let report = run(&mut store, &ctx, &rows).unwrap();

        assert_eq!(report.isolates_created, 1);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn row_missing_mandatory_demographic_produces_no_record() {
        let (mut store, tenant, tenant_organism, _version) = base_store();
        let catalog = TenantCatalog::build(&store, tenant);
        let config = Config { hash_salt_pre: "pre".into(), hash_salt_post: "post".into(), fixtures_dir: "fixtures".into() };
        let mapping = ColumnMapping::new(); // no columns mapped at all

        let row = Row::new(vec![("Ampicilina".into(), "R".into())]);
        let ctx = IngestContext { tenant, organism_tenant: tenant_organism, mapping: &mapping, catalog: &catalog, config: &config, load_timestamp: 1 };
        let report = run(&mut store, &ctx, std::slice::from_ref(&row)).unwrap();

        assert_eq!(report.isolates_created, 0);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.errors.len(), 1);
    }
}
