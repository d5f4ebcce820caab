//! End-to-end scenarios chaining ingestion through aggregation and trend
//! analysis over an `InMemoryStore`, one test per documented scenario.

use std::collections::HashSet;

use chrono::NaiveDate;

use amr_engine::aggregate::{self, AntibioticAggregateRequest, VariantView};
use amr_engine::config::Config;
use amr_engine::entities::*;
use amr_engine::ingest::row::Row;
use amr_engine::ingest::{self, ColumnMapping, IngestContext, SemanticField, TenantCatalog};
use amr_engine::parse;
use amr_engine::store::memory::InMemoryStore;
use amr_engine::store::Store;
use amr_engine::trend::{self, period::Grouping, TrendRequest, TrendTarget};

fn demographic_mapping() -> ColumnMapping {
    let mut mapping = ColumnMapping::new();
    mapping.insert(SemanticField::Nh, "nh".into());
    mapping.insert(SemanticField::Date, "fecha".into());
    mapping.insert(SemanticField::Age, "edad".into());
    mapping.insert(SemanticField::Sex, "sexo".into());
    mapping.insert(SemanticField::Scope, "ambito".into());
    mapping.insert(SemanticField::Service, "servicio".into());
    mapping.insert(SemanticField::SampleType, "tipo_muestra".into());
    mapping
}

fn demographic_cells(nh: &str, date: &str) -> Vec<(String, String)> {
    vec![
        ("nh".into(), nh.into()),
        ("fecha".into(), date.into()),
        ("edad".into(), "45".into()),
        ("sexo".into(), "hombre".into()),
        ("ambito".into(), "hospitalizacion".into()),
        ("servicio".into(), "urologia".into()),
        ("tipo_muestra".into(), "orina".into()),
    ]
}

fn test_config() -> Config {
    Config { hash_salt_pre: "pre".into(), hash_salt_post: "post".into(), fixtures_dir: "fixtures".into() }
}

/// A single EUCAST group/version/organism/profile setup shared by the
/// ingestion-facing scenarios: ampicillin and ciprofloxacin as plain base
/// drugs, amoxicillin-clavulanate wired into BLEE's acquired-resistance
/// list, and linezolid with a high-dose variant for the intrinsic-resistance
/// propagation scenario.
struct Fixture {
    store: InMemoryStore,
    tenant: TenantId,
    version: EucastVersionId,
    tenant_organism_ecoli: TenantOrganismId,
    ta_ampicillin: TenantAntibioticId,
    ta_ciprofloxacin: TenantAntibioticId,
    ta_amox_clav: TenantAntibioticId,
    ta_linezolid: TenantAntibioticId,
}

fn build_fixture() -> Fixture {
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

    let enterobacterales = EucastGroupId(1);
    store.put_eucast_group(EucastGroup { id: enterobacterales, name: "Enterobacterales".into() });

    let ecoli = OrganismId(1);
    store.put_organism(Organism {
        id: ecoli,
        taxonomy: Taxonomy { kingdom: "Bacteria".into(), family: "Enterobacteriaceae".into(), genus: "Escherichia".into(), species: "coli".into() },
        eucast_group: enterobacterales,
        intrinsic_resistance: HashSet::new(),
    });
    let tenant_organism_ecoli = TenantOrganismId(1);
    store.put_tenant_organism(TenantOrganism { id: tenant_organism_ecoli, tenant, organism: ecoli, aliases: vec!["e. coli".into()] });

    let ampicillin = AntibioticId(1);
    store.put_antibiotic(Antibiotic { id: ampicillin, name: "Ampicilina".into(), abbreviation: "AMP".into(), family: "Penicillins".into(), parent: None, variant_context: None });
    let ta_ampicillin = TenantAntibioticId(1);
    store.put_tenant_antibiotic(TenantAntibiotic { id: ta_ampicillin, tenant, antibiotic: ampicillin, report_order: 1, aliases: vec!["ampicilina".into()] });

    let ciprofloxacin = AntibioticId(2);
    store.put_antibiotic(Antibiotic { id: ciprofloxacin, name: "Ciprofloxacino".into(), abbreviation: "CIP".into(), family: "Fluoroquinolones".into(), parent: None, variant_context: None });
    let ta_ciprofloxacin = TenantAntibioticId(2);
    store.put_tenant_antibiotic(TenantAntibiotic { id: ta_ciprofloxacin, tenant, antibiotic: ciprofloxacin, report_order: 2, aliases: vec!["ciprofloxacino".into()] });

    let amox_clav = AntibioticId(3);
    store.put_antibiotic(Antibiotic { id: amox_clav, name: "Amoxicilina-clavulanico".into(), abbreviation: "AMC".into(), family: "Penicillins".into(), parent: None, variant_context: None });
    let ta_amox_clav = TenantAntibioticId(3);
    store.put_tenant_antibiotic(TenantAntibiotic { id: ta_amox_clav, tenant, antibiotic: amox_clav, report_order: 3, aliases: vec!["amoxicilina-clavulanico".into()] });
    store.put_breakpoint_rule(BreakpointRule {
        id: BreakpointRuleId(1),
        antibiotic: amox_clav,
        eucast_group: Some(enterobacterales),
        taxon_conditions: vec![],
        sample_categories: vec![],
        age_min: None,
        age_max: None,
        sex: None,
        s_mic_max: Some(8.0),
        r_mic_min: Some(8.0),
        s_halo_min: None,
        r_halo_max: None,
        version,
    });

    let linezolid = AntibioticId(5);
    store.put_antibiotic(Antibiotic { id: linezolid, name: "Linezolid".into(), abbreviation: "LNZ".into(), family: "Oxazolidinones".into(), parent: None, variant_context: None });
    let ta_linezolid = TenantAntibioticId(5);
    store.put_tenant_antibiotic(TenantAntibiotic { id: ta_linezolid, tenant, antibiotic: linezolid, report_order: 5, aliases: vec!["linezolid".into()] });
    let linezolid_variant = AntibioticId(6);
    store.put_antibiotic(Antibiotic {
        id: linezolid_variant,
        name: "Linezolid (alta dosis)".into(),
        abbreviation: "LNZ-HD".into(),
        family: "Oxazolidinones".into(),
        parent: Some(linezolid),
        variant_context: Some(VariantClinicalContext { administration_route: "IV".into(), indication: "severe infection".into() }),
    });
    let ta_linezolid_variant = TenantAntibioticId(6);
    store.put_tenant_antibiotic(TenantAntibiotic { id: ta_linezolid_variant, tenant, antibiotic: linezolid_variant, report_order: 6, aliases: vec!["linezolid alta dosis".into()] });

    store.put_profile(Profile {
        id: ProfileId(1),
        tenant,
        eucast_group: enterobacterales,
        entries: vec![
            ProfileAntibiotic { tenant_antibiotic: ta_ampicillin, show_in_report: true },
            ProfileAntibiotic { tenant_antibiotic: ta_ciprofloxacin, show_in_report: true },
            ProfileAntibiotic { tenant_antibiotic: ta_amox_clav, show_in_report: true },
            ProfileAntibiotic { tenant_antibiotic: ta_linezolid, show_in_report: true },
            ProfileAntibiotic { tenant_antibiotic: ta_linezolid_variant, show_in_report: true },
        ],
    });

    let blee = ResistanceMechanismId(1);
    store.put_resistance_mechanism(ResistanceMechanism { id: blee, name: "BLEE".into() });
    let mut acquired = HashSet::new();
    acquired.insert(amox_clav);
    store.put_tenant_mechanism(TenantMechanism { tenant, mechanism: blee, aliases: vec![], acquired_resistance: acquired });
    store.put_positive_tokens(PositiveTokens { tenant, tokens: vec!["positiva".into(), "positivo".into()] });

    store.put_scope(Scope { id: ScopeId(1), tenant, name: "hospitalizacion".into(), aliases: vec![] });
    store.put_service(Service { id: ServiceId(1), tenant, name: "urologia".into(), aliases: vec![] });
    let category = SampleCategoryId(1);
    store.put_sample_category(SampleCategory { id: category, name: "orina".into() });
    store.put_tenant_sample_type(TenantSampleType { id: SampleTypeId(1), tenant, category, name: "orina".into(), aliases: vec![], ignore_min: false });

    Fixture { store, tenant, version, tenant_organism_ecoli, ta_ampicillin, ta_ciprofloxacin, ta_amox_clav, ta_linezolid }
}

/// Scenario 1: a single E. coli isolate with ampicillin R and ciprofloxacin
/// S ingests to one Record, one Isolate, two Results; aggregation over that
/// day produces two rows, each with total 1 (too small to report by itself,
/// but the counts are still exact).
#[test]
fn single_isolate_with_two_results() {
    let mut f = build_fixture();
    let mapping = demographic_mapping();
    let catalog = TenantCatalog::build(&f.store, f.tenant);
    let config = test_config();

    let mut cells = demographic_cells("1001", "2024-03-10");
    cells.push(("Ampicilina".into(), "R".into()));
    cells.push(("Ciprofloxacino".into(), "S".into()));
    let row = Row::new(cells);

    let ctx = IngestContext { tenant: f.tenant, organism_tenant: f.tenant_organism_ecoli, mapping: &mapping, catalog: &catalog, config: &config, load_timestamp: 1_700_000_000 };
    let report = ingest::run(&mut f.store, &ctx, std::slice::from_ref(&row)).unwrap();
    assert_eq!(report.isolates_created, 1);
    assert!(report.errors.is_empty());

    let records = f.store.records_without_isolates(f.tenant);
    assert!(records.is_empty(), "the record must keep its isolate, not be orphaned");

    let req = AntibioticAggregateRequest {
        tenant: f.tenant,
        organism_tenant: f.tenant_organism_ecoli,
        eucast_version: f.version,
        from: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        to: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        variant_view: VariantView::BaseOnly,
    };
    let rows = aggregate::antibiotic_level(&f.store, &req).unwrap();
    let ampicillin_row = rows.iter().find(|r| r.tenant_antibiotic == f.ta_ampicillin).unwrap();
    let cipro_row = rows.iter().find(|r| r.tenant_antibiotic == f.ta_ciprofloxacin).unwrap();
    assert_eq!(ampicillin_row.counts.total(), 1);
    assert_eq!(ampicillin_row.counts.r, 1);
    assert_eq!(cipro_row.counts.total(), 1);
    assert_eq!(cipro_row.counts.s, 1);
}

/// Scenario 2: a `BLEE = positiva` column flags the BLEE mechanism, whose
/// acquired-resistance list names amoxicillin-clavulanate; an input S for
/// that drug is upgraded to R.
#[test]
fn blee_mechanism_upgrades_acquired_resistance() {
    let mut f = build_fixture();
    let mut mapping = demographic_mapping();
    mapping.insert(SemanticField::Observations, "observaciones".into());
    let catalog = TenantCatalog::build(&f.store, f.tenant);
    let config = test_config();

    let mut cells = demographic_cells("1002", "2024-03-11");
    cells.push(("BLEE".into(), "positiva".into()));
    cells.push(("Amoxicilina-clavulanico".into(), "S".into()));
    cells.push(("observaciones".into(), "".into()));
    let row = Row::new(cells);

    let ctx = IngestContext { tenant: f.tenant, organism_tenant: f.tenant_organism_ecoli, mapping: &mapping, catalog: &catalog, config: &config, load_timestamp: 1_700_000_000 };
    let report = ingest::run(&mut f.store, &ctx, std::slice::from_ref(&row)).unwrap();
    assert_eq!(report.isolates_created, 1);

    let isolate_id = f.store.first_isolate_per_patient_hash(f.tenant, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap())[0];
    let isolate = f.store.get_isolate(isolate_id).unwrap();
    assert!(isolate.mechanisms.contains(&ResistanceMechanismId(1)), "BLEE must be detected");

    let result = f.store.results_for_isolate(isolate_id).into_iter().find(|r| r.tenant_antibiotic == f.ta_amox_clav).unwrap();
    assert_eq!(result.interpretation, Interpretation::R, "acquired resistance upgrades S to R");
}

/// Scenario 3: E. coli made intrinsically resistant to linezolid forces R on
/// the base drug and propagates to its variant regardless of the input
/// interpretation.
#[test]
fn intrinsic_resistance_propagates_to_variants() {
    let mut f = build_fixture();
    {
        let mut organism = f.store.get_organism(OrganismId(1)).cloned().unwrap();
        organism.intrinsic_resistance.insert(AntibioticId(5)); // linezolid
        f.store.put_organism(organism);
    }

    let mapping = demographic_mapping();
    let catalog = TenantCatalog::build(&f.store, f.tenant);
    let config = test_config();

    let mut cells = demographic_cells("1003", "2024-03-12");
    cells.push(("Linezolid".into(), "S".into()));
    let row = Row::new(cells);

    let ctx = IngestContext { tenant: f.tenant, organism_tenant: f.tenant_organism_ecoli, mapping: &mapping, catalog: &catalog, config: &config, load_timestamp: 1_700_000_000 };
    let report = ingest::run(&mut f.store, &ctx, std::slice::from_ref(&row)).unwrap();
    assert_eq!(report.isolates_created, 1);

    let isolate_id = f.store.first_isolate_per_patient_hash(f.tenant, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())[0];
    let results = f.store.results_for_isolate(isolate_id);
    let base_result = results.iter().find(|r| r.tenant_antibiotic == f.ta_linezolid).unwrap();
    assert_eq!(base_result.interpretation, Interpretation::R, "intrinsic resistance forces R despite input S");
    let variant_result = results.iter().find(|r| r.tenant_antibiotic == TenantAntibioticId(6)).unwrap();
    assert_eq!(variant_result.interpretation, Interpretation::R, "intrinsic resistance propagates to the variant");
}

/// Scenario 4: an Excel-corrupted MIC cell `"27851"` recovers to `4.0`
/// (April, from a date-serial misread), which the amoxicillin-clavulanate
/// breakpoint rule interprets as S for a urinary E. coli isolate.
#[test]
fn excel_corrupted_mic_recovers_and_interprets() {
    let mic = parse::parse_mic("27851").expect("corrupted MIC cell should recover a month number");
    assert_eq!(mic, 4.0);

    let rule = BreakpointRule {
        id: BreakpointRuleId(1),
        antibiotic: AntibioticId(3),
        eucast_group: None,
        taxon_conditions: vec![],
        sample_categories: vec![],
        age_min: None,
        age_max: None,
        sex: None,
        s_mic_max: Some(8.0),
        r_mic_min: Some(8.0),
        s_halo_min: None,
        r_halo_max: None,
        version: EucastVersionId(1),
    };
    assert_eq!(rule.interpret(Some(mic), None), Interpretation::S);
}

/// Scenario 5: two identical rows in one file persist exactly one Isolate,
/// with the duplicate counted but not re-ingested.
#[test]
fn duplicate_rows_collapse_to_one_isolate() {
    let mut f = build_fixture();
    let mapping = demographic_mapping();
    let catalog = TenantCatalog::build(&f.store, f.tenant);
    let config = test_config();

    let mut cells = demographic_cells("1004", "2024-03-13");
    cells.push(("Ampicilina".into(), "R".into()));
    let row = Row::new(cells);

    let ctx = IngestContext { tenant: f.tenant, organism_tenant: f.tenant_organism_ecoli, mapping: &mapping, catalog: &catalog, config: &config, load_timestamp: 1_700_000_000 };
    let report = ingest::run(&mut f.store, &ctx, &[row.clone(), row]).unwrap();

    assert_eq!(report.isolates_created, 1);
    assert_eq!(report.duplicates, 1);
}

/// Deleting a Record cascades to its Isolates and Results (spec.md §8
/// "Ingestion" bullet).
#[test]
fn deleting_a_record_cascades_to_isolates_and_results() {
    let mut f = build_fixture();
    let mapping = demographic_mapping();
    let catalog = TenantCatalog::build(&f.store, f.tenant);
    let config = test_config();

    let mut cells = demographic_cells("1005", "2024-03-14");
    cells.push(("Ampicilina".into(), "R".into()));
    let row = Row::new(cells);
    let ctx = IngestContext { tenant: f.tenant, organism_tenant: f.tenant_organism_ecoli, mapping: &mapping, catalog: &catalog, config: &config, load_timestamp: 1_700_000_000 };
    ingest::run(&mut f.store, &ctx, std::slice::from_ref(&row)).unwrap();

    let isolate_id = f.store.first_isolate_per_patient_hash(f.tenant, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(), NaiveDate::from_ymd_opt(2024, 3, 14).unwrap())[0];
    let isolate = f.store.get_isolate(isolate_id).unwrap().clone();
    let record_id = isolate.record;
    assert!(!f.store.results_for_isolate(isolate_id).is_empty());

    f.store.delete_record(record_id);

    assert!(f.store.get_record(record_id).is_none());
    assert!(f.store.get_isolate(isolate_id).is_none());
    assert!(f.store.results_for_isolate(isolate_id).is_empty());
}

/// Scenario 6: an 8-quarter declining series yields a significantly negative
/// linear slope, a forecast below the last observed point, a finite GAM
/// forecast within [0, 100], and at least one rolling-origin CV fold.
#[test]
fn declining_trend_produces_negative_slope_and_bounded_forecast() {
    let mut store = InMemoryStore::new();
    let tenant = TenantId(1);
    store.put_tenant(Tenant { id: tenant, name: "hosp".into(), display_name: "Hospital".into() });

    let version = EucastVersionId(1);
    store.put_eucast_version(EucastVersion { id: version, year: 2024, label: "2024".into(), valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), valid_until: None });

    let group = EucastGroupId(1);
    store.put_eucast_group(EucastGroup { id: group, name: "Enterobacterales".into() });

    let organism_id = OrganismId(1);
    store.put_organism(Organism {
        id: organism_id,
        taxonomy: Taxonomy { kingdom: "Bacteria".into(), family: "Enterobacteriaceae".into(), genus: "Escherichia".into(), species: "coli".into() },
        eucast_group: group,
        intrinsic_resistance: HashSet::new(),
    });
    let tenant_organism = TenantOrganismId(1);
    store.put_tenant_organism(TenantOrganism { id: tenant_organism, tenant, organism: organism_id, aliases: vec![] });

    let ampicillin = AntibioticId(1);
    store.put_antibiotic(Antibiotic { id: ampicillin, name: "Ampicilina".into(), abbreviation: "AMP".into(), family: "Penicillins".into(), parent: None, variant_context: None });
    let ta = TenantAntibioticId(1);
    store.put_tenant_antibiotic(TenantAntibiotic { id: ta, tenant, antibiotic: ampicillin, report_order: 1, aliases: vec![] });
    store.put_profile(Profile { id: ProfileId(1), tenant, eucast_group: group, entries: vec![ProfileAntibiotic { tenant_antibiotic: ta, show_in_report: true }] });

    let category = SampleCategoryId(1);
    store.put_sample_category(SampleCategory { id: category, name: "orina".into() });
    store.put_tenant_sample_type(TenantSampleType { id: SampleTypeId(1), tenant, category, name: "orina".into(), aliases: vec![], ignore_min: false });
    store.put_scope(Scope { id: ScopeId(1), tenant, name: "hospitalizacion".into(), aliases: vec![] });
    store.put_service(Service { id: ServiceId(1), tenant, name: "urologia".into(), aliases: vec![] });

    // percent-S+I per quarter, each out of 20 isolates, rounded to the
    // nearest multiple of 5 from the declining series [70,72,68,65,60,58,55,52]
    let quarters: [(i32, u32, usize); 8] = [
        (2024, 1, 14), // 70%
        (2024, 4, 14), // 70%
        (2024, 7, 14), // 70%
        (2024, 10, 13), // 65%
        (2025, 1, 12), // 60%
        (2025, 4, 12), // 60%
        (2025, 7, 11), // 55%
        (2025, 10, 10), // 50%
    ];
    for (q_idx, (year, month, susceptible)) in quarters.into_iter().enumerate() {
        let date = NaiveDate::from_ymd_opt(year, month, 15).unwrap();
        for patient in 0..20 {
            let hash = format!("q{q_idx}-p{patient}");
            let record = Record { id: RecordId::new(0), tenant, date, patient_hash: hash, age: 40.0, sex: Sex::Male, scope: ScopeId(1), service: ServiceId(1), sample_type: SampleTypeId(1) };
            let record_id = store.get_or_create_record(record);
            let isolate = Isolate { id: IsolateId::new(0), tenant, record: record_id, tenant_organism, eucast_version: version, mechanisms: Default::default(), subtypes: Default::default() };
            let isolate_id = store.put_isolate(isolate);
            let interpretation = if patient < susceptible { Interpretation::S } else { Interpretation::R };
            store.put_result(LabResult { id: ResultId::new(0), isolate: isolate_id, tenant_antibiotic: ta, interpretation, mic: None, halo: None });
        }
    }

    let req = TrendRequest {
        tenant,
        organism_tenant: tenant_organism,
        target: TrendTarget::Antibiotic(ta),
        eucast_version: version,
        from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        to: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        grouping: Grouping::Quarter,
    };
    let report = trend::analyze(&store, &req).unwrap();

    assert_eq!(report.points.len(), 8);
    assert!(report.linear.slope < 0.0, "slope should be negative for a declining series");
    assert!(report.linear.slope_p_value < 0.05, "the decline should be statistically significant");
    let last_point = report.points.last().unwrap().percent;
    assert!(report.linear.forecast.point < last_point, "the forecast should continue the decline");
    assert!(report.gam.forecast.point.is_finite());
    assert!((0.0..=100.0).contains(&report.gam.forecast.point));
    assert!(report.cv.is_ok(), "8 periods should yield at least one rolling-origin fold");
    assert!(report.cv.unwrap().fold_count >= 1);
}
