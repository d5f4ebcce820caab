//! Persistence contract (spec.md §6): CRUD on every §3 entity plus the two
//! named queries the engine needs (first-isolate-per-patient-hash window,
//! and prefetch helpers). A real deployment backs this with a relational
//! database; this crate ships only the contract and an in-memory reference
//! implementation (`memory::InMemoryStore`) for tests and standalone runs.

pub mod memory;

use chrono::NaiveDate;

use crate::entities::*;

/// Synchronous persistence contract. The engine is single-threaded and
/// batch (spec.md §5), so there is no async boundary here, unlike a networked
/// client.
pub trait Store {
    fn put_tenant(&mut self, tenant: Tenant);
    fn get_tenant(&self, id: TenantId) -> Option<&Tenant>;

    fn put_antibiotic(&mut self, antibiotic: Antibiotic);
    fn get_antibiotic(&self, id: AntibioticId) -> Option<&Antibiotic>;
    fn antibiotics(&self) -> Vec<&Antibiotic>;
    fn variants_of(&self, base: AntibioticId) -> Vec<&Antibiotic>;

    fn put_tenant_antibiotic(&mut self, ta: TenantAntibiotic);
    fn get_tenant_antibiotic(&self, id: TenantAntibioticId) -> Option<&TenantAntibiotic>;
    fn tenant_antibiotics(&self, tenant: TenantId) -> Vec<&TenantAntibiotic>;

    fn put_eucast_group(&mut self, group: EucastGroup);
    fn get_eucast_group(&self, id: EucastGroupId) -> Option<&EucastGroup>;

    fn put_organism(&mut self, organism: Organism);
    fn get_organism(&self, id: OrganismId) -> Option<&Organism>;

    fn put_tenant_organism(&mut self, to: TenantOrganism);
    fn get_tenant_organism(&self, id: TenantOrganismId) -> Option<&TenantOrganism>;
    fn tenant_organisms(&self, tenant: TenantId) -> Vec<&TenantOrganism>;

    fn put_taxon_condition(&mut self, condition: TaxonCondition);
    fn taxon_conditions(&self) -> Vec<&TaxonCondition>;

    fn put_eucast_version(&mut self, version: EucastVersion);
    fn eucast_versions(&self) -> Vec<&EucastVersion>;
    fn version_covering(&self, date: NaiveDate) -> Option<&EucastVersion>;

    fn put_breakpoint_rule(&mut self, rule: BreakpointRule);
    fn breakpoint_rules_for(&self, antibiotic: AntibioticId, version: EucastVersionId) -> Vec<&BreakpointRule>;

    fn put_profile(&mut self, profile: Profile);
    fn profile_for_group(&self, tenant: TenantId, group: EucastGroupId) -> Option<&Profile>;

    fn put_resistance_mechanism(&mut self, mechanism: ResistanceMechanism);
    fn resistance_mechanisms(&self) -> Vec<&ResistanceMechanism>;

    fn put_mechanism_subtype(&mut self, subtype: MechanismSubtype);
    fn mechanism_subtypes(&self) -> Vec<&MechanismSubtype>;

    fn put_tenant_mechanism(&mut self, overlay: TenantMechanism);
    fn tenant_mechanisms(&self, tenant: TenantId) -> Vec<&TenantMechanism>;

    fn put_tenant_mechanism_subtype(&mut self, overlay: TenantMechanismSubtype);
    fn tenant_mechanism_subtypes(&self, tenant: TenantId) -> Vec<&TenantMechanismSubtype>;

    fn put_positive_tokens(&mut self, tokens: PositiveTokens);
    fn positive_tokens(&self, tenant: TenantId) -> Vec<&str>;

    fn put_interpretation_alias(&mut self, alias: InterpretationAlias);
    fn interpretation_aliases(&self, tenant: TenantId) -> Vec<&InterpretationAlias>;

    fn put_scope(&mut self, scope: Scope);
    fn scopes(&self, tenant: TenantId) -> Vec<&Scope>;

    fn put_service(&mut self, service: Service);
    fn services(&self, tenant: TenantId) -> Vec<&Service>;

    fn put_sample_category(&mut self, category: SampleCategory);
    fn sample_categories(&self) -> Vec<&SampleCategory>;

    fn put_tenant_sample_type(&mut self, sample_type: TenantSampleType);
    fn tenant_sample_types(&self, tenant: TenantId) -> Vec<&TenantSampleType>;
    fn get_tenant_sample_type(&self, id: SampleTypeId) -> Option<&TenantSampleType>;

    fn get_or_create_record(&mut self, record: Record) -> RecordId;
    fn get_record(&self, id: RecordId) -> Option<&Record>;
    fn delete_record(&mut self, id: RecordId);
    fn records_without_isolates(&self, tenant: TenantId) -> Vec<RecordId>;

    fn put_isolate(&mut self, isolate: Isolate) -> IsolateId;
    fn get_isolate(&self, id: IsolateId) -> Option<&Isolate>;
    fn isolates_for_record(&self, record: RecordId) -> Vec<&Isolate>;
    fn delete_isolate(&mut self, id: IsolateId);

    /// Isolates whose Record falls in `[from, to]`, ranked by ascending date
    /// within each patient-hash, rank 1 kept (spec.md §4.7 "First-isolate").
    fn first_isolate_per_patient_hash(&self, tenant: TenantId, from: NaiveDate, to: NaiveDate) -> Vec<IsolateId>;

    fn put_result(&mut self, result: LabResult) -> ResultId;
    fn get_result(&self, id: ResultId) -> Option<&LabResult>;
    fn results_for_isolate(&self, isolate: IsolateId) -> Vec<&LabResult>;
    fn delete_result(&mut self, id: ResultId);

    fn put_reinterpretation(&mut self, reinterpretation: Reinterpretation);
    fn reinterpretation_for(&self, result: ResultId, version: EucastVersionId) -> Option<&Reinterpretation>;

    /// Prefetch: every Result for an Isolate, paired with its Antibiotic
    /// (spec.md §6 "Prefetch of Result → Antibiotic").
    fn results_with_antibiotics(&self, isolate: IsolateId) -> Vec<(&LabResult, &TenantAntibiotic)> {
        self.results_for_isolate(isolate)
            .into_iter()
            .filter_map(|r| self.get_tenant_antibiotic(r.tenant_antibiotic).map(|ta| (r, ta)))
            .collect()
    }
}
