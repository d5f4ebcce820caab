//! Reference `Store` implementation backed by `HashMap`s, used by the
//! engine's own tests and by the CLI harness (spec.md §1 "[AMBIENT]").

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::entities::*;

use super::Store;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tenants: HashMap<TenantId, Tenant>,
    antibiotics: HashMap<AntibioticId, Antibiotic>,
    tenant_antibiotics: HashMap<TenantAntibioticId, TenantAntibiotic>,
    eucast_groups: HashMap<EucastGroupId, EucastGroup>,
    organisms: HashMap<OrganismId, Organism>,
    tenant_organisms: HashMap<TenantOrganismId, TenantOrganism>,
    taxon_conditions: HashMap<TaxonConditionId, TaxonCondition>,
    eucast_versions: HashMap<EucastVersionId, EucastVersion>,
    breakpoint_rules: Vec<BreakpointRule>,
    profiles: HashMap<(TenantId, EucastGroupId), Profile>,
    resistance_mechanisms: HashMap<ResistanceMechanismId, ResistanceMechanism>,
    mechanism_subtypes: HashMap<MechanismSubtypeId, MechanismSubtype>,
    tenant_mechanisms: HashMap<TenantId, Vec<TenantMechanism>>,
    tenant_mechanism_subtypes: HashMap<TenantId, Vec<TenantMechanismSubtype>>,
    positive_tokens: HashMap<TenantId, Vec<String>>,
    interpretation_aliases: HashMap<TenantId, Vec<InterpretationAlias>>,
    scopes: HashMap<ScopeId, Scope>,
    services: HashMap<ServiceId, Service>,
    sample_categories: HashMap<SampleCategoryId, SampleCategory>,
    tenant_sample_types: HashMap<SampleTypeId, TenantSampleType>,

    records: HashMap<RecordId, Record>,
    record_index: HashMap<RecordKey, RecordId>,
    next_record_id: u64,

    isolates: HashMap<IsolateId, Isolate>,
    next_isolate_id: u64,

    results: HashMap<ResultId, LabResult>,
    next_result_id: u64,

    reinterpretations: HashMap<(ResultId, EucastVersionId), Reinterpretation>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn put_tenant(&mut self, tenant: Tenant) {
        self.tenants.insert(tenant.id, tenant);
    }
    fn get_tenant(&self, id: TenantId) -> Option<&Tenant> {
        self.tenants.get(&id)
    }

    fn put_antibiotic(&mut self, antibiotic: Antibiotic) {
        self.antibiotics.insert(antibiotic.id, antibiotic);
    }
    fn get_antibiotic(&self, id: AntibioticId) -> Option<&Antibiotic> {
        self.antibiotics.get(&id)
    }
    fn antibiotics(&self) -> Vec<&Antibiotic> {
        self.antibiotics.values().collect()
    }
    fn variants_of(&self, base: AntibioticId) -> Vec<&Antibiotic> {
        self.antibiotics.values().filter(|a| a.parent == Some(base)).collect()
    }

    fn put_tenant_antibiotic(&mut self, ta: TenantAntibiotic) {
        self.tenant_antibiotics.insert(ta.id, ta);
    }
    fn get_tenant_antibiotic(&self, id: TenantAntibioticId) -> Option<&TenantAntibiotic> {
        self.tenant_antibiotics.get(&id)
    }
    fn tenant_antibiotics(&self, tenant: TenantId) -> Vec<&TenantAntibiotic> {
        self.tenant_antibiotics.values().filter(|ta| ta.tenant == tenant).collect()
    }

    fn put_eucast_group(&mut self, group: EucastGroup) {
        self.eucast_groups.insert(group.id, group);
    }
    fn get_eucast_group(&self, id: EucastGroupId) -> Option<&EucastGroup> {
        self.eucast_groups.get(&id)
    }

    fn put_organism(&mut self, organism: Organism) {
        self.organisms.insert(organism.id, organism);
    }
    fn get_organism(&self, id: OrganismId) -> Option<&Organism> {
        self.organisms.get(&id)
    }

    fn put_tenant_organism(&mut self, to: TenantOrganism) {
        self.tenant_organisms.insert(to.id, to);
    }
    fn get_tenant_organism(&self, id: TenantOrganismId) -> Option<&TenantOrganism> {
        self.tenant_organisms.get(&id)
    }
    fn tenant_organisms(&self, tenant: TenantId) -> Vec<&TenantOrganism> {
        self.tenant_organisms.values().filter(|to| to.tenant == tenant).collect()
    }

    fn put_taxon_condition(&mut self, condition: TaxonCondition) {
        self.taxon_conditions.insert(condition.id, condition);
    }
    fn taxon_conditions(&self) -> Vec<&TaxonCondition> {
        self.taxon_conditions.values().collect()
    }

    fn put_eucast_version(&mut self, version: EucastVersion) {
        self.eucast_versions.insert(version.id, version);
    }
    fn eucast_versions(&self) -> Vec<&EucastVersion> {
        self.eucast_versions.values().collect()
    }
    fn version_covering(&self, date: NaiveDate) -> Option<&EucastVersion> {
        self.eucast_versions.values().find(|v| v.contains(date))
    }

    fn put_breakpoint_rule(&mut self, rule: BreakpointRule) {
        self.breakpoint_rules.push(rule);
    }
    fn breakpoint_rules_for(&self, antibiotic: AntibioticId, version: EucastVersionId) -> Vec<&BreakpointRule> {
        self.breakpoint_rules
            .iter()
            .filter(|r| r.antibiotic == antibiotic && r.version == version)
            .collect()
    }

    fn put_profile(&mut self, profile: Profile) {
        self.profiles.insert((profile.tenant, profile.eucast_group), profile);
    }
    fn profile_for_group(&self, tenant: TenantId, group: EucastGroupId) -> Option<&Profile> {
        self.profiles.get(&(tenant, group))
    }

    fn put_resistance_mechanism(&mut self, mechanism: ResistanceMechanism) {
        self.resistance_mechanisms.insert(mechanism.id, mechanism);
    }
    fn resistance_mechanisms(&self) -> Vec<&ResistanceMechanism> {
        self.resistance_mechanisms.values().collect()
    }

    fn put_mechanism_subtype(&mut self, subtype: MechanismSubtype) {
        self.mechanism_subtypes.insert(subtype.id, subtype);
    }
    fn mechanism_subtypes(&self) -> Vec<&MechanismSubtype> {
        self.mechanism_subtypes.values().collect()
    }

    fn put_tenant_mechanism(&mut self, overlay: TenantMechanism) {
        self.tenant_mechanisms.entry(overlay.tenant).or_default().push(overlay);
    }
    fn tenant_mechanisms(&self, tenant: TenantId) -> Vec<&TenantMechanism> {
        self.tenant_mechanisms.get(&tenant).map(|v| v.iter().collect()).unwrap_or_default()
    }

    fn put_tenant_mechanism_subtype(&mut self, overlay: TenantMechanismSubtype) {
        self.tenant_mechanism_subtypes.entry(overlay.tenant).or_default().push(overlay);
    }
    fn tenant_mechanism_subtypes(&self, tenant: TenantId) -> Vec<&TenantMechanismSubtype> {
        self.tenant_mechanism_subtypes.get(&tenant).map(|v| v.iter().collect()).unwrap_or_default()
    }

    fn put_positive_tokens(&mut self, tokens: PositiveTokens) {
        self.positive_tokens.entry(tokens.tenant).or_default().extend(tokens.tokens);
    }
    fn positive_tokens(&self, tenant: TenantId) -> Vec<&str> {
        self.positive_tokens.get(&tenant).map(|v| v.iter().map(|s| s.as_str()).collect()).unwrap_or_default()
    }

    fn put_interpretation_alias(&mut self, alias: InterpretationAlias) {
        self.interpretation_aliases.entry(alias.tenant).or_default().push(alias);
    }
    fn interpretation_aliases(&self, tenant: TenantId) -> Vec<&InterpretationAlias> {
        self.interpretation_aliases.get(&tenant).map(|v| v.iter().collect()).unwrap_or_default()
    }

    fn put_scope(&mut self, scope: Scope) {
        self.scopes.insert(scope.id, scope);
    }
    fn scopes(&self, tenant: TenantId) -> Vec<&Scope> {
        self.scopes.values().filter(|s| s.tenant == tenant).collect()
    }

    fn put_service(&mut self, service: Service) {
        self.services.insert(service.id, service);
    }
    fn services(&self, tenant: TenantId) -> Vec<&Service> {
        self.services.values().filter(|s| s.tenant == tenant).collect()
    }

    fn put_sample_category(&mut self, category: SampleCategory) {
        self.sample_categories.insert(category.id, category);
    }
    fn sample_categories(&self) -> Vec<&SampleCategory> {
        self.sample_categories.values().collect()
    }

    fn put_tenant_sample_type(&mut self, sample_type: TenantSampleType) {
        self.tenant_sample_types.insert(sample_type.id, sample_type);
    }
    fn tenant_sample_types(&self, tenant: TenantId) -> Vec<&TenantSampleType> {
        self.tenant_sample_types.values().filter(|s| s.tenant == tenant).collect()
    }
    fn get_tenant_sample_type(&self, id: SampleTypeId) -> Option<&TenantSampleType> {
        self.tenant_sample_types.get(&id)
    }

    fn get_or_create_record(&mut self, mut record: Record) -> RecordId {
        let key = record.key();
        if let Some(&id) = self.record_index.get(&key) {
            return id;
        }
        self.next_record_id += 1;
        let id = RecordId::new(self.next_record_id);
        record.id = id;
        self.record_index.insert(key, id);
        self.records.insert(id, record);
        id
    }
    fn get_record(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }
    fn delete_record(&mut self, id: RecordId) {
        if let Some(record) = self.records.remove(&id) {
            self.record_index.remove(&record.key());
        }
        let orphaned: Vec<IsolateId> = self.isolates.values().filter(|iso| iso.record == id).map(|iso| iso.id).collect();
        for isolate_id in orphaned {
            self.delete_isolate(isolate_id);
        }
    }
    fn records_without_isolates(&self, tenant: TenantId) -> Vec<RecordId> {
        self.records
            .values()
            .filter(|r| r.tenant == tenant && self.isolates_for_record(r.id).is_empty())
            .map(|r| r.id)
            .collect()
    }

    fn put_isolate(&mut self, mut isolate: Isolate) -> IsolateId {
        self.next_isolate_id += 1;
        let id = IsolateId::new(self.next_isolate_id);
        isolate.id = id;
        self.isolates.insert(id, isolate);
        id
    }
    fn get_isolate(&self, id: IsolateId) -> Option<&Isolate> {
        self.isolates.get(&id)
    }
    fn isolates_for_record(&self, record: RecordId) -> Vec<&Isolate> {
        self.isolates.values().filter(|iso| iso.record == record).collect()
    }
    fn delete_isolate(&mut self, id: IsolateId) {
        if self.isolates.remove(&id).is_some() {
            let result_ids: Vec<ResultId> = self.results.values().filter(|r| r.isolate == id).map(|r| r.id).collect();
            for result_id in result_ids {
                self.delete_result(result_id);
            }
        }
    }

    fn first_isolate_per_patient_hash(&self, tenant: TenantId, from: NaiveDate, to: NaiveDate) -> Vec<IsolateId> {
        let mut by_patient: HashMap<&str, Vec<(NaiveDate, IsolateId)>> = HashMap::new();
        for isolate in self.isolates.values() {
            let Some(record) = self.records.get(&isolate.record) else { continue };
            if record.tenant != tenant || record.date < from || record.date > to {
                continue;
            }
            by_patient.entry(record.patient_hash.as_str()).or_default().push((record.date, isolate.id));
        }
        let mut out = Vec::new();
        for mut isolates in by_patient.into_values() {
            isolates.sort_by_key(|(date, id)| (*date, *id));
            if let Some((_, id)) = isolates.into_iter().next() {
                out.push(id);
            }
        }
        out
    }

    fn put_result(&mut self, mut result: LabResult) -> ResultId {
        self.next_result_id += 1;
        let id = ResultId::new(self.next_result_id);
        result.id = id;
        self.results.insert(id, result);
        id
    }
    fn get_result(&self, id: ResultId) -> Option<&LabResult> {
        self.results.get(&id)
    }
    fn results_for_isolate(&self, isolate: IsolateId) -> Vec<&LabResult> {
        self.results.values().filter(|r| r.isolate == isolate).collect()
    }
    fn delete_result(&mut self, id: ResultId) {
        self.results.remove(&id);
        self.reinterpretations.retain(|(result, _), _| *result != id);
    }

    fn put_reinterpretation(&mut self, reinterpretation: Reinterpretation) {
        self.reinterpretations.insert((reinterpretation.result, reinterpretation.version), reinterpretation);
    }
    fn reinterpretation_for(&self, result: ResultId, version: EucastVersionId) -> Option<&Reinterpretation> {
        self.reinterpretations.get(&(result, version))
    }
}
