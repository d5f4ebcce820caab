//! One tenant's hospital-specific setup (spec.md §3's per-tenant entities),
//! loaded from a single JSON file so `cli::Run` can seed a fresh store in
//! one step. The global catalog itself is loaded separately via `fixtures`.

use serde::{Deserialize, Serialize};

use crate::entities::*;
use crate::store::Store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub tenant: Tenant,
    pub organism_tenant: TenantOrganism,
    pub tenant_antibiotics: Vec<TenantAntibiotic>,
    pub profile: Profile,
    pub scopes: Vec<Scope>,
    pub services: Vec<Service>,
    pub sample_categories: Vec<SampleCategory>,
    pub sample_types: Vec<TenantSampleType>,
    #[serde(default)]
    pub tenant_mechanisms: Vec<TenantMechanism>,
    #[serde(default)]
    pub tenant_mechanism_subtypes: Vec<TenantMechanismSubtype>,
    #[serde(default)]
    pub positive_tokens: Vec<String>,
    #[serde(default)]
    pub interpretation_aliases: Vec<InterpretationAlias>,
}

impl Workspace {
    /// Writes every entity into `store`. Global-catalog entities referenced
    /// here (antibiotics, organisms, EUCAST groups/versions) must already
    /// have been loaded by `fixtures::load_dir`.
    pub fn seed(self, store: &mut impl Store) {
        let tenant = self.tenant.id;
        store.put_tenant(self.tenant);
        store.put_tenant_organism(self.organism_tenant);
        for ta in self.tenant_antibiotics {
            store.put_tenant_antibiotic(ta);
        }
        store.put_profile(self.profile);
        for scope in self.scopes {
            store.put_scope(scope);
        }
        for service in self.services {
            store.put_service(service);
        }
        for category in self.sample_categories {
            store.put_sample_category(category);
        }
        for sample_type in self.sample_types {
            store.put_tenant_sample_type(sample_type);
        }
        for mechanism in self.tenant_mechanisms {
            store.put_tenant_mechanism(mechanism);
        }
        for subtype in self.tenant_mechanism_subtypes {
            store.put_tenant_mechanism_subtype(subtype);
        }
        if !self.positive_tokens.is_empty() {
            store.put_positive_tokens(PositiveTokens { tenant, tokens: self.positive_tokens });
        }
        for alias in self.interpretation_aliases {
            store.put_interpretation_alias(alias);
        }
    }
}
