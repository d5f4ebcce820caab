//! The data model of spec.md §3: every entity, field, and invariant listed
//! there as a plain Rust struct or enum. This module holds data only — the
//! algorithms that operate over it (alias resolution, rule evaluation,
//! mechanism detection, aggregation, trend analysis) live in their own
//! top-level modules, one per engine component.

pub mod alias;
pub mod antibiotic;
pub mod demographics;
pub mod ids;
pub mod interpretation;
pub mod isolate;
pub mod mechanism;
pub mod organism;
pub mod profile;
pub mod record;
pub mod result;
pub mod rule;
pub mod sample_type;
pub mod tenant;

pub use alias::{InterpretationAlias, PositiveTokens};
pub use antibiotic::{Antibiotic, EucastGroup, TenantAntibiotic, VariantClinicalContext};
pub use demographics::{AgeGroup, Scope, Service, Sex};
pub use ids::*;
pub use interpretation::Interpretation;
pub use isolate::Isolate;
pub use mechanism::{
    MechanismSubtype, ResistanceMechanism, TenantMechanism, TenantMechanismSubtype,
};
pub use organism::{Organism, TenantOrganism, Taxonomy};
pub use profile::{Profile, ProfileAntibiotic};
pub use record::{Record, RecordKey};
pub use result::{LabResult, Reinterpretation};
pub use rule::{BreakpointRule, EucastVersion, TaxonCondition, TaxonScope};
pub use sample_type::{SampleCategory, TenantSampleType};
pub use tenant::Tenant;
