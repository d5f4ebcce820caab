//! Newtype identifiers for every entity in the data model (spec.md §3).
//!
//! Plain `u64`s would let a caller pass an `AntibioticId` where an
//! `OrganismId` is expected and the compiler would say nothing. These
//! newtypes make that a type error instead.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(TenantId);
id_type!(AntibioticId);
id_type!(TenantAntibioticId);
id_type!(OrganismId);
id_type!(TenantOrganismId);
id_type!(EucastGroupId);
id_type!(TaxonConditionId);
id_type!(BreakpointRuleId);
id_type!(EucastVersionId);
id_type!(ProfileId);
id_type!(ResistanceMechanismId);
id_type!(MechanismSubtypeId);
id_type!(RecordId);
id_type!(IsolateId);
id_type!(ResultId);
id_type!(ReinterpretationId);
id_type!(SampleTypeId);
id_type!(SampleCategoryId);
id_type!(ScopeId);
id_type!(ServiceId);
