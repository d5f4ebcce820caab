use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::antibiotic::Antibiotic;
use super::ids::{AntibioticId, EucastGroupId, OrganismId, TenantId, TenantOrganismId};

/// Taxonomic attributes, kingdom down to species (spec.md §3 "Organism
/// (global)"). Only the ranks `TaxonCondition` actually discriminates on are
/// modeled; anything finer belongs to the out-of-scope persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub kingdom: String,
    pub family: String,
    pub genus: String,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organism {
    pub id: OrganismId,
    pub taxonomy: Taxonomy,
    pub eucast_group: EucastGroupId,
    /// Base antibiotics this organism is intrinsically resistant to. The set
    /// is transitive over variants by construction: `is_intrinsically_resistant`
    /// checks `antibiotic.base_id()`, so a variant whose parent is in this set
    /// is covered without needing to enumerate it explicitly (spec.md §3).
    pub intrinsic_resistance: HashSet<AntibioticId>,
}

impl Organism {
    pub fn is_intrinsically_resistant(&self, antibiotic: &Antibiotic) -> bool {
        self.intrinsic_resistance.contains(&antibiotic.base_id())
    }
}

/// Per-tenant materialization with an alias list (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantOrganism {
    pub id: TenantOrganismId,
    pub tenant: TenantId,
    pub organism: OrganismId,
    pub aliases: Vec<String>,
}
