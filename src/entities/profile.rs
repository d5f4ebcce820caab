use serde::{Deserialize, Serialize};

use super::ids::{EucastGroupId, ProfileId, TenantAntibioticId, TenantId};

/// Per-tenant reporting profile for an EUCAST group: which antibiotics get
/// evaluated for organisms in that group, and which of those are shown in
/// cumulative reports (spec.md §3 "Profile").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub tenant: TenantId,
    pub eucast_group: EucastGroupId,
    pub entries: Vec<ProfileAntibiotic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAntibiotic {
    pub tenant_antibiotic: TenantAntibioticId,
    pub show_in_report: bool,
}
