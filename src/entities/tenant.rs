use serde::{Deserialize, Serialize};

use super::ids::TenantId;

/// Owner scope for every hospital-specific entity (spec.md §3 "Tenant").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub display_name: String,
}
