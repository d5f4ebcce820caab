use serde::{Deserialize, Serialize};

use super::ids::TenantId;
use super::interpretation::Interpretation;

/// A canonical category plus its free-text synonyms for one tenant (spec.md
/// §3 "InterpretationAlias").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationAlias {
    pub tenant: TenantId,
    pub category: Interpretation,
    pub synonyms: Vec<String>,
}

/// Strings that count as "positive" when read from a mechanism column
/// (spec.md §3 "PositiveTokens", §4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositiveTokens {
    pub tenant: TenantId,
    pub tokens: Vec<String>,
}
