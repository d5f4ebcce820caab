use serde::{Deserialize, Serialize};

/// Clinical interpretation of a susceptibility result (spec.md §9:
/// "Polymorphism over interpretation" — never compare strings in hot paths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interpretation {
    S,
    I,
    R,
    Nd,
    Na,
}

impl Interpretation {
    /// Maps free text through the direct S/I/R/ND/NA convention used as a
    /// fallback once the tenant's `InterpretationAlias` map misses (spec.md §4.5
    /// step 3: "falling back to direct S/R/I uppercase match; unknown -> ND").
    pub fn from_direct_text(raw: &str) -> Interpretation {
        match raw.trim().to_ascii_uppercase().as_str() {
            "S" => Interpretation::S,
            "I" => Interpretation::I,
            "R" => Interpretation::R,
            "NA" => Interpretation::Na,
            "ND" => Interpretation::Nd,
            _ => Interpretation::Nd,
        }
    }

    pub fn is_actionable(self) -> bool {
        !matches!(self, Interpretation::Nd)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interpretation::S => "S",
            Interpretation::I => "I",
            Interpretation::R => "R",
            Interpretation::Nd => "ND",
            Interpretation::Na => "NA",
        }
    }
}

impl std::fmt::Display for Interpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
