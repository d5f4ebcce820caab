//! Resistance mechanism and subtype detection (spec.md §4.4 C4): a column
//! pass plus a free-text pass over an observations column, with phrase-local
//! negation.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use crate::entities::{MechanismSubtypeId, ResistanceMechanismId, TenantMechanism, TenantMechanismSubtype};
use crate::text::normalize;

/// Negation tokens that flip a detected mention into "explicitly absent"
/// within the same phrase.
pub const NEGATION_TOKENS: &[&str] = &["no", "ausencia", "sin", "negativo", "no se detecta"];

static PHRASE_SPLIT: OnceLock<Regex> = OnceLock::new();

fn phrase_split_regex() -> &'static Regex {
    PHRASE_SPLIT.get_or_init(|| Regex::new(r"[.;$]+").unwrap())
}

/// The two sets this component produces, unioned across both passes
/// (spec.md §4.4).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionResult {
    pub mechanisms: BTreeSet<ResistanceMechanismId>,
    pub subtypes: BTreeSet<MechanismSubtypeId>,
}

impl DetectionResult {
    fn add_subtype(&mut self, subtype: &TenantMechanismSubtype, parent: ResistanceMechanismId) {
        self.subtypes.insert(subtype.subtype);
        self.mechanisms.insert(parent);
    }
}

fn alias_set<'a>(primary: &'a str, aliases: &'a [String]) -> impl Iterator<Item = String> + 'a {
    std::iter::once(normalize(primary)).chain(aliases.iter().map(|a| normalize(a)))
}

/// Detects mechanisms and subtypes in a single row.
///
/// - `row`: normalized `(column header, raw cell value)` pairs for this row.
/// - `mechanisms`/`subtypes`: the tenant's overlays, each carrying its
///   primary name (looked up by the caller via `mechanism_name`/
///   `subtype_name`) and aliases.
/// - `positive_tokens`: normalized values that count as "yes" in a mechanism
///   column.
/// - `observations`: the raw text of the designated free-text column, if the
///   mapping assigned one.
#[allow(clippy::too_many_arguments)]
pub fn detect(
    row: &[(String, String)],
    mechanisms: &[(&TenantMechanism, &str)],
    subtypes: &[(&TenantMechanismSubtype, &str, ResistanceMechanismId)],
    positive_tokens: &[String],
    observations: Option<&str>,
) -> DetectionResult {
    let positive: BTreeSet<String> = positive_tokens.iter().map(|t| normalize(t)).collect();
    let mut result = DetectionResult::default();

    detect_by_columns(row, mechanisms, subtypes, &positive, &mut result);
    if let Some(text) = observations {
        detect_in_free_text(text, mechanisms, subtypes, &mut result);
    }
    result
}

fn detect_by_columns(
    row: &[(String, String)],
    mechanisms: &[(&TenantMechanism, &str)],
    subtypes: &[(&TenantMechanismSubtype, &str, ResistanceMechanismId)],
    positive: &BTreeSet<String>,
    result: &mut DetectionResult,
) {
    for (mechanism, name) in mechanisms {
        let aliases: Vec<String> = alias_set(name, &mechanism.aliases).collect();
        'mech: for alias in &aliases {
            for (header, value) in row {
                if normalize(header).contains(alias.as_str()) {
                    let normalized_value = normalize(value);
                    if positive.contains(&normalized_value) {
                        result.mechanisms.insert(mechanism.mechanism);
                        break 'mech;
                    }
                }
            }
        }
    }

    for (subtype, name, parent) in subtypes {
        let aliases: Vec<String> = alias_set(name, &subtype.aliases).collect();
        for (header, value) in row {
            let normalized_header = normalize(header);
            if aliases.iter().any(|a| normalized_header.contains(a.as_str())) {
                let normalized_value = normalize(value);
                if positive.contains(&normalized_value) {
                    result.add_subtype(subtype, *parent);
                }
                break;
            }
        }
    }
}

fn detect_in_free_text(
    text: &str,
    mechanisms: &[(&TenantMechanism, &str)],
    subtypes: &[(&TenantMechanismSubtype, &str, ResistanceMechanismId)],
    result: &mut DetectionResult,
) {
    for phrase in phrase_split_regex().split(text) {
        let normalized_phrase = normalize(phrase);
        if normalized_phrase.is_empty() {
            continue;
        }
        let negated = NEGATION_TOKENS.iter().any(|neg| normalized_phrase.contains(&normalize(neg)));

        for (mechanism, name) in mechanisms {
            let mentioned = alias_set(name, &mechanism.aliases).any(|a| normalized_phrase.contains(a.as_str()));
            if mentioned && !negated {
                result.mechanisms.insert(mechanism.mechanism);
            }
        }

        for (subtype, name, parent) in subtypes {
            let mentioned = alias_set(name, &subtype.aliases).any(|a| normalized_phrase.contains(a.as_str()));
            if mentioned && !negated {
                result.add_subtype(subtype, *parent);
            }
        }
    }
}

/// Convenience index from mechanism id to its (primary name, overlay) pair,
/// used by ingestion to assemble the `(overlay, name)` slices `detect`
/// expects from the tenant's catalog snapshot.
pub fn index_by_mechanism<'a>(
    overlays: &'a [TenantMechanism],
    names: &'a HashMap<ResistanceMechanismId, String>,
) -> Vec<(&'a TenantMechanism, &'a str)> {
    overlays
        .iter()
        .filter_map(|overlay| names.get(&overlay.mechanism).map(|name| (overlay, name.as_str())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TenantId;
    use std::collections::HashSet;

    fn mechanism(id: u64, aliases: &[&str]) -> TenantMechanism {
        TenantMechanism {
            tenant: TenantId(1),
            mechanism: ResistanceMechanismId(id),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            acquired_resistance: HashSet::new(),
        }
    }

    fn subtype(id: u64, _parent: u64, aliases: &[&str]) -> TenantMechanismSubtype {
        TenantMechanismSubtype {
            tenant: TenantId(1),
            subtype: MechanismSubtypeId(id),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            acquired_resistance: HashSet::new(),
        }
    }

    #[test]
    fn detects_mechanism_from_column_value() {
        let blee = mechanism(1, &["blee"]);
        let row = vec![("BLEE".to_string(), "positivo".to_string())];
        let positive = vec!["positivo".to_string()];
        let result = detect(&row, &[(&blee, "BLEE")], &[], &positive, None);
        assert!(result.mechanisms.contains(&ResistanceMechanismId(1)));
    }

    #[test]
    fn column_value_not_in_positive_tokens_does_not_detect() {
        let blee = mechanism(1, &["blee"]);
        let row = vec![("BLEE".to_string(), "negativo".to_string())];
        let positive = vec!["positivo".to_string()];
        let result = detect(&row, &[(&blee, "BLEE")], &[], &positive, None);
        assert!(result.mechanisms.is_empty());
    }

    #[test]
    fn detecting_subtype_also_adds_parent_mechanism() {
        let oxa48 = subtype(1, 7, &["oxa-48"]);
        let row = vec![("OXA-48".to_string(), "positivo".to_string())];
        let positive = vec!["positivo".to_string()];
        let result = detect(&row, &[], &[(&oxa48, "OXA-48", ResistanceMechanismId(7))], &positive, None);
        assert!(result.subtypes.contains(&MechanismSubtypeId(1)));
        assert!(result.mechanisms.contains(&ResistanceMechanismId(7)));
    }

    #[test]
    fn free_text_negation_is_phrase_local() {
        let blee = mechanism(1, &["blee"]);
        let oxa48 = subtype(2, 7, &["oxa-48"]);
        let text = "No BLEE. OXA-48 positiva.";
        let result = detect(&[], &[(&blee, "BLEE")], &[(&oxa48, "OXA-48", ResistanceMechanismId(7))], &[], Some(text));
        assert!(!result.mechanisms.contains(&ResistanceMechanismId(1)));
        assert!(result.subtypes.contains(&MechanismSubtypeId(2)));
        assert!(result.mechanisms.contains(&ResistanceMechanismId(7)));
    }

    #[test]
    fn free_text_without_negation_is_detected() {
        let blee = mechanism(1, &["blee"]);
        let text = "Portador de BLEE; sensible a carbapenems";
        let result = detect(&[], &[(&blee, "BLEE")], &[], &[], Some(text));
        assert!(result.mechanisms.contains(&ResistanceMechanismId(1)));
    }
}
