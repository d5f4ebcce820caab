//! Re-evaluation of an Isolate's Results at a chosen EUCAST version (spec.md
//! §4.6 C6). Reuses `rules::applicable_rules` for breakpoint lookup and
//! `ingest::acquired_resistance_targets` for the same acquired-resistance
//! override ingestion applies.

use std::collections::HashMap;

use chrono::Utc;

use crate::entities::*;
use crate::error::{EngineError, EngineResult};
use crate::ingest::{acquired_resistance_targets, find_tenant_antibiotic};
use crate::rules::applicable_rules;
use crate::store::Store;

/// Re-evaluates every `TenantAntibiotic` in the isolate's organism's Profile
/// against `target_version`, upserting a `Reinterpretation` per result
/// (spec.md §4.6). Returns the reinterpretations written, in profile order.
pub fn run_for_isolate(store: &mut impl Store, isolate_id: IsolateId, target_version: EucastVersionId) -> EngineResult<Vec<Reinterpretation>> {
    let isolate = store.get_isolate(isolate_id).cloned().ok_or_else(|| EngineError::Domain("unknown isolate".into()))?;
    let record = store
        .get_record(isolate.record)
        .cloned()
        .ok_or_else(|| EngineError::Domain("isolate references an unknown record".into()))?;
    let tenant_organism = store
        .get_tenant_organism(isolate.tenant_organism)
        .cloned()
        .ok_or_else(|| EngineError::Domain("isolate references an unknown tenant organism".into()))?;
    let organism = store
        .get_organism(tenant_organism.organism)
        .cloned()
        .ok_or_else(|| EngineError::Domain("tenant organism references an unknown global organism".into()))?;
    let profile = store
        .profile_for_group(isolate.tenant, organism.eucast_group)
        .cloned()
        .ok_or_else(|| EngineError::Domain(format!("no Profile for EUCAST group {}", organism.eucast_group)))?;
    let sample_type = store.get_tenant_sample_type(record.sample_type).cloned();
    let taxon_conditions_owned: Vec<TaxonCondition> = store.taxon_conditions().into_iter().cloned().collect();
    let taxon_refs: Vec<&TaxonCondition> = taxon_conditions_owned.iter().collect();

    let existing: HashMap<TenantAntibioticId, LabResult> =
        store.results_for_isolate(isolate.id).into_iter().map(|r| (r.tenant_antibiotic, r.clone())).collect();

    let targeted = acquired_resistance_targets(store, isolate.tenant, &isolate.mechanisms, &isolate.subtypes);

    let mut written = Vec::new();

    for entry in &profile.entries {
        let Some(ta) = store.get_tenant_antibiotic(entry.tenant_antibiotic).cloned() else { continue };
        let Some(antibiotic) = store.get_antibiotic(ta.antibiotic).cloned() else { continue };

        let (result_id, mic, halo, is_new_placeholder) = match existing.get(&entry.tenant_antibiotic) {
            Some(r) => (r.id, r.mic, r.halo, false),
            None => {
                let Some(parent_id) = antibiotic.parent else { continue };
                let Some(parent_ta) = find_tenant_antibiotic(store, isolate.tenant, parent_id) else { continue };
                let Some(parent_result) = existing.get(&parent_ta) else { continue };
                let placeholder = LabResult {
                    id: ResultId::new(0),
                    isolate: isolate.id,
                    tenant_antibiotic: entry.tenant_antibiotic,
                    interpretation: Interpretation::Nd,
                    mic: parent_result.mic,
                    halo: parent_result.halo,
                };
                let id = store.put_result(placeholder);
                (id, parent_result.mic, parent_result.halo, true)
            }
        };

        let (mut new_interpretation, mut was_recomputed) = if organism.is_intrinsically_resistant(&antibiotic) {
            (Interpretation::R, true)
        } else {
            let rules: Vec<BreakpointRule> = store.breakpoint_rules_for(antibiotic.id, target_version).into_iter().cloned().collect();
            let resolve = |id: OrganismId| store.get_organism(id);
            let applicable = applicable_rules(
                &rules,
                antibiotic.id,
                &organism,
                &taxon_refs,
                &resolve,
                Some(record.age),
                Some(record.sex),
                sample_type.as_ref(),
                target_version,
            )
            .next();
            match applicable {
                Some(rule) => {
                    let interpretation = rule.interpret(mic, halo);
                    (interpretation, mic.is_some() || halo.is_some())
                }
                None => (Interpretation::Nd, false),
            }
        };

        if !new_interpretation.is_actionable() {
            if is_new_placeholder {
                store.delete_result(result_id);
                continue;
            }
            new_interpretation = existing.get(&entry.tenant_antibiotic).expect("not a placeholder").interpretation;
            was_recomputed = false;
        }

        if targeted.contains(&antibiotic.id) && !matches!(new_interpretation, Interpretation::R | Interpretation::Na | Interpretation::Nd) {
            new_interpretation = Interpretation::R;
            was_recomputed = true;
        }

        let reinterpretation = Reinterpretation {
            id: ReinterpretationId::new(0),
            result: result_id,
            version: target_version,
            new_interpretation,
            was_recomputed,
            computed_at: Utc::now().naive_utc(),
        };
        store.put_reinterpretation(reinterpretation.clone());
        written.push(reinterpretation);
    }

    Ok(written)
}
