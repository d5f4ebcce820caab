//! Global-catalog seed loading (spec.md §6 "Fixtures"): JSON arrays under a
//! directory, one file per entity kind, loaded into a `Store`. Idempotent on
//! a per-name uniqueness check — re-running the same fixture directory
//! against an already-seeded store never creates a duplicate catalog entry.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::entities::*;
use crate::error::EngineResult;
use crate::store::Store;

/// How many catalog entries of each kind were newly inserted versus skipped
/// as already-present (by name).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped: usize,
}

impl LoadReport {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Loads every recognized fixture file under `dir`. Missing files are not
/// an error — a deployment may seed only the catalogs it needs — but a
/// present file that fails to parse is (spec.md §7 "Configuration").
pub fn load_dir(store: &mut impl Store, dir: &Path) -> EngineResult<LoadReport> {
    let mut report = LoadReport::default();
    load_antibiotics(store, dir, &mut report)?;
    load_eucast_groups(store, dir, &mut report)?;
    load_organisms(store, dir, &mut report)?;
    load_eucast_versions(store, dir, &mut report)?;
    load_taxon_conditions(store, dir, &mut report)?;
    load_breakpoint_rules(store, dir, &mut report)?;
    load_resistance_mechanisms(store, dir, &mut report)?;
    load_mechanism_subtypes(store, dir, &mut report)?;
    load_sample_categories(store, dir, &mut report)?;
    Ok(report)
}

fn read_array<T: DeserializeOwned>(dir: &Path, file_name: &str) -> EngineResult<Option<Vec<T>>> {
    let path = dir.join(file_name);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    let items: Vec<T> = serde_json::from_str(&text)?;
    Ok(Some(items))
}

fn load_antibiotics(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<Antibiotic>(dir, "antibiotics.json")? else { return Ok(()) };
    for antibiotic in items {
        let exists = store.antibiotics().iter().any(|a| a.name.eq_ignore_ascii_case(&antibiotic.name));
        report.record(!exists);
        if !exists {
            store.put_antibiotic(antibiotic);
        }
    }
    Ok(())
}

fn load_eucast_groups(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<EucastGroup>(dir, "eucast_groups.json")? else { return Ok(()) };
    for group in items {
        report.record(true);
        store.put_eucast_group(group);
    }
    Ok(())
}

fn load_organisms(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<Organism>(dir, "organisms.json")? else { return Ok(()) };
    for organism in items {
        report.record(true);
        store.put_organism(organism);
    }
    Ok(())
}

fn load_eucast_versions(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<EucastVersion>(dir, "eucast_versions.json")? else { return Ok(()) };
    for version in items {
        let exists = store.eucast_versions().iter().any(|v| v.label == version.label);
        report.record(!exists);
        if !exists {
            store.put_eucast_version(version);
        }
    }
    Ok(())
}

fn load_taxon_conditions(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<TaxonCondition>(dir, "taxon_conditions.json")? else { return Ok(()) };
    for condition in items {
        report.record(true);
        store.put_taxon_condition(condition);
    }
    Ok(())
}

fn load_breakpoint_rules(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<BreakpointRule>(dir, "breakpoint_rules.json")? else { return Ok(()) };
    for rule in items {
        report.record(true);
        store.put_breakpoint_rule(rule);
    }
    Ok(())
}

fn load_resistance_mechanisms(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<ResistanceMechanism>(dir, "resistance_mechanisms.json")? else { return Ok(()) };
    for mechanism in items {
        let exists = store.resistance_mechanisms().iter().any(|m| m.name.eq_ignore_ascii_case(&mechanism.name));
        report.record(!exists);
        if !exists {
            store.put_resistance_mechanism(mechanism);
        }
    }
    Ok(())
}

fn load_mechanism_subtypes(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<MechanismSubtype>(dir, "mechanism_subtypes.json")? else { return Ok(()) };
    for subtype in items {
        let exists = store.mechanism_subtypes().iter().any(|s| s.name.eq_ignore_ascii_case(&subtype.name));
        report.record(!exists);
        if !exists {
            store.put_mechanism_subtype(subtype);
        }
    }
    Ok(())
}

fn load_sample_categories(store: &mut impl Store, dir: &Path, report: &mut LoadReport) -> EngineResult<()> {
    let Some(items) = read_array::<SampleCategory>(dir, "sample_categories.json")? else { return Ok(()) };
    for category in items {
        let exists = store.sample_categories().iter().any(|c| c.name.eq_ignore_ascii_case(&category.name));
        report.record(!exists);
        if !exists {
            store.put_sample_category(category);
        }
    }
    Ok(())
}
