//! Per-tenant alias resolution (spec.md §4.2 C2): maps free-text column
//! values and column headers onto the catalog entity they denote. Every
//! catalog entity that carries a primary name plus an `aliases: Vec<String>`
//! list (`TenantAntibiotic`, `TenantOrganism`, `Scope`, `Service`,
//! `TenantSampleType`, `TenantMechanism`, `TenantMechanismSubtype`) is
//! resolved through the same two structures here rather than one bespoke
//! cache per entity kind.

use std::collections::HashMap;

use crate::text::normalize;

/// `{normalized_key: entity}` built from a primary name plus its aliases.
/// The first entry written for a given normalized key wins — later entries
/// for the same key (a duplicate alias, or an alias that collides with
/// another entity's primary name) are silently dropped, matching the
/// first-writer-wins contract of spec.md §4.2.
#[derive(Debug, Clone)]
pub struct AliasCache<T> {
    entries: HashMap<String, T>,
}

impl<T: Clone> AliasCache<T> {
    pub fn new() -> Self {
        AliasCache { entries: HashMap::new() }
    }

    /// Registers `entity` under `primary_name` and every string in `aliases`.
    /// Call once per catalog row, in catalog order, to get first-writer-wins
    /// semantics across the whole catalog.
    pub fn register(&mut self, entity: T, primary_name: &str, aliases: &[String]) {
        self.insert_if_absent(primary_name, &entity);
        for alias in aliases {
            self.insert_if_absent(alias, &entity);
        }
    }

    fn insert_if_absent(&mut self, raw_key: &str, entity: &T) {
        let key = normalize(raw_key);
        if key.is_empty() {
            return;
        }
        self.entries.entry(key).or_insert_with(|| entity.clone());
    }

    /// Exact lookup mode: the whole (normalized) value must match a
    /// registered key — used for column *values* like sex, scope, service,
    /// sample type (spec.md §4.2 "Exact").
    pub fn lookup_exact(&self, raw_value: &str) -> Option<&T> {
        let key = normalize(raw_value);
        if key.is_empty() {
            return None;
        }
        self.entries.get(&key)
    }

    /// "Contains" lookup mode: the registered key need only appear as a
    /// substring of the normalized input — used for mechanism/subtype
    /// detection over column headers and free-text observation phrases
    /// (spec.md §4.2 "Contains"). Antibiotic and demographic column
    /// resolution always use `lookup_exact`.
    pub fn lookup_contains(&self, raw_value: &str) -> Option<&T> {
        let haystack = normalize(raw_value);
        if haystack.is_empty() {
            return None;
        }
        self.entries.iter().find(|(key, _)| haystack.contains(key.as_str())).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for AliasCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
