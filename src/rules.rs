//! EUCAST breakpoint rule evaluation (spec.md §4.3 C3): taxonomic condition
//! matching by decreasing specificity, rule applicability, and MIC/halo
//! interpretation with two-fold dilution doubling.

use chrono::NaiveDate;

use crate::entities::{
    AntibioticId, BreakpointRule, EucastGroupId, EucastVersionId, Interpretation, Organism,
    OrganismId, SampleCategoryId, Sex, TaxonCondition, TaxonScope, TenantSampleType,
};

/// Whether `organism` and `reference` share the taxonomic rank `scope`
/// names (spec.md §4.3 step 4). `Custom` has no rank-level meaning here —
/// callers only reach this for the non-`Custom` variants.
fn shares_rank(scope: TaxonScope, organism: &Organism, reference: &Organism) -> bool {
    match scope {
        TaxonScope::Group => organism.eucast_group == reference.eucast_group,
        TaxonScope::Family => organism.taxonomy.family == reference.taxonomy.family,
        TaxonScope::Genus => organism.taxonomy.genus == reference.taxonomy.genus,
        TaxonScope::Species => {
            organism.taxonomy.genus == reference.taxonomy.genus
                && organism.taxonomy.species == reference.taxonomy.species
        }
        TaxonScope::Custom => false,
    }
}

impl TaxonCondition {
    /// Decides whether this predicate matches `organism`, trying
    /// decreasing levels of taxonomic specificity (spec.md §4.3). `resolve`
    /// looks up the full `Organism` behind an id in `include`/`exclude` so
    /// non-`Custom` scopes can compare taxonomy/group against it rather than
    /// requiring exact id membership.
    pub fn applies_to<'o>(&self, organism: &Organism, resolve: &dyn Fn(OrganismId) -> Option<&'o Organism>) -> bool {
        if self.exclude.contains(&organism.id) {
            return false;
        }
        // Exclusion is re-evaluated at every specificity level, independent
        // of include-set membership: EUCAST rules sometimes exclude at a
        // higher rank than they include.
        if !matches!(self.scope, TaxonScope::Custom) {
            let excluded_at_scope = self
                .exclude
                .iter()
                .filter_map(|&id| resolve(id))
                .any(|excl| shares_rank(self.scope, organism, excl));
            if excluded_at_scope {
                return false;
            }
        }
        if self.include.is_empty() {
            return true;
        }
        if self.include.contains(&organism.id) {
            return true;
        }
        if matches!(self.scope, TaxonScope::Custom) {
            return false;
        }
        self.include
            .iter()
            .filter_map(|&id| resolve(id))
            .any(|inc| shares_rank(self.scope, organism, inc))
    }
}

impl BreakpointRule {
    /// Full applicability check against an organism, context, and optional
    /// demographic/sample filters (spec.md §4.3).
    #[allow(clippy::too_many_arguments)]
    pub fn applies_to<'o>(
        &self,
        antibiotic: AntibioticId,
        organism: &Organism,
        taxon_conditions: &[&TaxonCondition],
        resolve: &dyn Fn(OrganismId) -> Option<&'o Organism>,
        age: Option<f64>,
        sex: Option<Sex>,
        sample_type: Option<&TenantSampleType>,
        version: EucastVersionId,
    ) -> bool {
        if self.version != version {
            return false;
        }
        if self.antibiotic != antibiotic {
            return false;
        }
        if let Some(group) = self.eucast_group {
            if organism.eucast_group != group {
                return false;
            }
        }
        if !self.taxon_conditions.is_empty() {
            let relevant: Vec<&&TaxonCondition> = taxon_conditions
                .iter()
                .filter(|tc| self.taxon_conditions.contains(&tc.id))
                .collect();
            if !relevant.iter().any(|tc| tc.applies_to(organism, resolve)) {
                return false;
            }
            if relevant.iter().any(|tc| tc.exclude.contains(&organism.id)) {
                return false;
            }
        }
        if self.age_min.is_some() || self.age_max.is_some() {
            match age {
                None => return false,
                Some(age) => {
                    if self.age_min.is_some_and(|min| age < min) {
                        return false;
                    }
                    if self.age_max.is_some_and(|max| age > max) {
                        return false;
                    }
                }
            }
        }
        if let (Some(rule_sex), Some(input_sex)) = (self.sex, sex) {
            if rule_sex != input_sex {
                return false;
            }
        }
        if !self.sample_categories.is_empty() {
            match sample_type {
                None => return false,
                Some(sample_type) => {
                    if !self.sample_categories.contains(&sample_type.category) {
                        return false;
                    }
                }
            }
        }
        true
    }

    /// MIC/halo interpretation with MIC precedence and two-fold dilution
    /// doubling on the resistant boundary (spec.md §4.3).
    pub fn interpret(&self, mic: Option<f64>, halo: Option<f64>) -> Interpretation {
        if let Some(mic) = mic {
            return self.interpret_mic(mic);
        }
        if let Some(halo) = halo {
            return self.interpret_halo(halo);
        }
        Interpretation::Nd
    }

    fn interpret_mic(&self, mic: f64) -> Interpretation {
        let below_s = self.s_mic_max.is_some_and(|s| mic <= s);
        let above_r = self.r_mic_min.is_some_and(|r| mic > 2.0 * r);
        match (below_s, above_r, self.s_mic_max, self.r_mic_min) {
            (true, _, _, _) => Interpretation::S,
            (_, true, _, _) => Interpretation::R,
            (false, false, Some(s), Some(r)) if mic > s && mic < 2.0 * r => Interpretation::I,
            _ => Interpretation::Nd,
        }
    }

    fn interpret_halo(&self, halo: f64) -> Interpretation {
        match (self.s_halo_min, self.r_halo_max) {
            (Some(s), _) if halo >= s => Interpretation::S,
            (_, Some(r)) if halo < r => Interpretation::R,
            (Some(s), Some(r)) if halo >= r && halo < s => Interpretation::I,
            _ => Interpretation::Nd,
        }
    }
}

/// Returns every candidate rule for which `applies_to` holds, in the same
/// order as `candidates`. Callers decide first-match-wins vs. apply-all
/// policy per use-case (spec.md §4.3, §4.6) — this function never picks one.
#[allow(clippy::too_many_arguments)]
pub fn applicable_rules<'a>(
    candidates: &'a [BreakpointRule],
    antibiotic: AntibioticId,
    organism: &'a Organism,
    taxon_conditions: &'a [&'a TaxonCondition],
    resolve: &'a dyn Fn(OrganismId) -> Option<&'a Organism>,
    age: Option<f64>,
    sex: Option<Sex>,
    sample_type: Option<&'a TenantSampleType>,
    version: EucastVersionId,
) -> impl Iterator<Item = &'a BreakpointRule> {
    candidates.iter().filter(move |rule| {
        rule.applies_to(antibiotic, organism, taxon_conditions, resolve, age, sex, sample_type, version)
    })
}

/// Whether `date` falls within a version's validity window — re-exported
/// here for callers that resolve "the applicable version for a capture date"
/// alongside rule lookup (spec.md §3 `EucastVersion`).
pub fn version_covers(valid_from: NaiveDate, valid_until: Option<NaiveDate>, date: NaiveDate) -> bool {
    date >= valid_from && valid_until.is_none_or(|end| date <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{OrganismId, Taxonomy};
    use std::collections::HashSet;

    fn organism(id: u64, group: u64) -> Organism {
        organism_with_taxonomy(id, group, "Enterobacteriaceae", "Escherichia", "coli")
    }

    fn organism_with_taxonomy(id: u64, group: u64, family: &str, genus: &str, species: &str) -> Organism {
        Organism {
            id: OrganismId(id),
            taxonomy: Taxonomy {
                kingdom: "Bacteria".into(),
                family: family.into(),
                genus: genus.into(),
                species: species.into(),
            },
            eucast_group: EucastGroupId(group),
            intrinsic_resistance: HashSet::new(),
        }
    }

    fn no_resolve(_: OrganismId) -> Option<&'static Organism> {
        None
    }

    fn rule(s_mic_max: Option<f64>, r_mic_min: Option<f64>) -> BreakpointRule {
        BreakpointRule {
            id: crate::entities::BreakpointRuleId(1),
            antibiotic: AntibioticId(1),
            eucast_group: None,
            taxon_conditions: vec![],
            sample_categories: vec![],
            age_min: None,
            age_max: None,
            sex: None,
            s_mic_max,
            r_mic_min,
            s_halo_min: None,
            r_halo_max: None,
            version: EucastVersionId(1),
        }
    }

    #[test]
    fn mic_interpretation_respects_doubling_on_resistant_boundary() {
        let r = rule(Some(1.0), Some(2.0));
        assert_eq!(r.interpret(Some(1.0), None), Interpretation::S);
        assert_eq!(r.interpret(Some(3.0), None), Interpretation::I);
        assert_eq!(r.interpret(Some(4.0), None), Interpretation::I);
        assert_eq!(r.interpret(Some(4.01), None), Interpretation::R);
    }

    #[test]
    fn mic_interpretation_is_nd_without_bounds() {
        let r = rule(None, None);
        assert_eq!(r.interpret(Some(1.0), None), Interpretation::Nd);
    }

    #[test]
    fn interpret_is_nd_when_both_null() {
        let r = rule(Some(1.0), Some(2.0));
        assert_eq!(r.interpret(None, None), Interpretation::Nd);
    }

    #[test]
    fn mic_takes_precedence_over_halo() {
        let mut r = rule(Some(1.0), Some(2.0));
        r.s_halo_min = Some(20.0);
        r.r_halo_max = Some(14.0);
        assert_eq!(r.interpret(Some(0.5), Some(5.0)), Interpretation::S);
    }

    #[test]
    fn halo_path_used_only_when_mic_absent() {
        let mut r = rule(None, None);
        r.s_halo_min = Some(20.0);
        r.r_halo_max = Some(14.0);
        assert_eq!(r.interpret(None, Some(21.0)), Interpretation::S);
        assert_eq!(r.interpret(None, Some(10.0)), Interpretation::R);
        assert_eq!(r.interpret(None, Some(17.0)), Interpretation::I);
    }

    #[test]
    fn taxon_condition_exclude_wins_over_include() {
        let tc = TaxonCondition {
            id: crate::entities::TaxonConditionId(1),
            scope: TaxonScope::Species,
            include: [OrganismId(1)].into_iter().collect(),
            exclude: [OrganismId(1)].into_iter().collect(),
        };
        assert!(!tc.applies_to(&organism(1, 1), &no_resolve));
    }

    #[test]
    fn custom_scope_requires_explicit_membership() {
        let tc = TaxonCondition {
            id: crate::entities::TaxonConditionId(1),
            scope: TaxonScope::Custom,
            include: [OrganismId(1)].into_iter().collect(),
            exclude: HashSet::new(),
        };
        assert!(tc.applies_to(&organism(1, 1), &no_resolve));
        assert!(!tc.applies_to(&organism(2, 1), &no_resolve));
    }

    #[test]
    fn group_scope_matches_any_organism_sharing_the_included_organisms_group() {
        let reference = organism_with_taxonomy(1, 7, "Enterobacteriaceae", "Escherichia", "coli");
        let same_group_different_species = organism_with_taxonomy(2, 7, "Enterobacteriaceae", "Klebsiella", "pneumoniae");
        let different_group = organism_with_taxonomy(3, 8, "Enterobacteriaceae", "Escherichia", "coli");
        let tc = TaxonCondition {
            id: crate::entities::TaxonConditionId(1),
            scope: TaxonScope::Group,
            include: [OrganismId(1)].into_iter().collect(),
            exclude: HashSet::new(),
        };
        let resolve = |id: OrganismId| [&reference].into_iter().find(|o| o.id == id);
        assert!(tc.applies_to(&same_group_different_species, &resolve));
        assert!(!tc.applies_to(&different_group, &resolve));
    }

    #[test]
    fn genus_scope_matches_across_species_within_the_same_genus() {
        let reference = organism_with_taxonomy(1, 1, "Enterobacteriaceae", "Escherichia", "coli");
        let same_genus = organism_with_taxonomy(2, 1, "Enterobacteriaceae", "Escherichia", "fergusonii");
        let different_genus = organism_with_taxonomy(3, 1, "Enterobacteriaceae", "Klebsiella", "pneumoniae");
        let tc = TaxonCondition {
            id: crate::entities::TaxonConditionId(1),
            scope: TaxonScope::Genus,
            include: [OrganismId(1)].into_iter().collect(),
            exclude: HashSet::new(),
        };
        let resolve = |id: OrganismId| [&reference].into_iter().find(|o| o.id == id);
        assert!(tc.applies_to(&same_genus, &resolve));
        assert!(!tc.applies_to(&different_genus, &resolve));
    }

    #[test]
    fn species_scope_requires_matching_genus_and_species() {
        let reference = organism_with_taxonomy(1, 1, "Enterobacteriaceae", "Escherichia", "coli");
        let same_species_different_id = organism_with_taxonomy(2, 1, "Enterobacteriaceae", "Escherichia", "coli");
        let same_genus_different_species = organism_with_taxonomy(3, 1, "Enterobacteriaceae", "Escherichia", "fergusonii");
        let tc = TaxonCondition {
            id: crate::entities::TaxonConditionId(1),
            scope: TaxonScope::Species,
            include: [OrganismId(1)].into_iter().collect(),
            exclude: HashSet::new(),
        };
        let resolve = |id: OrganismId| [&reference].into_iter().find(|o| o.id == id);
        assert!(tc.applies_to(&same_species_different_id, &resolve));
        assert!(!tc.applies_to(&same_genus_different_species, &resolve));
    }

    #[test]
    fn family_scope_excludes_at_the_family_level_even_without_exact_id_membership() {
        let excluded_marker = organism_with_taxonomy(9, 2, "Pseudomonadaceae", "Pseudomonas", "aeruginosa");
        let different_id_same_family = organism_with_taxonomy(50, 2, "Pseudomonadaceae", "Pseudomonas", "putida");
        let unrelated = organism_with_taxonomy(1, 1, "Enterobacteriaceae", "Escherichia", "coli");
        let tc = TaxonCondition {
            id: crate::entities::TaxonConditionId(1),
            scope: TaxonScope::Family,
            include: HashSet::new(),
            exclude: [OrganismId(9)].into_iter().collect(),
        };
        let resolve = |id: OrganismId| [&excluded_marker].into_iter().find(|o| o.id == id);
        assert!(!tc.applies_to(&different_id_same_family, &resolve));
        assert!(tc.applies_to(&unrelated, &resolve));
    }

    #[test]
    fn rule_applies_to_checks_version_antibiotic_and_group() {
        let mut r = rule(Some(1.0), Some(2.0));
        r.eucast_group = Some(EucastGroupId(5));
        let org = organism(1, 5);
        assert!(r.applies_to(AntibioticId(1), &org, &[], &no_resolve, None, None, None, EucastVersionId(1)));
        assert!(!r.applies_to(AntibioticId(1), &org, &[], &no_resolve, None, None, None, EucastVersionId(2)));
        assert!(!r.applies_to(AntibioticId(2), &org, &[], &no_resolve, None, None, None, EucastVersionId(1)));
        let wrong_group = organism(1, 9);
        assert!(!r.applies_to(AntibioticId(1), &wrong_group, &[], &no_resolve, None, None, None, EucastVersionId(1)));
    }

    #[test]
    fn rule_with_age_bounds_fails_missing_age() {
        let mut r = rule(Some(1.0), Some(2.0));
        r.age_min = Some(18.0);
        let org = organism(1, 1);
        assert!(!r.applies_to(AntibioticId(1), &org, &[], &no_resolve, None, None, None, EucastVersionId(1)));
        assert!(r.applies_to(AntibioticId(1), &org, &[], &no_resolve, Some(20.0), None, None, EucastVersionId(1)));
        assert!(!r.applies_to(AntibioticId(1), &org, &[], &no_resolve, Some(10.0), None, None, EucastVersionId(1)));
    }
}
