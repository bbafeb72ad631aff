//! Attack registry for accessing all builtin attack vectors.

use std::collections::HashMap;

use crate::attack::Attack;
use crate::attacks::builtin_attacks;
use crate::meta::Category;

/// Central registry of all builtin attack vectors.
///
/// Holds the flat attack list in registry order plus an index by id.
pub struct AttackRegistry {
    attacks: Vec<&'static dyn Attack>,
    by_id: HashMap<&'static str, usize>,
}

impl AttackRegistry {
    /// Creates a registry pre-loaded with all builtin attacks.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(builtin_attacks())
    }

    /// Creates a registry from an explicit attack list.
    ///
    /// When ids collide the first attack wins the index entry; the
    /// registry tests guard the builtin list against that.
    #[must_use]
    pub fn new(attacks: Vec<&'static dyn Attack>) -> Self {
        let mut by_id = HashMap::with_capacity(attacks.len());
        for (idx, attack) in attacks.iter().enumerate() {
            by_id.entry(attack.meta().id).or_insert(idx);
        }
        Self { attacks, by_id }
    }

    /// Returns every attack in registry order.
    #[must_use]
    pub fn attacks(&self) -> &[&'static dyn Attack] {
        &self.attacks
    }

    /// Looks up an attack by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'static dyn Attack> {
        self.by_id.get(id).and_then(|&idx| self.attacks.get(idx)).copied()
    }

    /// Returns the attacks in one category, in registry order.
    #[must_use]
    pub fn by_category(&self, category: Category) -> Vec<&'static dyn Attack> {
        self.attacks
            .iter()
            .filter(|a| a.meta().category == category)
            .copied()
            .collect()
    }

    /// Returns the categories that have at least one attack, in canonical order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.attacks.iter().any(|a| a.meta().category == *c))
            .collect()
    }

    /// Returns the total number of attacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    /// Returns `true` when the registry holds no attacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }
}

impl std::fmt::Debug for AttackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackRegistry")
            .field("attack_count", &self.attacks.len())
            .field("category_count", &self.categories().len())
            .finish_non_exhaustive()
    }
}

impl Default for AttackRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use regex::Regex;

    use super::*;
    use crate::Check;

    #[test]
    fn builtin_registry_has_several_hundred_attacks() {
        assert!(AttackRegistry::builtin().len() >= 300);
    }

    #[test]
    fn ids_are_unique() {
        let registry = AttackRegistry::builtin();
        let mut seen = HashSet::new();
        for attack in registry.attacks() {
            assert!(seen.insert(attack.meta().id), "duplicate attack id: {}", attack.meta().id);
        }
    }

    #[test]
    fn ids_are_prefixed_with_their_category() {
        for attack in AttackRegistry::builtin().attacks() {
            let meta = attack.meta();
            let prefix = format!("{}/", meta.category.as_str());
            assert!(meta.id.starts_with(&prefix), "{} is not under {prefix}", meta.id);
            assert!(meta.id.len() > prefix.len(), "{} has an empty name", meta.id);
        }
    }

    #[test]
    fn every_category_has_attacks() {
        let registry = AttackRegistry::builtin();
        assert_eq!(registry.categories(), Category::ALL.to_vec());
    }

    #[test]
    fn by_category_partitions_the_registry() {
        let registry = AttackRegistry::builtin();
        let mut total = 0;
        let mut seen = HashSet::new();

        for category in Category::ALL {
            for attack in registry.by_category(category) {
                assert_eq!(attack.meta().category, category);
                assert!(seen.insert(attack.meta().id));
                total += 1;
            }
        }

        assert_eq!(total, registry.len());
    }

    #[test]
    fn get_finds_every_attack_by_id() {
        let registry = AttackRegistry::builtin();
        for attack in registry.attacks() {
            let found = registry.get(attack.meta().id).unwrap();
            assert_eq!(found.meta().id, attack.meta().id);
        }
        assert!(registry.get("rls/does-not-exist").is_none());
    }

    #[test]
    fn metadata_is_filled_in() {
        for attack in AttackRegistry::builtin().attacks() {
            let meta = attack.meta();
            assert!(!meta.name.is_empty(), "{} has no name", meta.id);
            assert!(!meta.description.is_empty(), "{} has no description", meta.id);
        }
    }

    #[test]
    fn every_check_regex_compiles() {
        for check in crate::attacks::all_checks() {
            let mut patterns = Vec::new();
            check.rule.regexes(&mut patterns);
            for pattern in patterns {
                assert!(Regex::new(pattern).is_ok(), "{}: bad regex {pattern}", check.meta.id);
            }
        }
    }

    #[test]
    fn check_bodies_are_valid_json() {
        for check in crate::attacks::all_checks() {
            if let Some(body) = check.request.body {
                assert!(
                    serde_json::from_str::<serde_json::Value>(body).is_ok(),
                    "{}: body is not JSON",
                    check.meta.id
                );
            }
        }
    }

    #[test]
    fn new_keeps_first_attack_on_id_collision() {
        static FIRST: Check = crate::check! {
            id: "rls/dup",
            name: "first",
            description: "d",
            category: Category::Rls,
            severity: crate::Severity::Low,
            tags: &[],
            request: crate::RequestDef::get(crate::Service::Rest, "x"),
            rule: crate::Rule::Success,
        };
        static SECOND: Check = crate::check! {
            id: "rls/dup",
            name: "second",
            description: "d",
            category: Category::Rls,
            severity: crate::Severity::Low,
            tags: &[],
            request: crate::RequestDef::get(crate::Service::Rest, "y"),
            rule: crate::Rule::Success,
        };

        let registry = AttackRegistry::new(vec![&FIRST, &SECOND]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("rls/dup").unwrap().meta().name, "first");
    }

    #[test]
    fn default_is_equivalent_to_builtin() {
        assert_eq!(AttackRegistry::default().len(), AttackRegistry::builtin().len());
    }
}
