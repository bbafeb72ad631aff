use std::collections::HashSet;

use supaprobe_attacks::{Attack, AttackRegistry, Category, Severity};

use crate::error::SelectionError;

/// Filters that narrow the registry to the attacks of one run.
///
/// Categories and explicit ids are combined as a union; an empty union means
/// every attack. Severity and tag filters then apply to that set, and
/// disabled ids are removed last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Categories to include.
    pub categories: Vec<Category>,
    /// Attack ids to include; each must exist in the registry.
    pub ids: Vec<String>,
    /// Minimum severity to keep.
    pub min_severity: Option<Severity>,
    /// Attack ids to drop.
    pub disabled: Vec<String>,
    /// Keep only attacks carrying at least one of these tags.
    pub tags: Vec<String>,
}

impl Selection {
    /// A selection matching every attack.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns `true` when no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Resolves the selection against `registry`, preserving registry order.
    pub fn resolve(&self, registry: &AttackRegistry) -> Result<Vec<&'static dyn Attack>, SelectionError> {
        if let Some(unknown) = self.ids.iter().find(|id| registry.get(id).is_none()) {
            return Err(SelectionError::UnknownAttack(unknown.clone()));
        }

        let ids: HashSet<&str> = self.ids.iter().map(String::as_str).collect();
        let disabled: HashSet<&str> = self.disabled.iter().map(String::as_str).collect();
        let include_all = self.categories.is_empty() && ids.is_empty();

        let selected = registry
            .attacks()
            .iter()
            .copied()
            .filter(|attack| {
                let meta = attack.meta();
                include_all || ids.contains(meta.id) || self.categories.contains(&meta.category)
            })
            .filter(|attack| self.min_severity.is_none_or(|min| attack.meta().severity >= min))
            .filter(|attack| self.tags.is_empty() || self.tags.iter().any(|t| attack.meta().has_tag(t)))
            .filter(|attack| !disabled.contains(attack.meta().id))
            .collect();

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(attacks: &[&'static dyn Attack]) -> Vec<&'static str> {
        attacks.iter().map(|a| a.meta().id).collect()
    }

    #[test]
    fn empty_selection_returns_whole_registry() {
        let registry = AttackRegistry::builtin();
        let attacks = Selection::all().resolve(&registry).unwrap();
        assert_eq!(attacks.len(), registry.len());
        assert!(Selection::all().is_empty());
    }

    #[test]
    fn category_filter_keeps_only_that_category() {
        let registry = AttackRegistry::builtin();
        let selection = Selection {
            categories: vec![Category::Storage],
            ..Selection::default()
        };
        let attacks = selection.resolve(&registry).unwrap();
        assert!(!attacks.is_empty());
        assert!(attacks.iter().all(|a| a.meta().category == Category::Storage));
        assert_eq!(attacks.len(), registry.by_category(Category::Storage).len());
    }

    #[test]
    fn ids_and_categories_are_a_union() {
        let registry = AttackRegistry::builtin();
        let selection = Selection {
            categories: vec![Category::Vault],
            ids: vec!["auth/alg-none".into()],
            ..Selection::default()
        };
        let attacks = selection.resolve(&registry).unwrap();
        assert!(ids(&attacks).contains(&"auth/alg-none"));
        assert_eq!(attacks.len(), registry.by_category(Category::Vault).len() + 1);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let registry = AttackRegistry::builtin();
        let selection = Selection {
            ids: vec!["rls/not-a-real-attack".into()],
            ..Selection::default()
        };
        assert_eq!(
            selection.resolve(&registry).map(|_| ()).unwrap_err(),
            SelectionError::UnknownAttack("rls/not-a-real-attack".into())
        );
    }

    #[test]
    fn min_severity_drops_lower_attacks() {
        let registry = AttackRegistry::builtin();
        let selection = Selection {
            min_severity: Some(Severity::Critical),
            ..Selection::default()
        };
        let attacks = selection.resolve(&registry).unwrap();
        assert!(!attacks.is_empty());
        assert!(attacks.iter().all(|a| a.meta().severity == Severity::Critical));
    }

    #[test]
    fn disabled_ids_are_removed_last() {
        let registry = AttackRegistry::builtin();
        let selection = Selection {
            ids: vec!["auth/alg-none".into(), "auth/admin-users".into()],
            disabled: vec!["auth/alg-none".into()],
            ..Selection::default()
        };
        assert_eq!(ids(&selection.resolve(&registry).unwrap()), vec!["auth/admin-users"]);
    }

    #[test]
    fn tag_filter_matches_any_tag() {
        let registry = AttackRegistry::builtin();
        let selection = Selection {
            tags: vec!["secrets".into()],
            ..Selection::default()
        };
        let attacks = selection.resolve(&registry).unwrap();
        assert!(!attacks.is_empty());
        assert!(attacks.iter().all(|a| a.meta().has_tag("secrets")));
    }

    #[test]
    fn resolution_preserves_registry_order() {
        let registry = AttackRegistry::builtin();
        let selection = Selection {
            categories: vec![Category::RlsPolicy, Category::Rls],
            ..Selection::default()
        };
        let attacks = selection.resolve(&registry).unwrap();
        let first_policy = attacks
            .iter()
            .position(|a| a.meta().category == Category::RlsPolicy)
            .unwrap();
        assert!(attacks[..first_policy].iter().all(|a| a.meta().category == Category::Rls));
    }
}
