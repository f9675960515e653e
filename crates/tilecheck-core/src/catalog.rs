//! The mode catalog seam.
//!
//! The catalog itself (which modes exist, their board sizes and rules)
//! is an external collaborator. The verifier only needs to resolve a
//! declared key to an immutable [`ModeConfig`], honouring legacy aliases.

use indexmap::IndexMap;

use crate::error::CatalogError;
use crate::mode::ModeConfig;

/// Read-only lookup of game modes by key.
pub trait ModeCatalog {
    /// Resolve a key (canonical or legacy alias) to its mode.
    ///
    /// The returned config's `key` is always the canonical key.
    fn resolve(&self, key: &str) -> Option<ModeConfig>;
}

/// In-process catalog backed by ordered maps.
///
/// # Examples
///
/// ```
/// use tilecheck_core::{ModeConfig, Ruleset, StaticCatalog, ModeCatalog};
///
/// let mode = ModeConfig {
///     key: "classic_4x4".into(),
///     board_width: 4,
///     board_height: 4,
///     ruleset: Ruleset::Pow2,
///     spawn_table: vec![],
///     max_tile: None,
///     undo_enabled: false,
///     mode_family: "classic".into(),
///     rank_policy: "ranked".into(),
///     ranked_bucket: "classic".into(),
///     special_rules: Default::default(),
/// };
/// let mut catalog = StaticCatalog::new();
/// catalog.insert(mode).unwrap();
/// catalog.alias("classic", "classic_4x4").unwrap();
///
/// assert_eq!(catalog.resolve("classic").unwrap().key, "classic_4x4");
/// assert!(catalog.resolve("hex_7x7").is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    modes: IndexMap<String, ModeConfig>,
    aliases: IndexMap<String, String>,
}

impl StaticCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mode under its own key.
    pub fn insert(&mut self, mode: ModeConfig) -> Result<(), CatalogError> {
        if self.modes.contains_key(&mode.key) || self.aliases.contains_key(&mode.key) {
            return Err(CatalogError::DuplicateKey { key: mode.key });
        }
        self.modes.insert(mode.key.clone(), mode);
        Ok(())
    }

    /// Register a legacy alias for an existing canonical key.
    pub fn alias(
        &mut self,
        alias: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<(), CatalogError> {
        let alias = alias.into();
        let target = target.into();
        if !self.modes.contains_key(&target) {
            return Err(CatalogError::DanglingAlias { alias, target });
        }
        if self.modes.contains_key(&alias) || self.aliases.contains_key(&alias) {
            return Err(CatalogError::DuplicateKey { key: alias });
        }
        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Canonical key for `key`, following one level of aliasing.
    pub fn canonical_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Registered canonical keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    /// Number of canonical modes.
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// Whether the catalog has no modes.
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl ModeCatalog for StaticCatalog {
    fn resolve(&self, key: &str) -> Option<ModeConfig> {
        self.modes.get(self.canonical_key(key)).cloned()
    }
}

impl<C: ModeCatalog + ?Sized> ModeCatalog for &C {
    fn resolve(&self, key: &str) -> Option<ModeConfig> {
        (**self).resolve(key)
    }
}

impl<C: ModeCatalog + ?Sized> ModeCatalog for std::sync::Arc<C> {
    fn resolve(&self, key: &str) -> Option<ModeConfig> {
        (**self).resolve(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Ruleset;

    fn mode(key: &str) -> ModeConfig {
        ModeConfig {
            key: key.to_string(),
            board_width: 4,
            board_height: 4,
            ruleset: Ruleset::Pow2,
            spawn_table: vec![],
            max_tile: None,
            undo_enabled: false,
            mode_family: "classic".to_string(),
            rank_policy: "ranked".to_string(),
            ranked_bucket: "classic".to_string(),
            special_rules: Default::default(),
        }
    }

    #[test]
    fn duplicate_keys_rejected() {
        let mut c = StaticCatalog::new();
        c.insert(mode("a")).unwrap();
        assert_eq!(
            c.insert(mode("a")),
            Err(CatalogError::DuplicateKey { key: "a".into() })
        );
    }

    #[test]
    fn alias_requires_existing_target() {
        let mut c = StaticCatalog::new();
        assert!(matches!(
            c.alias("old", "new"),
            Err(CatalogError::DanglingAlias { .. })
        ));
        c.insert(mode("new")).unwrap();
        c.alias("old", "new").unwrap();
        assert_eq!(c.canonical_key("old"), "new");
        assert_eq!(c.canonical_key("new"), "new");
        assert_eq!(c.resolve("old").map(|m| m.key), Some("new".to_string()));
    }

    #[test]
    fn alias_cannot_shadow_a_mode() {
        let mut c = StaticCatalog::new();
        c.insert(mode("a")).unwrap();
        c.insert(mode("b")).unwrap();
        assert!(c.alias("a", "b").is_err());
        assert_eq!(c.len(), 2);
        assert_eq!(c.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
