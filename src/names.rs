//! Fresh propositional variable names.

use std::collections::{HashMap, HashSet};

use crate::pbes::Pbes;

/// Hands out names that are distinct from every registered name.
///
/// A fresh name for base `X` is `X` itself if unused, otherwise `X_<n>` where `n` counts up
/// from 1 per base.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    used: HashSet<String>,
    suffix: HashMap<String, usize>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with all equation names of `pbes`.
    pub fn from_pbes(pbes: &Pbes) -> Self {
        let mut registry = Self::new();
        for name in pbes.names() {
            registry.register(name);
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>) {
        self.used.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn fresh(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        while self.used.contains(&name) {
            let n = self.suffix.entry(base.to_string()).or_insert(0);
            *n += 1;
            name = format!("{}_{}", base, n);
        }
        self.used.insert(name.clone());
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh() {
        let mut registry = NameRegistry::new();
        registry.register("X");
        registry.register("X_2");
        assert_eq!(registry.fresh("Y"), "Y");
        assert_eq!(registry.fresh("X"), "X_1");
        assert_eq!(registry.fresh("X"), "X_3");
        assert_eq!(registry.fresh("X_1"), "X_1_1");
        assert!(registry.contains("X_3"));
    }
}
