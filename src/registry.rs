//! Canonical dense integer IDs for entity names.
//!
//! Every distinct entity name seen across every level is assigned exactly
//! one `EntityIndex`, once. The registry is mutable during ingestion and
//! frozen before any alignment work begins; `intern` after freezing is a
//! programming error in the glue, surfaced as an `AppError::Configuration`.

use std::collections::HashMap;

use crate::error::AppError;

/// Dense index into the entity name table, `i ∈ [0, N)`.
pub type EntityIndex = usize;

/// Bidirectional name↔index table, frozen after ingestion.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    name_to_index: HashMap<String, EntityIndex>,
    index_to_name: Vec<String>,
    frozen: bool,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing index for `name`, allocating a new one if unseen.
    ///
    /// Errors if the registry has already been frozen.
    pub fn intern(&mut self, name: &str) -> Result<EntityIndex, AppError> {
        if let Some(&index) = self.name_to_index.get(name) {
            return Ok(index);
        }
        if self.frozen {
            return Err(AppError::Configuration(format!(
                "cannot intern '{name}': entity registry is frozen"
            )));
        }
        let index = self.index_to_name.len();
        self.index_to_name.push(name.to_string());
        self.name_to_index.insert(name.to_string(), index);
        Ok(index)
    }

    /// Prevent further allocation of new indices.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Total over the allocated range `[0, len())`.
    pub fn lookup(&self, index: EntityIndex) -> &str {
        &self.index_to_name[index]
    }

    /// Index for `name`, if it has been interned.
    pub fn index_of(&self, name: &str) -> Option<EntityIndex> {
        self.name_to_index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.index_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_name.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index_to_name.iter().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_a_bijection_and_stable() {
        let mut registry = EntityRegistry::new();
        let a = registry.intern("alpha").unwrap();
        let b = registry.intern("beta").unwrap();
        let a_again = registry.intern("alpha").unwrap();

        assert_eq!(a, a_again);
        assert_ne!(a, b);
        assert_eq!(registry.lookup(a), "alpha");
        assert_eq!(registry.lookup(b), "beta");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn frozen_registry_rejects_new_names() {
        let mut registry = EntityRegistry::new();
        registry.intern("alpha").unwrap();
        registry.freeze();

        assert!(registry.intern("alpha").is_ok());
        assert!(registry.intern("new-name").is_err());
    }
}
