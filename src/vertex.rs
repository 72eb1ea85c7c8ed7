//! Cross-level pairwise entity similarities: user-supplied, or a default
//! identity map (optionally with suffix-stripped name equality).

use std::collections::HashMap;

use crate::error::AppError;
use crate::level::LevelSet;
use crate::registry::{EntityIndex, EntityRegistry};

/// A cross-level similarity triple: `i` belongs to the canonical "first"
/// level of the pair's key, `j` to the canonical "second".
pub type Triple = ((EntityIndex, EntityIndex), f64);

/// Symmetric `(levelA, levelB) → triples` map. Internally keyed by
/// lexicographically-sorted level-name pairs so lookups are independent of
/// query order.
#[derive(Debug, Default)]
pub struct VertexSimMap {
    map: HashMap<(String, String), Vec<Triple>>,
}

impl VertexSimMap {
    fn canonical_key<'a>(a: &'a str, b: &'a str) -> ((&'a str, &'a str), bool) {
        if a <= b {
            ((a, b), false)
        } else {
            ((b, a), true)
        }
    }

    /// Triples for the pair `(level_a, level_b)`, oriented so that `i`
    /// belongs to `level_a` and `j` to `level_b`, regardless of how the
    /// pair was originally stored.
    pub fn get(&self, level_a: &str, level_b: &str) -> Vec<Triple> {
        let (key, swapped) = Self::canonical_key(level_a, level_b);
        let stored = self
            .map
            .get(&(key.0.to_string(), key.1.to_string()))
            .cloned()
            .unwrap_or_default();
        if swapped {
            stored
                .into_iter()
                .map(|((i, j), v)| ((j, i), v))
                .collect()
        } else {
            stored
        }
    }

    fn insert(&mut self, level_a: &str, level_b: &str, i: EntityIndex, j: EntityIndex, v: f64) {
        let (key, swapped) = Self::canonical_key(level_a, level_b);
        let entry = self
            .map
            .entry((key.0.to_string(), key.1.to_string()))
            .or_default();
        if swapped {
            entry.push(((j, i), v));
        } else {
            entry.push(((i, j), v));
        }
    }
}

/// Build the default identity vertex-similarity map: similarity `1` for any
/// pair of entities across two distinct levels whose names are equal, or —
/// when `entity_diff` is given — whose names are equal up to stripping a
/// suffix starting at the first occurrence of `entity_diff` in exactly one
/// of the two names.
pub fn default_vertex_sim_map_with_registry(
    levels: &LevelSet,
    registry: &EntityRegistry,
    entity_diff: Option<&str>,
) -> VertexSimMap {
    let mut map = VertexSimMap::default();

    for (level_a, level_b) in levels.unordered_pairs() {
        let la = levels.get(&level_a).expect("level_a must exist");
        let lb = levels.get(&level_b).expect("level_b must exist");

        for i in la.entities() {
            let name_i = registry.lookup(i);
            for j in lb.entities() {
                let name_j = registry.lookup(j);
                if names_match(name_i, name_j, entity_diff) {
                    map.insert(&level_a, &level_b, i, j, 1.0);
                }
            }
        }
    }

    map
}

fn names_match(a: &str, b: &str, entity_diff: Option<&str>) -> bool {
    if a == b {
        return true;
    }
    let Some(sep) = entity_diff else {
        return false;
    };
    let a_has = a.contains(sep);
    let b_has = b.contains(sep);
    if a_has == b_has {
        // Either both or neither contain the separator: not the
        // "exactly one" case the spec requires.
        return false;
    }
    let (with_suffix, without_suffix) = if a_has { (a, b) } else { (b, a) };
    let prefix = with_suffix.split(sep).next().unwrap_or(with_suffix);
    prefix == without_suffix
}

/// A user-supplied vertex-similarity row, pre-validation.
#[derive(Debug, Clone)]
pub struct VertexRow {
    pub level_a: String,
    pub level_b: String,
    pub entity_a: String,
    pub entity_b: String,
    pub similarity: f64,
}

/// Build a `VertexSimMap` from user-supplied rows, validating that every
/// referenced level and entity is present in `levels`/`registry`.
pub fn build_vertex_sim_map(
    rows: &[VertexRow],
    levels: &LevelSet,
    registry: &EntityRegistry,
) -> Result<VertexSimMap, AppError> {
    let mut map = VertexSimMap::default();

    for row in rows {
        if levels.get(&row.level_a).is_none() {
            return Err(AppError::Reference(format!(
                "vertex input references unknown level '{}'",
                row.level_a
            )));
        }
        if levels.get(&row.level_b).is_none() {
            return Err(AppError::Reference(format!(
                "vertex input references unknown level '{}'",
                row.level_b
            )));
        }
        let i = registry.index_of(&row.entity_a).ok_or_else(|| {
            AppError::Reference(format!(
                "vertex input references unknown entity '{}'",
                row.entity_a
            ))
        })?;
        let j = registry.index_of(&row.entity_b).ok_or_else(|| {
            AppError::Reference(format!(
                "vertex input references unknown entity '{}'",
                row.entity_b
            ))
        })?;
        map.insert(&row.level_a, &row.level_b, i, j, row.similarity);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::build_levels;
    use crate::level::DataRow;

    fn row(level: &str, replicate: &str, entity: &str, intensity: f64) -> DataRow {
        DataRow {
            level: level.to_string(),
            replicate: replicate.to_string(),
            entity: entity.to_string(),
            intensity,
        }
    }

    #[test]
    fn default_map_matches_identical_names() {
        let mut registry = EntityRegistry::new();
        let rows = vec![row("A", "r1", "e1", 1.0), row("B", "r1", "e1", 1.0)];
        let levels = build_levels(&rows, &mut registry).unwrap();

        let map = default_vertex_sim_map_with_registry(&levels, &registry, None);
        let triples = map.get("A", "B");
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].1, 1.0);
    }

    #[test]
    fn default_map_lookup_is_symmetric() {
        let mut registry = EntityRegistry::new();
        let rows = vec![row("A", "r1", "e1", 1.0), row("B", "r1", "e1", 1.0)];
        let levels = build_levels(&rows, &mut registry).unwrap();

        let map = default_vertex_sim_map_with_registry(&levels, &registry, None);
        let a_b = map.get("A", "B");
        let b_a = map.get("B", "A");

        assert_eq!(a_b.len(), b_a.len());
        let ((i, j), v) = a_b[0];
        let ((j2, i2), v2) = b_a[0];
        assert_eq!((i, j, v), (i2, j2, v2));
    }

    #[test]
    fn entity_diff_suffix_matches() {
        let mut registry = EntityRegistry::new();
        let rows = vec![row("A", "r1", "ARG29", 1.0), row("B", "r1", "ARG29_7", 1.0)];
        let levels = build_levels(&rows, &mut registry).unwrap();

        let map = default_vertex_sim_map_with_registry(&levels, &registry, Some("_"));
        let triples = map.get("A", "B");
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].1, 1.0);
    }

    #[test]
    fn entity_diff_requires_exactly_one_side_to_have_separator() {
        assert!(!names_match("a_1", "b_2", Some("_")));
        assert!(!names_match("a", "b", Some("_")));
        assert!(names_match("a_1", "a", Some("_")));
    }
}
