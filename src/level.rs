//! Groups raw `(level, replicate, entity, intensity)` rows into
//! replicate-indexed per-level tables.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::AppError;
use crate::registry::{EntityIndex, EntityRegistry};

/// A single ingested measurement row.
#[derive(Debug, Clone)]
pub struct DataRow {
    pub level: String,
    pub replicate: String,
    pub entity: String,
    pub intensity: f64,
}

/// Dense per-level representation: entity index → one value per replicate,
/// in the level's deterministic (sorted) replicate order. Missing
/// measurements are `None`, never `0.0`.
#[derive(Debug, Clone)]
pub struct StandardLevel {
    pub name: String,
    pub replicate_names: Vec<String>,
    pub values: HashMap<EntityIndex, Vec<Option<f64>>>,
}

impl StandardLevel {
    /// Entities that have at least one measurement in this level.
    pub fn entities(&self) -> impl Iterator<Item = EntityIndex> + '_ {
        self.values.keys().copied()
    }

    pub fn replicate_count(&self) -> usize {
        self.replicate_names.len()
    }
}

/// All levels built from a single ingestion pass, keyed by level name.
#[derive(Debug, Default)]
pub struct LevelSet {
    levels: BTreeMap<String, StandardLevel>,
}

impl LevelSet {
    pub fn get(&self, name: &str) -> Option<&StandardLevel> {
        self.levels.get(name)
    }

    /// Level names in deterministic (sorted) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// All unordered level-name pairs, in a fixed deterministic order.
    pub fn unordered_pairs(&self) -> Vec<(String, String)> {
        let names: Vec<&str> = self.names().collect();
        let mut pairs = Vec::new();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                pairs.push((names[i].to_string(), names[j].to_string()));
            }
        }
        pairs
    }
}

/// Group rows by level, then by replicate (sorted), pre-interning every
/// entity name. Fails on a duplicate `(level, replicate, entity)` triple.
pub fn build_levels(
    rows: &[DataRow],
    registry: &mut EntityRegistry,
) -> Result<LevelSet, AppError> {
    // level -> replicate -> entity -> intensity
    let mut by_level: BTreeMap<&str, BTreeMap<&str, Vec<&DataRow>>> = BTreeMap::new();
    for row in rows {
        by_level
            .entry(row.level.as_str())
            .or_default()
            .entry(row.replicate.as_str())
            .or_default()
            .push(row);
    }

    let mut levels = BTreeMap::new();
    for (level_name, replicates) in by_level {
        let replicate_names: Vec<String> = replicates.keys().map(|s| s.to_string()).collect();
        let mut values: HashMap<EntityIndex, Vec<Option<f64>>> = HashMap::new();

        for (replicate_position, (_, rows_in_replicate)) in replicates.iter().enumerate() {
            let mut seen_entities: BTreeSet<&str> = BTreeSet::new();
            for row in rows_in_replicate {
                if !seen_entities.insert(row.entity.as_str()) {
                    return Err(AppError::InputFormat(format!(
                        "duplicate row for (level={}, replicate={}, entity={})",
                        row.level, row.replicate, row.entity
                    )));
                }
                let index = registry.intern(&row.entity)?;
                let slot = values
                    .entry(index)
                    .or_insert_with(|| vec![None; replicate_names.len()]);
                slot[replicate_position] = Some(row.intensity);
            }
        }

        levels.insert(
            level_name.to_string(),
            StandardLevel {
                name: level_name.to_string(),
                replicate_names,
                values,
            },
        );
    }

    Ok(LevelSet { levels })
}
