//! This library implements a cross-level alignment engine: it integrates
//! per-entity measurements produced by independent experiment "levels" and
//! scores, per entity, how consistent that entity's behavior is across
//! every pair of levels.

/// Typed error taxonomy shared by every layer.
pub mod error;

/// Canonical dense integer IDs for entity names.
pub mod registry;

/// Groups raw rows into replicate-indexed per-level tables.
pub mod level;

/// Shared numeric primitives: correlation, cosine, percentiles, normal CDF/quantile.
pub mod stats;

/// Per-level sparse symmetric edge-similarity matrices.
pub mod edge;

/// Cross-level entity similarity maps.
pub mod vertex;

/// Cosine aligner: neighborhood-vector comparison plus a bootstrap or
/// permutation confidence statistic.
pub mod cosine;

/// Random-walk aligner: restartable walk over a product graph.
pub mod walker;

/// Combines per-level-pair scores into one score per entity; ranking and
/// accuracy evaluation utilities.
pub mod aggregate;

/// CSV ingestion and output formatting.
pub mod io;

/// Command-line surface.
pub mod cli;

use std::collections::HashMap;

use cli::{Cli, Method};
use cosine::{align_cosine, CosineConfig};
use edge::{build_edge_matrix, EdgeSimMatrix};
use error::AppError;
use level::{build_levels, DataRow, LevelSet};
use registry::EntityRegistry;
use vertex::{build_vertex_sim_map, default_vertex_sim_map_with_registry, VertexRow, VertexSimMap};
use walker::align_random_walk;

/// Everything produced by ingestion: a frozen registry, the per-level
/// tables, and the vertex-similarity map to align against.
pub struct Ingested {
    pub registry: EntityRegistry,
    pub levels: LevelSet,
    pub vertex_map: VertexSimMap,
}

/// Run ingestion: intern every entity name, group rows into levels, build
/// (or default) the vertex-similarity map, then freeze the registry.
pub fn ingest(
    data_rows: Vec<DataRow>,
    vertex_rows: Option<Vec<VertexRow>>,
    entity_diff: Option<&str>,
) -> Result<Ingested, AppError> {
    let mut registry = EntityRegistry::new();
    let levels = build_levels(&data_rows, &mut registry)?;

    let vertex_map = match vertex_rows {
        Some(rows) => build_vertex_sim_map(&rows, &levels, &registry)?,
        None => default_vertex_sim_map_with_registry(&levels, &registry, entity_diff),
    };

    registry.freeze();

    Ok(Ingested {
        registry,
        levels,
        vertex_map,
    })
}

/// Build the per-level edge-similarity matrices, once per level.
pub fn build_edge_matrices(levels: &LevelSet) -> HashMap<String, EdgeSimMatrix> {
    levels
        .names()
        .map(|name| {
            let level = levels.get(name).expect("name came from levels.names()");
            (name.to_string(), build_edge_matrix(level))
        })
        .collect()
}

/// Run the selected aligner over every unordered level pair and aggregate
/// the results into one score per entity.
pub fn align_all(
    ingested: &Ingested,
    edges: &HashMap<String, EdgeSimMatrix>,
    cli: &Cli,
) -> Result<aggregate::FlatNodeCorrScores, AppError> {
    let n = ingested.registry.len();
    let level_names: Vec<&str> = ingested.levels.names().collect();

    let mut per_pair = Vec::new();
    for (level_a, level_b) in ingested.levels.unordered_pairs() {
        let e1 = &edges[&level_a];
        let e2 = &edges[&level_b];
        let triples = ingested.vertex_map.get(&level_a, &level_b);

        let index_a = level_names.iter().position(|&n| n == level_a).unwrap_or(0);
        let index_b = level_names.iter().position(|&n| n == level_b).unwrap_or(0);
        let pair_id = cosine::level_pair_id(index_a, index_b);

        let scores = match cli.method {
            Method::CosineSimilarity => {
                let config = CosineConfig {
                    nan_policy: cli.nan_policy,
                    bootstrap_resamples: cli.steps,
                    global_seed: cli.seed,
                    confidence_level: 0.95,
                };
                align_cosine(e1, e2, &triples, n, pair_id, &config)
            }
            Method::RandomWalker => {
                align_random_walk(e1, e2, &triples, n, cli.walker_restart, cli.steps)?
            }
        };
        per_pair.push(scores);
    }

    Ok(aggregate::aggregate(n, &per_pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use level::DataRow;

    fn row(level: &str, replicate: &str, entity: &str, intensity: f64) -> DataRow {
        DataRow {
            level: level.to_string(),
            replicate: replicate.to_string(),
            entity: entity.to_string(),
            intensity,
        }
    }

    fn cli_with(method: Method) -> Cli {
        Cli {
            data_input: "unused".into(),
            vertex_input: None,
            entity_diff: None,
            method,
            walker_restart: 0.05,
            steps: 50,
            nan_policy: cosine::NanPolicy::Zero,
            seed: 7,
            verbose: 0,
        }
    }

    #[test]
    fn identical_levels_score_one_under_identity_map() {
        let rows = vec![
            row("A", "r1", "e1", 1.0),
            row("A", "r2", "e1", 2.0),
            row("A", "r1", "e2", 2.0),
            row("A", "r2", "e2", 4.0),
            row("B", "r1", "e1", 1.0),
            row("B", "r2", "e1", 2.0),
            row("B", "r1", "e2", 2.0),
            row("B", "r2", "e2", 4.0),
        ];

        let ingested = ingest(rows, None, None).unwrap();
        let edges = build_edge_matrices(&ingested.levels);
        let flat = align_all(&ingested, &edges, &cli_with(Method::CosineSimilarity)).unwrap();

        for &score in &flat.scores {
            assert!((score - 1.0).abs() < 1e-9, "expected ~1.0, got {score}");
        }
    }

    #[test]
    fn anti_correlated_levels_score_minus_one() {
        let rows = vec![
            row("A", "r1", "e1", 1.0),
            row("A", "r2", "e1", 2.0),
            row("A", "r1", "e2", 2.0),
            row("A", "r2", "e2", 4.0),
            row("B", "r1", "e1", 2.0),
            row("B", "r2", "e1", 4.0),
            row("B", "r1", "e2", 1.0),
            row("B", "r2", "e2", 2.0),
        ];

        let ingested = ingest(rows, None, None).unwrap();
        let edges = build_edge_matrices(&ingested.levels);
        let flat = align_all(&ingested, &edges, &cli_with(Method::CosineSimilarity)).unwrap();

        for &score in &flat.scores {
            assert!((score + 1.0).abs() < 1e-9, "expected ~-1.0, got {score}");
        }
    }

    #[test]
    fn no_overlap_yields_nan_for_every_entity() {
        let rows = vec![
            row("A", "r1", "e1", 1.0),
            row("A", "r2", "e1", 2.0),
            row("B", "r1", "e2", 1.0),
            row("B", "r2", "e2", 2.0),
        ];

        let ingested = ingest(rows, None, None).unwrap();
        let edges = build_edge_matrices(&ingested.levels);
        let flat = align_all(&ingested, &edges, &cli_with(Method::CosineSimilarity)).unwrap();

        assert!(flat.scores.iter().all(|s| s.is_nan()));
    }

    #[test]
    fn entity_diff_suffix_aligns_renamed_entities() {
        let rows = vec![
            row("A", "r1", "ARG29", 1.0),
            row("A", "r2", "ARG29", 2.0),
            row("B", "r1", "ARG29_7", 1.0),
            row("B", "r2", "ARG29_7", 2.0),
        ];

        let ingested = ingest(rows, None, Some("_")).unwrap();
        let edges = build_edge_matrices(&ingested.levels);
        let flat = align_all(&ingested, &edges, &cli_with(Method::CosineSimilarity)).unwrap();

        assert!(flat.scores.iter().any(|&s| (s - 1.0).abs() < 1e-9));
    }

    #[test]
    fn symmetry_of_alignment_holds() {
        let rows = vec![
            row("A", "r1", "e1", 1.0),
            row("A", "r2", "e1", 3.0),
            row("A", "r1", "e2", 2.0),
            row("A", "r2", "e2", 1.0),
            row("B", "r1", "e1", 0.9),
            row("B", "r2", "e1", 3.1),
            row("B", "r1", "e2", 2.2),
            row("B", "r2", "e2", 0.8),
        ];

        let ingested = ingest(rows, None, None).unwrap();
        let edges = build_edge_matrices(&ingested.levels);

        let e_a = &edges["A"];
        let e_b = &edges["B"];
        let triples_ab = ingested.vertex_map.get("A", "B");
        let triples_ba = ingested.vertex_map.get("B", "A");
        let id_ab = cosine::level_pair_id(0, 1);
        let id_ba = cosine::level_pair_id(1, 0);
        let config = CosineConfig {
            bootstrap_resamples: 50,
            ..Default::default()
        };

        let forward = align_cosine(e_a, e_b, &triples_ab, ingested.registry.len(), id_ab, &config);
        let backward = align_cosine(e_b, e_a, &triples_ba, ingested.registry.len(), id_ba, &config);

        for k in 0..ingested.registry.len() {
            let fs = forward.scores[k];
            let bs = backward.scores[k];
            assert!(
                (fs.is_nan() && bs.is_nan()) || (fs - bs).abs() < 1e-9,
                "mismatch at {k}: {fs} vs {bs}"
            );
        }
    }
}
