//! Random-walk aligner: an alternative to the cosine aligner that derives
//! per-vertex alignment scores from a restartable random walk over the
//! product graph of two levels' edge matrices.

use std::collections::HashMap;

use crate::cosine::NodeCorrScores;
use crate::edge::EdgeSimMatrix;
use crate::error::AppError;
use crate::registry::EntityIndex;
use crate::vertex::Triple;

/// Vertices above this count abort the walk with a resource error rather
/// than silently truncating the product graph.
pub const MAX_PRODUCT_VERTICES: usize = 2_000_000;

const CONVERGENCE_EPSILON: f64 = 1e-8;

/// A vertex of the product graph: one entity from each level.
type ProductVertex = (EntityIndex, EntityIndex);

/// Run the random-walk aligner for one unordered pair of levels.
pub fn align_random_walk(
    e1: &EdgeSimMatrix,
    e2: &EdgeSimMatrix,
    vertex_triples: &[Triple],
    n: usize,
    restart: f64,
    steps: u64,
) -> Result<NodeCorrScores, AppError> {
    if !(restart > 0.0 && restart < 1.0) {
        return Err(AppError::Configuration(format!(
            "restart probability must be in (0, 1), got {restart}"
        )));
    }

    let s1: Vec<EntityIndex> = e1.row_indices().collect();
    let s2: Vec<EntityIndex> = e2.row_indices().collect();

    let vertex_count = s1.len().saturating_mul(s2.len());
    if vertex_count > MAX_PRODUCT_VERTICES {
        return Err(AppError::Resource(format!(
            "product graph of {vertex_count} vertices exceeds the cap of {MAX_PRODUCT_VERTICES}"
        )));
    }

    let vertices: Vec<ProductVertex> = s1
        .iter()
        .flat_map(|&i| s2.iter().map(move |&j| (i, j)))
        .collect();
    let index_of: HashMap<ProductVertex, usize> = vertices
        .iter()
        .enumerate()
        .map(|(idx, &v)| (v, idx))
        .collect();
    let total = vertices.len();

    if total == 0 {
        return Ok(NodeCorrScores::undefined(n));
    }

    let adjacency = build_adjacency(&vertices, &index_of, e1, e2);
    let pi0 = initial_distribution(&vertices, &index_of, vertex_triples, total);

    let mut pi = pi0;
    for _ in 0..steps {
        let next = power_iteration_step(&pi, &adjacency, total, restart);
        let delta = l1_distance(&pi, &next);
        pi = next;
        if delta < CONVERGENCE_EPSILON {
            break;
        }
    }

    let mut out = NodeCorrScores::undefined(n);
    for (&(i, j), &idx) in &index_of {
        if i == j {
            out.scores[i] = pi[idx];
        }
    }
    Ok(out)
}

/// Sparse outgoing-edge list per product-graph vertex: `(target_index,
/// weight)`, already normalized so each source's weights sum to 1 (or is
/// empty for a dangling node, handled separately in the iteration step).
fn build_adjacency(
    vertices: &[ProductVertex],
    index_of: &HashMap<ProductVertex, usize>,
    e1: &EdgeSimMatrix,
    e2: &EdgeSimMatrix,
) -> Vec<Vec<(usize, f64)>> {
    vertices
        .iter()
        .map(|&(i, j)| {
            let mut out_edges: Vec<(usize, f64)> = Vec::new();
            let row_i = e1.row(i);
            let row_j = e2.row(j);
            if let (Some(row_i), Some(row_j)) = (row_i, row_j) {
                for (&i_prime, &e1_w) in row_i {
                    let w1 = e1_w.max(0.0);
                    if w1 == 0.0 {
                        continue;
                    }
                    for (&j_prime, &e2_w) in row_j {
                        let w2 = e2_w.max(0.0);
                        if w2 == 0.0 {
                            continue;
                        }
                        if let Some(&target) = index_of.get(&(i_prime, j_prime)) {
                            out_edges.push((target, w1 * w2));
                        }
                    }
                }
            }
            let total_weight: f64 = out_edges.iter().map(|(_, w)| w).sum();
            if total_weight > 0.0 {
                for edge in &mut out_edges {
                    edge.1 /= total_weight;
                }
            }
            out_edges
        })
        .collect()
}

fn initial_distribution(
    vertices: &[ProductVertex],
    index_of: &HashMap<ProductVertex, usize>,
    vertex_triples: &[Triple],
    total: usize,
) -> Vec<f64> {
    let mut pi = vec![0.0; total];
    let mut mass = 0.0;
    for &((i, j), v) in vertex_triples {
        if let Some(&idx) = index_of.get(&(i, j)) {
            pi[idx] += v.max(0.0);
            mass += v.max(0.0);
        }
    }
    if mass > 0.0 {
        for value in &mut pi {
            *value /= mass;
        }
    } else {
        // No overlap to seed from: fall back to uniform over the product
        // graph so the walk still has somewhere to start.
        let uniform = 1.0 / total as f64;
        pi.iter_mut().for_each(|value| *value = uniform);
    }
    let _ = vertices;
    pi
}

fn power_iteration_step(
    pi: &[f64],
    adjacency: &[Vec<(usize, f64)>],
    total: usize,
    restart: f64,
) -> Vec<f64> {
    let uniform_mass = restart / total as f64;
    let mut next = vec![uniform_mass; total];

    for (source, mass) in pi.iter().enumerate() {
        if *mass == 0.0 {
            continue;
        }
        let out_edges = &adjacency[source];
        if out_edges.is_empty() {
            // Dangling node: redistribute its mass uniformly, standard
            // PageRank-style handling, before applying the restart split.
            let share = (1.0 - restart) * mass / total as f64;
            for value in &mut next {
                *value += share;
            }
        } else {
            for &(target, weight) in out_edges {
                next[target] += (1.0 - restart) * mass * weight;
            }
        }
    }

    next
}

fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}
