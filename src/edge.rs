//! Per-level sparse symmetric edge-similarity matrix, and the diagonal
//! injection operation used to bridge two levels' matrices during alignment.

use std::collections::HashMap;

use itertools::Itertools;
use rayon::prelude::*;

use crate::level::StandardLevel;
use crate::registry::EntityIndex;
use crate::stats::pearson_correlation;

/// Values outside `[-1, 1]` are never produced by a real correlation, so
/// `-5` unambiguously marks "this pair was considered but could not be
/// scored" rather than "this pair has zero similarity".
pub const SENTINEL: f64 = -5.0;

/// Upper clamp applied to every computed similarity.
pub const MAXIMUM_EDGE: f64 = 1.0;

/// One sparse row of an `EdgeSimMatrix`: sibling entity index → similarity.
pub type Row = HashMap<EntityIndex, f64>;

/// Sparse symmetric `N × N` similarity matrix for a single level.
#[derive(Debug, Clone, Default)]
pub struct EdgeSimMatrix {
    rows: HashMap<EntityIndex, Row>,
}

impl EdgeSimMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` at both `(i, j)` and `(j, i)`, overwriting whatever was
    /// there before (used for the diagonal-injection operation).
    pub fn set_symmetric(&mut self, i: EntityIndex, j: EntityIndex, value: f64) {
        self.rows.entry(i).or_default().insert(j, value);
        self.rows.entry(j).or_default().insert(i, value);
    }

    pub fn get(&self, i: EntityIndex, j: EntityIndex) -> Option<f64> {
        self.rows.get(&i).and_then(|row| row.get(&j)).copied()
    }

    /// The sparse neighborhood vector for `i`, if `i` is a row of this matrix.
    pub fn row(&self, i: EntityIndex) -> Option<&Row> {
        self.rows.get(&i)
    }

    pub fn has_row(&self, i: EntityIndex) -> bool {
        self.rows.contains_key(&i)
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = (&EntityIndex, &Row)> {
        self.rows.iter()
    }

    pub fn row_indices(&self) -> impl Iterator<Item = EntityIndex> + '_ {
        self.rows.keys().copied()
    }
}

/// Build the sparse edge-similarity matrix for a single level's replicate
/// vectors. Every unordered pair of entities present in the level receives
/// an entry: the clamped Pearson correlation if at least two replicate
/// positions are co-present, the sentinel otherwise.
pub fn build_edge_matrix(level: &StandardLevel) -> EdgeSimMatrix {
    let entities: Vec<EntityIndex> = itertools::sorted(level.entities()).collect();
    let pairs: Vec<(EntityIndex, EntityIndex)> = entities.into_iter().tuple_combinations().collect();

    let scored_pairs: Vec<(EntityIndex, EntityIndex, f64)> = pairs
        .into_par_iter()
        .map(|(i, j)| {
            let similarity = pairwise_similarity(level, i, j);
            (i, j, similarity)
        })
        .collect();

    let mut matrix = EdgeSimMatrix::new();
    for (i, j, similarity) in scored_pairs {
        matrix.set_symmetric(i, j, similarity);
    }
    matrix
}

fn pairwise_similarity(level: &StandardLevel, i: EntityIndex, j: EntityIndex) -> f64 {
    let xi = &level.values[&i];
    let xj = &level.values[&j];

    let (common_x, common_y): (Vec<f64>, Vec<f64>) = xi
        .iter()
        .zip(xj.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        })
        .unzip();

    if common_x.len() < 2 {
        return SENTINEL;
    }

    let similarity = pearson_correlation(&common_x, &common_y);
    if similarity.is_nan() {
        return SENTINEL;
    }
    similarity.min(MAXIMUM_EDGE)
}

/// Non-destructively fold inter-level vertex similarities into a copy of
/// `matrix`'s diagonal region. Each `((i, j), v)` triple writes `E[i,j] =
/// E[j,i] = v`, potentially introducing rows for indices that were not
/// natively part of `matrix` — that is how a shared vertex becomes a row of
/// both levels' matrices post-injection.
pub fn inject_vertex_sim(matrix: &EdgeSimMatrix, triples: &[((EntityIndex, EntityIndex), f64)]) -> EdgeSimMatrix {
    let mut out = matrix.clone();
    for &((i, j), v) in triples {
        out.set_symmetric(i, j, v);
    }
    out
}
