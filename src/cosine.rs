//! Cosine aligner: folds vertex similarities into edge matrices, then for
//! every shared vertex compares neighborhood vectors across the two levels
//! and attaches a confidence statistic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::edge::{inject_vertex_sim, EdgeSimMatrix, Row};
use crate::registry::EntityIndex;
use crate::stats::{cosine_similarity, normal_cdf, normal_quantile, percentile_sorted};
use crate::vertex::Triple;

/// What a zero-norm cosine resolves to during bootstrap resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum NanPolicy {
    Zero,
    Propagate,
}

impl Default for NanPolicy {
    fn default() -> Self {
        NanPolicy::Zero
    }
}

/// A confidence statistic attached to one vertex's alignment score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    PValue(f64),
    Bootstrap {
        point: f64,
        lower: f64,
        upper: f64,
        level: f64,
    },
}

/// Dense length-N per-entity score vector; unseen entries are `NaN`.
#[derive(Debug, Clone)]
pub struct NodeCorrScores {
    pub scores: Vec<f64>,
    pub statistics: Vec<Option<Statistic>>,
}

impl NodeCorrScores {
    pub fn undefined(n: usize) -> Self {
        NodeCorrScores {
            scores: vec![f64::NAN; n],
            statistics: vec![None; n],
        }
    }
}

/// Configuration shared by every per-vertex cosine+confidence job.
#[derive(Debug, Clone, Copy)]
pub struct CosineConfig {
    pub nan_policy: NanPolicy,
    pub bootstrap_resamples: u64,
    pub global_seed: u64,
    pub confidence_level: f64,
}

impl Default for CosineConfig {
    fn default() -> Self {
        CosineConfig {
            nan_policy: NanPolicy::Zero,
            bootstrap_resamples: 10_000,
            global_seed: 42,
            confidence_level: 0.95,
        }
    }
}

/// Deterministic per-job seed: `splitmix64`-style mix of the level-pair id,
/// the entity index, and the run's global seed, so output does not depend
/// on worker scheduling.
pub fn derive_seed(global_seed: u64, level_pair_id: u64, entity: EntityIndex) -> u64 {
    let mut x = global_seed
        ^ level_pair_id.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (entity as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Combine two sorted level indices into a single id, order-independent so
/// `align(L1, L2)` and `align(L2, L1)` derive identical per-job seeds.
pub fn level_pair_id(level_index_a: usize, level_index_b: usize) -> u64 {
    let (lo, hi) = if level_index_a <= level_index_b {
        (level_index_a, level_index_b)
    } else {
        (level_index_b, level_index_a)
    };
    ((lo as u64) << 32) | (hi as u64)
}

/// Align one unordered pair of levels' edge matrices via the cosine path.
/// `n` is the total entity count (registry size), used to size the dense
/// output vector and the bootstrap's densified vectors.
pub fn align_cosine(
    e1: &EdgeSimMatrix,
    e2: &EdgeSimMatrix,
    vertex_triples: &[Triple],
    n: usize,
    level_pair_id: u64,
    config: &CosineConfig,
) -> NodeCorrScores {
    let e1_prime = inject_vertex_sim(e1, vertex_triples);
    let e2_prime = inject_vertex_sim(e2, vertex_triples);

    let shared: Vec<EntityIndex> = e1_prime
        .row_indices()
        .filter(|k| e2_prime.has_row(*k))
        .collect();

    let results: Vec<(EntityIndex, f64, Statistic)> = shared
        .par_iter()
        .map(|&k| {
            let x = e1_prime.row(k).expect("k is a shared row");
            let y = e2_prime.row(k).expect("k is a shared row");
            let seed = derive_seed(config.global_seed, level_pair_id, k);
            let (score, stat) = score_vertex(x, y, n, seed, config);
            (k, score, stat)
        })
        .collect();

    let mut out = NodeCorrScores::undefined(n);
    for (k, score, stat) in results {
        out.scores[k] = score;
        out.statistics[k] = Some(stat);
    }
    out
}

fn score_vertex(
    x: &Row,
    y: &Row,
    n: usize,
    seed: u64,
    config: &CosineConfig,
) -> (f64, Statistic) {
    let (dense_x, dense_y) = densify(x, y, n);
    let raw_score = cosine_similarity(&dense_x, &dense_y);
    let score = resolve_nan(raw_score, config.nan_policy, "cosine alignment score");

    let stat = bca_bootstrap(
        &dense_x,
        &dense_y,
        config.bootstrap_resamples,
        config.confidence_level,
        seed,
        config.nan_policy,
    );

    (score, stat)
}

fn resolve_nan(value: f64, policy: NanPolicy, context: &str) -> f64 {
    if value.is_nan() && policy == NanPolicy::Zero {
        log::warn!("numeric degeneracy resolved to 0 ({context}): zero-norm vector");
        0.0
    } else {
        value
    }
}

/// Densify two sparse rows into length-N vectors sharing an index space
/// (the union of both rows' keys, padded with zeros elsewhere).
fn densify(x: &Row, y: &Row, n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut dense_x = vec![0.0; n];
    let mut dense_y = vec![0.0; n];
    for (&i, &v) in x {
        dense_x[i] = v;
    }
    for (&i, &v) in y {
        dense_y[i] = v;
    }
    (dense_x, dense_y)
}

/// BCa bootstrap confidence interval for the cosine statistic over two
/// densified length-N vectors.
fn bca_bootstrap(
    x: &[f64],
    y: &[f64],
    resamples: u64,
    confidence: f64,
    seed: u64,
    nan_policy: NanPolicy,
) -> Statistic {
    let n = x.len();
    let point = resolve_nan(cosine_similarity(x, y), nan_policy, "bootstrap point estimate");

    if n == 0 || resamples == 0 {
        return Statistic::Bootstrap {
            point,
            lower: point,
            upper: point,
            level: confidence,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut replicates: Vec<f64> = Vec::with_capacity(resamples as usize);
    for _ in 0..resamples {
        let mut rx = Vec::with_capacity(n);
        let mut ry = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = rng.gen_range(0..n);
            rx.push(x[idx]);
            ry.push(y[idx]);
        }
        let resampled = resolve_nan(cosine_similarity(&rx, &ry), NanPolicy::Zero, "bootstrap resample");
        replicates.push(resampled);
    }

    let mut sorted = replicates.clone();
    sorted.sort_by(f64::total_cmp);

    // Bias-correction z0: proportion of replicates below the point estimate.
    let below = replicates.iter().filter(|&&r| r < point).count() as f64;
    let proportion = ((below + 0.5) / (replicates.len() as f64 + 1.0)).clamp(1e-6, 1.0 - 1e-6);
    let z0 = normal_quantile(proportion);

    // Acceleration via leave-one-position-out jackknife over the N coordinates.
    let jackknife: Vec<f64> = (0..n)
        .map(|leave_out| {
            let jx: Vec<f64> = x
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != leave_out)
                .map(|(_, &v)| v)
                .collect();
            let jy: Vec<f64> = y
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != leave_out)
                .map(|(_, &v)| v)
                .collect();
            resolve_nan(cosine_similarity(&jx, &jy), NanPolicy::Zero, "jackknife replicate")
        })
        .collect();

    let theta_dot = jackknife.iter().sum::<f64>() / jackknife.len().max(1) as f64;
    let numerator: f64 = jackknife.iter().map(|&t| (theta_dot - t).powi(3)).sum();
    let denominator: f64 = 6.0
        * jackknife
            .iter()
            .map(|&t| (theta_dot - t).powi(2))
            .sum::<f64>()
            .powf(1.5);
    let acceleration = if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    };

    let alpha = 1.0 - confidence;
    let z_lower = normal_quantile(alpha / 2.0);
    let z_upper = normal_quantile(1.0 - alpha / 2.0);

    let bca_quantile = |z: f64| -> f64 {
        let adjusted = z0 + (z0 + z) / (1.0 - acceleration * (z0 + z));
        normal_cdf(adjusted).clamp(0.0, 1.0)
    };

    let lower = percentile_sorted(&sorted, bca_quantile(z_lower) * 100.0);
    let upper = percentile_sorted(&sorted, bca_quantile(z_upper) * 100.0);

    let (lower, upper) = if lower <= upper {
        (lower, upper)
    } else {
        (upper, lower)
    };
    // Guarantee lower <= point <= upper even under BCa's occasional
    // quantile-crossing at small sample counts.
    let lower = lower.min(point);
    let upper = upper.max(point);

    Statistic::Bootstrap {
        point,
        lower,
        upper,
        level: confidence,
    }
}

/// Permutation-test alternate confidence path: shuffle the keys of `y`
/// (keeping its value multiset) and count how often the recomputed cosine
/// is at least as extreme as the observed one.
pub fn permutation_p_value(x: &Row, y: &Row, n: usize, trials: u64, seed: u64) -> Statistic {
    let (dense_x, dense_y) = densify(x, y, n);
    let observed = resolve_nan(cosine_similarity(&dense_x, &dense_y), NanPolicy::Zero, "permutation observed");

    if trials == 0 {
        return Statistic::PValue(0.0);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut values: Vec<f64> = dense_y.clone();
    let mut successes = 0u64;
    for _ in 0..trials {
        shuffle(&mut values, &mut rng);
        let shuffled = resolve_nan(cosine_similarity(&dense_x, &values), NanPolicy::Zero, "permutation trial");
        if shuffled.abs() >= observed.abs() {
            successes += 1;
        }
    }

    Statistic::PValue(successes as f64 / trials as f64)
}

fn shuffle(values: &mut [f64], rng: &mut StdRng) {
    for i in (1..values.len()).rev() {
        let j = rng.gen_range(0..=i);
        values.swap(i, j);
    }
}
