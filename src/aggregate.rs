//! Combines per-level-pair alignment scores into one score per entity, plus
//! an evaluation-time ranking/accuracy utility used by test harnesses.

use std::collections::HashSet;

use crate::cosine::NodeCorrScores;
use crate::registry::EntityIndex;

/// Dense length-N averaged score vector.
#[derive(Debug, Clone)]
pub struct FlatNodeCorrScores {
    pub scores: Vec<f64>,
}

/// Average the defined (non-NaN) scores for each entity across every
/// level-pair result. An entity undefined everywhere stays `NaN`. The
/// result does not depend on the order `pairs` is given in.
pub fn aggregate(n: usize, pairs: &[NodeCorrScores]) -> FlatNodeCorrScores {
    let mut sums = vec![0.0_f64; n];
    let mut counts = vec![0u32; n];

    for pair in pairs {
        for (entity, &score) in pair.scores.iter().enumerate() {
            if !score.is_nan() {
                sums[entity] += score;
                counts[entity] += 1;
            }
        }
    }

    let scores = sums
        .into_iter()
        .zip(counts)
        .map(|(sum, count)| if count == 0 { f64::NAN } else { sum / count as f64 })
        .collect();

    FlatNodeCorrScores { scores }
}

/// Entities ranked in ascending order of score, 1-based; `NaN` sorts last
/// via a total order over `f64`.
pub fn rank_entities(scores: &[f64]) -> Vec<(usize, EntityIndex)> {
    let mut indexed: Vec<EntityIndex> = (0..scores.len()).collect();
    indexed.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    indexed
        .into_iter()
        .enumerate()
        .map(|(i, id)| (i + 1, id))
        .collect()
}

/// Accuracy metric: how concentrated the ground-truth set `truth` is among
/// the lowest-scoring entities. `1.0` means every truth entity occupies one
/// of the `|truth|` lowest ranks.
pub fn accuracy(scores: &[f64], truth: &HashSet<EntityIndex>) -> f64 {
    let n = scores.len();
    let t = truth.len();
    if t == 0 || t > n {
        return f64::NAN;
    }

    let ranks = rank_entities(scores);
    let rank_of: std::collections::HashMap<EntityIndex, usize> =
        ranks.into_iter().map(|(rank, id)| (id, rank)).collect();

    let penalty: f64 = truth
        .iter()
        .map(|id| {
            let rank = rank_of[id] as i64;
            (rank - t as i64).max(0) as f64
        })
        .sum();

    let f: f64 = (0..t).map(|k| (n - k) as f64).sum();
    if f == 0.0 {
        return f64::NAN;
    }
    1.0 - penalty / f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_ignores_undefined_and_averages_defined() {
        let mut a = NodeCorrScores::undefined(3);
        a.scores = vec![1.0, f64::NAN, 0.5];
        let mut b = NodeCorrScores::undefined(3);
        b.scores = vec![0.5, 0.2, f64::NAN];

        let flat = aggregate(3, &[a, b]);
        assert!((flat.scores[0] - 0.75).abs() < 1e-9);
        assert!((flat.scores[1] - 0.2).abs() < 1e-9);
        assert!((flat.scores[2] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn aggregate_all_undefined_is_nan() {
        let a = NodeCorrScores::undefined(2);
        let flat = aggregate(2, &[a]);
        assert!(flat.scores[0].is_nan());
    }

    #[test]
    fn aggregate_is_invariant_to_pair_order() {
        let mut a = NodeCorrScores::undefined(2);
        a.scores = vec![1.0, 0.3];
        let mut b = NodeCorrScores::undefined(2);
        b.scores = vec![0.0, 0.7];

        let forward = aggregate(2, &[a.clone(), b.clone()]);
        let backward = aggregate(2, &[b, a]);
        assert_eq!(forward.scores, backward.scores);
    }

    #[test]
    fn accuracy_matches_worked_scenario() {
        let n = 10;
        let mut scores = vec![0.0; n];
        // Ranks are 1-based ascending; place truth entities at ranks
        // {1,2,3,8,10} by construction via distinct increasing scores.
        for (rank_minus_one, score) in scores.iter_mut().enumerate() {
            *score = rank_minus_one as f64;
        }
        let truth: HashSet<EntityIndex> = [0, 1, 2, 7, 9].into_iter().collect();
        let acc = accuracy(&scores, &truth);
        assert!((acc - 0.8).abs() < 1e-9, "got {acc}");
    }

    #[test]
    fn rank_entities_sorts_nan_last() {
        let scores = vec![f64::NAN, 1.0, 0.5];
        let ranks = rank_entities(&scores);
        assert_eq!(ranks[2].1, 0); // NaN entity ranked last
    }
}
