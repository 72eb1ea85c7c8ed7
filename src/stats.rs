//! Shared numeric primitives used by both aligners: descriptive statistics,
//! Pearson correlation, cosine similarity, percentiles, and the normal
//! CDF/quantile pair the BCa bootstrap needs.
//!
//! Everything here is self-contained native arithmetic; no foreign
//! statistical runtime is shelled out to.

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (denominator n-1), given a precomputed mean.
pub fn sample_std_dev(xs: &[f64], m: f64) -> f64 {
    let n = xs.len();
    if n < 2 {
        return f64::NAN;
    }
    let variance = xs.iter().map(|&x| (x - m).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    variance.sqrt()
}

/// Pearson correlation over paired samples of equal length. `NaN` if either
/// vector has zero variance or fewer than two samples.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len();
    assert_eq!(n, ys.len(), "xs and ys must have same length");
    if n < 2 {
        return f64::NAN;
    }
    let mx = mean(xs);
    let my = mean(ys);
    let sx = sample_std_dev(xs, mx);
    let sy = sample_std_dev(ys, my);
    if sx == 0.0 || sy == 0.0 {
        return f64::NAN;
    }
    let cov: f64 = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (x - mx) * (y - my))
        .sum::<f64>()
        / (n as f64 - 1.0);
    cov / (sx * sy)
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Cosine similarity between two equal-length dense vectors. `NaN` when
/// either vector has zero norm — callers decide how to resolve that via
/// `NanPolicy`.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let na = l2_norm(a);
    let nb = l2_norm(b);
    if na == 0.0 || nb == 0.0 {
        return f64::NAN;
    }
    dot(a, b) / (na * nb)
}

/// Linear-interpolated percentile (0..=100) over an already-sorted slice.
pub fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = rank - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

/// Standard normal CDF, via the Abramowitz & Stegun erf approximation
/// (formula 7.1.26, max error ~1.5e-7).
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

/// Inverse standard normal CDF (quantile function), via Acklam's rational
/// approximation. Accurate to ~1.15e-9 over `(0, 1)`.
pub fn normal_quantile(p: f64) -> f64 {
    assert!(p > 0.0 && p < 1.0, "p must be in (0, 1), got {p}");

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];

    const P_LOW: f64 = 0.02425;
    let p_high = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= p_high {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: f64, expected: f64, eps: f64) {
        assert!(
            (actual - expected).abs() < eps,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![2.0, 4.0, 6.0, 8.0];
        let y_inv = vec![8.0, 6.0, 4.0, 2.0];
        approx(pearson_correlation(&x, &y), 1.0, 1e-9);
        approx(pearson_correlation(&x, &y_inv), -1.0, 1e-9);
    }

    #[test]
    fn pearson_constant_vector_is_nan() {
        assert!(pearson_correlation(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).is_nan());
    }

    #[test]
    fn cosine_zero_vector_is_nan() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_nan());
        approx(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0, 1e-9);
    }

    #[test]
    fn percentile_matches_known_points() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        approx(percentile_sorted(&sorted, 0.0), 1.0, 1e-9);
        approx(percentile_sorted(&sorted, 50.0), 3.0, 1e-9);
        approx(percentile_sorted(&sorted, 100.0), 5.0, 1e-9);
    }

    #[test]
    fn normal_cdf_and_quantile_are_inverses() {
        approx(normal_cdf(0.0), 0.5, 1e-6);
        approx(normal_quantile(0.5), 0.0, 1e-6);
        approx(normal_cdf(1.959963985), 0.975, 1e-6);
        approx(normal_quantile(0.975), 1.959963985, 1e-6);
        // Round trip over a handful of probabilities.
        for &p in &[0.01, 0.1, 0.3, 0.5, 0.7, 0.9, 0.99] {
            let z = normal_quantile(p);
            approx(normal_cdf(z), p, 1e-6);
        }
    }
}
