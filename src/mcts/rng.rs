//! Randomness used by the search: Dirichlet exploration noise at the root, and temperature
//! sampling when picking a move to play. No `rand_distr`-style gamma sampler is pulled in;
//! Marsaglia-Tsang is short enough to keep in-house on top of `rand`'s uniform/normal draws.

use rand::Rng;

/// Samples a single Gamma(`shape`, 1) draw via Marsaglia-Tsang. Valid for `shape > 0`; for the
/// `shape < 1` case (Dirichlet noise commonly uses alpha = 0.3) it boosts the shape by one and
/// corrects with a uniform draw, per the standard trick described in the original paper.
pub fn sample_gamma(rng: &mut impl Rng, shape: f32) -> f32 {
    if shape < 1.0 {
        let u: f32 = rng.gen_range(0.0f32..1.0);
        return sample_gamma(rng, shape + 1.0) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let mut x;
        let mut v;
        loop {
            x = sample_standard_normal(rng);
            v = 1.0 + c * x;
            if v > 0.0 {
                break;
            }
        }
        let v3 = v * v * v;
        let u: f32 = rng.gen_range(0.0f32..1.0);
        if u < 1.0 - 0.0331 * x * x * x * x {
            return d * v3;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v3 + v3.ln()) {
            return d * v3;
        }
    }
}

fn sample_standard_normal(rng: &mut impl Rng) -> f32 {
    // Box-Muller; only one of the pair is kept, which is wasteful but simple and matches the
    // modest call volume (one Dirichlet draw per root expansion).
    let u1: f32 = rng.gen_range(1e-7f32..1.0);
    let u2: f32 = rng.gen_range(0.0f32..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

/// Draws a Dirichlet(`alpha`, ..., `alpha`) vector of length `n` by sampling `n` independent
/// Gamma(`alpha`, 1) draws and normalizing. Returns a uniform vector if `n == 0`.
pub fn sample_dirichlet(rng: &mut impl Rng, alpha: f32, n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    let draws: Vec<f32> = (0..n).map(|_| sample_gamma(rng, alpha)).collect();
    let total: f32 = draws.iter().sum();
    if total <= 0.0 {
        return vec![1.0 / n as f32; n];
    }
    draws.into_iter().map(|d| d / total).collect()
}
