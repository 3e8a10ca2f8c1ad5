//! Injectable source of randomness for probabilistic triggers.

/// Yields uniform samples in `[0, 1)`.
pub trait ProbabilitySource: Send + Sync {
    fn sample(&self) -> f64;

    /// True with probability `p` (clamped to `[0, 1]`).
    fn hit(&self, p: f64) -> bool {
        self.sample() < p.clamp(0.0, 1.0)
    }
}

/// Always returns the same sample. Useful to force either branch.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbability(pub f64);

impl ProbabilitySource for FixedProbability {
    fn sample(&self) -> f64 {
        self.0
    }
}
