//! Thread-local RNG backed probability source.

use crate::domain::ProbabilitySource;

/// Samples from `rand`'s thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngProbability;

impl ProbabilitySource for ThreadRngProbability {
    fn sample(&self) -> f64 {
        rand::random::<f64>()
    }
}
