//! ADC reading noise
//!
//! Every simulated reading gets `bias + N(0, stddev)` counts added before it
//! is clamped. A zero seed draws from entropy, anything else is reproducible.

use super::config::ReflectanceNoiseConfig;
use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;

pub struct ReadingNoise {
    rng: SmallRng,
    bias: f32,
    stddev: f32,
}

impl ReadingNoise {
    pub fn new(config: &ReflectanceNoiseConfig, seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self {
            rng,
            bias: config.bias,
            stddev: config.stddev,
        }
    }

    /// Offset in ADC counts for the next reading
    #[inline]
    pub fn sample(&mut self) -> f32 {
        if self.stddev == 0.0 {
            return self.bias;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        self.bias + n * self.stddev
    }
}
