use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use super::ParamGen;
use crate::error::Result;

/// Draws parameters from a distribution, up to a fixed amount.
///
/// The rng is shared behind an `Rc<RefCell<_>>` so every layer of a network can draw,
/// in order, from one seeded source.
pub struct RandParamGen<R: Rng, D: Distribution<f64> = Uniform<f64>> {
    rng: Rc<RefCell<R>>,
    distribution: D,
    remaining: usize,
}

impl<R: Rng, D: Distribution<f64>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen`.
    ///
    /// # Arguments
    /// * `rng` - The shared source of randomness.
    /// * `distribution` - What every parameter is sampled from.
    /// * `limit` - The amount of parameters to hand out before running dry.
    pub fn new(rng: Rc<RefCell<R>>, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<R: Rng> RandParamGen<R> {
    /// Creates a new `RandParamGen` sampling `U(-1, 1) / sqrt(fan_in)`, so a node's
    /// pre-activation keeps roughly the same scale whatever its amount of inputs.
    ///
    /// # Arguments
    /// * `rng` - The shared source of randomness.
    /// * `fan_in` - The amount of inputs feeding each node of the layer.
    /// * `limit` - The amount of parameters to hand out before running dry.
    ///
    /// # Errors
    /// `ParamGen` if the range can't be built, which happens for `fan_in == 0`.
    pub fn fan_in_scaled(rng: Rc<RefCell<R>>, fan_in: usize, limit: usize) -> Result<Self> {
        let bound = (fan_in as f64).sqrt().recip();
        Ok(Self::new(rng, Uniform::new(-bound, bound)?, limit))
    }
}

impl<R: Rng, D: Distribution<f64>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Option<Vec<f64>> {
        if self.remaining == 0 {
            return None;
        }

        let n = n.min(self.remaining);
        self.remaining -= n;

        let mut rng = self.rng.borrow_mut();
        Some((&self.distribution).sample_iter(&mut *rng).take(n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn shared(seed: u64) -> Rc<RefCell<StdRng>> {
        Rc::new(RefCell::new(StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn values_stay_within_the_fan_in_bound() {
        let mut param_gen = RandParamGen::fan_in_scaled(shared(42), 16, 1000).unwrap();
        let values = param_gen.sample(5000).unwrap();

        assert_eq!(values.len(), 1000);
        assert!(values.iter().all(|v| v.abs() <= 0.25));
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn shared_rng_advances_across_generators() {
        let rng = shared(7);
        let mut first = RandParamGen::fan_in_scaled(Rc::clone(&rng), 4, 3).unwrap();
        let mut second = RandParamGen::fan_in_scaled(rng, 4, 3).unwrap();

        let mut replay = RandParamGen::fan_in_scaled(shared(7), 4, 6).unwrap();
        let mut drawn = first.sample(3).unwrap();
        drawn.extend(second.sample(3).unwrap());

        assert_eq!(replay.sample(6).unwrap(), drawn);
    }

    #[test]
    fn zero_fan_in_is_rejected() {
        assert!(RandParamGen::fan_in_scaled(shared(0), 0, 10).is_err());
    }
}
