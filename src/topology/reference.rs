use std::num::NonZeroUsize;

use rand::Rng;

use super::Topology;
use crate::{
    arch::Layer,
    config::TrainConfig,
    data::{DataPoint, Dataset},
    error::Result,
    initialization::LiteralParamGen,
};

/// A 2-2-2 network with fixed parameters and a single example, small enough to check
/// every forward and backward value by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceTopology;

impl ReferenceTopology {
    /// The only training example: input `[0.05, 0.1]`, target `[0.01, 0.99]`.
    pub fn example() -> DataPoint {
        DataPoint::new(vec![0.05, 0.1], 1, vec![0.01, 0.99])
    }
}

impl Topology for ReferenceTopology {
    fn build<R: Rng>(&self, _rng: &mut R) -> Result<Vec<Layer>> {
        let mut hidden = LiteralParamGen::new(vec![0.15, 0.2, 0.35, 0.25, 0.3, 0.35]);
        let mut output = LiteralParamGen::new(vec![0.4, 0.45, 0.6, 0.5, 0.55, 0.6]);

        Ok(vec![
            Layer::generate(2, 2, &mut hidden, 0)?,
            Layer::generate(2, 2, &mut output, 1)?,
        ])
    }

    fn load_data(&self) -> Result<(Dataset, Dataset)> {
        let train = Dataset::new(vec![Self::example()]);
        Ok((train.clone(), train))
    }

    fn default_config(&self) -> TrainConfig {
        TrainConfig {
            batch_size: NonZeroUsize::MIN,
            learning_rate: 0.5,
            ..Default::default()
        }
    }
}
