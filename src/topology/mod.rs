//! Concrete networks: how to build their layers and where their data comes from.

mod mnist;
mod reference;

use std::{cell::RefCell, rc::Rc};

use rand::Rng;

pub use mnist::MnistTopology;
pub use reference::ReferenceTopology;

use crate::{
    arch::{Layer, Network},
    config::TrainConfig,
    data::Dataset,
    error::Result,
    initialization::RandParamGen,
};

/// A network shape together with the data it trains on.
pub trait Topology {
    /// Builds the initial layers, drawing any random parameter from `rng`.
    fn build<R: Rng>(&self, rng: &mut R) -> Result<Vec<Layer>>;

    /// Loads the training and test sets, in that order.
    fn load_data(&self) -> Result<(Dataset, Dataset)>;

    /// The hyperparameters this topology is meant to be trained with.
    fn default_config(&self) -> TrainConfig {
        TrainConfig::default()
    }

    /// Builds the layers and wraps them in a `Network`.
    fn build_network<R: Rng>(&self, rng: &mut R) -> Result<Network> {
        Network::new(self.build(rng)?)
    }
}

/// Builds fully-connected layers of the given sizes, every parameter drawn from
/// `U(-1, 1) / sqrt(input_size)`.
///
/// # Arguments
/// * `rng` - The source of randomness, shared by every layer in order.
/// * `sizes` - The input size followed by each layer's size.
pub fn random_layers<R: Rng>(rng: &mut R, sizes: &[usize]) -> Result<Vec<Layer>> {
    let rng = Rc::new(RefCell::new(rng));

    sizes
        .windows(2)
        .enumerate()
        .map(|(index, pair)| {
            let (input_size, size) = (pair[0], pair[1]);
            let limit = size * (input_size + 1);
            let mut param_gen = RandParamGen::fan_in_scaled(Rc::clone(&rng), input_size, limit)?;
            Layer::generate(input_size, size, &mut param_gen, index)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn random_layers_chain_and_respect_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let layers = random_layers(&mut rng, &[4, 3, 2]).unwrap();

        assert_eq!(layers.len(), 2);
        assert_eq!((layers[0].input_size(), layers[0].size()), (4, 3));
        assert_eq!((layers[1].input_size(), layers[1].size()), (3, 2));
        assert!(layers[0].weights().iter().all(|w| w.abs() <= 0.5));
        assert!(Network::new(layers).is_ok());
    }

    #[test]
    fn same_seed_same_layers() {
        let a = random_layers(&mut StdRng::seed_from_u64(9), &[5, 4, 3]).unwrap();
        let b = random_layers(&mut StdRng::seed_from_u64(9), &[5, 4, 3]).unwrap();
        assert_eq!(a, b);
    }
}
