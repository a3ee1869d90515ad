use std::{env, sync::atomic::AtomicBool};

use anyhow::Context;
use log::info;
use rand::{SeedableRng, rngs::StdRng};

use batched_backprop::{MnistTopology, Topology, TrainConfig, Trainer};

const DEFAULT_MNIST_ROOT: &str = "data/mnist";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let topology =
        MnistTopology::new(env::var("MNIST_ROOT").unwrap_or_else(|_| DEFAULT_MNIST_ROOT.into()));

    let config = match env::var("TRAIN_CONFIG") {
        Ok(path) => TrainConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        Err(_) => topology.default_config(),
    };

    let epochs = env::var("EPOCHS")
        .ok()
        .map(|e| e.parse::<usize>())
        .transpose()
        .context("EPOCHS must be a non-negative integer")?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    info!("loading data from {}", topology.data_root().display());
    let mut trainer = Trainer::from_topology(&topology, &mut rng, &config)
        .context("setting up the trainer")?;

    info!(
        "training with {} threads, batch size {}, learning rate {}",
        trainer.nthreads(),
        config.batch_size,
        config.learning_rate
    );

    match epochs {
        Some(epochs) => trainer.train_epochs(epochs)?,
        None => trainer.train(&AtomicBool::new(false))?,
    }

    info!("test accuracy: {:.4}", trainer.evaluate_test_accuracy()?);
    Ok(())
}
