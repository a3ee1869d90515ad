use std::{fs, num::NonZeroUsize, path::Path, thread};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrainErr};

const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(32).unwrap();

/// The hyperparameters and pool sizing of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub batch_size: NonZeroUsize,
    pub learning_rate: f64,
    /// Explicit pool size; when unset it's derived from the available parallelism.
    pub threads: Option<NonZeroUsize>,
    /// Cores left free for the rest of the process when `threads` is unset.
    pub thread_reserve: usize,
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: 0.05,
            threads: None,
            thread_reserve: 2,
            seed: None,
        }
    }
}

impl TrainConfig {
    /// Parses and validates a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Errors with `InvalidConfig` unless the learning rate is finite and positive.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0. {
            return Err(TrainErr::InvalidConfig(
                "learning_rate must be finite and positive",
            ));
        }
        Ok(())
    }

    /// The pool size: `threads` if set, otherwise the available parallelism minus
    /// `thread_reserve`, never below one.
    pub fn resolve_threads(&self) -> NonZeroUsize {
        if let Some(threads) = self.threads {
            return threads;
        }

        let available = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        NonZeroUsize::new(available.saturating_sub(self.thread_reserve)).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = TrainConfig::from_json(r#"{ "learning_rate": 0.5 }"#).unwrap();

        assert_eq!(config.batch_size.get(), 32);
        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.thread_reserve, 2);
        assert!(config.threads.is_none());
    }

    #[test]
    fn rejects_bad_learning_rates() {
        assert!(matches!(
            TrainConfig::from_json(r#"{ "learning_rate": -1.0 }"#),
            Err(TrainErr::InvalidConfig(_))
        ));
        assert!(matches!(
            TrainConfig::from_json(r#"{ "batch_size": 0 }"#),
            Err(TrainErr::Json(_))
        ));
    }

    #[test]
    fn explicit_threads_win() {
        let config = TrainConfig {
            threads: NonZeroUsize::new(3),
            ..Default::default()
        };
        assert_eq!(config.resolve_threads().get(), 3);
    }

    #[test]
    fn reserve_never_drops_below_one_thread() {
        let config = TrainConfig {
            thread_reserve: usize::MAX,
            ..Default::default()
        };
        assert_eq!(config.resolve_threads().get(), 1);
    }
}
