use std::time::Duration;

/// Counters a `Trainer` keeps across its lifetime.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrainerMetrics {
    pub epochs: u64,
    pub batches: u64,
    pub samples: u64,

    /// The training accuracy measured at the start of the last epoch.
    pub last_accuracy: Option<f64>,
    pub last_epoch_time: Duration,
}

impl TrainerMetrics {
    #[inline]
    pub fn bump_epoch(&mut self, elapsed: Duration) {
        self.epochs += 1;
        self.last_epoch_time = elapsed;
    }

    #[inline]
    pub fn bump_batch(&mut self, samples: usize) {
        self.batches += 1;
        self.samples += samples as u64;
    }

    #[inline]
    pub fn record_accuracy(&mut self, accuracy: f64) {
        self.last_accuracy = Some(accuracy);
    }
}
