use std::{
    mem,
    num::NonZeroUsize,
    ops::AddAssign,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use log::{debug, info};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rand::Rng;

use super::{
    Gradients, Scratch, TrainerMetrics,
    backprop::{accumulate_example, backpropagate},
};
use crate::{
    arch::{Network, loss::cost},
    config::TrainConfig,
    data::{DataPoint, Dataset},
    error::{Result, TrainErr},
    optimization::{GradientDescent, Optimizer},
    pool::WorkerPool,
    topology::Topology,
};

/// The state private to one pool thread, indexed by its `thread_index`.
struct WorkerState {
    scratch: Scratch,
    grads: Gradients,
}

impl WorkerState {
    fn new(network: &Network) -> Self {
        Self {
            scratch: Scratch::new(network.layers()),
            grads: Gradients::new(network.layers()),
        }
    }

    fn reset(&mut self) {
        self.scratch.reset();
        self.grads.reset();
    }
}

/// Splits `[0..n)` into consecutive mini-batches of `batch_size`, the last one
/// truncated. Yields `(start, len)` pairs.
pub fn batch_ranges(n: usize, batch_size: NonZeroUsize) -> impl Iterator<Item = (usize, usize)> {
    let b = batch_size.get();
    (0..n).step_by(b).map(move |start| (start, b.min(n - start)))
}

/// Trains a network with mini-batch gradient descent, spreading every batch across a
/// pool of worker threads.
///
/// Each worker writes only its own scratch and gradient accumulator; after every batch
/// the accumulators are summed serially, in worker order, and the update is applied
/// under the network's write lock.
pub struct Trainer<O: Optimizer = GradientDescent> {
    network: Arc<RwLock<Network>>,
    train: Arc<Dataset>,
    test: Arc<Dataset>,
    states: Option<Arc<[Mutex<WorkerState>]>>,
    combined: Gradients,
    optimizer: O,
    batch_size: NonZeroUsize,
    pool: WorkerPool,
    metrics: TrainerMetrics,
}

impl Trainer<GradientDescent> {
    /// Creates a new `Trainer` using plain gradient descent.
    ///
    /// # Arguments
    /// * `network` - The network to train.
    /// * `train` - The training set.
    /// * `test` - The held-out set, only used by [`Trainer::evaluate_test_accuracy`].
    /// * `config` - Hyperparameters and pool sizing.
    ///
    /// # Returns
    /// The trainer, or an error if the config is invalid, an example doesn't fit the
    /// network or the pool couldn't be started.
    pub fn new(
        network: Network,
        train: Dataset,
        test: Dataset,
        config: &TrainConfig,
    ) -> Result<Self> {
        config.validate()?;

        Self::with_optimizer(
            network,
            train,
            test,
            GradientDescent::new(config.learning_rate),
            config.batch_size,
            config.resolve_threads(),
        )
    }

    /// Builds `topology` with `rng`, loads its data and creates a `Trainer` for it.
    pub fn from_topology<T, R>(topology: &T, rng: &mut R, config: &TrainConfig) -> Result<Self>
    where
        T: Topology,
        R: Rng,
    {
        let network = topology.build_network(rng)?;
        let (train, test) = topology.load_data()?;
        Self::new(network, train, test, config)
    }
}

impl<O: Optimizer> Trainer<O> {
    /// Creates a new `Trainer` with a custom optimizer.
    ///
    /// Every example of both sets is checked against the network here, so nothing
    /// dispatched later can hit a shape mismatch.
    ///
    /// # Arguments
    /// * `network` - The network to train.
    /// * `train` - The training set.
    /// * `test` - The held-out set.
    /// * `optimizer` - The update rule applied after every batch.
    /// * `batch_size` - The amount of examples per update.
    /// * `nthreads` - The size of the worker pool.
    pub fn with_optimizer(
        network: Network,
        train: Dataset,
        test: Dataset,
        optimizer: O,
        batch_size: NonZeroUsize,
        nthreads: NonZeroUsize,
    ) -> Result<Self> {
        train.check_shapes(&network)?;
        test.check_shapes(&network)?;

        let combined = Gradients::new(network.layers());
        let pool = WorkerPool::new(nthreads)?;

        debug!(
            train = train.len(),
            test = test.len(),
            params = network.param_count(),
            nthreads = nthreads.get();
            "trainer ready"
        );

        Ok(Self {
            network: Arc::new(RwLock::new(network)),
            train: Arc::new(train),
            test: Arc::new(test),
            states: None,
            combined,
            optimizer,
            batch_size,
            pool,
            metrics: TrainerMetrics::default(),
        })
    }

    /// Read access to the network, e.g. for inference between epochs.
    pub fn network(&self) -> RwLockReadGuard<'_, Network> {
        self.network.read()
    }

    /// Consumes the trainer and returns a copy of the trained network.
    pub fn into_network(self) -> Network {
        self.network.read().clone()
    }

    #[inline]
    pub fn training_set(&self) -> &Dataset {
        &self.train
    }

    #[inline]
    pub fn test_set(&self) -> &Dataset {
        &self.test
    }

    #[inline]
    pub fn nthreads(&self) -> usize {
        self.pool.nthreads()
    }

    #[inline]
    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    #[inline]
    pub fn metrics(&self) -> &TrainerMetrics {
        &self.metrics
    }

    /// The fraction of training examples the network currently classifies correctly.
    ///
    /// Forward-only: no gradient state is touched. `0.0` for an empty set.
    pub fn evaluate_accuracy(&self) -> Result<f64> {
        self.accuracy(&self.train)
    }

    /// The fraction of test examples the network currently classifies correctly.
    pub fn evaluate_test_accuracy(&self) -> Result<f64> {
        self.accuracy(&self.test)
    }

    /// The mean of `0.5 * Σ (o - e)²` over the training set.
    pub fn training_cost(&self) -> Result<f64> {
        let total: f64 = self
            .fold_examples(&self.train, |net, point| {
                cost(&net.forward(point.input()), point.expected())
            })?
            .into_iter()
            .sum();

        Ok(mean(total, self.train.len()))
    }

    /// Computes every layer's deltas into `scratch`, which must hold a forward pass of
    /// the current network.
    ///
    /// # Errors
    /// `ShapeMismatch` if `expected` or `scratch` don't fit the network.
    pub fn compute_deltas(&self, expected: &[f64], scratch: &mut Scratch) -> Result<()> {
        super::compute_deltas(&self.network.read(), expected, scratch)
    }

    /// Runs the forward and backward pass of the training examples
    /// `[start..start + len)` across the pool and adds their summed gradients into
    /// `combined`.
    ///
    /// Per-worker scratch and accumulators are allocated on first use and zeroed on
    /// every later call. The reduction runs serially over workers `0..N` after the
    /// barrier, so a fixed thread count gives identical sums run to run.
    ///
    /// # Errors
    /// `BatchOutOfRange` if the range exceeds the training set, `ShapeMismatch` if
    /// `combined` wasn't built for the network, `WorkerPanicked` if a worker panicked.
    pub fn process_batch(
        &mut self,
        start: usize,
        len: usize,
        combined: &mut Gradients,
    ) -> Result<()> {
        let total = self.train.len();
        if start.checked_add(len).is_none_or(|end| end > total) {
            return Err(TrainErr::BatchOutOfRange { start, len, total });
        }
        combined.check_shape(self.network.read().layers())?;

        let states = self.worker_states();
        let network = Arc::clone(&self.network);
        let data = Arc::clone(&self.train);
        let states_ = Arc::clone(&states);

        {
            let _weights = self.network.read();
            self.pool.run_batched(
                move |t, offset, count| {
                    let network = network.read();
                    let mut state = states_[t].lock();
                    let WorkerState { scratch, grads } = &mut *state;

                    for point in data.slice(start + offset..start + offset + count) {
                        network.calculate_with(point.input(), scratch);
                        backpropagate(&network, point.expected(), scratch);
                        accumulate_example(&network, point.input(), scratch, grads);
                    }
                },
                len,
            )?;
        }

        for state in states.iter() {
            combined.accumulate(&state.lock().grads);
        }

        Ok(())
    }

    /// Runs one pass over the training set.
    ///
    /// The training accuracy is measured first, then every mini-batch is processed and
    /// applied in order.
    ///
    /// # Returns
    /// The training accuracy measured before the epoch.
    pub fn run_epoch(&mut self) -> Result<f64> {
        self.epoch(None).map(|(accuracy, _)| accuracy)
    }

    /// Runs `epochs` full passes over the training set.
    pub fn train_epochs(&mut self, epochs: usize) -> Result<()> {
        for _ in 0..epochs {
            self.run_epoch()?;
        }
        Ok(())
    }

    /// Trains until `stop` is set, checking it between mini-batches.
    ///
    /// An epoch interrupted halfway keeps the updates it already applied but isn't
    /// counted in the metrics.
    pub fn train(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Acquire) {
            let (_, finished) = self.epoch(Some(stop))?;
            if !finished {
                break;
            }
        }

        info!(epochs = self.metrics.epochs; "training stopped");
        Ok(())
    }

    /// Returns the accuracy before the epoch and whether it ran to completion.
    fn epoch(&mut self, stop: Option<&AtomicBool>) -> Result<(f64, bool)> {
        let accuracy = self.evaluate_accuracy()?;
        self.metrics.record_accuracy(accuracy);
        info!(epoch = self.metrics.epochs; "training accuracy: {accuracy:.4}");

        let started = Instant::now();
        let mut combined = mem::take(&mut self.combined);
        let finished = self.run_batches(&mut combined, stop);
        self.combined = combined;

        if !finished? {
            return Ok((accuracy, false));
        }

        let elapsed = started.elapsed();
        self.metrics.bump_epoch(elapsed);
        debug!(epoch = self.metrics.epochs; "epoch took {elapsed:?}");

        Ok((accuracy, true))
    }

    fn run_batches(
        &mut self,
        combined: &mut Gradients,
        stop: Option<&AtomicBool>,
    ) -> Result<bool> {
        for (start, len) in batch_ranges(self.train.len(), self.batch_size) {
            if stop.is_some_and(|s| s.load(Ordering::Acquire)) {
                return Ok(false);
            }

            combined.reset();
            self.process_batch(start, len, combined)?;

            // len > 0 for every range batch_ranges yields
            let real = NonZeroUsize::new(len).unwrap_or(NonZeroUsize::MIN);
            self.optimizer
                .update_network(&mut self.network.write(), combined, real)?;

            self.metrics.bump_batch(len);
        }

        Ok(true)
    }

    /// The per-worker states, allocated on first use and zeroed otherwise.
    fn worker_states(&mut self) -> Arc<[Mutex<WorkerState>]> {
        if let Some(states) = &self.states {
            for state in states.iter() {
                state.lock().reset();
            }
            return Arc::clone(states);
        }

        let states: Arc<[_]> = {
            let network = self.network.read();
            (0..self.pool.nthreads())
                .map(|_| Mutex::new(WorkerState::new(&network)))
                .collect()
        };

        self.states = Some(Arc::clone(&states));
        states
    }

    fn accuracy(&self, data: &Arc<Dataset>) -> Result<f64> {
        let correct: usize = self
            .fold_examples(data, |net, point| {
                point.is_correct(&net.forward(point.input())) as usize
            })?
            .into_iter()
            .sum();

        Ok(mean(correct as f64, data.len()))
    }

    /// Evaluates `per_example` on every example of `data` across the pool, summing the
    /// results into one private slot per worker.
    ///
    /// # Returns
    /// The slots, in worker order.
    fn fold_examples<T, F>(&self, data: &Arc<Dataset>, per_example: F) -> Result<Vec<T>>
    where
        T: Default + AddAssign + Copy + Send + 'static,
        F: Fn(&Network, &DataPoint) -> T + Send + Sync + 'static,
    {
        let slots: Arc<[Mutex<T>]> = (0..self.pool.nthreads())
            .map(|_| Mutex::new(T::default()))
            .collect();

        let network = Arc::clone(&self.network);
        let data_ = Arc::clone(data);
        let slots_ = Arc::clone(&slots);

        {
            let _weights = self.network.read();
            self.pool.run_batched(
                move |t, offset, count| {
                    let network = network.read();
                    let network: &Network = &network;
                    let mut acc = T::default();
                    for point in data_.slice(offset..offset + count) {
                        acc += per_example(network, point);
                    }
                    *slots_[t].lock() += acc;
                },
                data.len(),
            )?;
        }

        Ok(slots.iter().map(|slot| *slot.lock()).collect())
    }
}

fn mean(total: f64, n: usize) -> f64 {
    if n == 0 { 0. } else { total / n as f64 }
}
