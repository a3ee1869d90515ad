use std::{
    num::NonZeroUsize,
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::{debug, trace, warn};

use super::{
    partition::partition,
    task::{Task, TaskHandle, TaskStatus},
    worker::{Overflow, Worker},
};
use crate::error::{Result, TrainErr};

/// A fixed set of long-lived worker threads.
///
/// Each thread is bound to its own [`Worker`] queue; a shared overflow queue is
/// drained by whichever worker is idle. Threads live until the pool is dropped.
pub struct WorkerPool {
    workers: Vec<Arc<Worker>>,
    overflow: Overflow,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Creates a new `WorkerPool` and starts its threads.
    ///
    /// # Arguments
    /// * `nthreads` - The amount of worker threads.
    ///
    /// # Returns
    /// The pool or an io error if a thread couldn't be spawned.
    pub fn new(nthreads: NonZeroUsize) -> Result<Self> {
        let nthreads = nthreads.get();
        let overflow = Overflow::default();
        let mut workers = Vec::with_capacity(nthreads);
        let mut threads = Vec::with_capacity(nthreads);

        for thread_index in 0..nthreads {
            let worker = Arc::new(Worker::new());
            let w = Arc::clone(&worker);
            let overflow_ = Arc::clone(&overflow);

            let spawned = thread::Builder::new()
                .name(format!("pool-worker-{thread_index}"))
                .spawn(move || w.run(thread_index, overflow_));

            let handle = match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    shutdown(&workers, &mut threads);
                    return Err(TrainErr::Io(e));
                }
            };

            workers.push(worker);
            threads.push(handle);
        }

        debug!(nthreads = nthreads; "worker pool started");
        Ok(Self {
            workers,
            overflow,
            threads,
        })
    }

    /// The amount of worker threads.
    #[inline]
    pub fn nthreads(&self) -> usize {
        self.workers.len()
    }

    /// Runs `f` over `[0..total)` split in contiguous slices, one per worker, and blocks
    /// until every slice finished.
    ///
    /// `f(thread_index, offset, len)` runs exactly once per non-empty slice, on the
    /// worker that owns it. `total == 0` dispatches nothing.
    ///
    /// Must not be called from inside a job running on this same pool.
    ///
    /// # Errors
    /// `WorkerPanicked` if `f` panicked in any slice, reported after every other
    /// slice completed.
    pub fn run_batched<F>(&self, f: F, total: usize) -> Result<()>
    where
        F: Fn(usize, usize, usize) + Send + Sync + 'static,
    {
        if total == 0 {
            return Ok(());
        }

        let f = Arc::new(f);
        let handles: Vec<_> = partition(total, self.nthreads())
            .into_iter()
            .enumerate()
            .map(|(t, range)| {
                let f = Arc::clone(&f);
                let (offset, len) = (range.start, range.len());
                let job = Box::new(move |ti: usize| f(ti, offset, len));
                let (task, handle) = Task::new(job, offset, len);

                trace!(thread_index = t, offset = offset, len = len; "task dispatched");
                self.workers[t].push(task);
                handle
            })
            .collect();

        wait_all(&handles)
    }

    /// Queues a single job on the shared overflow queue, to be run by the first idle
    /// worker.
    ///
    /// # Returns
    /// The handle to wait on the job.
    pub fn execute<F>(&self, f: F) -> Arc<TaskHandle>
    where
        F: FnOnce(usize) + Send + 'static,
    {
        let (task, handle) = Task::new(Box::new(f), 0, 1);
        self.overflow.lock().push_back(task);

        for worker in &self.workers {
            worker.wake();
        }

        handle
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        shutdown(&self.workers, &mut self.threads);
        debug!(nthreads = self.workers.len(); "worker pool stopped");
    }
}

/// Blocks on every handle and reports the first panic, if any.
fn wait_all(handles: &[Arc<TaskHandle>]) -> Result<()> {
    let mut panicked = None;

    for (t, handle) in handles.iter().enumerate() {
        if let TaskStatus::Panicked(message) = handle.wait() {
            let thread_index = handle.thread_index().unwrap_or(t);
            warn!(thread_index = thread_index; "task panicked: {message}");
            panicked.get_or_insert(TrainErr::WorkerPanicked {
                thread_index,
                message,
            });
        }
    }

    panicked.map_or(Ok(()), Err)
}

fn shutdown(workers: &[Arc<Worker>], threads: &mut Vec<JoinHandle<()>>) {
    for worker in workers {
        worker.terminate();
    }

    for (thread_index, handle) in threads.drain(..).enumerate() {
        if handle.join().is_err() {
            warn!(thread_index = thread_index; "worker thread panicked outside of a task");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    fn pool(n: usize) -> WorkerPool {
        WorkerPool::new(NonZeroUsize::new(n).unwrap()).unwrap()
    }

    #[test]
    fn every_slice_runs_once_on_its_worker() {
        let pool = pool(3);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_ = Arc::clone(&seen);
        pool.run_batched(move |t, offset, len| seen_.lock().push((t, offset, len)), 10)
            .unwrap();

        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen, vec![(0, 0, 4), (1, 4, 4), (2, 8, 2)]);
    }

    #[test]
    fn zero_total_dispatches_nothing() {
        let pool = pool(2);
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_ = Arc::clone(&calls);
        pool.run_batched(
            move |_, _, _| {
                calls_.fetch_add(1, Ordering::Relaxed);
            },
            0,
        )
        .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn covers_every_element_across_dispatches() {
        let pool = pool(4);
        let hits = Arc::new((0..100).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>());

        for _ in 0..5 {
            let hits_ = Arc::clone(&hits);
            pool.run_batched(
                move |_, offset, len| {
                    for i in offset..offset + len {
                        hits_[i].fetch_add(1, Ordering::Relaxed);
                    }
                },
                100,
            )
            .unwrap();
        }

        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 5));
    }

    #[test]
    fn panic_surfaces_after_the_barrier() {
        let pool = pool(2);
        let finished = Arc::new(AtomicUsize::new(0));

        let finished_ = Arc::clone(&finished);
        let err = pool
            .run_batched(
                move |t, _, _| {
                    if t == 1 {
                        panic!("slice failed");
                    }
                    finished_.fetch_add(1, Ordering::Relaxed);
                },
                4,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            TrainErr::WorkerPanicked { thread_index: 1, ref message } if message == "slice failed"
        ));
        assert_eq!(finished.load(Ordering::Relaxed), 1);

        // the pool keeps working after a panic
        pool.run_batched(|_, _, _| {}, 4).unwrap();
    }

    #[test]
    fn execute_runs_on_some_worker() {
        let pool = pool(2);
        let handle = pool.execute(|t| assert!(t < 2));

        assert_eq!(handle.wait(), TaskStatus::Complete);
        assert!(handle.thread_index().is_some());
    }

    #[test]
    fn drop_finishes_queued_work() {
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let pool = pool(2);
            for _ in 0..8 {
                let calls_ = Arc::clone(&calls);
                pool.execute(move |_| {
                    calls_.fetch_add(1, Ordering::Relaxed);
                });
            }
        }

        assert_eq!(calls.load(Ordering::Relaxed), 8);
    }
}
