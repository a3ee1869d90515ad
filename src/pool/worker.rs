use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use log::trace;
use parking_lot::{Condvar, Mutex};

use super::task::Task;

/// How long an idle worker sleeps before re-checking its queues and termination flag.
pub(crate) const IDLE_TIMEOUT: Duration = Duration::from_millis(50);

/// The queue shared by every worker, drained by whichever worker runs out of its own
/// work first.
pub(crate) type Overflow = Arc<Mutex<VecDeque<Task>>>;

/// The record bound to one pool thread: its own task queue, the condvar it sleeps on
/// and its termination flag.
pub(crate) struct Worker {
    queue: Mutex<VecDeque<Task>>,
    cv: Condvar,
    terminate: AtomicBool,
}

impl Worker {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            cv: Condvar::new(),
            terminate: AtomicBool::new(false),
        }
    }

    /// Queues `task` on this worker and wakes it.
    pub fn push(&self, task: Task) {
        self.queue.lock().push_back(task);
        self.cv.notify_one();
    }

    /// Wakes the worker if it's idle, so it looks at the overflow queue.
    pub fn wake(&self) {
        let _queue = self.queue.lock();
        self.cv.notify_one();
    }

    /// Asks the worker to exit once both its queue and the overflow are empty.
    pub fn terminate(&self) {
        let _queue = self.queue.lock();
        self.terminate.store(true, Ordering::Release);
        self.cv.notify_all();
    }

    /// Blocks until there's a task for this worker, or returns `None` when it should exit.
    fn next_task(&self, overflow: &Overflow) -> Option<Task> {
        let mut queue = self.queue.lock();

        loop {
            if let Some(task) = queue.pop_front() {
                return Some(task);
            }

            if let Some(task) = overflow.lock().pop_front() {
                return Some(task);
            }

            if self.terminate.load(Ordering::Acquire) {
                return None;
            }

            self.cv.wait_for(&mut queue, IDLE_TIMEOUT);
        }
    }

    /// The body of a pool thread.
    ///
    /// # Arguments
    /// * `thread_index` - The index of this worker in the pool.
    /// * `overflow` - The queue shared by every worker.
    pub fn run(self: Arc<Self>, thread_index: usize, overflow: Overflow) {
        while let Some(task) = self.next_task(&overflow) {
            let (offset, len) = (task.offset(), task.len());
            trace!(thread_index = thread_index, offset = offset, len = len; "task started");

            task.run(thread_index);

            trace!(thread_index = thread_index, offset = offset, len = len; "task finished");
        }

        trace!(thread_index = thread_index; "worker exiting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::task::{TaskStatus, tests::job};
    use std::thread;

    #[test]
    fn drains_own_queue_before_exiting() {
        let worker = Arc::new(Worker::new());
        let overflow: Overflow = Arc::default();

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let (task, handle) = Task::new(job(|_| {}), i, 1);
                worker.push(task);
                handle
            })
            .collect();
        worker.terminate();

        let w = Arc::clone(&worker);
        let overflow_ = Arc::clone(&overflow);
        thread::spawn(move || w.run(0, overflow_)).join().unwrap();

        assert!(handles.iter().all(|h| h.status() == TaskStatus::Complete));
    }

    #[test]
    fn picks_up_overflow_when_idle() {
        let worker = Arc::new(Worker::new());
        let overflow: Overflow = Arc::default();

        let w = Arc::clone(&worker);
        let overflow_ = Arc::clone(&overflow);
        let join = thread::spawn(move || w.run(5, overflow_));

        let (task, handle) = Task::new(job(|_| {}), 0, 1);
        overflow.lock().push_back(task);
        worker.wake();

        assert_eq!(handle.wait(), TaskStatus::Complete);
        assert_eq!(handle.thread_index(), Some(5));

        worker.terminate();
        join.join().unwrap();
    }
}
