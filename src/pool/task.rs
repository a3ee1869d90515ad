use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use parking_lot::{Condvar, Mutex};

/// Work that runs on a pool thread, receiving that thread's index.
pub(crate) type Job = Box<dyn FnOnce(usize) + Send + 'static>;

/// The lifecycle of a dispatched task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running { thread_index: usize },
    Complete,
    Panicked(String),
}

impl TaskStatus {
    /// Whether the task won't change state anymore.
    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Panicked(_))
    }
}

/// The caller's side of a dispatched task, used to block until it finishes.
#[derive(Debug)]
pub struct TaskHandle {
    status: Mutex<TaskStatus>,
    done: Condvar,
    thread_index: Mutex<Option<usize>>,
}

impl TaskHandle {
    fn new() -> Self {
        Self {
            status: Mutex::new(TaskStatus::Pending),
            done: Condvar::new(),
            thread_index: Mutex::new(None),
        }
    }

    /// The current status, without blocking.
    pub fn status(&self) -> TaskStatus {
        self.status.lock().clone()
    }

    /// The index of the thread that picked the task up, if any did yet.
    pub fn thread_index(&self) -> Option<usize> {
        *self.thread_index.lock()
    }

    /// Blocks until the task completes or panics and returns its final status.
    pub fn wait(&self) -> TaskStatus {
        let mut status = self.status.lock();
        while !status.is_finished() {
            self.done.wait(&mut status);
        }

        status.clone()
    }

    fn set(&self, new: TaskStatus) {
        let mut status = self.status.lock();
        *status = new;
        if status.is_finished() {
            self.done.notify_all();
        }
    }
}

/// A unit of work queued on a worker: the job, the span of elements it covers and its
/// completion state.
pub(crate) struct Task {
    job: Job,
    offset: usize,
    len: usize,
    handle: Arc<TaskHandle>,
}

impl Task {
    /// Creates a new `Task` and the handle to wait on it.
    ///
    /// # Arguments
    /// * `job` - The work to run.
    /// * `offset` - The first element the job covers.
    /// * `len` - The amount of elements the job covers.
    pub fn new(job: Job, offset: usize, len: usize) -> (Self, Arc<TaskHandle>) {
        let handle = Arc::new(TaskHandle::new());
        let task = Self {
            job,
            offset,
            len,
            handle: Arc::clone(&handle),
        };

        (task, handle)
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Runs the job on the calling thread, capturing a panic as the final status.
    pub fn run(self, thread_index: usize) {
        let Self { job, handle, .. } = self;

        *handle.thread_index.lock() = Some(thread_index);
        handle.set(TaskStatus::Running { thread_index });

        let status = match panic::catch_unwind(AssertUnwindSafe(|| job(thread_index))) {
            Ok(()) => TaskStatus::Complete,
            Err(payload) => TaskStatus::Panicked(panic_message(&*payload)),
        };

        handle.set(status);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return s.to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}
