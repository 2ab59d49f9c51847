//! Task queues for listener delivery
//!
//! Two implementations of [`TaskQueue`]:
//!
//! - [`ManualQueue`] holds tasks until the test runs them, giving fully
//!   deterministic delivery on the test's own thread
//! - [`TokioQueue`] runs tasks in order on a tokio worker task; tests await
//!   [`TokioQueue::drain`] before observing side effects

use std::collections::VecDeque;
use std::sync::Arc;

use hal_protocol::{QueueHandle, Task, TaskQueue};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Queue whose tasks run only when [`run_pending`](Self::run_pending) is called
#[derive(Default)]
pub struct ManualQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl ManualQueue {
    /// Create a shared manual queue
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Handle for passing this queue to a directory
    pub fn handle(self: &Arc<Self>) -> QueueHandle {
        QueueHandle::new(Arc::clone(self))
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Run queued tasks in order on the calling thread until the queue is empty
    ///
    /// Tasks submitted while draining are run as well. Returns the number of
    /// tasks run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop under the lock, run without it: tasks may submit more work.
            let next = self.tasks.lock().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    /// Drop queued tasks without running them
    pub fn clear(&self) {
        self.tasks.lock().clear();
    }
}

impl TaskQueue for ManualQueue {
    fn submit(&self, task: Task) {
        self.tasks.lock().push_back(task);
    }
}

/// Serial queue running tasks on a tokio worker task
pub struct TokioQueue {
    label: String,
    tx: mpsc::UnboundedSender<Task>,
}

impl TokioQueue {
    /// Spawn the worker on the current runtime
    ///
    /// Must be called from within a tokio runtime. The worker exits when the
    /// queue is dropped.
    pub fn spawn(label: impl Into<String>) -> Arc<Self> {
        let label = label.into();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_queue_worker(label.clone(), rx));
        Arc::new(Self { label, tx })
    }

    /// Handle for passing this queue to a directory
    pub fn handle(self: &Arc<Self>) -> QueueHandle {
        QueueHandle::new(Arc::clone(self))
    }

    /// Queue label used in logs
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wait until every task submitted before this call has run
    pub async fn drain(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.submit(Box::new(move || {
            let _ = done_tx.send(());
        }));
        // An error means the worker is gone, so nothing is left to wait for.
        let _ = done_rx.await;
    }
}

impl TaskQueue for TokioQueue {
    fn submit(&self, task: Task) {
        if self.tx.send(task).is_err() {
            debug!("Task queue {} worker stopped, dropping task", self.label);
        }
    }
}

async fn run_queue_worker(label: String, mut rx: mpsc::UnboundedReceiver<Task>) {
    debug!("Task queue {} started", label);
    while let Some(task) = rx.recv().await {
        task();
    }
    debug!("Task queue {} stopped", label);
}
