//! Bounded-concurrency edit pipeline.
//!
//! A fixed pool of workers pulls tasks from a shared FIFO queue. Each worker
//! builds the task's edit and sends it, one at a time, so at most
//! `concurrency` edits are outstanding. Dispatch follows input order;
//! completion order does not. Outcomes are pushed onto a channel as they
//! complete and surface through [`ReplicationStream`].
//!
//! ```text
//! [task queue] ──pop──> worker 0 ──edit──> Conduit ──outcome──> ReplicationStream
//!              ──pop──> worker 1 ──edit──> Conduit ──outcome──┘
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::stream::Stream;
use parking_lot::Mutex;
use taskcopy_proto::records::{EditResult, EditedObject, Phid, Task};
use taskcopy_proto::transaction::TransactionSet;
use tokio::sync::mpsc;

use super::plan::ReplicationJob;
use super::{ReplicationError, ReplicationOutcome};
use crate::conduit::{ConduitClient, ConduitError, MANIPHEST_EDIT};
use crate::priority::PrioritySet;
use crate::transport::Transport;

/// Default number of edits in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 2;

impl<T: Transport> ConduitClient<T> {
    /// Creates a task from `transactions` via `maniphest.edit`.
    ///
    /// # Errors
    ///
    /// Returns [`ConduitError`] if the edit call fails.
    pub async fn create_task(
        &self,
        transactions: &TransactionSet,
    ) -> Result<EditedObject, ConduitError> {
        let result: EditResult = self.call(MANIPHEST_EDIT, &transactions.to_params()).await?;
        Ok(result.object)
    }
}

/// Inputs shared by every worker of one run.
struct RunPlan {
    source: Phid,
    destination: Phid,
    priorities: PrioritySet,
}

/// Copies tasks with a cap on concurrent edit calls.
pub struct ReplicationPipeline<T> {
    client: Arc<ConduitClient<T>>,
    concurrency: usize,
}

impl<T: Transport + 'static> ReplicationPipeline<T> {
    /// Creates a pipeline with [`DEFAULT_CONCURRENCY`].
    pub const fn new(client: Arc<ConduitClient<T>>) -> Self {
        Self {
            client,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Sets the number of concurrent edits (at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Configured concurrency cap.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Starts copying `tasks` from `source` into `destination`.
    ///
    /// Returns immediately; the stream yields one outcome per task as its
    /// edit completes or fails, then ends. Dropping the stream does not stop
    /// the remaining edits.
    pub fn run(
        &self,
        tasks: Vec<Task>,
        source: Phid,
        destination: Phid,
        priorities: PrioritySet,
    ) -> ReplicationStream {
        let total = tasks.len();
        let workers = self.concurrency().min(total);
        let (tx, rx) = mpsc::channel(total.max(1));

        let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let plan = Arc::new(RunPlan {
            source,
            destination,
            priorities,
        });

        tracing::info!(
            tasks = total,
            workers,
            destination = %plan.destination,
            "starting replication"
        );

        for worker in 0..workers {
            tokio::spawn(worker_loop(
                worker,
                Arc::clone(&self.client),
                Arc::clone(&queue),
                Arc::clone(&plan),
                tx.clone(),
            ));
        }

        ReplicationStream { rx, total }
    }
}

/// Outcomes of a running replication, in completion order.
pub struct ReplicationStream {
    rx: mpsc::Receiver<ReplicationOutcome>,
    total: usize,
}

impl ReplicationStream {
    /// Number of tasks in the run (and of outcomes the stream will yield).
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Waits for the next outcome; `None` once every task has finished.
    pub async fn next_outcome(&mut self) -> Option<ReplicationOutcome> {
        self.rx.recv().await
    }
}

impl Stream for ReplicationStream {
    type Item = ReplicationOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

fn next_task(queue: &Mutex<VecDeque<Task>>) -> Option<Task> {
    queue.lock().pop_front()
}

async fn worker_loop<T: Transport>(
    worker: usize,
    client: Arc<ConduitClient<T>>,
    queue: Arc<Mutex<VecDeque<Task>>>,
    plan: Arc<RunPlan>,
    tx: mpsc::Sender<ReplicationOutcome>,
) {
    while let Some(task) = next_task(&queue) {
        let outcome = replicate_one(&client, &plan, task).await;
        if tx.send(outcome).await.is_err() {
            tracing::debug!(worker, "outcome stream dropped, continuing without reporting");
        }
    }
    tracing::debug!(worker, "queue drained");
}

async fn replicate_one<T: Transport>(
    client: &ConduitClient<T>,
    plan: &RunPlan,
    task: Task,
) -> ReplicationOutcome {
    let task_id = task.id;

    let job = match ReplicationJob::plan(task, &plan.source, &plan.destination, &plan.priorities)
    {
        Ok(job) => job,
        Err(e) => {
            tracing::warn!(task_id, error = %e, "skipping task, edit cannot be built");
            return ReplicationOutcome {
                task_id,
                result: Err(e.into()),
            };
        }
    };

    tracing::debug!(
        task_id,
        transactions = job.transactions.len(),
        "dispatching edit"
    );
    let result = client
        .create_task(&job.transactions)
        .await
        .map(|object| object.id)
        .map_err(ReplicationError::from);

    match &result {
        Ok(new_id) => tracing::info!(task_id, new_id, "task copied"),
        Err(e) => tracing::warn!(task_id, error = %e, "edit failed"),
    }

    ReplicationOutcome { task_id, result }
}
