//! Copying tasks into the destination project.
//!
//! [`plan`] turns each fetched task into the [`TransactionSet`] that
//! re-creates it as an open task in the destination; [`pipeline`] sends
//! those edits with a concurrency cap and streams per-task outcomes.
//!
//! Failures are isolated per task: a task whose edit cannot be built or
//! sent is reported in its [`ReplicationOutcome`] while the others carry on.
//!
//! [`TransactionSet`]: taskcopy_proto::transaction::TransactionSet

pub mod pipeline;
pub mod plan;

pub use pipeline::{DEFAULT_CONCURRENCY, ReplicationPipeline, ReplicationStream};
pub use plan::{ReplicationJob, build_transactions, retarget_projects};

use crate::conduit::ConduitError;
use crate::priority::PriorityError;

/// Why a single task was not copied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicationError {
    /// The edit could not be built; nothing was sent.
    #[error("cannot build edit: {0}")]
    Priority(#[from] PriorityError),

    /// The edit call failed.
    #[error(transparent)]
    Conduit(#[from] ConduitError),
}

/// Result of copying one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationOutcome {
    /// Numeric id of the source task.
    pub task_id: u64,
    /// Numeric id of the created task, or why it was not created.
    pub result: Result<u64, ReplicationError>,
}

impl ReplicationOutcome {
    /// Id of the created task, if the copy succeeded.
    #[must_use]
    pub fn new_task_id(&self) -> Option<u64> {
        self.result.as_ref().ok().copied()
    }
}
