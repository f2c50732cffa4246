//! Building the edit for one task.

use taskcopy_proto::records::{Phid, Task};
use taskcopy_proto::transaction::{STATUS_OPEN, Transaction, TransactionSet};

use crate::priority::{PriorityError, PrioritySet};

/// A task paired with the edit that copies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationJob {
    /// The source task.
    pub task: Task,
    /// Transactions for `maniphest.edit`.
    pub transactions: TransactionSet,
    /// Project the copy is filed under.
    pub destination: Phid,
}

impl ReplicationJob {
    /// Plans the copy of `task` from `source` into `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityError`] if the task's priority has no keyword.
    pub fn plan(
        task: Task,
        source: &Phid,
        destination: &Phid,
        priorities: &PrioritySet,
    ) -> Result<Self, PriorityError> {
        let transactions = build_transactions(&task, source, destination, priorities)?;
        Ok(Self {
            task,
            transactions,
            destination: destination.clone(),
        })
    }
}

/// Transactions that re-create `task` as an open task tagged with
/// `destination` instead of `source`.
///
/// The set holds, in order: title, status, priority, points, description,
/// owner, projects.set, and space when the task has one.
///
/// # Errors
///
/// Returns [`PriorityError`] if the task's priority value is not in
/// `priorities` or has no keywords.
pub fn build_transactions(
    task: &Task,
    source: &Phid,
    destination: &Phid,
    priorities: &PrioritySet,
) -> Result<TransactionSet, PriorityError> {
    let priority = priorities.keyword_for(task.priority_value)?;

    let mut set = TransactionSet::new();
    set.set(Transaction::Title(task.name.clone()));
    set.set(Transaction::Status(STATUS_OPEN.to_string()));
    set.set(Transaction::Priority(priority.to_string()));
    set.set(Transaction::Points(task.points.clone()));
    set.set(Transaction::Description(task.description.clone()));
    set.set(Transaction::Owner(task.owner.clone()));
    set.set(Transaction::ProjectsSet(retarget_projects(
        &task.projects,
        source,
        destination,
    )));
    if let Some(space) = &task.space {
        set.set(Transaction::Space(space.clone()));
    }
    Ok(set)
}

/// `projects` without `source`, with `destination` appended exactly once.
///
/// Other projects keep their relative order.
#[must_use]
pub fn retarget_projects(projects: &[Phid], source: &Phid, destination: &Phid) -> Vec<Phid> {
    let mut retargeted: Vec<Phid> = projects
        .iter()
        .filter(|p| *p != source && *p != destination)
        .cloned()
        .collect();
    retargeted.push(destination.clone());
    retargeted
}
