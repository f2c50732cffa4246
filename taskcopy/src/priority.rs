//! Priority levels and keyword resolution.
//!
//! Tasks store a numeric priority, but `maniphest.edit` only accepts a
//! keyword. The set of levels is fetched once per run (in the background
//! while the user answers prompts) and looked up per task.

use taskcopy_proto::form::Params;
use taskcopy_proto::records::{SearchPage, TaskPriority};

use crate::conduit::{ConduitClient, ConduitError, PRIORITY_SEARCH};
use crate::transport::Transport;

/// A task references a priority that cannot be expressed as a keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriorityError {
    /// No fetched priority has this value.
    #[error("no priority with value {value}")]
    Unknown {
        /// The task's numeric priority.
        value: i64,
    },

    /// The priority exists but has no keywords.
    #[error("priority with value {value} has no keywords")]
    NoKeywords {
        /// The task's numeric priority.
        value: i64,
    },
}

/// The priority levels configured on the install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrioritySet {
    levels: Vec<TaskPriority>,
}

impl PrioritySet {
    /// Wraps fetched levels.
    #[must_use]
    pub const fn new(levels: Vec<TaskPriority>) -> Self {
        Self { levels }
    }

    /// All levels, in API order.
    #[must_use]
    pub fn levels(&self) -> &[TaskPriority] {
        &self.levels
    }

    /// Canonical keyword for a numeric priority value.
    ///
    /// # Errors
    ///
    /// Returns [`PriorityError::Unknown`] if no level has `value`, or
    /// [`PriorityError::NoKeywords`] if the matching level has none.
    pub fn keyword_for(&self, value: i64) -> Result<&str, PriorityError> {
        let level = self
            .levels
            .iter()
            .find(|p| p.value == value)
            .ok_or(PriorityError::Unknown { value })?;
        level
            .canonical_keyword()
            .ok_or(PriorityError::NoKeywords { value })
    }
}

impl<T: Transport> ConduitClient<T> {
    /// Fetches every priority level.
    ///
    /// # Errors
    ///
    /// Returns [`ConduitError`] if the call fails.
    pub async fn fetch_priorities(&self) -> Result<PrioritySet, ConduitError> {
        let page: SearchPage<TaskPriority> = self.call(PRIORITY_SEARCH, &Params::new()).await?;
        tracing::debug!(count = page.data.len(), "fetched priorities");
        Ok(PrioritySet::new(page.data))
    }
}
