//! One interactive copy run.
//!
//! Pick source and tag, fetch the resolved tasks, confirm, pick the
//! destination, then copy. The priority list is fetched in the background
//! from the start so it is ready by the time the edits are built.

use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use taskcopy_proto::records::Task;

use crate::conduit::{ConduitClient, ConduitError};
use crate::config::AppConfig;
use crate::prompt::{PromptError, Prompter};
use crate::replication::{ReplicationOutcome, ReplicationPipeline};
use crate::search::{IncrementalSearch, SearchOption};
use crate::transport::Transport;

/// Message of the source project prompt.
pub const SOURCE_PROMPT: &str = "Source Project";
/// Message of the tag prompt.
pub const TAG_PROMPT: &str = "Tag";
/// Message of the destination prompt.
pub const DESTINATION_PROMPT: &str = "Destination";
/// Printed when the search finds nothing.
pub const NO_TASKS: &str = "No tasks to copy!";

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A project search behind a prompt failed.
    #[error("project search failed: {0}")]
    Search(ConduitError),

    /// The task search failed.
    #[error("cannot fetch tasks: {0}")]
    FetchTasks(ConduitError),

    /// The priority list could not be fetched.
    #[error("cannot fetch priorities: {0}")]
    FetchPriorities(ConduitError),

    /// A prompt was cancelled or the terminal failed.
    #[error(transparent)]
    Prompt(PromptError),

    /// Writing progress output failed.
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),

    /// The background priority fetch did not finish.
    #[error("priority fetch aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<PromptError> for RunError {
    fn from(e: PromptError) -> Self {
        match e {
            PromptError::Search(e) => Self::Search(e),
            other => Self::Prompt(other),
        }
    }
}

/// Tunables of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Quiet period before a search query is sent.
    pub settle_delay: Duration,
    /// Number of edits in flight at once.
    pub concurrency: usize,
}

impl From<&AppConfig> for RunSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            settle_delay: config.settle_delay,
            concurrency: config.concurrency,
        }
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Resolved tasks found for source and tag.
    pub found: usize,
    /// Whether the user declined the copy.
    pub declined: bool,
    /// One outcome per copied task, in completion order.
    pub outcomes: Vec<ReplicationOutcome>,
}

impl RunSummary {
    /// Tasks that were created in the destination.
    #[must_use]
    pub fn created(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Tasks that failed to copy.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.created()
    }
}

/// Runs the whole interactive flow, writing progress lines to `out`.
///
/// # Errors
///
/// Returns [`RunError`] if a prompt is cancelled, a search or fetch fails,
/// or `out` cannot be written. Failures of individual copies are not
/// errors; they are reported in the summary.
pub async fn run<T, P, W>(
    client: Arc<ConduitClient<T>>,
    prompter: &mut P,
    settings: RunSettings,
    out: &mut W,
) -> Result<RunSummary, RunError>
where
    T: Transport + 'static,
    P: Prompter,
    W: Write,
{
    let priorities = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.fetch_priorities().await }
    });

    let source = select_project(prompter, SOURCE_PROMPT, &client, settings).await?;
    let tag = select_project(prompter, TAG_PROMPT, &client, settings).await?;

    let tasks = client
        .fetch_tasks(&source.id, &tag.id)
        .await
        .map_err(RunError::FetchTasks)?;
    if tasks.is_empty() {
        writeln!(out, "{NO_TASKS}")?;
        return Ok(RunSummary::default());
    }

    let found = tasks.len();
    if !prompter.confirm(&confirmation_message(&tasks)).await? {
        tracing::info!(found, "copy declined");
        return Ok(RunSummary {
            found,
            declined: true,
            outcomes: Vec::new(),
        });
    }

    let destination = select_project(prompter, DESTINATION_PROMPT, &client, settings).await?;
    let priorities = priorities.await?.map_err(RunError::FetchPriorities)?;

    let pipeline = ReplicationPipeline::new(client).with_concurrency(settings.concurrency);
    let mut stream = pipeline.run(tasks, source.id, destination.id, priorities);

    let mut outcomes = Vec::with_capacity(found);
    while let Some(outcome) = stream.next_outcome().await {
        match &outcome.result {
            Ok(new_id) => writeln!(out, "Created T{new_id}")?,
            Err(e) => writeln!(out, "Failed to copy T{}: {e}", outcome.task_id)?,
        }
        outcomes.push(outcome);
    }

    let summary = RunSummary {
        found,
        declined: false,
        outcomes,
    };
    tracing::info!(
        found,
        created = summary.created(),
        failed = summary.failed(),
        "run finished"
    );
    Ok(summary)
}

async fn select_project<T, P>(
    prompter: &mut P,
    message: &str,
    client: &Arc<ConduitClient<T>>,
    settings: RunSettings,
) -> Result<SearchOption, RunError>
where
    T: Transport + 'static,
    P: Prompter,
{
    let search = IncrementalSearch::new(Arc::clone(client), settings.settle_delay);
    Ok(prompter.select(message, &search).await?)
}

/// `T{id} {name}` per task, then `Copy {n} task(s)?`.
#[must_use]
pub fn confirmation_message(tasks: &[Task]) -> String {
    let mut message = String::new();
    for task in tasks {
        let _ = writeln!(message, "T{} {}", task.id, task.name);
    }
    let _ = write!(message, "Copy {} task(s)?", tasks.len());
    message
}
