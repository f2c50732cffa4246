//! Interactive prompts.
//!
//! The run flow only talks to the [`Prompter`] trait. [`TerminalPrompter`]
//! drives a real terminal; [`ScriptedPrompter`] answers from a script and
//! is used by tests.

pub mod picker;
pub mod scripted;
pub mod terminal;
mod theme;

use std::future::Future;

pub use picker::{PickerAction, PickerState};
pub use scripted::{Answer, ScriptedPrompter};
pub use terminal::TerminalPrompter;

use crate::conduit::ConduitError;
use crate::search::{IncrementalSearch, ProjectSearch, SearchOption};

/// Errors from an interactive prompt.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// The user aborted the prompt.
    #[error("prompt cancelled")]
    Cancelled,

    /// Reading keys or drawing failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The search behind an autocomplete prompt failed.
    #[error("project search failed: {0}")]
    Search(#[from] ConduitError),
}

/// Asks the user questions.
pub trait Prompter {
    /// Autocomplete prompt: every edit is submitted to `search`, the user
    /// picks one of the latest options.
    fn select<S: ProjectSearch>(
        &mut self,
        message: &str,
        search: &IncrementalSearch<S>,
    ) -> impl Future<Output = Result<SearchOption, PromptError>>;

    /// Yes/no question. Defaults to no.
    fn confirm(&mut self, message: &str) -> impl Future<Output = Result<bool, PromptError>>;
}
