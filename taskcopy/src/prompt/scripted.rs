//! A [`Prompter`] that answers from a script.
//!
//! Autocomplete answers still go through the real [`IncrementalSearch`]:
//! the scripted query is submitted and the option at the scripted index of
//! the latest result is picked.

use std::collections::VecDeque;

use super::{PromptError, Prompter};
use crate::search::{IncrementalSearch, ProjectSearch, SearchOption};

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Type `query`, then accept the option at `index`.
    Select {
        /// Text submitted to the search.
        query: String,
        /// Position in the result list.
        index: usize,
    },
    /// Answer a confirmation.
    Confirm(bool),
    /// Abort the prompt.
    Cancel,
}

impl Answer {
    /// Picks the first option found for `query`.
    pub fn first(query: impl Into<String>) -> Self {
        Self::Select {
            query: query.into(),
            index: 0,
        }
    }
}

/// Prompter fed by a queue of [`Answer`]s.
///
/// Running out of answers, or an answer of the wrong kind, cancels the
/// prompt.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    /// Creates a prompter that answers in order.
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Messages of every prompt shown so far.
    #[must_use]
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Answers not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self, message: &str) -> Option<Answer> {
        self.asked.push(message.to_string());
        self.answers.pop_front()
    }
}

impl Prompter for ScriptedPrompter {
    async fn select<S: ProjectSearch>(
        &mut self,
        message: &str,
        search: &IncrementalSearch<S>,
    ) -> Result<SearchOption, PromptError> {
        let Some(Answer::Select { query, index }) = self.next_answer(message) else {
            return Err(PromptError::Cancelled);
        };
        search.submit(&query);
        let mut options = search.latest().await?;
        if index >= options.len() {
            tracing::debug!(prompt = message, %query, index, "scripted option missing");
            return Err(PromptError::Cancelled);
        }
        Ok(options.swap_remove(index))
    }

    async fn confirm(&mut self, message: &str) -> Result<bool, PromptError> {
        match self.next_answer(message) {
            Some(Answer::Confirm(yes)) => Ok(yes),
            _ => Err(PromptError::Cancelled),
        }
    }
}
