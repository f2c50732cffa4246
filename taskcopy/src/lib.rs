//! `taskcopy`: copy resolved Maniphest tasks into another project.
//!
//! Talks to a Phabricator install over the Conduit HTTP API. The
//! interactive flow lives in [`app`]; everything it needs is reachable
//! through traits ([`transport::Transport`], [`prompt::Prompter`]) so the
//! whole run can be driven without a network or a terminal.

pub mod app;
pub mod conduit;
pub mod config;
pub mod priority;
pub mod prompt;
pub mod replication;
pub mod search;
pub mod tasks;
pub mod transport;
