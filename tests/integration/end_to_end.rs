// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::future_not_send,
    clippy::missing_panics_doc,
    clippy::doc_markdown
)]

//! End-to-end runs of the interactive copy flow.
//!
//! A scripted Conduit install answers every call and a scripted prompter
//! answers every prompt, so each test drives `app::run` exactly as the
//! binary does, minus the network and the terminal.
//!
//! Covers:
//! - no matching tasks: message printed, nothing copied
//! - three tasks confirmed: three edits, never more than two at once
//! - declined confirmation: no edits at all
//! - a task with an unmapped priority fails alone
//! - an edit rejected by the API fails alone
//! - fatal errors: priority fetch failure, cancelled prompt

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use taskcopy::app::{self, DESTINATION_PROMPT, RunError, RunSettings, SOURCE_PROMPT, TAG_PROMPT};
use taskcopy::conduit::{
    ConduitClient, ConduitError, MANIPHEST_EDIT, MANIPHEST_SEARCH, PRIORITY_SEARCH,
    PROJECT_SEARCH,
};
use taskcopy::prompt::{Answer, PromptError, ScriptedPrompter};
use taskcopy::replication::ReplicationError;
use taskcopy::transport::scripted::{self, ScriptedTransport};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LATENCY: Duration = Duration::from_millis(50);

fn settings() -> RunSettings {
    RunSettings {
        settle_delay: Duration::from_millis(200),
        concurrency: 2,
    }
}

fn task(id: u64, name: &str, priority: i64) -> Value {
    json!({
        "id": id,
        "phid": format!("PHID-TASK-{id}"),
        "fields": {
            "name": name,
            "description": { "raw": format!("details of {name}") },
            "ownerPHID": "PHID-USER-alice",
            "priority": { "value": priority },
            "points": "3",
            "spacePHID": null,
            "status": { "value": "resolved" }
        },
        "attachments": {
            "projects": { "projectPHIDs": ["PHID-PROJ-src", "PHID-PROJ-tag"] }
        }
    })
}

fn priorities() -> Value {
    json!({
        "data": [
            { "name": "High", "value": 80, "keywords": ["high"] },
            { "name": "Normal", "value": 50, "keywords": ["normal", "medium"] }
        ]
    })
}

/// A Conduit install that knows one project per query (`PHID-PROJ-{query}`),
/// returns `tasks` for every task search, and numbers created tasks from 100.
///
/// Edits whose title is `reject_title` fail with an API error.
fn conduit(tasks: Vec<Value>, reject_title: Option<&'static str>) -> ScriptedTransport {
    let next_id = AtomicU64::new(100);
    ScriptedTransport::new(move |request| match request.method.as_str() {
        PROJECT_SEARCH => {
            let query = request.param("constraints[query]").unwrap_or_default();
            scripted::result(&json!({
                "data": [{
                    "id": 1,
                    "phid": format!("PHID-PROJ-{query}"),
                    "fields": { "name": query, "parent": null }
                }]
            }))
        }
        PRIORITY_SEARCH => scripted::result(&priorities()),
        MANIPHEST_SEARCH => scripted::result(&json!({ "data": tasks })),
        MANIPHEST_EDIT => {
            if reject_title.is_some() && request.param("transactions[0][value]").as_deref() == reject_title {
                return scripted::api_error("ERR-CONDUIT-CORE", "title is not allowed");
            }
            let id = next_id.fetch_add(1, Ordering::SeqCst);
            scripted::result(&json!({
                "object": { "id": id, "phid": format!("PHID-TASK-{id}") },
                "transactions": []
            }))
        }
        _ => scripted::api_error("ERR-CONDUIT-CALL", "unknown method"),
    })
    .with_latency(LATENCY)
}

fn confirm_and_copy() -> ScriptedPrompter {
    ScriptedPrompter::new([
        Answer::first("src"),
        Answer::first("tag"),
        Answer::Confirm(true),
        Answer::first("dest"),
    ])
}

fn lines(out: &[u8]) -> Vec<String> {
    String::from_utf8(out.to_vec())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn no_matching_tasks_prints_message_and_copies_nothing() {
    let client = Arc::new(ConduitClient::new(conduit(Vec::new(), None), "tok"));
    let mut prompter = confirm_and_copy();
    let mut out = Vec::new();

    let summary = app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap();

    assert_eq!(lines(&out), vec!["No tasks to copy!"]);
    assert_eq!(summary.found, 0);
    assert!(summary.outcomes.is_empty());
    assert_eq!(client.transport().calls_to(MANIPHEST_EDIT), 0);
    assert_eq!(prompter.asked(), [SOURCE_PROMPT, TAG_PROMPT]);
}

#[tokio::test(start_paused = true)]
async fn confirmed_tasks_are_copied_two_at_a_time() {
    let tasks = vec![
        task(1, "First", 80),
        task(2, "Second", 50),
        task(3, "Third", 50),
    ];
    let client = Arc::new(ConduitClient::new(conduit(tasks, None), "tok"));
    let mut prompter = confirm_and_copy();
    let mut out = Vec::new();

    let summary = app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap();

    let transport = client.transport();
    assert_eq!(transport.calls_to(MANIPHEST_EDIT), 3);
    assert_eq!(transport.peak_in_flight(), 2);

    let mut printed = lines(&out);
    printed.sort();
    assert_eq!(printed, vec!["Created T100", "Created T101", "Created T102"]);
    assert_eq!(summary.created(), 3);
    assert_eq!(summary.failed(), 0);

    assert_eq!(
        prompter.asked(),
        [
            SOURCE_PROMPT,
            TAG_PROMPT,
            "T1 First\nT2 Second\nT3 Third\nCopy 3 task(s)?",
            DESTINATION_PROMPT,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn edits_carry_the_retargeted_task() {
    let client = Arc::new(ConduitClient::new(
        conduit(vec![task(7, "Rotate keys", 80)], None),
        "tok",
    ));
    let mut prompter = confirm_and_copy();
    let mut out = Vec::new();

    app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap();

    let edit = &client.transport().requests_to(MANIPHEST_EDIT)[0];
    let expected = [
        ("api.token", "tok"),
        ("transactions[0][type]", "title"),
        ("transactions[0][value]", "Rotate keys"),
        ("transactions[1][type]", "status"),
        ("transactions[1][value]", "open"),
        ("transactions[2][type]", "priority"),
        ("transactions[2][value]", "high"),
        ("transactions[3][type]", "points"),
        ("transactions[3][value]", "3"),
        ("transactions[4][type]", "description"),
        ("transactions[4][value]", "details of Rotate keys"),
        ("transactions[5][type]", "owner"),
        ("transactions[5][value]", "PHID-USER-alice"),
        ("transactions[6][type]", "projects.set"),
        ("transactions[6][value][0]", "PHID-PROJ-tag"),
        ("transactions[6][value][1]", "PHID-PROJ-dest"),
    ];
    let expected: Vec<(String, String)> = expected
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    assert_eq!(edit.params(), expected);
}

#[tokio::test(start_paused = true)]
async fn priorities_are_fetched_before_the_first_prompt_resolves() {
    let client = Arc::new(ConduitClient::new(conduit(Vec::new(), None), "tok"));
    let mut prompter = confirm_and_copy();
    let mut out = Vec::new();

    app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap();

    let requests = client.transport().requests();
    assert_eq!(requests[0].method, PRIORITY_SEARCH);
    assert_eq!(client.transport().calls_to(PRIORITY_SEARCH), 1);
}

#[tokio::test(start_paused = true)]
async fn declining_makes_no_edits() {
    let tasks = vec![task(1, "First", 80), task(2, "Second", 50)];
    let client = Arc::new(ConduitClient::new(conduit(tasks, None), "tok"));
    let mut prompter = ScriptedPrompter::new([
        Answer::first("src"),
        Answer::first("tag"),
        Answer::Confirm(false),
    ]);
    let mut out = Vec::new();

    let summary = app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap();

    assert!(summary.declined);
    assert_eq!(summary.found, 2);
    assert!(out.is_empty());
    assert_eq!(client.transport().calls_to(MANIPHEST_EDIT), 0);
    assert_eq!(prompter.asked().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn unmapped_priority_fails_only_that_task() {
    let tasks = vec![
        task(1, "First", 80),
        task(2, "Odd", 13),
        task(3, "Third", 50),
    ];
    let client = Arc::new(ConduitClient::new(conduit(tasks, None), "tok"));
    let mut prompter = confirm_and_copy();
    let mut out = Vec::new();

    let summary = app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap();

    assert_eq!(client.transport().calls_to(MANIPHEST_EDIT), 2);
    assert_eq!(summary.created(), 2);
    assert_eq!(summary.failed(), 1);

    let failed = summary
        .outcomes
        .iter()
        .find(|o| o.result.is_err())
        .unwrap();
    assert_eq!(failed.task_id, 2);
    assert!(matches!(failed.result, Err(ReplicationError::Priority(_))));

    let printed = lines(&out);
    assert!(printed.contains(&"Failed to copy T2: cannot build edit: no priority with value 13".to_string()));
    assert_eq!(printed.iter().filter(|l| l.starts_with("Created T")).count(), 2);
}

#[tokio::test(start_paused = true)]
async fn rejected_edit_fails_only_that_task() {
    let tasks = vec![
        task(1, "First", 80),
        task(2, "Broken", 50),
        task(3, "Third", 50),
    ];
    let client = Arc::new(ConduitClient::new(conduit(tasks, Some("Broken")), "tok"));
    let mut prompter = confirm_and_copy();
    let mut out = Vec::new();

    let summary = app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap();

    assert_eq!(client.transport().calls_to(MANIPHEST_EDIT), 3);
    assert_eq!(summary.created(), 2);

    let failed = summary
        .outcomes
        .iter()
        .find(|o| o.result.is_err())
        .unwrap();
    assert_eq!(failed.task_id, 2);
    assert!(matches!(
        failed.result,
        Err(ReplicationError::Conduit(ConduitError::Api { .. }))
    ));
    assert!(
        lines(&out)
            .iter()
            .any(|l| l.starts_with("Failed to copy T2:") && l.contains("title is not allowed"))
    );
}

#[tokio::test(start_paused = true)]
async fn priority_fetch_failure_is_fatal_and_copies_nothing() {
    let client = Arc::new(ConduitClient::new(
        ScriptedTransport::new(|request| match request.method.as_str() {
            PROJECT_SEARCH => scripted::result(&json!({
                "data": [{ "id": 1, "phid": "PHID-PROJ-x", "fields": { "name": "x" } }]
            })),
            MANIPHEST_SEARCH => scripted::result(&json!({ "data": [task(1, "First", 80)] })),
            _ => scripted::api_error("ERR-INVALID-AUTH", "token expired"),
        }),
        "tok",
    ));
    let mut prompter = confirm_and_copy();
    let mut out = Vec::new();

    let err = app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::FetchPriorities(_)));
    assert_eq!(client.transport().calls_to(MANIPHEST_EDIT), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_prompt_ends_the_run() {
    let client = Arc::new(ConduitClient::new(conduit(Vec::new(), None), "tok"));
    let mut prompter = ScriptedPrompter::new([Answer::first("src"), Answer::Cancel]);
    let mut out = Vec::new();

    let err = app::run(Arc::clone(&client), &mut prompter, settings(), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Prompt(PromptError::Cancelled)));
    assert_eq!(client.transport().calls_to(MANIPHEST_SEARCH), 0);
}

#[tokio::test(start_paused = true)]
async fn failing_project_search_is_reported_as_search_error() {
    let client = Arc::new(ConduitClient::new(
        ScriptedTransport::new(|request| match request.method.as_str() {
            PRIORITY_SEARCH => scripted::result(&priorities()),
            _ => scripted::api_error("ERR-INVALID-AUTH", "bad token"),
        }),
        "",
    ));
    let mut prompter = confirm_and_copy();
    let mut out = Vec::new();

    let err = app::run(client, &mut prompter, settings(), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Search(ConduitError::Api { .. })));
}
