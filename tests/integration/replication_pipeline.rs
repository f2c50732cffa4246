// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::future_not_send,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation
)]

//! Integration tests for the replication pipeline.
//!
//! Verifies:
//! - the concurrency cap holds for any cap and task count
//! - edits are dispatched in input order
//! - one failing task does not stop the others
//! - every task yields exactly one outcome, then the stream ends
//! - dropping the stream does not cancel outstanding edits

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;

use taskcopy::conduit::{ConduitClient, ConduitError, MANIPHEST_EDIT};
use taskcopy::priority::{PriorityError, PrioritySet};
use taskcopy::replication::{ReplicationError, ReplicationPipeline};
use taskcopy::transport::scripted::{self, ScriptedTransport};
use taskcopy_proto::records::{Phid, Task, TaskPriority};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn task(id: u64, priority_value: i64) -> Task {
    Task {
        id,
        phid: Phid::new(format!("PHID-TASK-{id}")),
        name: format!("task {id}"),
        description: String::new(),
        owner: None,
        priority_value,
        points: String::new(),
        space: None,
        status: "resolved".into(),
        projects: vec![Phid::new("PHID-PROJ-src")],
    }
}

fn tasks(n: u64) -> Vec<Task> {
    (1..=n).map(|id| task(id, 50)).collect()
}

fn priorities() -> PrioritySet {
    PrioritySet::new(vec![TaskPriority {
        name: "Normal".into(),
        value: 50,
        keywords: vec!["normal".into()],
    }])
}

/// Edit endpoint that echoes the source id + 1000 as the new id, and
/// rejects titles listed in `reject`.
fn edit_endpoint(reject: &'static [&'static str]) -> ScriptedTransport {
    ScriptedTransport::new(move |request| {
        let title = request.param("transactions[0][value]").unwrap_or_default();
        if reject.contains(&title.as_str()) {
            return scripted::api_error("ERR-CONDUIT-CORE", "rejected");
        }
        let id: u64 = title.trim_start_matches("task ").parse().unwrap();
        scripted::result(&json!({
            "object": { "id": id + 1000, "phid": format!("PHID-TASK-{}", id + 1000) }
        }))
    })
    .with_latency(Duration::from_millis(40))
}

fn build_pipeline(
    transport: ScriptedTransport,
    concurrency: usize,
) -> (Arc<ConduitClient<ScriptedTransport>>, ReplicationPipeline<ScriptedTransport>) {
    let client = Arc::new(ConduitClient::new(transport, "tok"));
    let pipeline = ReplicationPipeline::new(Arc::clone(&client)).with_concurrency(concurrency);
    (client, pipeline)
}

fn src() -> Phid {
    Phid::new("PHID-PROJ-src")
}

fn dst() -> Phid {
    Phid::new("PHID-PROJ-dst")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn concurrency_cap_is_never_exceeded() {
    for (cap, count) in [(1, 4), (2, 5), (3, 7), (4, 2)] {
        let (client, pipeline) = build_pipeline(edit_endpoint(&[]), cap);
        let outcomes: Vec<_> = pipeline
            .run(tasks(count), src(), dst(), priorities())
            .collect()
            .await;

        assert_eq!(outcomes.len(), count as usize);
        assert_eq!(client.transport().calls_to(MANIPHEST_EDIT), count as usize);
        assert_eq!(
            client.transport().peak_in_flight(),
            cap.min(count as usize),
            "cap {cap}, {count} tasks"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn default_concurrency_is_two() {
    let client = Arc::new(ConduitClient::new(edit_endpoint(&[]), "tok"));
    let pipeline = ReplicationPipeline::new(Arc::clone(&client));
    assert_eq!(pipeline.concurrency(), 2);

    let outcomes: Vec<_> = pipeline
        .run(tasks(6), src(), dst(), priorities())
        .collect()
        .await;
    assert_eq!(outcomes.len(), 6);
    assert_eq!(client.transport().peak_in_flight(), 2);
}

#[tokio::test(start_paused = true)]
async fn edits_are_dispatched_in_input_order() {
    let (client, pipeline) = build_pipeline(edit_endpoint(&[]), 2);
    let _ = pipeline
        .run(tasks(5), src(), dst(), priorities())
        .collect::<Vec<_>>()
        .await;

    let titles: Vec<String> = client
        .transport()
        .requests_to(MANIPHEST_EDIT)
        .iter()
        .map(|r| r.param("transactions[0][value]").unwrap())
        .collect();
    assert_eq!(titles, ["task 1", "task 2", "task 3", "task 4", "task 5"]);
}

#[tokio::test(start_paused = true)]
async fn every_task_gets_exactly_one_outcome() {
    let (_client, pipeline) = build_pipeline(edit_endpoint(&[]), 2);
    let mut stream = pipeline.run(tasks(4), src(), dst(), priorities());
    assert_eq!(stream.total(), 4);

    let mut seen = HashSet::new();
    while let Some(outcome) = stream.next_outcome().await {
        assert!(seen.insert(outcome.task_id), "duplicate outcome");
        assert_eq!(outcome.new_task_id(), Some(outcome.task_id + 1000));
    }
    assert_eq!(seen, HashSet::from([1, 2, 3, 4]));
}

#[tokio::test(start_paused = true)]
async fn failures_are_isolated_per_task() {
    let (client, pipeline) = build_pipeline(edit_endpoint(&["task 2"]), 2);
    let mut input = tasks(4);
    input[3].priority_value = 99;

    let outcomes: Vec<_> = pipeline
        .run(input, src(), dst(), priorities())
        .collect()
        .await;

    assert_eq!(outcomes.len(), 4);
    // The task with the unmapped priority never reaches the API.
    assert_eq!(client.transport().calls_to(MANIPHEST_EDIT), 3);

    for outcome in &outcomes {
        match outcome.task_id {
            1 | 3 => assert_eq!(outcome.result, Ok(outcome.task_id + 1000)),
            2 => assert!(matches!(
                outcome.result,
                Err(ReplicationError::Conduit(ConduitError::Api { .. }))
            )),
            4 => assert_eq!(
                outcome.result,
                Err(ReplicationError::Priority(PriorityError::Unknown { value: 99 }))
            ),
            other => panic!("unexpected task {other}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn empty_input_ends_immediately() {
    let (client, pipeline) = build_pipeline(edit_endpoint(&[]), 2);
    let mut stream = pipeline.run(Vec::new(), src(), dst(), priorities());

    assert_eq!(stream.total(), 0);
    assert!(stream.next_outcome().await.is_none());
    assert!(client.transport().requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_stream_does_not_cancel_edits() {
    let (client, pipeline) = build_pipeline(edit_endpoint(&[]), 2);
    drop(pipeline.run(tasks(5), src(), dst(), priorities()));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(client.transport().calls_to(MANIPHEST_EDIT), 5);
}

#[tokio::test(start_paused = true)]
async fn edit_response_without_phid_counts_as_created() {
    let transport =
        ScriptedTransport::new(|_| scripted::result(&json!({ "object": { "id": 55 } })));
    let (_client, pipeline) = build_pipeline(transport, 1);

    let outcomes: Vec<_> = pipeline
        .run(tasks(1), src(), dst(), priorities())
        .collect()
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result, Ok(55));
}
