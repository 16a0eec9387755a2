use jsonshelf_core::projection::{self, discover_columns, filter, preview};
use jsonshelf_core::{IngestError, IngestionPipeline, RecordSync, RecordView, SyncPhase};
use jsonshelf_protocol::{OwnerId, RecordId};
use jsonshelf_store::MemoryDocumentStore;
use jsonshelf_test_utils::{ScriptedStore, record};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const COLLECTION: &str = "records";

async fn wait_for(
    rx: &mut watch::Receiver<Arc<RecordView>>,
    predicate: impl FnMut(&Arc<RecordView>) -> bool,
) -> Arc<RecordView> {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("view in time")
        .expect("view channel open")
        .clone()
}

#[tokio::test]
async fn object_ingest_creates_one_equal_record() {
    let store = Arc::new(MemoryDocumentStore::new());
    let sync = RecordSync::new(store.clone(), COLLECTION);
    let pipeline = IngestionPipeline::new(store, COLLECTION);
    let owner = OwnerId::new("u1");
    let mut rx = sync.watch();
    sync.start(owner.clone()).await.expect("start");
    wait_for(&mut rx, |view| view.phase == SyncPhase::Live).await;

    let payload = json!({ "name": "Computer Science", "credits": 120, "tags": ["a", "b"] });
    let report = pipeline
        .ingest(&payload.to_string(), &owner)
        .await
        .expect("ingest");
    assert_eq!(report.attempted, 1);

    let view = wait_for(&mut rx, |view| view.records.len() == 1).await;
    assert_eq!(view.records[0].payload, payload);
    assert_eq!(view.records[0].id, report.inserted[0]);
    assert_eq!(view.records[0].owner_id, owner);
}

#[tokio::test]
async fn array_ingest_creates_one_record_per_element() {
    let store = Arc::new(MemoryDocumentStore::new());
    let sync = RecordSync::new(store.clone(), COLLECTION);
    let pipeline = IngestionPipeline::new(store, COLLECTION);
    let owner = OwnerId::new("u1");
    let mut rx = sync.watch();
    sync.start(owner.clone()).await.expect("start");

    let report = pipeline
        .ingest(r#"[{"n": 1}, {"n": 2}, 3, "four"]"#, &owner)
        .await
        .expect("ingest");
    assert_eq!(report.succeeded(), 4);

    let view = wait_for(&mut rx, |view| view.records.len() == 4).await;
    let mut payloads: Vec<String> = view
        .records
        .iter()
        .map(|record| record.payload.to_string())
        .collect();
    payloads.sort();
    assert_eq!(payloads, vec!["\"four\"", "3", "{\"n\":1}", "{\"n\":2}"]);
}

#[tokio::test]
async fn rejected_input_never_reaches_the_store() {
    let store = Arc::new(ScriptedStore::new());
    let pipeline = IngestionPipeline::new(store.clone(), COLLECTION);
    let owner = OwnerId::new("u1");

    let err = pipeline.ingest("[]", &owner).await.unwrap_err();
    assert!(matches!(err, IngestError::EmptyBatch));
    let err = pipeline.ingest("{not json", &owner).await.unwrap_err();
    assert!(matches!(err, IngestError::MalformedInput(_)));
    let err = pipeline.ingest("   ", &owner).await.unwrap_err();
    assert!(matches!(err, IngestError::EmptyInput));

    assert!(store.inserted().is_empty());
}

#[tokio::test]
async fn delete_shows_up_only_with_next_snapshot() {
    let store = Arc::new(ScriptedStore::new());
    let sync = RecordSync::new(store.clone(), COLLECTION);
    let mut rx = sync.watch();
    sync.start(OwnerId::new("u1")).await.expect("start");

    store.push_snapshot(vec![
        record("r2", "u1", json!({ "n": 2 })),
        record("r1", "u1", json!({ "n": 1 })),
    ]);
    let before = wait_for(&mut rx, |view| view.records.len() == 2).await;

    sync.delete(&RecordId::new("r1")).await.expect("delete");
    assert_eq!(store.deleted(), vec![RecordId::new("r1")]);
    let unchanged = sync.view();
    assert_eq!(unchanged.version, before.version);
    assert_eq!(unchanged.records.len(), 2);

    store.push_snapshot(vec![record("r2", "u1", json!({ "n": 2 }))]);
    let after = wait_for(&mut rx, |view| view.records.len() == 1).await;
    assert_eq!(after.records[0].id, RecordId::new("r2"));
}

#[test]
fn columns_are_discovered_in_first_seen_order() {
    let records = vec![
        record("a", "u1", json!({ "a": 1, "b": 2 })),
        record("b", "u1", json!({ "b": 3, "c": 4 })),
        record("c", "u1", json!("scalar")),
    ];
    assert_eq!(discover_columns(&records), vec!["a", "b", "c"]);
}

#[test]
fn preview_with_huge_limit_is_full_pretty_json() {
    let payload = json!({ "name": "Data Science", "nested": { "list": [1, 2, 3] } });
    assert_eq!(
        preview(&payload, 1_000_000),
        serde_json::to_string_pretty(&payload).expect("pretty")
    );
}

#[tokio::test]
async fn owner_scenario_filters_then_stops() {
    let store = Arc::new(ScriptedStore::new());
    let sync = RecordSync::new(store.clone(), COLLECTION);
    let mut rx = sync.watch();
    sync.start(OwnerId::new("u1")).await.expect("start");
    assert_eq!(store.queries()[0].owner_id, OwnerId::new("u1"));

    store.push_snapshot(vec![
        record("r2", "u1", json!({ "course": "Business Administration" })),
        record("r1", "u1", json!({ "course": "Data Science" })),
    ]);
    let view = wait_for(&mut rx, |view| view.records.len() == 2).await;

    let visible = filter(&view.records, "science");
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, RecordId::new("r1"));
    let table = projection::table(&view.records, "science");
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.columns, vec!["course"]);

    sync.stop();
    let stopped = sync.view();
    assert_eq!(stopped.phase, SyncPhase::Idle);

    store.push_snapshot(vec![record("r3", "u1", json!({ "late": true }))]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let after = sync.view();
    assert_eq!(after.version, stopped.version);
    assert!(after.records.is_empty());
}
