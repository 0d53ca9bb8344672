mod common;

use common::MemStore;
use reading_plan_bot::storage::progress::ProgressStore;
use std::collections::BTreeSet;
use std::sync::Arc;

const HEADER: &[&str] = &["user_id", "username", "current_day", "last_read_at", "group_ids"];

fn store_with_progress(rows: Vec<Vec<&str>>) -> Arc<MemStore> {
    let store = Arc::new(MemStore::new());
    let mut all = vec![HEADER.to_vec()];
    all.extend(rows);
    store.set_sheet("progress", all);
    store
}

fn progress_store(store: Arc<MemStore>) -> ProgressStore<MemStore> {
    ProgressStore::new(store, "progress", None)
}

#[tokio::test]
async fn test_get_returns_absent_for_unknown_user() {
    let store = progress_store(store_with_progress(vec![]));
    assert!(store.get("42").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_then_get_round_trips() {
    let mem = store_with_progress(vec![]);
    let store = progress_store(mem.clone());

    store
        .upsert("42", "alice", 3, Some("2025-12-03"), None)
        .await
        .unwrap();

    let record = store.get("42").await.unwrap().unwrap();
    assert_eq!(record.user_id, "42");
    assert_eq!(record.username, "alice");
    assert_eq!(record.current_day, 3);
    assert_eq!(record.last_read_at, "2025-12-03");
    assert!(record.linked_group_ids.is_empty());
}

#[tokio::test]
async fn test_upsert_overwrites_the_existing_row_in_place() {
    let mem = store_with_progress(vec![vec!["42", "alice", "3", "2025-12-03", ""]]);
    let store = progress_store(mem.clone());

    store
        .upsert("42", "alice", 4, Some("2025-12-04"), None)
        .await
        .unwrap();

    let record = store.get("42").await.unwrap().unwrap();
    assert_eq!(record.current_day, 4);
    // One header + one data row; no duplicate appended.
    assert_eq!(mem.sheet("progress").len(), 2);
}

#[tokio::test]
async fn test_omitted_group_ids_preserve_the_existing_set() {
    let mem = store_with_progress(vec![vec![
        "42",
        "alice",
        "3",
        "2025-12-03",
        "-1001,-1002",
    ]]);
    let store = progress_store(mem);

    store
        .upsert("42", "alice", 4, Some("2025-12-04"), None)
        .await
        .unwrap();

    let record = store.get("42").await.unwrap().unwrap();
    assert_eq!(record.current_day, 4);
    assert!(record.linked_group_ids.contains("-1001"));
    assert!(record.linked_group_ids.contains("-1002"));
}

#[tokio::test]
async fn test_explicit_group_ids_replace_the_set() {
    let mem = store_with_progress(vec![vec!["42", "alice", "3", "", "-1001"]]);
    let store = progress_store(mem);

    let groups: BTreeSet<String> = ["-2002".to_string()].into_iter().collect();
    store
        .upsert("42", "alice", 3, Some(""), Some(&groups))
        .await
        .unwrap();

    let record = store.get("42").await.unwrap().unwrap();
    assert_eq!(record.linked_group_ids, groups);
}

#[tokio::test]
async fn test_first_matching_row_wins() {
    let mem = store_with_progress(vec![
        vec!["42", "alice", "3", "", ""],
        vec!["42", "impostor", "9", "", ""],
    ]);
    let store = progress_store(mem);

    let record = store.get("42").await.unwrap().unwrap();
    assert_eq!(record.username, "alice");
    assert_eq!(record.current_day, 3);
}

#[tokio::test]
async fn test_link_group_unions_into_existing_record() {
    let mem = store_with_progress(vec![vec!["42", "alice", "3", "2025-12-03", "-1001"]]);
    let store = progress_store(mem);

    assert!(store.link_group("42", "-2002").await.unwrap());

    let record = store.get("42").await.unwrap().unwrap();
    assert!(record.linked_group_ids.contains("-1001"));
    assert!(record.linked_group_ids.contains("-2002"));
    // Nothing else moved.
    assert_eq!(record.current_day, 3);
    assert_eq!(record.last_read_at, "2025-12-03");
}

#[tokio::test]
async fn test_link_group_is_idempotent() {
    let mem = store_with_progress(vec![vec!["42", "alice", "3", "", "-1001"]]);
    let store = progress_store(mem);

    assert!(!store.link_group("42", "-1001").await.unwrap());
}

#[tokio::test]
async fn test_link_group_never_creates_records() {
    let mem = store_with_progress(vec![]);
    let store = progress_store(mem.clone());

    assert!(!store.link_group("42", "-1001").await.unwrap());
    assert!(store.get("42").await.unwrap().is_none());
    assert_eq!(mem.sheet("progress").len(), 1);
}

#[tokio::test]
async fn test_omitted_last_read_defaults_to_today() {
    let mem = store_with_progress(vec![]);
    let store = progress_store(mem);

    store.upsert("42", "alice", 2, None, None).await.unwrap();

    let record = store.get("42").await.unwrap().unwrap();
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(record.last_read_at, today);
}
