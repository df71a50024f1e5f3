use crate::config::DatabaseConfig;
use crate::database::SnapshotStore;
use serde_json::json;
use tempfile::tempdir;

async fn memory_store() -> SnapshotStore {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    SnapshotStore::connect(&config).await.unwrap()
}

#[tokio::test]
async fn test_insert_and_latest() {
    let store = memory_store().await;

    store
        .insert("rig-1", "summary", &json!({"uptime": 100}))
        .await
        .unwrap();
    store
        .insert("rig-1", "summary", &json!({"uptime": 200}))
        .await
        .unwrap();

    let latest = store.latest("rig-1", "summary").await.unwrap().unwrap();
    assert_eq!(latest.miner, "rig-1");
    assert_eq!(latest.endpoint, "summary");
    assert_eq!(latest.payload["uptime"], 200);
}

#[tokio::test]
async fn test_latest_is_scoped_by_miner_and_endpoint() {
    let store = memory_store().await;

    store
        .insert("rig-1", "summary", &json!({"who": "rig-1"}))
        .await
        .unwrap();
    store
        .insert("rig-2", "summary", &json!({"who": "rig-2"}))
        .await
        .unwrap();
    store
        .insert("rig-1", "config", &json!({"donate-level": 1}))
        .await
        .unwrap();

    let latest = store.latest("rig-1", "summary").await.unwrap().unwrap();
    assert_eq!(latest.payload["who"], "rig-1");
    assert!(store.latest("rig-2", "config").await.unwrap().is_none());
    assert!(store.latest("ghost", "summary").await.unwrap().is_none());
}

#[tokio::test]
async fn test_history_is_newest_first_and_limited() {
    let store = memory_store().await;

    for i in 0..5 {
        store
            .insert("rig-1", "summary", &json!({"seq": i}))
            .await
            .unwrap();
    }

    let history = store.history("rig-1", "summary", 3).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].payload["seq"], 4);
    assert_eq!(history[1].payload["seq"], 3);
    assert_eq!(history[2].payload["seq"], 2);
}

#[tokio::test]
async fn test_purge_miner() {
    let store = memory_store().await;

    store
        .insert("rig-1", "summary", &json!({"a": 1}))
        .await
        .unwrap();
    store
        .insert("rig-1", "config", &json!({"b": 2}))
        .await
        .unwrap();
    store
        .insert("rig-2", "summary", &json!({"c": 3}))
        .await
        .unwrap();

    let deleted = store.purge_miner("rig-1").await.unwrap();
    assert_eq!(deleted, 2);
    assert!(store.latest("rig-1", "summary").await.unwrap().is_none());
    assert!(store.latest("rig-2", "summary").await.unwrap().is_some());

    // purging an unknown miner is a no-op
    assert_eq!(store.purge_miner("ghost").await.unwrap(), 0);
}

#[tokio::test]
async fn test_stats_counts_rows_and_miners() {
    let store = memory_store().await;

    store
        .insert("rig-1", "summary", &json!({}))
        .await
        .unwrap();
    store
        .insert("rig-1", "config", &json!({}))
        .await
        .unwrap();
    store
        .insert("rig-2", "summary", &json!({}))
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.snapshot_count, 3);
    assert_eq!(stats.miner_count, 2);
}

#[tokio::test]
async fn test_health_check() {
    let store = memory_store().await;
    store.health_check().await.unwrap();
}

#[tokio::test]
async fn test_file_backed_store_survives_reconnect() {
    let dir = tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("snapshots.db").display());
    let config = DatabaseConfig {
        url,
        max_connections: 1,
    };

    {
        let store = SnapshotStore::connect(&config).await.unwrap();
        store
            .insert("rig-1", "summary", &json!({"uptime": 42}))
            .await
            .unwrap();
    }

    let store = SnapshotStore::connect(&config).await.unwrap();
    let latest = store.latest("rig-1", "summary").await.unwrap().unwrap();
    assert_eq!(latest.payload["uptime"], 42);
}
