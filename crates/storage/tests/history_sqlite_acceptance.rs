use std::sync::Arc;

use shared::domain::{History, HistoryItem, ImageArtifact, Style, UserImage};
use storage::{HistoryStore, KeyValueStore, SqliteKeyValueStore, HISTORY_STORAGE_KEY};

fn item(timestamp: i64, caption: &str) -> HistoryItem {
    HistoryItem {
        id: HistoryStore::make_id(timestamp),
        user_image: UserImage::from_bytes(Some("selfie.jpg".into()), "image/jpeg", b"jpeg"),
        generated_image: ImageArtifact::from_bytes("image/png", b"png"),
        generated_caption: caption.to_string(),
        style: Style {
            id: "watercolor".into(),
            label: "Watercolor".into(),
            image_prompt: "paint".into(),
            caption_prompt: "describe".into(),
        },
        timestamp,
    }
}

#[tokio::test]
async fn history_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!(
        "sqlite://{}",
        dir.path().join("history.db").to_string_lossy().replace('\\', "/")
    );

    let kv = SqliteKeyValueStore::new(&database_url).await.expect("db");
    let store = HistoryStore::new(Arc::new(kv.clone()));
    let history = store
        .append(&History::new(), item(1, "first"))
        .await
        .expect("append first");
    let history = store
        .append(&history, item(2, "second"))
        .await
        .expect("append second");
    kv.pool().close().await;

    let reopened = SqliteKeyValueStore::new(&database_url).await.expect("reopen");
    let loaded = HistoryStore::new(Arc::new(reopened)).load().await;
    assert_eq!(loaded, history);
    assert_eq!(loaded.get(0).expect("newest").generated_caption, "second");
}

#[tokio::test]
async fn corrupt_sqlite_record_self_heals() {
    let kv = Arc::new(SqliteKeyValueStore::new("sqlite::memory:").await.expect("db"));
    kv.set(HISTORY_STORAGE_KEY, "[{\"broken\": true}]")
        .await
        .expect("seed garbage");

    let store = HistoryStore::new(kv.clone());
    assert!(store.load().await.is_empty());
    assert_eq!(kv.get(HISTORY_STORAGE_KEY).await.expect("get"), None);
}
