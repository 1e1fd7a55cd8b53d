//! Integration tests for `SqliteStore` against in-memory and on-disk databases.

use verid_core::store::{KeyValueStore, USER_DATA_KEY, VERIFICATION_RESULT_KEY};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Single slots ────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_slot_returns_none() {
  let s = store().await;
  assert_eq!(s.get(USER_DATA_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn put_then_get() {
  let s = store().await;
  s.put(USER_DATA_KEY, r#"{"name":"Ana"}"#.into()).await.unwrap();
  assert_eq!(
    s.get(USER_DATA_KEY).await.unwrap().as_deref(),
    Some(r#"{"name":"Ana"}"#)
  );
}

#[tokio::test]
async fn put_overwrites() {
  let s = store().await;
  s.put(USER_DATA_KEY, "1".into()).await.unwrap();
  s.put(USER_DATA_KEY, "2".into()).await.unwrap();
  assert_eq!(s.get(USER_DATA_KEY).await.unwrap().as_deref(), Some("2"));
}

#[tokio::test]
async fn remove_is_idempotent() {
  let s = store().await;
  s.put(USER_DATA_KEY, "1".into()).await.unwrap();
  s.remove(USER_DATA_KEY).await.unwrap();
  s.remove(USER_DATA_KEY).await.unwrap();
  assert_eq!(s.get(USER_DATA_KEY).await.unwrap(), None);
}

// ─── Multiple slots ──────────────────────────────────────────────────────────

#[tokio::test]
async fn put_many_writes_every_entry() {
  let s = store().await;
  s.put_many(vec![
    (VERIFICATION_RESULT_KEY.into(), "raw".into()),
    (USER_DATA_KEY.into(), "record".into()),
  ])
  .await
  .unwrap();

  assert_eq!(s.get(VERIFICATION_RESULT_KEY).await.unwrap().as_deref(), Some("raw"));
  assert_eq!(s.get(USER_DATA_KEY).await.unwrap().as_deref(), Some("record"));
}

#[tokio::test]
async fn clear_removes_everything() {
  let s = store().await;
  s.put_many(vec![
    (VERIFICATION_RESULT_KEY.into(), "raw".into()),
    (USER_DATA_KEY.into(), "record".into()),
  ])
  .await
  .unwrap();
  s.clear().await.unwrap();

  assert_eq!(s.get(VERIFICATION_RESULT_KEY).await.unwrap(), None);
  assert_eq!(s.get(USER_DATA_KEY).await.unwrap(), None);
}

// ─── Durability ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn values_survive_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("verid.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.put(USER_DATA_KEY, "kept".into()).await.unwrap();
  }

  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.get(USER_DATA_KEY).await.unwrap().as_deref(), Some("kept"));
}

#[tokio::test]
async fn newer_schema_is_refused() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("future.db");

  {
    let conn = tokio_rusqlite::Connection::open(&path).await.unwrap();
    conn
      .call(|c| {
        c.execute_batch("PRAGMA user_version = 99;")?;
        Ok(())
      })
      .await
      .unwrap();
  }

  let err = SqliteStore::open(&path).await.err().unwrap();
  assert!(matches!(err, Error::SchemaVersion(99)), "{err}");
}
