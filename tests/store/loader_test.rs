//! Integration tests for schema creation and bulk loading.

#[path = "../common/mod.rs"]
mod common;

use std::io::Write;

use clipcount::store::{load_file, load_json, LoadStats, StoreError};
use common::{dataset, empty_store, snapshot, uuid, video, CREATOR_A};
use rusqlite::Connection;
use serde_json::json;

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_load_reports_counts_and_batches() {
    let fixture = empty_store();
    let mut conn = fixture.database.open_writer().unwrap();

    let stats = load_json(&mut conn, dataset().to_string().as_bytes(), 3).unwrap();

    assert_eq!(
        stats,
        LoadStats {
            videos: 5,
            snapshots: 6,
            batches: 4
        }
    );
    assert_eq!(count(&conn, "videos"), 5);
    assert_eq!(count(&conn, "video_snapshots"), 6);
}

#[test]
fn test_single_batch_when_size_is_large() {
    let fixture = empty_store();
    let mut conn = fixture.database.open_writer().unwrap();

    let stats = load_json(&mut conn, dataset().to_string().as_bytes(), 500).unwrap();
    assert_eq!(stats.batches, 1);
}

#[test]
fn test_timestamps_stored_canonically() {
    let fixture = empty_store();
    let mut conn = fixture.database.open_writer().unwrap();
    let doc = json!({
        "videos": [video(1, CREATOR_A, "2025-11-01T03:00:00+03:00", 10, vec![
            snapshot(1, 1, "2025-11-28T10:00:00.5Z", 10, 1),
        ])]
    });

    load_json(&mut conn, doc.to_string().as_bytes(), 10).unwrap();

    let published: String = conn
        .query_row(
            "SELECT video_created_at FROM videos WHERE id = ?1",
            [uuid(1)],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(published, "2025-11-01T00:00:00.000000Z");

    let taken: String = conn
        .query_row("SELECT created_at FROM video_snapshots", [], |row| row.get(0))
        .unwrap();
    assert_eq!(taken, "2025-11-28T10:00:00.500000Z");
}

#[test]
fn test_reload_updates_in_place() {
    let fixture = empty_store();
    let mut conn = fixture.database.open_writer().unwrap();

    load_json(&mut conn, dataset().to_string().as_bytes(), 3).unwrap();

    let updated = json!({
        "videos": [video(1, CREATOR_A, "2025-11-01T10:00:00+00:00", 200_000, vec![
            snapshot(2, 1, "2025-11-28T10:00:00+00:00", 200_000, 51_000),
        ])]
    });
    load_json(&mut conn, updated.to_string().as_bytes(), 3).unwrap();

    assert_eq!(count(&conn, "videos"), 5);
    assert_eq!(count(&conn, "video_snapshots"), 6);

    let views: i64 = conn
        .query_row("SELECT views_count FROM videos WHERE id = ?1", [uuid(1)], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(views, 200_000);

    let delta: i64 = conn
        .query_row(
            "SELECT delta_views_count FROM video_snapshots WHERE id = ?1",
            [uuid(1002)],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(delta, 51_000);
}

#[test]
fn test_failed_batch_rolls_back_alone() {
    let fixture = empty_store();
    let mut conn = fixture.database.open_writer().unwrap();
    let doc = json!({
        "videos": [
            video(1, CREATOR_A, "2025-11-01T10:00:00+00:00", 1, vec![]),
            video(2, CREATOR_A, "2025-11-02T10:00:00+00:00", 1, vec![
                // references a video that does not exist
                snapshot(1, 99, "2025-11-28T10:00:00+00:00", 1, 1),
            ]),
        ]
    });

    let err = load_json(&mut conn, doc.to_string().as_bytes(), 1).unwrap_err();
    assert!(matches!(err, StoreError::Sqlite(_)), "{:?}", err);

    assert_eq!(count(&conn, "videos"), 1);
    assert_eq!(count(&conn, "video_snapshots"), 0);
}

#[test]
fn test_empty_videos_is_noop() {
    let fixture = empty_store();
    let mut conn = fixture.database.open_writer().unwrap();

    let stats = load_json(&mut conn, r#"{"videos": []}"#.as_bytes(), 10).unwrap();
    assert_eq!(stats, LoadStats::default());
    assert_eq!(count(&conn, "videos"), 0);
}

#[test]
fn test_missing_field_is_json_error() {
    let fixture = empty_store();
    let mut conn = fixture.database.open_writer().unwrap();
    let doc = r#"{"videos": [{"id": "00000000-0000-4000-8000-000000000001"}]}"#;

    let err = load_json(&mut conn, doc.as_bytes(), 10).unwrap_err();
    assert!(matches!(err, StoreError::Json(_)));
    assert_eq!(count(&conn, "videos"), 0);
}

#[test]
fn test_load_file() {
    let fixture = empty_store();
    let path = fixture.dir.path().join("videos.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(dataset().to_string().as_bytes()).unwrap();
    drop(file);

    let mut conn = fixture.database.open_writer().unwrap();
    let stats = load_file(&mut conn, &path, 500).unwrap();
    assert_eq!(stats.videos, 5);

    let err = load_file(&mut conn, fixture.dir.path().join("absent.json"), 500).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}
