//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use clipcount::exec::Database;
use clipcount::store::{create_schema, load_json};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const CREATOR_A: &str = "aca1061a9d324ecf8c3fa2bb32d7be63";
pub const CREATOR_B: &str = "0f5e2c7b9d1a4e3f8b6c2d4a1e7f9b3c";

#[path = "../../src/sql/test_utils.rs"]
mod sql_checks;

pub use sql_checks::validate_sql;

pub fn uuid(n: u32) -> String {
    format!("00000000-0000-4000-8000-{:012x}", n)
}

pub fn video(n: u32, creator: &str, published: &str, views: i64, snapshots: Vec<Value>) -> Value {
    json!({
        "id": uuid(n),
        "video_created_at": published,
        "views_count": views,
        "likes_count": views / 10,
        "comments_count": views / 100,
        "reports_count": 0,
        "creator_id": creator,
        "created_at": published,
        "updated_at": published,
        "snapshots": snapshots,
    })
}

pub fn snapshot(n: u32, video: u32, at: &str, views: i64, delta_views: i64) -> Value {
    json!({
        "id": uuid(1000 + n),
        "video_id": uuid(video),
        "views_count": views,
        "likes_count": 0,
        "comments_count": 0,
        "reports_count": 0,
        "delta_views_count": delta_views,
        "delta_likes_count": 0,
        "delta_comments_count": 0,
        "delta_reports_count": 0,
        "created_at": at,
        "updated_at": at,
    })
}

/// Five videos, two creators, snapshots on 2025-11-27 and 2025-11-28.
///
/// ```text
/// video  creator  published                  views    snapshots (at, delta_views)
/// 1      A        2025-11-01T10:00:00+00:00  150000   11-27 23:00 +500, 11-28 10:00 +1000
/// 2      A        2025-11-05T23:59:59+00:00  50000    11-28 00:00 +0, 11-28 23:59:59 +250
/// 3      A        2025-11-06T00:00:00+00:00  120000   11-29 00:00 +40
/// 4      B        2025-11-03T12:00:00+00:00  99999    11-28 12:00 +7
/// 5      B        2025-10-31T23:00:00+00:00  0        (none)
/// ```
pub fn dataset() -> Value {
    json!({
        "videos": [
            video(1, CREATOR_A, "2025-11-01T10:00:00+00:00", 150_000, vec![
                snapshot(1, 1, "2025-11-27T23:00:00+00:00", 149_000, 500),
                snapshot(2, 1, "2025-11-28T10:00:00+00:00", 150_000, 1000),
            ]),
            video(2, CREATOR_A, "2025-11-05T23:59:59+00:00", 50_000, vec![
                snapshot(3, 2, "2025-11-28T00:00:00+00:00", 49_750, 0),
                snapshot(4, 2, "2025-11-28T23:59:59+00:00", 50_000, 250),
            ]),
            video(3, CREATOR_A, "2025-11-06T00:00:00+00:00", 120_000, vec![
                snapshot(5, 3, "2025-11-29T00:00:00+00:00", 120_000, 40),
            ]),
            video(4, CREATOR_B, "2025-11-03T12:00:00+00:00", 99_999, vec![
                snapshot(6, 4, "2025-11-28T12:00:00+00:00", 99_999, 7),
            ]),
            video(5, CREATOR_B, "2025-10-31T23:00:00+00:00", 0, vec![]),
        ]
    })
}

/// A temporary store loaded with [`dataset`].
pub struct Fixture {
    pub dir: TempDir,
    pub database: Database,
}

impl Fixture {
    pub fn path(&self) -> PathBuf {
        self.database.path().to_path_buf()
    }
}

pub fn empty_store() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let database = Database::new(dir.path().join("clipcount.db"));
    let conn = database.open_writer().unwrap();
    create_schema(&conn).unwrap();
    Fixture { dir, database }
}

pub fn loaded_store() -> Fixture {
    let fixture = empty_store();
    let mut conn = fixture.database.open_writer().unwrap();
    let doc = dataset().to_string();
    load_json(&mut conn, doc.as_bytes(), 3).unwrap();
    fixture
}
