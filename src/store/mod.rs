//! SQLite analytics store: schema creation and bulk loading.
//!
//! # Design
//!
//! - Two tables, `videos` and `video_snapshots`, matching the schema registry
//! - Timestamps stored as canonical UTC text (see [`crate::schema::format_timestamp`])
//! - Loading is idempotent per id: re-loading a row updates it in place
//!
//! # Input format
//!
//! ```text
//! {"videos": [ {id, video_created_at, counters…, creator_id, created_at, updated_at,
//!               "snapshots": [ {id, video_id, counters…, deltas…, created_at, updated_at} ]} ]}
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{de, Deserialize, Deserializer};
use uuid::Uuid;

use crate::schema::{format_timestamp, parse_iso_instant};

/// Rows written per transaction unless the caller says otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Create both tables and their indexes if they do not exist yet.
pub fn create_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS videos (
            id TEXT PRIMARY KEY,
            video_created_at TEXT NOT NULL,
            views_count INTEGER NOT NULL,
            likes_count INTEGER NOT NULL,
            comments_count INTEGER NOT NULL,
            reports_count INTEGER NOT NULL,
            creator_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS video_snapshots (
            id TEXT PRIMARY KEY,
            video_id TEXT NOT NULL REFERENCES videos (id),
            views_count INTEGER NOT NULL,
            likes_count INTEGER NOT NULL,
            comments_count INTEGER NOT NULL,
            reports_count INTEGER NOT NULL,
            delta_views_count INTEGER NOT NULL,
            delta_likes_count INTEGER NOT NULL,
            delta_comments_count INTEGER NOT NULL,
            delta_reports_count INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_videos_creator_id ON videos (creator_id);
        CREATE INDEX IF NOT EXISTS idx_videos_video_created_at ON videos (video_created_at);
        CREATE INDEX IF NOT EXISTS idx_video_snapshots_video_id ON video_snapshots (video_id);
        CREATE INDEX IF NOT EXISTS idx_video_snapshots_created_at ON video_snapshots (created_at);
        ",
    )?;
    Ok(())
}

// ============================================================================
// Input records
// ============================================================================

#[derive(Debug, Deserialize)]
struct Dataset {
    #[serde(default)]
    videos: Vec<VideoRecord>,
}

#[derive(Debug, Deserialize)]
struct VideoRecord {
    id: Uuid,
    #[serde(deserialize_with = "instant")]
    video_created_at: DateTime<Utc>,
    views_count: i64,
    likes_count: i64,
    comments_count: i64,
    reports_count: i64,
    creator_id: String,
    #[serde(deserialize_with = "instant")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "instant")]
    updated_at: DateTime<Utc>,
    #[serde(default)]
    snapshots: Vec<SnapshotRecord>,
}

#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    id: Uuid,
    video_id: Uuid,
    views_count: i64,
    likes_count: i64,
    comments_count: i64,
    reports_count: i64,
    delta_views_count: i64,
    delta_likes_count: i64,
    delta_comments_count: i64,
    delta_reports_count: i64,
    #[serde(deserialize_with = "instant")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "instant")]
    updated_at: DateTime<Utc>,
}

fn instant<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_iso_instant(&s).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s)))
}

enum Row<'a> {
    Video(&'a VideoRecord),
    Snapshot(&'a SnapshotRecord),
}

// ============================================================================
// Loading
// ============================================================================

/// Counts reported by a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub videos: usize,
    pub snapshots: usize,
    pub batches: usize,
}

/// Load a dataset file. See [`load_json`].
pub fn load_file<P: AsRef<Path>>(
    conn: &mut Connection,
    path: P,
    batch_size: usize,
) -> StoreResult<LoadStats> {
    let file = File::open(path.as_ref())?;
    load_json(conn, BufReader::new(file), batch_size)
}

/// Load videos and their snapshots, committing every `batch_size` rows.
///
/// A video is always written before its snapshots.
pub fn load_json<R: Read>(
    conn: &mut Connection,
    reader: R,
    batch_size: usize,
) -> StoreResult<LoadStats> {
    let dataset: Dataset = serde_json::from_reader(reader)?;
    let mut stats = LoadStats::default();

    if dataset.videos.is_empty() {
        tracing::warn!("dataset has no videos, nothing to load");
        return Ok(stats);
    }

    let batch_size = batch_size.max(1);
    let mut pending: Vec<Row<'_>> = Vec::with_capacity(batch_size);

    for video in &dataset.videos {
        pending.push(Row::Video(video));
        stats.videos += 1;

        for snapshot in &video.snapshots {
            pending.push(Row::Snapshot(snapshot));
            stats.snapshots += 1;
        }

        if pending.len() >= batch_size {
            write_batch(conn, &pending)?;
            pending.clear();
            stats.batches += 1;
            tracing::info!(videos = stats.videos, snapshots = stats.snapshots, "batch committed");
        }
    }

    if !pending.is_empty() {
        write_batch(conn, &pending)?;
        stats.batches += 1;
    }

    tracing::info!(
        videos = stats.videos,
        snapshots = stats.snapshots,
        batches = stats.batches,
        "load finished"
    );
    Ok(stats)
}

fn write_batch(conn: &mut Connection, rows: &[Row<'_>]) -> StoreResult<()> {
    let tx = conn.transaction()?;
    {
        let mut insert_video = tx.prepare_cached(
            "INSERT INTO videos (id, video_created_at, views_count, likes_count, comments_count,
                                 reports_count, creator_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (id) DO UPDATE SET
                video_created_at = excluded.video_created_at,
                views_count = excluded.views_count,
                likes_count = excluded.likes_count,
                comments_count = excluded.comments_count,
                reports_count = excluded.reports_count,
                creator_id = excluded.creator_id,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
        )?;
        let mut insert_snapshot = tx.prepare_cached(
            "INSERT INTO video_snapshots (id, video_id, views_count, likes_count, comments_count,
                                          reports_count, delta_views_count, delta_likes_count,
                                          delta_comments_count, delta_reports_count,
                                          created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (id) DO UPDATE SET
                video_id = excluded.video_id,
                views_count = excluded.views_count,
                likes_count = excluded.likes_count,
                comments_count = excluded.comments_count,
                reports_count = excluded.reports_count,
                delta_views_count = excluded.delta_views_count,
                delta_likes_count = excluded.delta_likes_count,
                delta_comments_count = excluded.delta_comments_count,
                delta_reports_count = excluded.delta_reports_count,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
        )?;

        for row in rows {
            match row {
                Row::Video(v) => {
                    insert_video.execute(params![
                        v.id.to_string(),
                        format_timestamp(&v.video_created_at),
                        v.views_count,
                        v.likes_count,
                        v.comments_count,
                        v.reports_count,
                        v.creator_id,
                        format_timestamp(&v.created_at),
                        format_timestamp(&v.updated_at),
                    ])?;
                }
                Row::Snapshot(s) => {
                    insert_snapshot.execute(params![
                        s.id.to_string(),
                        s.video_id.to_string(),
                        s.views_count,
                        s.likes_count,
                        s.comments_count,
                        s.reports_count,
                        s.delta_views_count,
                        s.delta_likes_count,
                        s.delta_comments_count,
                        s.delta_reports_count,
                        format_timestamp(&s.created_at),
                        format_timestamp(&s.updated_at),
                    ])?;
                }
            }
        }
    }
    tx.commit()?;
    Ok(())
}
