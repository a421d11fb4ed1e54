//! Schema registry for the video-metrics store.
//!
//! The registry is the closed vocabulary the compiler validates against:
//!
//! ```text
//! videos           one row per video, cumulative counters
//! video_snapshots  one row per hourly observation, counters + deltas
//! ```
//!
//! It is built once, never mutated, and shared by reference
//! ([`SchemaRegistry::global`]).

mod timestamp;

pub use timestamp::{format_timestamp, parse_iso_date, parse_iso_instant, TIMESTAMP_FORMAT};

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Physical tables of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Videos,
    VideoSnapshots,
}

impl Table {
    pub const ALL: [Table; 2] = [Table::Videos, Table::VideoSnapshots];

    /// SQL name of the table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Videos => "videos",
            Table::VideoSnapshots => "video_snapshots",
        }
    }

    /// Parse a table name as it appears in a specification document.
    pub fn from_name(name: &str) -> Option<Self> {
        Table::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const VIDEOS_COLUMNS: &[&str] = &[
    "id",
    "video_created_at",
    "views_count",
    "likes_count",
    "comments_count",
    "reports_count",
    "creator_id",
    "created_at",
    "updated_at",
];

const SNAPSHOTS_COLUMNS: &[&str] = &[
    "id",
    "video_id",
    "views_count",
    "likes_count",
    "comments_count",
    "reports_count",
    "delta_views_count",
    "delta_likes_count",
    "delta_comments_count",
    "delta_reports_count",
    "created_at",
    "updated_at",
];

const VIDEOS_AGGREGABLE: &[&str] = &[
    "id",
    "views_count",
    "likes_count",
    "comments_count",
    "reports_count",
];

const SNAPSHOTS_AGGREGABLE: &[&str] = &[
    "id",
    "video_id",
    "views_count",
    "likes_count",
    "comments_count",
    "reports_count",
    "delta_views_count",
    "delta_likes_count",
    "delta_comments_count",
    "delta_reports_count",
];

const FILTERABLE: &[&str] = &[
    "creator_id",
    "video_created_at",
    "views_count",
    "created_at",
    "delta_views_count",
];

const TEMPORAL: &[&str] = &["video_created_at", "created_at"];

/// Allow-lists consulted by the compiler.
///
/// Every identifier the compiler interpolates into SQL text is one of the
/// `&'static str` entries held here.
#[derive(Debug)]
pub struct SchemaRegistry {
    videos_columns: &'static [&'static str],
    snapshots_columns: &'static [&'static str],
    videos_aggregable: &'static [&'static str],
    snapshots_aggregable: &'static [&'static str],
    filterable: &'static [&'static str],
    temporal: &'static [&'static str],
}

static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(|| SchemaRegistry {
    videos_columns: VIDEOS_COLUMNS,
    snapshots_columns: SNAPSHOTS_COLUMNS,
    videos_aggregable: VIDEOS_AGGREGABLE,
    snapshots_aggregable: SNAPSHOTS_AGGREGABLE,
    filterable: FILTERABLE,
    temporal: TEMPORAL,
});

impl SchemaRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static SchemaRegistry {
        &REGISTRY
    }

    /// Columns that may be aggregated in `table`.
    pub fn aggregable_fields(&self, table: Table) -> &'static [&'static str] {
        match table {
            Table::Videos => self.videos_aggregable,
            Table::VideoSnapshots => self.snapshots_aggregable,
        }
    }

    /// Columns that may appear in a filter, regardless of table.
    pub fn filterable_columns(&self) -> &'static [&'static str] {
        self.filterable
    }

    /// Filterable columns that hold timestamps (eligible for `date_eq`).
    pub fn temporal_columns(&self) -> &'static [&'static str] {
        self.temporal
    }

    /// Every physical column of `table`.
    pub fn table_columns(&self, table: Table) -> &'static [&'static str] {
        match table {
            Table::Videos => self.videos_columns,
            Table::VideoSnapshots => self.snapshots_columns,
        }
    }

    /// Registry entry equal to `field` if it is aggregable in `table`.
    pub fn aggregable(&self, table: Table, field: &str) -> Option<&'static str> {
        lookup(self.aggregable_fields(table), field)
    }

    /// Registry entry equal to `column` if it is globally filterable.
    pub fn filterable(&self, column: &str) -> Option<&'static str> {
        lookup(self.filterable, column)
    }

    pub fn is_temporal(&self, column: &str) -> bool {
        lookup(self.temporal, column).is_some()
    }

    pub fn has_column(&self, table: Table, column: &str) -> bool {
        lookup(self.table_columns(table), column).is_some()
    }
}

fn lookup(set: &'static [&'static str], name: &str) -> Option<&'static str> {
    set.iter().copied().find(|entry| *entry == name)
}
