//! Integration tests for Specification → SQL compilation.

#[path = "../common/mod.rs"]
mod common;

use chrono::{TimeZone, Utc};
use clipcount::compile::{compile, compile_with, ColumnScope, CompileOptions, SpecError};
use clipcount::schema::{SchemaRegistry, Table};
use clipcount::spec::{Aggregation, Condition, ConditionOp, ConditionValue, Specification};
use clipcount::sql::ParamValue;
use common::validate_sql;
use insta::assert_snapshot;

fn ts(y: i32, m: u32, d: u32) -> ParamValue {
    ParamValue::Timestamp(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
}

// ============================================================================
// Emitted SQL
// ============================================================================

#[test]
fn test_count_rows_without_filters() {
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id");
    let compiled = compile(&spec).unwrap();

    assert_snapshot!(compiled.sql, @"SELECT COUNT(*) AS value FROM videos;");
    assert!(compiled.params.is_empty());
    validate_sql(&compiled.sql).unwrap();
}

#[test]
fn test_creator_and_publication_window() {
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id")
        .filter(Condition::eq("creator_id", "abc"))
        .filter(Condition::between_datetime(
            "video_created_at",
            "2025-11-01T00:00:00+00:00",
            "2025-11-06T00:00:00+00:00",
        ));
    let compiled = compile(&spec).unwrap();

    assert_snapshot!(
        compiled.sql,
        @"SELECT COUNT(*) AS value FROM videos WHERE creator_id = :p0 AND video_created_at >= :p1 AND video_created_at < :p2;"
    );
    assert_eq!(compiled.params.len(), 3);
    assert_eq!(compiled.params["p0"], ParamValue::Text("abc".into()));
    assert_eq!(compiled.params["p1"], ts(2025, 11, 1));
    assert_eq!(compiled.params["p2"], ts(2025, 11, 6));
    validate_sql(&compiled.sql).unwrap();
}

#[test]
fn test_sum_over_one_day() {
    let spec = Specification::new(Table::VideoSnapshots, Aggregation::SumField, "delta_views_count")
        .filter(Condition::date_eq("created_at", "2025-11-28"));
    let compiled = compile(&spec).unwrap();

    assert_snapshot!(
        compiled.sql,
        @"SELECT COALESCE(SUM(delta_views_count), 0) AS value FROM video_snapshots WHERE created_at >= :p0 AND created_at < :p1;"
    );
    assert_eq!(compiled.params["p0"], ts(2025, 11, 28));
    assert_eq!(compiled.params["p1"], ts(2025, 11, 29));
    validate_sql(&compiled.sql).unwrap();
}

#[test]
fn test_count_distinct_with_two_clauses() {
    let spec = Specification::new(Table::VideoSnapshots, Aggregation::CountDistinct, "video_id")
        .filter(Condition::date_eq("created_at", "2025-11-27"))
        .filter(Condition::gt("delta_views_count", 0));
    let compiled = compile(&spec).unwrap();

    assert_snapshot!(
        compiled.sql,
        @"SELECT COUNT(DISTINCT video_id) AS value FROM video_snapshots WHERE created_at >= :p0 AND created_at < :p1 AND delta_views_count > :p2;"
    );
    assert_eq!(compiled.params["p0"], ts(2025, 11, 27));
    assert_eq!(compiled.params["p1"], ts(2025, 11, 28));
    assert_eq!(compiled.params["p2"], ParamValue::Int(0));
    validate_sql(&compiled.sql).unwrap();
}

#[test]
fn test_month_end_date_rolls_over() {
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id")
        .filter(Condition::date_eq("video_created_at", "2025-12-31"));
    let compiled = compile(&spec).unwrap();

    assert_eq!(compiled.params["p0"], ts(2025, 12, 31));
    assert_eq!(compiled.params["p1"], ts(2026, 1, 1));
}

#[test]
fn test_between_normalizes_offsets_to_utc() {
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id").filter(
        Condition::between_datetime(
            "video_created_at",
            "2025-11-01T03:00:00+03:00",
            "2025-11-02T00:00:00Z",
        ),
    );
    let compiled = compile(&spec).unwrap();

    assert_eq!(compiled.params["p0"], ts(2025, 11, 1));
    assert_eq!(compiled.params["p1"], ts(2025, 11, 2));
}

#[test]
fn test_values_never_reach_sql_text() {
    let hostile = "x' OR '1'='1";
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id")
        .filter(Condition::eq("creator_id", hostile));
    let compiled = compile(&spec).unwrap();

    assert!(!compiled.sql.contains(hostile));
    assert_eq!(compiled.params["p0"], ParamValue::Text(hostile.into()));
}

#[test]
fn test_eq_and_gt_bind_verbatim_and_ignore_value2() {
    let spec = Specification::new(Table::Videos, Aggregation::SumField, "views_count")
        .filter(Condition::gt("views_count", 100_000).with_value2(5))
        .filter(Condition::eq("video_created_at", "2025-11-01"));
    let compiled = compile(&spec).unwrap();

    assert_snapshot!(
        compiled.sql,
        @"SELECT COALESCE(SUM(views_count), 0) AS value FROM videos WHERE views_count > :p0 AND video_created_at = :p1;"
    );
    assert_eq!(compiled.params.len(), 2);
    assert_eq!(compiled.params["p0"], ParamValue::Int(100_000));
    assert_eq!(compiled.params["p1"], ParamValue::Text("2025-11-01".into()));
}

#[test]
fn test_count_rows_ignores_field_in_expression() {
    let spec = Specification::new(Table::VideoSnapshots, Aggregation::CountRows, "video_id");
    let compiled = compile(&spec).unwrap();
    assert_eq!(compiled.sql, "SELECT COUNT(*) AS value FROM video_snapshots;");
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_compilation_is_deterministic() {
    let spec = Specification::new(Table::VideoSnapshots, Aggregation::CountDistinct, "video_id")
        .filter(Condition::between_datetime(
            "created_at",
            "2025-11-01T00:00:00",
            "2025-11-02T00:00:00",
        ))
        .filter(Condition::gt("delta_views_count", 10));

    let first = compile(&spec).unwrap();
    let second = compile(&spec).unwrap();
    assert_eq!(first.sql, second.sql);
    assert_eq!(first.params, second.params);
}

#[test]
fn test_compiles_concurrently() {
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id")
        .filter(Condition::eq("creator_id", "abc"));
    let expected = compile(&spec).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8).map(|_| s.spawn(|| compile(&spec).unwrap())).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_empty_filters_have_no_where() {
    let registry = SchemaRegistry::global();
    for table in Table::ALL {
        for field in registry.aggregable_fields(table) {
            for aggregation in Aggregation::ALL {
                let spec = Specification::new(table, aggregation, field);
                let compiled = compile(&spec).unwrap();
                assert!(!compiled.sql.contains("WHERE"), "{}", compiled.sql);
                validate_sql(&compiled.sql).unwrap();
            }
        }
    }
}

#[test]
fn test_every_non_aggregable_field_is_rejected() {
    let registry = SchemaRegistry::global();
    for table in Table::ALL {
        let candidates = registry
            .table_columns(table)
            .iter()
            .copied()
            .chain(["title", "", "id; DROP TABLE videos"]);
        for field in candidates {
            if registry.aggregable(table, field).is_some() {
                continue;
            }
            let spec = Specification::new(table, Aggregation::SumField, field);
            assert_eq!(
                compile(&spec).unwrap_err(),
                SpecError::UnknownField {
                    table,
                    field: field.to_string()
                }
            );
        }
    }
}

#[test]
fn test_every_non_filterable_column_is_rejected() {
    let registry = SchemaRegistry::global();
    let candidates = ["id", "likes_count", "updated_at", "video_id", "title", "views_count "];
    for column in candidates {
        assert!(registry.filterable(column).is_none());
        for scope in [ColumnScope::PerTable, ColumnScope::Global] {
            let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id")
                .filter(Condition::gt(column, 1));
            let err = compile_with(&spec, &CompileOptions::default().with_column_scope(scope))
                .unwrap_err();
            assert_eq!(
                err,
                SpecError::UnknownColumn {
                    column: column.to_string(),
                    table: None
                }
            );
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_between_without_end_fails() {
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id").filter(Condition::new(
        "video_created_at",
        ConditionOp::BetweenDatetime,
        "2025-11-01T00:00:00+00:00",
    ));
    assert_eq!(
        compile(&spec).unwrap_err(),
        SpecError::MissingSecondValue {
            column: "video_created_at".into()
        }
    );
}

#[test]
fn test_date_eq_on_non_temporal_column_fails() {
    for column in ["views_count", "creator_id"] {
        let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id")
            .filter(Condition::date_eq(column, "2025-11-28"));
        assert_eq!(
            compile(&spec).unwrap_err(),
            SpecError::InvalidColumnForOperator {
                column: column.into(),
                op: ConditionOp::DateEq
            }
        );
    }
}

#[test]
fn test_unparseable_datetimes_fail() {
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id").filter(
        Condition::between_datetime("video_created_at", "2025-11-01T00:00:00Z", "next week"),
    );
    assert_eq!(
        compile(&spec).unwrap_err(),
        SpecError::InvalidDatetime {
            column: "video_created_at".into(),
            value: "next week".into()
        }
    );

    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id").filter(
        Condition::between_datetime("video_created_at", 1_700_000_000, "2025-11-01T00:00:00Z"),
    );
    assert!(matches!(
        compile(&spec).unwrap_err(),
        SpecError::InvalidDatetime { .. }
    ));
}

#[test]
fn test_unparseable_dates_fail() {
    for value in [
        ConditionValue::from("2025-02-30"),
        ConditionValue::from("28/11/2025"),
        ConditionValue::from(20251128),
    ] {
        let spec = Specification::new(Table::VideoSnapshots, Aggregation::CountRows, "id")
            .filter(Condition::date_eq("created_at", value.clone()));
        assert_eq!(
            compile(&spec).unwrap_err(),
            SpecError::InvalidDate {
                column: "created_at".into(),
                value: value.to_string()
            }
        );
    }
}

#[test]
fn test_field_is_checked_before_filters() {
    let spec = Specification::new(Table::Videos, Aggregation::SumField, "delta_views_count")
        .filter(Condition::gt("title", 1));
    assert!(matches!(
        compile(&spec).unwrap_err(),
        SpecError::UnknownField { .. }
    ));
}

#[test]
fn test_first_bad_condition_is_reported() {
    let spec = Specification::new(Table::Videos, Aggregation::CountRows, "id")
        .filter(Condition::gt("views_count", 10))
        .filter(Condition::date_eq("views_count", "2025-11-28"))
        .filter(Condition::gt("title", 1));
    assert!(matches!(
        compile(&spec).unwrap_err(),
        SpecError::InvalidColumnForOperator { .. }
    ));
}

// ============================================================================
// Column scope
// ============================================================================

#[test]
fn test_per_table_scope_rejects_column_missing_from_table() {
    let spec = Specification::new(Table::VideoSnapshots, Aggregation::CountRows, "id")
        .filter(Condition::eq("creator_id", "abc"));

    assert_eq!(
        compile(&spec).unwrap_err(),
        SpecError::UnknownColumn {
            column: "creator_id".into(),
            table: Some(Table::VideoSnapshots)
        }
    );
}

#[test]
fn test_global_scope_accepts_column_missing_from_table() {
    let spec = Specification::new(Table::VideoSnapshots, Aggregation::CountRows, "id")
        .filter(Condition::eq("creator_id", "abc"));
    let options = CompileOptions::default().with_column_scope(ColumnScope::Global);
    let compiled = compile_with(&spec, &options).unwrap();

    assert_snapshot!(
        compiled.sql,
        @"SELECT COUNT(*) AS value FROM video_snapshots WHERE creator_id = :p0;"
    );
}
