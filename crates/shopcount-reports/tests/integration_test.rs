//! Integration tests for shopcount-reports crate.
//!
//! These tests drive the report service over the in-memory store and parse
//! rendered CSV back with the `csv` reader.

use shopcount_common::test_utils::{init_test_logging, mock_date, mock_timestamp, record};
use shopcount_common::{BranchId, BranchInfo, DateRange, Granularity, ReportFormat, ShopCountError};
use shopcount_config::ConfigCache;
use shopcount_reports::{render, InMemoryStore, ReportService};
use std::sync::Arc;

fn seeded_service() -> ReportService<InMemoryStore> {
    let store = InMemoryStore::new();
    store.upsert_branch(BranchInfo::new("BKK-001", "Siam Square"));
    store.insert_records([
        record(mock_timestamp(2024, 1, 1, 9, 15, 0), 3, 1, 10).with_camera("cam-1"),
        record(mock_timestamp(2024, 1, 1, 9, 45, 0), 2, 0, 12).with_camera("cam-1"),
        record(mock_timestamp(2024, 1, 1, 10, 5, 0), 1, 1, 12).with_camera("cam-2"),
        record(mock_timestamp(2024, 1, 3, 14, 0, 0), 7, 4, 9).with_camera("cam-2"),
    ]);
    ReportService::new(store, Arc::new(ConfigCache::default()))
}

fn branch() -> BranchId {
    BranchId::from("BKK-001")
}

/// Splits a rendered sheet into records, dropping blank separator lines.
fn parse_csv(body: &str) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect::<Vec<_>>())
        .filter(|fields: &Vec<String>| fields.iter().any(|f| !f.is_empty()))
        .collect()
}

/// Rows between the column header starting with `key_label` and the next
/// `Summary` label.
fn data_rows(rows: &[Vec<String>], key_label: &str) -> Vec<Vec<String>> {
    let start = rows
        .iter()
        .position(|r| r[0] == key_label)
        .expect("column header present");
    rows[start + 1..]
        .iter()
        .take_while(|r| r[0] != "Summary")
        .cloned()
        .collect()
}

#[tokio::test]
async fn test_daily_report_csv_round_trip() {
    init_test_logging();
    let service = seeded_service();

    let report = service.daily(&branch(), mock_date(2024, 1, 1)).await.unwrap();
    let rendered = render(&report, ReportFormat::Csv).unwrap();
    let rows = parse_csv(&rendered.body);

    assert_eq!(rows[0], vec!["Daily Report", "2024-01-01"]);
    assert_eq!(rows[1], vec!["Branch", "BKK-001", "Siam Square"]);

    let data = data_rows(&rows, "Hour");
    assert_eq!(
        data,
        vec![
            vec!["2024-01-01 09:00:00", "5", "1", "12"],
            vec!["2024-01-01 10:00:00", "1", "1", "12"],
        ]
    );

    let total = rows.iter().find(|r| r[0] == "Total Entries").unwrap();
    assert_eq!(total[1], "6");
}

#[tokio::test]
async fn test_empty_day_renders_well_formed_csv() {
    let service = seeded_service();

    let report = service.daily(&branch(), mock_date(2024, 2, 1)).await.unwrap();
    let rendered = render(&report, ReportFormat::Csv).unwrap();
    let rows = parse_csv(&rendered.body);

    assert!(data_rows(&rows, "Hour").is_empty());
    let busiest = rows.iter().find(|r| r[0] == "Busiest Hour").unwrap();
    assert_eq!(busiest[1], "-");
}

#[tokio::test]
async fn test_weekly_report_json() {
    let service = seeded_service();

    let report = service.weekly(&branch(), mock_date(2024, 1, 4)).await.unwrap();
    let rendered = render(&report, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered.body).unwrap();

    assert_eq!(rendered.content_type, "application/json");
    assert_eq!(value["summary"]["total_entries"], 13);
    assert_eq!(value["summary"]["busiest_sub_period"], "2024-01-03");
    assert_eq!(value["daily"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_history_by_week_and_month() {
    let service = seeded_service();
    let range = DateRange::inclusive(mock_date(2024, 1, 1), mock_date(2024, 1, 31)).unwrap();

    let weekly = service.history(&branch(), range, Granularity::Week).await.unwrap();
    assert_eq!(weekly.buckets.len(), 1);
    assert_eq!(weekly.buckets[0].bucket_key, "2024-W01");
    assert_eq!(weekly.buckets[0].entries, 13);

    let monthly = service.history(&branch(), range, Granularity::Month).await.unwrap();
    assert_eq!(monthly.buckets[0].bucket_key, "2024-01");
}

#[tokio::test]
async fn test_comparison_report_csv() {
    let service = seeded_service();
    let p1 = DateRange::inclusive(mock_date(2023, 12, 25), mock_date(2023, 12, 31)).unwrap();
    let p2 = DateRange::inclusive(mock_date(2024, 1, 1), mock_date(2024, 1, 7)).unwrap();

    let report = service.comparison(&branch(), p1, p2).await.unwrap();
    let rendered = render(&report, ReportFormat::Csv).unwrap();
    assert_eq!(
        rendered.filename,
        "comparison_report_BKK-001_2023-12-25_vs_2024-01-01.csv"
    );

    let rows = parse_csv(&rendered.body);
    let change_at = rows.iter().position(|r| r[0] == "Change (%)").unwrap();
    assert_eq!(rows[change_at + 1], vec!["Entries", "1300.00%"]);
}

#[tokio::test]
async fn test_current_occupancy() {
    let service = seeded_service();
    let occupancy = service.current(&branch()).await.unwrap();

    assert_eq!(occupancy.cameras.len(), 2);
    assert_eq!(occupancy.current_count, 12 + 9);
    assert_eq!(occupancy.last_updated, Some(mock_timestamp(2024, 1, 3, 14, 0, 0)));
}

#[tokio::test]
async fn test_unknown_branch() {
    let service = seeded_service();
    let err = service
        .summary(
            &BranchId::from("CNX-404"),
            DateRange::single_day(mock_date(2024, 1, 1)).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ShopCountError::NotFound { .. }));
}
