//! Movement report tests
//!
//! Tests for the ledger aggregation behind the daily and monthly reports:
//! - Property 7: Report Aggregation Accuracy
//! - Property 8: Empty Range Safety

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use shared::{
    aggregate_movements, daily_activity, ChangeType, DailyActivity, MovementRecord, SubjectKind,
    TOP_MOVED_LIMIT,
};
use uuid::Uuid;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, day, hour, 0, 0).unwrap()
}

fn record(
    subject_id: Option<Uuid>,
    name: &str,
    change: ChangeType,
    previous: i64,
    new: i64,
    created_at: DateTime<Utc>,
) -> MovementRecord {
    MovementRecord {
        subject_id,
        subject_kind: SubjectKind::Product,
        subject_name: Some(name.to_string()),
        change_type: change,
        previous_quantity: previous,
        new_quantity: new,
        description: None,
        actor_name: None,
        created_at,
    }
}

// ============================================================================
// Property 7: Report Aggregation Accuracy
// ============================================================================

mod report_totals {
    use super::*;

    #[test]
    fn directional_totals_from_quantity_transitions() {
        let id = Uuid::new_v4();
        let records = vec![
            record(Some(id), "Espresso blend", ChangeType::Inbound, 50, 70, at(4, 9)),
            record(Some(id), "Espresso blend", ChangeType::Outbound, 70, 65, at(4, 11)),
            record(Some(id), "Espresso blend", ChangeType::PriceEdit, 65, 65, at(4, 12)),
        ];

        let report = aggregate_movements(&records);
        assert_eq!(report.total_movements, 3);
        assert_eq!(report.inbound_total, 20);
        assert_eq!(report.outbound_total, 5);
        assert_eq!(report.adjustment_total, 0);
    }

    #[test]
    fn recount_magnitude_lands_in_adjustment_total() {
        let id = Uuid::new_v4();
        let records = vec![record(
            Some(id),
            "Paper cups",
            ChangeType::Adjustment,
            40,
            100,
            at(4, 9),
        )];

        let report = aggregate_movements(&records);
        assert_eq!(report.adjustment_total, 60);
        assert_eq!(report.inbound_total, 0);
        assert_eq!(report.outbound_total, 0);
    }

    #[test]
    fn deletion_magnitude_lands_in_adjustment_total() {
        let records = vec![record(
            None,
            "Retired blend",
            ChangeType::Deletion,
            65,
            0,
            at(4, 9),
        )];

        let report = aggregate_movements(&records);
        assert_eq!(report.total_movements, 1);
        assert_eq!(report.adjustment_total, 65);
    }

    #[test]
    fn descriptive_edits_count_as_movements_with_no_quantity() {
        let id = Uuid::new_v4();
        let records = vec![
            record(Some(id), "Espresso blend", ChangeType::NameEdit, 30, 30, at(4, 9)),
            record(Some(id), "Espresso blend", ChangeType::DescriptionEdit, 30, 30, at(4, 10)),
        ];

        let report = aggregate_movements(&records);
        assert_eq!(report.total_movements, 2);
        assert_eq!(report.adjustment_total, 0);
        assert_eq!(report.per_subject[0].movement_count, 2);
    }

    // Property 8: Empty Range Safety
    #[test]
    fn empty_range_reports_zeros_without_error() {
        let report = aggregate_movements(&[]);
        assert_eq!(report.total_movements, 0);
        assert_eq!(report.inbound_total, 0);
        assert_eq!(report.outbound_total, 0);
        assert_eq!(report.adjustment_total, 0);
        assert!(report.top_moved_subjects.is_empty());
        assert!(report.per_subject.is_empty());
    }
}

// ============================================================================
// Subject Grouping
// ============================================================================

mod subject_grouping {
    use super::*;

    #[test]
    fn renamed_subject_stays_one_group() {
        let id = Uuid::new_v4();
        let records = vec![
            record(Some(id), "Old name", ChangeType::Inbound, 0, 10, at(4, 9)),
            record(Some(id), "New name", ChangeType::Outbound, 10, 8, at(5, 9)),
        ];

        let report = aggregate_movements(&records);
        assert_eq!(report.per_subject.len(), 1);
        assert_eq!(report.per_subject[0].movement_count, 2);
    }

    #[test]
    fn deleted_subjects_group_under_name_snapshot() {
        let records = vec![
            record(None, "Retired A", ChangeType::Outbound, 5, 3, at(4, 9)),
            record(None, "Retired B", ChangeType::Deletion, 2, 0, at(4, 10)),
            record(None, "Retired A", ChangeType::Inbound, 0, 5, at(4, 11)),
        ];

        let report = aggregate_movements(&records);
        assert_eq!(report.per_subject.len(), 2);
        assert_eq!(report.per_subject[0].subject_name, "Retired A");
        assert_eq!(report.per_subject[0].movement_count, 2);
        assert_eq!(report.per_subject[1].subject_name, "Retired B");
    }

    #[test]
    fn deleted_history_still_counts_in_totals() {
        // Entries left behind by a deleted product keep feeding the report
        let records = vec![
            record(None, "Retired blend", ChangeType::Inbound, 0, 65, at(4, 9)),
            record(None, "Retired blend", ChangeType::Deletion, 65, 0, at(4, 10)),
        ];

        let report = aggregate_movements(&records);
        assert_eq!(report.total_movements, 2);
        assert_eq!(report.inbound_total, 65);
        assert_eq!(report.adjustment_total, 65);
    }
}

// ============================================================================
// Most-Moved Ranking
// ============================================================================

mod top_ranking {
    use super::*;

    #[test]
    fn ranking_orders_by_movement_count() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut records = Vec::new();
        for i in 0..3 {
            records.push(record(Some(a), "A", ChangeType::Inbound, i, i + 1, at(4, 9)));
        }
        records.push(record(Some(b), "B", ChangeType::Inbound, 0, 1, at(4, 9)));

        let report = aggregate_movements(&records);
        assert_eq!(report.top_moved_subjects[0].subject_name, "A");
        assert_eq!(report.top_moved_subjects[0].movement_count, 3);
        assert_eq!(report.top_moved_subjects[1].subject_name, "B");
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let names = ["First", "Second", "Third"];
        let records: Vec<MovementRecord> = names
            .iter()
            .map(|name| record(Some(Uuid::new_v4()), name, ChangeType::Inbound, 0, 1, at(4, 9)))
            .collect();

        let report = aggregate_movements(&records);
        let ranked: Vec<&str> = report
            .top_moved_subjects
            .iter()
            .map(|r| r.subject_name.as_str())
            .collect();
        assert_eq!(ranked, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn ranking_truncates_to_limit() {
        let records: Vec<MovementRecord> = (0..9)
            .map(|i| {
                record(
                    Some(Uuid::new_v4()),
                    &format!("Subject {}", i),
                    ChangeType::Inbound,
                    0,
                    1,
                    at(4, 9),
                )
            })
            .collect();

        let report = aggregate_movements(&records);
        assert_eq!(report.top_moved_subjects.len(), TOP_MOVED_LIMIT);
        // The full per-subject list is not truncated
        assert_eq!(report.per_subject.len(), 9);
    }
}

// ============================================================================
// Daily Activity Buckets (monthly report)
// ============================================================================

mod daily_buckets {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn entries_bucket_per_calendar_day() {
        let id = Uuid::new_v4();
        let records = vec![
            record(Some(id), "Espresso blend", ChangeType::Inbound, 0, 10, at(4, 9)),
            record(Some(id), "Espresso blend", ChangeType::Inbound, 10, 20, at(4, 18)),
            record(Some(id), "Espresso blend", ChangeType::Outbound, 20, 15, at(6, 8)),
        ];

        let days = daily_activity(&records);
        assert_eq!(days.len(), 2);

        let may_4 = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let may_6 = NaiveDate::from_ymd_opt(2026, 5, 6).unwrap();
        assert_eq!(
            days[&may_4],
            DailyActivity {
                inbound_count: 2,
                outbound_count: 0
            }
        );
        assert_eq!(
            days[&may_6],
            DailyActivity {
                inbound_count: 0,
                outbound_count: 1
            }
        );
    }

    #[test]
    fn edit_only_days_get_zeroed_buckets() {
        let id = Uuid::new_v4();
        let records = vec![record(
            Some(id),
            "Espresso blend",
            ChangeType::PriceEdit,
            10,
            10,
            at(12, 9),
        )];

        let days = daily_activity(&records);
        let may_12 = NaiveDate::from_ymd_opt(2026, 5, 12).unwrap();
        assert_eq!(days[&may_12], DailyActivity::default());
    }

    #[test]
    fn days_iterate_in_calendar_order() {
        let id = Uuid::new_v4();
        let records = vec![
            record(Some(id), "X", ChangeType::Inbound, 0, 1, at(20, 9)),
            record(Some(id), "X", ChangeType::Inbound, 1, 2, at(3, 9)),
            record(Some(id), "X", ChangeType::Inbound, 2, 3, at(11, 9)),
        ];

        let days = daily_activity(&records);
        let ordered: Vec<u32> = days.keys().map(|d| d.day()).collect();
        assert_eq!(ordered, vec![3, 11, 20]);
    }
}

// ============================================================================
// Aggregation Properties
// ============================================================================

mod report_properties {
    use super::*;

    fn change_type_strategy() -> impl Strategy<Value = ChangeType> {
        prop_oneof![
            Just(ChangeType::Inbound),
            Just(ChangeType::Outbound),
            Just(ChangeType::Adjustment),
            Just(ChangeType::PriceEdit),
            Just(ChangeType::Deletion),
        ]
    }

    fn records_strategy() -> impl Strategy<Value = Vec<MovementRecord>> {
        let subject_ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        prop::collection::vec(
            (0usize..4, change_type_strategy(), 0i64..200, 0i64..200, 1u32..28).prop_map(
                move |(slot, change, previous, new, day)| {
                    let (previous, new) = match change {
                        // Edits snapshot an unchanged quantity
                        ChangeType::PriceEdit => (previous, previous),
                        ChangeType::Deletion => (previous, 0),
                        _ => (previous, new),
                    };
                    record(
                        Some(subject_ids[slot]),
                        &format!("Subject {}", slot),
                        change,
                        previous,
                        new,
                        at(day, 12),
                    )
                },
            ),
            0..40,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Report totals equal the sums over per-subject groups
        #[test]
        fn prop_totals_match_per_subject_sums(records in records_strategy()) {
            let report = aggregate_movements(&records);

            let inbound: i64 = report.per_subject.iter().map(|s| s.inbound_total).sum();
            let outbound: i64 = report.per_subject.iter().map(|s| s.outbound_total).sum();
            let adjustment: i64 = report.per_subject.iter().map(|s| s.adjustment_total).sum();

            prop_assert_eq!(report.inbound_total, inbound);
            prop_assert_eq!(report.outbound_total, outbound);
            prop_assert_eq!(report.adjustment_total, adjustment);
        }

        /// Every entry lands in exactly one subject group
        #[test]
        fn prop_every_record_counted_once(records in records_strategy()) {
            let report = aggregate_movements(&records);

            let grouped: i64 = report.per_subject.iter().map(|s| s.movement_count).sum();
            prop_assert_eq!(grouped, records.len() as i64);
            prop_assert_eq!(report.total_movements, records.len() as i64);

            let listed: usize = report.per_subject.iter().map(|s| s.movements.len()).sum();
            prop_assert_eq!(listed, records.len());
        }

        /// The ranking never grows past its limit and is sorted descending
        #[test]
        fn prop_ranking_sorted_and_bounded(records in records_strategy()) {
            let report = aggregate_movements(&records);

            prop_assert!(report.top_moved_subjects.len() <= TOP_MOVED_LIMIT);
            for pair in report.top_moved_subjects.windows(2) {
                prop_assert!(pair[0].movement_count >= pair[1].movement_count);
            }
        }

        /// Daily buckets count exactly the directional entries
        #[test]
        fn prop_daily_counts_match_directional_entries(records in records_strategy()) {
            let days = daily_activity(&records);

            let inbound_bucketed: i64 = days.values().map(|d| d.inbound_count).sum();
            let outbound_bucketed: i64 = days.values().map(|d| d.outbound_count).sum();

            let inbound_actual = records
                .iter()
                .filter(|r| r.change_type == ChangeType::Inbound)
                .count() as i64;
            let outbound_actual = records
                .iter()
                .filter(|r| r.change_type == ChangeType::Outbound)
                .count() as i64;

            prop_assert_eq!(inbound_bucketed, inbound_actual);
            prop_assert_eq!(outbound_bucketed, outbound_actual);
        }
    }
}

// ============================================================================
// CSV Export Shape
// ============================================================================

mod csv_export {
    use serde::Serialize;

    /// Row shape used by the report download endpoints
    #[derive(Debug, Serialize)]
    struct ExportRow {
        subject: String,
        inbound_total: i64,
        outbound_total: i64,
        adjustment_total: i64,
        movement_count: i64,
    }

    fn to_csv(rows: &[ExportRow]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            writer.serialize(row).unwrap();
        }
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn header_row_from_field_names() {
        let csv = to_csv(&[ExportRow {
            subject: "Espresso blend".to_string(),
            inbound_total: 20,
            outbound_total: 5,
            adjustment_total: 0,
            movement_count: 3,
        }]);

        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("subject,inbound_total,outbound_total,adjustment_total,movement_count")
        );
        assert_eq!(lines.next(), Some("Espresso blend,20,5,0,3"));
    }

    #[test]
    fn subject_names_with_commas_are_quoted() {
        let csv = to_csv(&[ExportRow {
            subject: "Beans, dark roast".to_string(),
            inbound_total: 1,
            outbound_total: 0,
            adjustment_total: 0,
            movement_count: 1,
        }]);

        assert!(csv.contains("\"Beans, dark roast\""));
    }
}
