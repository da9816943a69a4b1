//! Ledger folds producing movement reports.
//!
//! Reports group ledger entries by subject. Live subjects group under their
//! id; entries whose subject was deleted group under the preserved name
//! snapshot, so renames of a live subject still land in one group while
//! deleted subjects stay readable.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::ledger::{ChangeType, MovementRecord};

/// How many subjects the ranking keeps
pub const TOP_MOVED_LIMIT: usize = 5;

/// Totals and raw movements for one subject
#[derive(Debug, Clone, Serialize)]
pub struct SubjectMovements {
    pub subject_id: Option<Uuid>,
    pub subject_name: String,
    pub inbound_total: i64,
    pub outbound_total: i64,
    pub adjustment_total: i64,
    pub movement_count: i64,
    pub movements: Vec<MovementRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectRanking {
    pub subject_id: Option<Uuid>,
    pub subject_name: String,
    pub movement_count: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MovementReport {
    pub total_movements: i64,
    pub inbound_total: i64,
    pub outbound_total: i64,
    pub adjustment_total: i64,
    pub top_moved_subjects: Vec<SubjectRanking>,
    pub per_subject: Vec<SubjectMovements>,
}

/// Per-day inbound/outbound entry counts for the monthly report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub inbound_count: i64,
    pub outbound_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Id(Uuid),
    Name(String),
}

fn group_key(record: &MovementRecord) -> GroupKey {
    match record.subject_id {
        Some(id) => GroupKey::Id(id),
        None => GroupKey::Name(display_name(record)),
    }
}

fn display_name(record: &MovementRecord) -> String {
    record
        .subject_name
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Fold ledger entries into a movement report.
///
/// Inbound and outbound entries accumulate their moved quantity into the
/// matching total; every other change type accumulates into
/// `adjustment_total` (descriptive edits contribute zero there but still
/// count as movements). Subjects appear in first-seen order; pass entries
/// newest first to keep each subject's movement list newest first as well.
/// The ranking is by movement count, ties resolved by first appearance.
pub fn aggregate_movements(records: &[MovementRecord]) -> MovementReport {
    let mut subjects: Vec<SubjectMovements> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for record in records {
        let key = group_key(record);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                subjects.push(SubjectMovements {
                    subject_id: record.subject_id,
                    subject_name: display_name(record),
                    inbound_total: 0,
                    outbound_total: 0,
                    adjustment_total: 0,
                    movement_count: 0,
                    movements: Vec::new(),
                });
                index.insert(key, subjects.len() - 1);
                subjects.len() - 1
            }
        };

        let subject = &mut subjects[slot];
        subject.movement_count += 1;
        match record.change_type {
            ChangeType::Inbound => subject.inbound_total += record.magnitude(),
            ChangeType::Outbound => subject.outbound_total += record.magnitude(),
            _ => subject.adjustment_total += record.magnitude(),
        }
        subject.movements.push(record.clone());
    }

    let mut ranking: Vec<SubjectRanking> = subjects
        .iter()
        .map(|s| SubjectRanking {
            subject_id: s.subject_id,
            subject_name: s.subject_name.clone(),
            movement_count: s.movement_count,
        })
        .collect();
    // sort_by is stable, so equal counts keep first-appearance order
    ranking.sort_by(|a, b| b.movement_count.cmp(&a.movement_count));
    ranking.truncate(TOP_MOVED_LIMIT);

    MovementReport {
        total_movements: records.len() as i64,
        inbound_total: subjects.iter().map(|s| s.inbound_total).sum(),
        outbound_total: subjects.iter().map(|s| s.outbound_total).sum(),
        adjustment_total: subjects.iter().map(|s| s.adjustment_total).sum(),
        top_moved_subjects: ranking,
        per_subject: subjects,
    }
}

/// Bucket entries per calendar day, counting inbound and outbound entries.
/// A day with entries of other types still gets a bucket, with zero counts.
pub fn daily_activity(records: &[MovementRecord]) -> BTreeMap<NaiveDate, DailyActivity> {
    let mut days: BTreeMap<NaiveDate, DailyActivity> = BTreeMap::new();

    for record in records {
        let bucket = days.entry(record.created_at.date_naive()).or_default();
        match record.change_type {
            ChangeType::Inbound => bucket.inbound_count += 1,
            ChangeType::Outbound => bucket.outbound_count += 1,
            _ => {}
        }
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectKind;
    use chrono::{TimeZone, Utc};

    fn record(
        subject_id: Option<Uuid>,
        name: &str,
        change: ChangeType,
        previous: i64,
        new: i64,
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
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_totals_accumulate_per_direction() {
        let id = Uuid::new_v4();
        let records = vec![
            record(Some(id), "Widget", ChangeType::Inbound, 50, 65),
            record(Some(id), "Widget", ChangeType::Outbound, 55, 50),
            record(Some(id), "Widget", ChangeType::Inbound, 50, 55),
        ];

        let report = aggregate_movements(&records);
        assert_eq!(report.total_movements, 3);
        assert_eq!(report.inbound_total, 20);
        assert_eq!(report.outbound_total, 5);
        assert_eq!(report.adjustment_total, 0);
        assert_eq!(report.per_subject.len(), 1);
        assert_eq!(report.per_subject[0].movement_count, 3);
    }

    #[test]
    fn test_deletion_counts_into_adjustment_total() {
        let records = vec![record(None, "Old widget", ChangeType::Deletion, 65, 0)];

        let report = aggregate_movements(&records);
        assert_eq!(report.total_movements, 1);
        assert_eq!(report.adjustment_total, 65);
        assert_eq!(report.inbound_total, 0);
    }

    #[test]
    fn test_descriptive_edits_count_as_movements_with_zero_quantity() {
        let id = Uuid::new_v4();
        let records = vec![record(Some(id), "Widget", ChangeType::PriceEdit, 40, 40)];

        let report = aggregate_movements(&records);
        assert_eq!(report.total_movements, 1);
        assert_eq!(report.adjustment_total, 0);
        assert_eq!(report.per_subject[0].movement_count, 1);
    }

    #[test]
    fn test_deleted_subjects_group_by_name_snapshot() {
        let live = Uuid::new_v4();
        let records = vec![
            record(None, "Retired A", ChangeType::Outbound, 5, 3),
            record(Some(live), "Live", ChangeType::Inbound, 0, 10),
            record(None, "Retired A", ChangeType::Inbound, 0, 5),
            record(None, "Retired B", ChangeType::Deletion, 2, 0),
        ];

        let report = aggregate_movements(&records);
        assert_eq!(report.per_subject.len(), 3);
        assert_eq!(report.per_subject[0].subject_name, "Retired A");
        assert_eq!(report.per_subject[0].movement_count, 2);
        assert_eq!(report.per_subject[1].subject_name, "Live");
        assert_eq!(report.per_subject[2].subject_name, "Retired B");
    }

    #[test]
    fn test_ranking_keeps_first_appearance_order_on_ties() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let records = vec![
            record(Some(a), "A", ChangeType::Inbound, 0, 1),
            record(Some(b), "B", ChangeType::Inbound, 0, 1),
            record(Some(c), "C", ChangeType::Inbound, 0, 1),
            record(Some(c), "C", ChangeType::Outbound, 1, 0),
        ];

        let report = aggregate_movements(&records);
        let names: Vec<&str> = report
            .top_moved_subjects
            .iter()
            .map(|r| r.subject_name.as_str())
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_ranking_truncates_to_limit() {
        let records: Vec<MovementRecord> = (0..8)
            .map(|i| {
                record(
                    Some(Uuid::new_v4()),
                    &format!("S{}", i),
                    ChangeType::Inbound,
                    0,
                    1,
                )
            })
            .collect();

        let report = aggregate_movements(&records);
        assert_eq!(report.top_moved_subjects.len(), TOP_MOVED_LIMIT);
        assert_eq!(report.per_subject.len(), 8);
    }

    #[test]
    fn test_empty_range_yields_zeroed_report() {
        let report = aggregate_movements(&[]);
        assert_eq!(report.total_movements, 0);
        assert_eq!(report.inbound_total, 0);
        assert_eq!(report.outbound_total, 0);
        assert_eq!(report.adjustment_total, 0);
        assert!(report.top_moved_subjects.is_empty());
        assert!(report.per_subject.is_empty());
    }

    #[test]
    fn test_daily_activity_counts_only_directional_entries() {
        let id = Uuid::new_v4();
        let mut records = vec![
            record(Some(id), "Widget", ChangeType::Inbound, 0, 5),
            record(Some(id), "Widget", ChangeType::Outbound, 5, 4),
            record(Some(id), "Widget", ChangeType::Adjustment, 4, 9),
        ];
        records[1].created_at = Utc.with_ymd_and_hms(2026, 3, 15, 8, 30, 0).unwrap();

        let days = daily_activity(&records);
        assert_eq!(days.len(), 2);

        let march_14 = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let march_15 = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(
            days[&march_14],
            DailyActivity {
                inbound_count: 1,
                outbound_count: 0
            }
        );
        assert_eq!(
            days[&march_15],
            DailyActivity {
                inbound_count: 0,
                outbound_count: 1
            }
        );
    }
}
