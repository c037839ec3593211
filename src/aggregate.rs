use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::dates::DateRange;
use crate::models::{AttendanceRecord, AttendanceStatus, ClassSummary, Student, StudentStats};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceMatrix {
    cells: BTreeMap<i64, BTreeMap<NaiveDate, AttendanceStatus>>,
}

impl AttendanceMatrix {
    pub fn build(roster: &[Student], records: &[AttendanceRecord], range: &DateRange) -> Self {
        let roster_ids: HashSet<i64> = roster.iter().map(|student| student.id).collect();
        let mut cells: BTreeMap<i64, BTreeMap<NaiveDate, AttendanceStatus>> = BTreeMap::new();

        for record in records {
            if !roster_ids.contains(&record.student_id) || !range.contains(record.date) {
                continue;
            }
            cells
                .entry(record.student_id)
                .or_default()
                .insert(record.date, record.status);
        }

        AttendanceMatrix { cells }
    }

    pub fn status(&self, student_id: i64, date: NaiveDate) -> Option<AttendanceStatus> {
        self.cells
            .get(&student_id)
            .and_then(|row| row.get(&date))
            .copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceReport {
    pub roster: Vec<Student>,
    pub dates: DateRange,
    pub matrix: AttendanceMatrix,
    pub students: Vec<StudentStats>,
    pub summary: ClassSummary,
}

impl AttendanceReport {
    pub fn class_name(&self) -> &str {
        &self.summary.class_name
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }
}

pub fn aggregate(
    class_name: &str,
    roster: &[Student],
    records: &[AttendanceRecord],
    range: &DateRange,
) -> AttendanceReport {
    let matrix = AttendanceMatrix::build(roster, records, range);
    let mut students = Vec::with_capacity(roster.len());
    let mut total_present = 0usize;
    let mut total_absent = 0usize;

    for student in roster {
        let mut present_days = 0usize;
        let mut absent_days = 0usize;
        let mut unset_days = 0usize;

        for date in range.dates() {
            match matrix.status(student.id, *date) {
                Some(AttendanceStatus::Present) => present_days += 1,
                Some(AttendanceStatus::Absent) => absent_days += 1,
                None => unset_days += 1,
            }
        }

        total_present += present_days;
        total_absent += absent_days;
        students.push(StudentStats {
            student_id: student.id,
            name: student.name.clone(),
            registration_number: student.registration_number.clone(),
            present_days,
            absent_days,
            unset_days,
            percentage: percentage(present_days, range.len()),
        });
    }

    let summary = ClassSummary {
        class_name: class_name.to_string(),
        total_students: roster.len(),
        total_present,
        total_absent,
        attendance_percentage: percentage(total_present, total_present + total_absent),
    };

    AttendanceReport {
        roster: roster.to_vec(),
        dates: range.clone(),
        matrix,
        students,
        summary,
    }
}

pub fn percentage(count: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let raw = count as f64 / denominator as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn day(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    fn student(id: i64, name: &str) -> Student {
        Student {
            id,
            name: name.to_string(),
            registration_number: format!("20250000{id:02}"),
            class_name: "Java".to_string(),
        }
    }

    fn record(student_id: i64, date: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            student_id,
            date: day(date),
            status,
        }
    }

    fn two_day_range() -> DateRange {
        DateRange::between(day("2025-09-12"), day("2025-09-13")).unwrap()
    }

    #[test]
    fn mixed_roll_follows_both_percentage_policies() {
        let roster = vec![student(1, "A"), student(2, "B")];
        let records = vec![
            record(1, "2025-09-12", AttendanceStatus::Present),
            record(1, "2025-09-13", AttendanceStatus::Absent),
            record(2, "2025-09-12", AttendanceStatus::Absent),
        ];

        let report = aggregate("Java", &roster, &records, &two_day_range());

        assert_eq!(report.students[0].present_days, 1);
        assert_eq!(report.students[0].percentage, 50.0);
        assert_eq!(report.students[1].present_days, 0);
        assert_eq!(report.students[1].unset_days, 1);
        assert_eq!(report.students[1].percentage, 0.0);
        assert_eq!(
            report.summary,
            ClassSummary {
                class_name: "Java".to_string(),
                total_students: 2,
                total_present: 1,
                total_absent: 2,
                attendance_percentage: 33.3,
            }
        );
    }

    #[test]
    fn no_records_means_zero_everywhere() {
        let roster = vec![student(1, "A"), student(2, "B"), student(3, "C")];
        let report = aggregate("Java", &roster, &[], &two_day_range());

        assert_eq!(report.summary.total_present, 0);
        assert_eq!(report.summary.total_absent, 0);
        assert_eq!(report.summary.attendance_percentage, 0.0);
        assert!(report.students.iter().all(|stats| stats.percentage == 0.0));
        assert!(report.students.iter().all(|stats| stats.unset_days == 2));
    }

    #[test]
    fn empty_roster_and_empty_range_are_valid() {
        let records = vec![record(1, "2025-09-12", AttendanceStatus::Present)];

        let no_students = aggregate("Java", &[], &records, &two_day_range());
        assert!(no_students.is_empty());
        assert_eq!(no_students.summary.total_students, 0);
        assert_eq!(no_students.summary.attendance_percentage, 0.0);

        let no_dates = aggregate("Java", &[student(1, "A")], &records, &DateRange::default());
        assert_eq!(no_dates.summary.total_present, 0);
        assert_eq!(no_dates.students[0].percentage, 0.0);
    }

    #[test]
    fn records_outside_roster_or_range_are_ignored() {
        let roster = vec![student(1, "A")];
        let records = vec![
            record(1, "2025-09-12", AttendanceStatus::Present),
            record(1, "2025-09-20", AttendanceStatus::Present),
            record(9, "2025-09-12", AttendanceStatus::Present),
        ];

        let report = aggregate("Java", &roster, &records, &two_day_range());

        assert_eq!(report.summary.total_present, 1);
        assert_eq!(report.matrix.status(9, day("2025-09-12")), None);
        assert_eq!(report.matrix.status(1, day("2025-09-20")), None);
    }

    #[test]
    fn recorded_cells_never_exceed_roster_times_range() {
        let roster = vec![student(1, "A"), student(2, "B")];
        let range = two_day_range();
        let records = vec![
            record(1, "2025-09-12", AttendanceStatus::Present),
            record(1, "2025-09-12", AttendanceStatus::Absent),
            record(1, "2025-09-13", AttendanceStatus::Present),
            record(2, "2025-09-12", AttendanceStatus::Present),
            record(2, "2025-09-13", AttendanceStatus::Present),
        ];

        let report = aggregate("Java", &roster, &records, &range);
        let summary = &report.summary;

        assert!(summary.total_present + summary.total_absent <= roster.len() * range.len());
        assert_eq!(report.matrix.status(1, day("2025-09-12")), Some(AttendanceStatus::Absent));
    }

    #[test]
    fn aggregation_is_repeatable() {
        let roster = vec![student(1, "A"), student(2, "B")];
        let records = vec![
            record(2, "2025-09-13", AttendanceStatus::Present),
            record(1, "2025-09-12", AttendanceStatus::Absent),
        ];
        let range = two_day_range();

        assert_eq!(
            aggregate("Java", &roster, &records, &range),
            aggregate("Java", &roster, &records, &range)
        );
    }

    fn generated_range(len: usize) -> DateRange {
        if len == 0 {
            return DateRange::default();
        }
        let from = day("2025-09-01");
        DateRange::between(from, from + chrono::Duration::days(len as i64 - 1)).unwrap()
    }

    fn generated_records(raw: &[(i64, i64, bool)]) -> Vec<AttendanceRecord> {
        raw.iter()
            .map(|&(student_id, offset, present)| AttendanceRecord {
                student_id,
                date: day("2025-09-01") + chrono::Duration::days(offset),
                status: if present {
                    AttendanceStatus::Present
                } else {
                    AttendanceStatus::Absent
                },
            })
            .collect()
    }

    fn generated_roster(names: &[String]) -> Vec<Student> {
        names
            .iter()
            .enumerate()
            .map(|(idx, name)| student(idx as i64 + 1, name))
            .collect()
    }

    proptest! {
        #[test]
        fn without_records_every_count_is_zero(
            names in prop::collection::vec("[a-z]{1,8}", 0..8),
            len in 0usize..20,
        ) {
            let roster = generated_roster(&names);
            let range = generated_range(len);
            let report = aggregate("Java", &roster, &[], &range);

            prop_assert_eq!(report.summary.total_students, roster.len());
            prop_assert_eq!(report.summary.total_present, 0);
            prop_assert_eq!(report.summary.total_absent, 0);
            prop_assert_eq!(report.summary.attendance_percentage, 0.0);
            for stats in &report.students {
                prop_assert_eq!(stats.present_days, 0);
                prop_assert_eq!(stats.absent_days, 0);
                prop_assert_eq!(stats.unset_days, range.len());
                prop_assert_eq!(stats.percentage, 0.0);
            }
        }

        #[test]
        fn aggregation_is_idempotent(
            names in prop::collection::vec("[a-z]{1,8}", 0..8),
            raw in prop::collection::vec((1i64..10, 0i64..40, any::<bool>()), 0..60),
            len in 0usize..20,
        ) {
            let roster = generated_roster(&names);
            let records = generated_records(&raw);
            let range = generated_range(len);

            prop_assert_eq!(
                aggregate("Java", &roster, &records, &range),
                aggregate("Java", &roster, &records, &range)
            );
        }

        #[test]
        fn counts_stay_within_roster_times_range(
            names in prop::collection::vec("[a-z]{1,8}", 0..8),
            raw in prop::collection::vec((1i64..10, 0i64..40, any::<bool>()), 0..60),
            len in 0usize..20,
        ) {
            let roster = generated_roster(&names);
            let records = generated_records(&raw);
            let range = generated_range(len);
            let report = aggregate("Java", &roster, &records, &range);
            let summary = &report.summary;

            prop_assert!(
                summary.total_present + summary.total_absent
                    <= summary.total_students * range.len()
            );
            prop_assert!((0.0..=100.0).contains(&summary.attendance_percentage));
            for stats in &report.students {
                prop_assert_eq!(
                    stats.present_days + stats.absent_days + stats.unset_days,
                    range.len()
                );
                prop_assert!((0.0..=100.0).contains(&stats.percentage));
            }
        }
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 6), 16.7);
        assert_eq!(percentage(3, 3), 100.0);
        assert_eq!(percentage(0, 0), 0.0);
    }
}
