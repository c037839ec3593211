use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::AttendanceReport;
use crate::models::{AttendanceStatus, ClassSummary};

pub const FIXED_COLUMNS: [&str; 3] = ["S.No", "Reg No", "Student Name"];
pub const PERCENTAGE_COLUMN: &str = "Attendance %";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceTable {
    pub class_name: String,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<TableRow>,
    pub summary: ClassSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub serial: usize,
    pub registration_number: String,
    pub name: String,
    pub cells: Vec<Option<AttendanceStatus>>,
    pub percentage: f64,
}

impl AttendanceTable {
    pub fn from_report(report: &AttendanceReport) -> Self {
        let dates = report.dates.dates().to_vec();
        let rows = report
            .roster
            .iter()
            .zip(&report.students)
            .enumerate()
            .map(|(idx, (student, stats))| TableRow {
                serial: idx + 1,
                registration_number: stats.registration_number.clone(),
                name: stats.name.clone(),
                cells: dates
                    .iter()
                    .map(|date| report.matrix.status(student.id, *date))
                    .collect(),
                percentage: stats.percentage,
            })
            .collect();

        AttendanceTable {
            class_name: report.class_name().to_string(),
            dates,
            rows,
            summary: report.summary.clone(),
            search: None,
        }
    }

    pub fn shows_percentage(&self) -> bool {
        self.dates.len() > 1
    }

    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
        header.extend(self.dates.iter().map(|date| date.to_string()));
        if self.shows_percentage() {
            header.push(PERCENTAGE_COLUMN.to_string());
        }
        header
    }

    pub fn column_count(&self) -> usize {
        FIXED_COLUMNS.len() + self.dates.len() + usize::from(self.shows_percentage())
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.to_strings(self.shows_percentage()))
            .collect()
    }

    pub fn filtered(&self, term: &str) -> Self {
        let needle = term.trim().to_lowercase();
        let mut table = self.clone();
        if needle.is_empty() {
            return table;
        }

        table.rows.retain(|row| {
            row.name.to_lowercase().contains(&needle)
                || row.registration_number.to_lowercase().contains(&needle)
        });
        for (idx, row) in table.rows.iter_mut().enumerate() {
            row.serial = idx + 1;
        }
        table.search = Some(term.trim().to_string());
        table
    }
}

impl TableRow {
    pub fn to_strings(&self, with_percentage: bool) -> Vec<String> {
        let mut values = vec![
            self.serial.to_string(),
            self.registration_number.clone(),
            self.name.clone(),
        ];
        values.extend(self.cells.iter().map(|cell| cell_label(*cell).to_string()));
        if with_percentage {
            values.push(format!("{:.1}%", self.percentage));
        }
        values
    }
}

pub fn cell_label(cell: Option<AttendanceStatus>) -> &'static str {
    cell.map(|status| status.label()).unwrap_or("-")
}
