use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StatusParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub registration_number: String,
    pub class_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "A")]
    Absent,
}

impl AttendanceStatus {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "P",
            AttendanceStatus::Absent => "A",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = StatusParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "P" | "p" => Ok(AttendanceStatus::Present),
            "A" | "a" => Ok(AttendanceStatus::Absent),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub student_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentStats {
    pub student_id: i64,
    pub name: String,
    pub registration_number: String,
    pub present_days: usize,
    pub absent_days: usize,
    pub unset_days: usize,
    // Present days over every scheduled day in range; unset days count against the student.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub class_name: String,
    pub total_students: usize,
    pub total_present: usize,
    pub total_absent: usize,
    // Present over recorded (present + absent) cells; unset cells are excluded.
    pub attendance_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_parse_both_cases() {
        assert_eq!("P".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Present);
        assert_eq!(" a ".parse::<AttendanceStatus>().unwrap(), AttendanceStatus::Absent);
        assert_eq!(AttendanceStatus::Present.code(), "P");
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "L".parse::<AttendanceStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown attendance status \"L\"");
    }
}
