use std::fmt::Write;

use html_escape::encode_text;

use crate::dates::DateSelector;
use crate::models::ClassSummary;
use crate::table::AttendanceTable;

pub fn build_report(table: &AttendanceTable, selector: &DateSelector) -> String {
    let mut output = String::new();
    let summary = &table.summary;

    let _ = writeln!(output, "# {} Attendance Details", table.class_name);
    let _ = writeln!(output, "Generated for {selector}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total students: {}", summary.total_students);
    let _ = writeln!(output, "- Present: {}", summary.total_present);
    let _ = writeln!(output, "- Absent: {}", summary.total_absent);
    let _ = writeln!(
        output,
        "- Attendance: {:.1}% of recorded days",
        summary.attendance_percentage
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");

    if table.rows.is_empty() {
        let _ = writeln!(output, "{}.", empty_message(table));
        return output;
    }

    let header = table.header();
    let _ = writeln!(output, "{}", markdown_row(&header));
    let _ = writeln!(output, "|{}", "---|".repeat(header.len()));
    for record in table.records() {
        let _ = writeln!(output, "{}", markdown_row(&record));
    }

    output
}

pub fn build_overview(summaries: &[ClassSummary], selector: &DateSelector) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Management");
    let _ = writeln!(output, "Generated for {selector}");
    let _ = writeln!(output);

    let total_students: usize = summaries.iter().map(|s| s.total_students).sum();
    let total_present: usize = summaries.iter().map(|s| s.total_present).sum();
    let total_absent: usize = summaries.iter().map(|s| s.total_absent).sum();
    let _ = writeln!(output, "- Total students: {total_students}");
    let _ = writeln!(output, "- Present: {total_present}");
    let _ = writeln!(output, "- Absent: {total_absent}");
    let _ = writeln!(output);

    if summaries.is_empty() {
        let _ = writeln!(output, "No classes match this selection.");
        return output;
    }

    let _ = writeln!(output, "| S.No | Class | Total Students | Present | Absent | Attendance % |");
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for (idx, summary) in summaries.iter().enumerate() {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {:.1}% |",
            idx + 1,
            markdown_cell(&summary.class_name),
            summary.total_students,
            summary.total_present,
            summary.total_absent,
            summary.attendance_percentage
        );
    }

    output
}

pub fn build_html(table: &AttendanceTable) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "<h3>{} Attendance Details</h3>", encode_text(&table.class_name));
    let _ = writeln!(output, "<table>");
    let _ = write!(output, "<thead><tr>");
    for column in table.header() {
        let _ = write!(output, "<th>{}</th>", encode_text(&column));
    }
    let _ = writeln!(output, "</tr></thead>");
    let _ = writeln!(output, "<tbody>");

    if table.rows.is_empty() {
        let _ = writeln!(
            output,
            "<tr><td colspan=\"{}\">{}</td></tr>",
            table.column_count(),
            encode_text(&empty_message(table))
        );
    }
    for record in table.records() {
        let _ = write!(output, "<tr>");
        for value in record {
            let _ = write!(output, "<td>{}</td>", encode_text(&value));
        }
        let _ = writeln!(output, "</tr>");
    }

    let _ = writeln!(output, "</tbody>");
    let _ = writeln!(output, "</table>");
    output
}

pub fn empty_message(table: &AttendanceTable) -> String {
    match table.search.as_deref() {
        Some(term) if table.summary.total_students > 0 => format!("No students match \"{term}\""),
        _ => format!("No students found for {}", table.class_name),
    }
}

fn markdown_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn markdown_row(values: &[String]) -> String {
    let cells: Vec<String> = values.iter().map(|value| markdown_cell(value)).collect();
    format!("| {} |", cells.join(" | "))
}
