use std::path::{Path, PathBuf};

use anyhow::Context;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};

use crate::table::AttendanceTable;

pub fn export_file_name(class_name: &str, extension: &str) -> String {
    let safe: String = class_name
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\') { '_' } else { ch })
        .collect();
    format!("{safe}_Attendance.{extension}")
}

const XLSX_MAX_COLUMNS: usize = 16_384;

pub fn ensure_fits(table: &AttendanceTable) -> anyhow::Result<()> {
    let columns = table.column_count();
    if columns > XLSX_MAX_COLUMNS {
        anyhow::bail!(
            "{} columns exceed the spreadsheet limit of {XLSX_MAX_COLUMNS}; narrow the date range",
            columns
        );
    }
    Ok(())
}

fn column(idx: usize) -> anyhow::Result<u16> {
    u16::try_from(idx).with_context(|| format!("column {idx} is out of spreadsheet range"))
}

pub fn export_xlsx(table: &AttendanceTable, dir: &Path) -> anyhow::Result<PathBuf> {
    ensure_fits(table)?;
    let path = dir.join(export_file_name(&table.class_name, "xlsx"));
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Attendance")?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);
    let percentage_format = Format::new().set_num_format("0.0");

    for (col, name) in table.header().iter().enumerate() {
        worksheet.write_string_with_format(0, column(col)?, name, &header_format)?;
    }

    worksheet.set_column_width(1, 14)?;
    worksheet.set_column_width(2, 28)?;

    let date_count = table.dates.len();
    for (idx, row) in table.rows.iter().enumerate() {
        let line = u32::try_from(idx + 1).context("too many rows for a spreadsheet")?;
        worksheet.write_number(line, 0, row.serial as f64)?;
        worksheet.write_string(line, 1, &row.registration_number)?;
        worksheet.write_string(line, 2, &row.name)?;
        for (offset, cell) in row.cells.iter().enumerate() {
            worksheet.write_string(line, column(3 + offset)?, crate::table::cell_label(*cell))?;
        }
        if table.shows_percentage() {
            worksheet.write_number_with_format(
                line,
                column(3 + date_count)?,
                row.percentage,
                &percentage_format,
            )?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    workbook
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = table.rows.len(), "exported spreadsheet");
    Ok(path)
}

pub fn export_csv(table: &AttendanceTable, dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join(export_file_name(&table.class_name, "csv"));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(table.header())?;
    for record in table.records() {
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(path)
}
