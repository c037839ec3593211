use std::collections::HashSet;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgExecutor, PgPool, Row};

use crate::dates::DateRange;
use crate::models::{AttendanceRecord, AttendanceStatus, Student};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    use AttendanceStatus::{Absent as A, Present as P};

    let dates = DateRange::between(
        NaiveDate::from_ymd_opt(2025, 9, 12).context("invalid date")?,
        NaiveDate::from_ymd_opt(2025, 9, 16).context("invalid date")?,
    )?;

    let students = vec![
        ("John Doe", "Java", "2025000001", [P, P, A, P, P]),
        ("Jane Smith", "Python", "2025000002", [A, P, P, A, P]),
        ("Bob Johnson", "C++", "2025000003", [P, A, P, P, A]),
        ("Alice Brown", "Java", "2025000004", [P, A, A, P, P]),
        ("Mike Wilson", "Python", "2025000005", [P, P, P, A, P]),
    ];

    for (name, class_name, reg_no, roll) in students {
        let student_id = upsert_student(pool, name, reg_no, class_name).await?;
        for (date, status) in dates.dates().iter().zip(roll) {
            upsert_attendance(pool, student_id, *date, status, class_name).await?;
        }
    }

    Ok(())
}

async fn upsert_student(
    pool: &PgPool,
    name: &str,
    reg_no: &str,
    class_name: &str,
) -> anyhow::Result<i64> {
    let id: i64 = sqlx::query(
        r#"
        INSERT INTO coaching_admin.student_list (name, reg_no, class_type)
        VALUES ($1, $2, $3)
        ON CONFLICT (reg_no) DO UPDATE
        SET name = EXCLUDED.name, class_type = EXCLUDED.class_type
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(reg_no)
    .bind(class_name)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert student {reg_no}"))?
    .get("id");

    Ok(id)
}

async fn upsert_attendance<'e, E: PgExecutor<'e>>(
    executor: E,
    student_id: i64,
    date: NaiveDate,
    status: AttendanceStatus,
    class_name: &str,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO coaching_admin.attendance
        (student_id, attendance_date, status, class_type)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (student_id, attendance_date, class_type) DO UPDATE
        SET status = EXCLUDED.status
        "#,
    )
    .bind(student_id)
    .bind(date)
    .bind(status.code())
    .bind(class_name)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_classes(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT DISTINCT class_type FROM coaching_admin.student_list ORDER BY class_type",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("class_type")).collect())
}

pub async fn fetch_roster(pool: &PgPool, class_name: &str) -> Result<Vec<Student>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, name, reg_no, class_type \
         FROM coaching_admin.student_list \
         WHERE class_type = $1 \
         ORDER BY id",
    )
    .bind(class_name)
    .fetch_all(pool)
    .await?;

    let mut students = Vec::with_capacity(rows.len());
    for row in rows {
        students.push(Student {
            id: row.get("id"),
            name: row.get("name"),
            registration_number: row.get("reg_no"),
            class_name: row.get("class_type"),
        });
    }

    Ok(students)
}

pub async fn fetch_attendance(
    pool: &PgPool,
    class_name: &str,
    range: &DateRange,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    let (Some(from), Some(to)) = (range.first(), range.last()) else {
        return Ok(Vec::new());
    };

    let rows = sqlx::query(
        "SELECT student_id, attendance_date, status \
         FROM coaching_admin.attendance \
         WHERE class_type = $1 AND attendance_date BETWEEN $2 AND $3",
    )
    .bind(class_name)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let raw: String = row.get("status");
        match raw.parse::<AttendanceStatus>() {
            Ok(status) => records.push(AttendanceRecord {
                student_id: row.get("student_id"),
                date: row.get("attendance_date"),
                status,
            }),
            Err(err) => tracing::warn!(class_name, %err, "skipping attendance row"),
        }
    }

    Ok(records)
}

pub fn build_marks(
    roster: &[Student],
    date: NaiveDate,
    present: &HashSet<i64>,
) -> Vec<AttendanceRecord> {
    roster
        .iter()
        .map(|student| AttendanceRecord {
            student_id: student.id,
            date,
            status: if present.contains(&student.id) {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            },
        })
        .collect()
}

pub async fn mark_attendance(
    pool: &PgPool,
    class_name: &str,
    date: NaiveDate,
    present: &HashSet<i64>,
) -> anyhow::Result<Vec<AttendanceRecord>> {
    let roster = fetch_roster(pool, class_name)
        .await
        .with_context(|| format!("failed to load roster for {class_name}"))?;

    let mut unknown: Vec<i64> = present
        .iter()
        .filter(|id| !roster.iter().any(|student| student.id == **id))
        .copied()
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        anyhow::bail!("students {unknown:?} are not enrolled in {class_name}");
    }

    let marks = build_marks(&roster, date, present);
    let mut tx = pool.begin().await?;
    for mark in &marks {
        upsert_attendance(&mut *tx, mark.student_id, mark.date, mark.status, class_name).await?;
    }
    tx.commit().await?;

    tracing::info!(class_name, %date, marked = marks.len(), "attendance saved");
    Ok(marks)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        reg_no: String,
        class_name: String,
        attendance_date: NaiveDate,
        status: AttendanceStatus,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut written = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid CSV row {}", line + 1))?;
        let student_id = upsert_student(pool, &row.full_name, &row.reg_no, &row.class_name).await?;
        let affected = upsert_attendance(
            pool,
            student_id,
            row.attendance_date,
            row.status,
            &row.class_name,
        )
        .await?;

        if affected > 0 {
            written += 1;
        }
    }

    Ok(written)
}
