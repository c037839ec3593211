use async_trait::async_trait;
use sqlx::PgPool;

use crate::dates::DateRange;
use crate::db;
use crate::models::{AttendanceRecord, Student};

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn list_classes(&self) -> Result<Vec<String>, sqlx::Error>;

    async fn fetch_roster(&self, class_name: &str) -> Result<Vec<Student>, sqlx::Error>;

    async fn fetch_attendance(
        &self,
        class_name: &str,
        range: &DateRange,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error>;
}

pub struct PgAttendanceRepository {
    pool: PgPool,
}

impl PgAttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn list_classes(&self) -> Result<Vec<String>, sqlx::Error> {
        db::list_classes(&self.pool).await
    }

    async fn fetch_roster(&self, class_name: &str) -> Result<Vec<Student>, sqlx::Error> {
        db::fetch_roster(&self.pool, class_name).await
    }

    async fn fetch_attendance(
        &self,
        class_name: &str,
        range: &DateRange,
    ) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
        db::fetch_attendance(&self.pool, class_name, range).await
    }
}
