use std::fmt;
use std::future::Future;

use uuid::Uuid;

use crate::aggregate::{aggregate, AttendanceReport};
use crate::dates::{Clock, DateRange, DateSelector};
use crate::error::ReportError;
use crate::models::ClassSummary;
use crate::repository::AttendanceRepository;

pub struct ReportLoader<R, C> {
    repository: R,
    clock: C,
    retries: u32,
}

impl<R: AttendanceRepository, C: Clock> ReportLoader<R, C> {
    pub fn new(repository: R, clock: C, retries: u32) -> Self {
        Self {
            repository,
            clock,
            retries,
        }
    }

    pub async fn load(
        &self,
        class_name: &str,
        selector: &DateSelector,
    ) -> Result<AttendanceReport, ReportError> {
        let range = selector.resolve(&self.clock)?;
        self.load_range(class_name, &range).await
    }

    pub async fn overview(
        &self,
        selector: &DateSelector,
        search: Option<&str>,
    ) -> Result<Vec<ClassSummary>, ReportError> {
        let range = selector.resolve(&self.clock)?;
        let classes = with_retry(self.retries, move || self.repository.list_classes())
            .await
            .map_err(ReportError::ClassListFetch)?;

        let needle = search.map(str::to_lowercase).unwrap_or_default();
        let mut summaries = Vec::new();
        for class_name in classes
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
        {
            let report = self.load_range(class_name, &range).await?;
            summaries.push(report.summary);
        }

        Ok(summaries)
    }

    async fn load_range(
        &self,
        class_name: &str,
        range: &DateRange,
    ) -> Result<AttendanceReport, ReportError> {
        tracing::debug!(class_name, days = range.len(), "fetching roster and attendance");

        let roster = async {
            with_retry(self.retries, move || self.repository.fetch_roster(class_name))
                .await
                .map_err(|source| ReportError::RosterFetch {
                    class_name: class_name.to_string(),
                    source,
                })
        };
        let records = async {
            if range.is_empty() {
                return Ok(Vec::new());
            }
            with_retry(self.retries, move || {
                self.repository.fetch_attendance(class_name, range)
            })
            .await
            .map_err(|source| ReportError::AttendanceFetch {
                class_name: class_name.to_string(),
                source,
            })
        };
        let (roster, records) = tokio::try_join!(roster, records)?;

        tracing::debug!(
            class_name,
            students = roster.len(),
            records = records.len(),
            "aggregating attendance"
        );
        Ok(aggregate(class_name, &roster, &records, range))
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
}

async fn with_retry<T, F, Fut>(retries: u32, mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retries && is_transient(&err) => {
                attempt += 1;
                tracing::warn!(%err, attempt, "transient fetch failure, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(Uuid);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub enum ReportState {
    #[default]
    Idle,
    Loading(RequestToken),
    Ready(AttendanceReport),
    Failed(ReportError),
}

#[derive(Debug, Default)]
pub struct ReportSession {
    current: Option<RequestToken>,
    state: ReportState,
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> RequestToken {
        let token = RequestToken(Uuid::new_v4());
        self.current = Some(token);
        self.state = ReportState::Loading(token);
        token
    }

    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<AttendanceReport, ReportError>,
    ) -> bool {
        if self.current != Some(token) {
            tracing::debug!(%token, "discarding stale report response");
            return false;
        }

        self.current = None;
        self.state = match result {
            Ok(report) => ReportState::Ready(report),
            Err(err) => ReportState::Failed(err),
        };
        true
    }

    pub fn report(&self) -> Option<&AttendanceReport> {
        match &self.state {
            ReportState::Ready(report) => Some(report),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match &self.state {
            ReportState::Idle => Some("Select a class to load attendance.".to_string()),
            ReportState::Loading(_) => Some("Loading...".to_string()),
            ReportState::Ready(report) if report.is_empty() => {
                Some(format!("No students found for {}", report.class_name()))
            }
            ReportState::Ready(_) => None,
            ReportState::Failed(err) => Some(format!("Failed to load attendance: {err}")),
        }
    }
}
