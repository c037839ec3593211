use std::fmt;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;

use crate::error::ReportError;

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelector {
    Exact(NaiveDate),
    Range { from: NaiveDate, to: NaiveDate },
    OpenEnded { from: NaiveDate },
    CurrentMonth,
}

impl DateSelector {
    pub fn from_parts(date: Option<NaiveDate>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (date, from, to) {
            (Some(date), _, _) => DateSelector::Exact(date),
            (None, Some(from), Some(to)) => DateSelector::Range { from, to },
            (None, Some(from), None) => DateSelector::OpenEnded { from },
            (None, None, Some(to)) => DateSelector::Exact(to),
            (None, None, None) => DateSelector::CurrentMonth,
        }
    }

    pub fn resolve(&self, clock: &dyn Clock) -> Result<DateRange, ReportError> {
        match *self {
            DateSelector::Exact(date) => Ok(DateRange::single(date)),
            DateSelector::Range { from, to } => DateRange::between(from, to),
            DateSelector::OpenEnded { from } => DateRange::between(from, clock.today()),
            DateSelector::CurrentMonth => Ok(DateRange::month_containing(clock.today())),
        }
    }
}

impl fmt::Display for DateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSelector::Exact(date) => write!(f, "{date}"),
            DateSelector::Range { from, to } => write!(f, "{from} to {to}"),
            DateSelector::OpenEnded { from } => write!(f, "{from} to today"),
            DateSelector::CurrentMonth => f.write_str("current month"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DateRange(Vec<NaiveDate>);

impl DateRange {
    pub fn single(date: NaiveDate) -> Self {
        DateRange(vec![date])
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Result<Self, ReportError> {
        if from > to {
            return Err(ReportError::InvalidRange { from, to });
        }
        Ok(DateRange(from.iter_days().take_while(|day| *day <= to).collect()))
    }

    pub fn month_containing(date: NaiveDate) -> Self {
        let first = date - Duration::days(i64::from(date.day0()));
        DateRange(
            first
                .iter_days()
                .take_while(|day| day.month() == first.month())
                .collect(),
        )
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.0.last().copied()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.binary_search(&date).is_ok()
    }
}
