use std::fmt;
use std::num::NonZeroU32;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime};

const LABEL_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]_[month]");
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// A point in time a snapshot is taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    instant: OffsetDateTime,
}

impl Period {
    pub fn new(instant: OffsetDateTime) -> Self {
        Period { instant }
    }

    pub fn instant(&self) -> OffsetDateTime {
        self.instant
    }

    /// `YYYY_MM`, used in file and table names.
    pub fn label(&self) -> String {
        format_or_empty(self.instant, LABEL_FORMAT)
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`, as `osmium time-filter` expects it.
    pub fn timestamp(&self) -> String {
        format_or_empty(self.instant, TIMESTAMP_FORMAT)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// Formatting only fails for years outside 0..=9999 with these descriptions.
fn format_or_empty(instant: OffsetDateTime, format: &[BorrowedFormatItem<'_>]) -> String {
    instant.format(format).unwrap_or_default()
}

/// Adds calendar months, clamping the day to the end of the target month.
pub fn add_months(instant: OffsetDateTime, months: u32) -> Option<OffsetDateTime> {
    let date = instant.date();
    let month_index = i64::from(date.month() as u8) - 1;
    let total = i64::from(date.year()) * 12 + month_index + i64::from(months);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u8::try_from(total.rem_euclid(12) + 1).ok()?;
    let month = Month::try_from(month).ok()?;
    let day = date.day().min(time::util::days_in_year_month(year, month));
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(instant.replace_date(date))
}

/// Date cursor stepping from `start` while the cursor is before `until`.
#[derive(Debug, Clone)]
pub struct Periods {
    next: Option<OffsetDateTime>,
    until: OffsetDateTime,
    step: NonZeroU32,
}

impl Periods {
    pub fn new(start: OffsetDateTime, until: OffsetDateTime, step: NonZeroU32) -> Self {
        Periods {
            next: Some(start),
            until,
            step,
        }
    }
}

impl Iterator for Periods {
    type Item = Period;

    fn next(&mut self) -> Option<Period> {
        let cursor = self.next.filter(|cursor| *cursor < self.until)?;
        self.next = add_months(cursor, self.step.get());
        Some(Period::new(cursor))
    }
}
