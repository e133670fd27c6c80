//! Calendar months used to bucket transactions.

use time::{Date, Month, OffsetDateTime, util::days_in_month};

use crate::{Error, FieldError, timezone::LocalTimezone};

/// A calendar month of a specific year, e.g. December 2025.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthPeriod {
    /// The calendar year.
    pub year: i32,
    /// The month of the year.
    pub month: Month,
}

impl MonthPeriod {
    /// Create a period from a year and month.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The month containing the current instant in `timezone`.
    pub fn current(timezone: LocalTimezone) -> Self {
        Self::containing(OffsetDateTime::now_utc(), timezone)
    }

    /// The month that `instant` falls in, in `timezone`.
    pub fn containing(instant: OffsetDateTime, timezone: LocalTimezone) -> Self {
        let local = timezone.to_local(instant);
        Self::new(local.year(), local.month())
    }

    /// Build a period from optional client-supplied numbers.
    ///
    /// A missing month or year defaults to the current one in `timezone`.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the month is not 1-12 or the year is not
    /// 1-9999.
    pub fn from_parts(
        month: Option<i64>,
        year: Option<i64>,
        timezone: LocalTimezone,
    ) -> Result<Self, Error> {
        let current = Self::current(timezone);
        let mut errors = Vec::new();

        let month = match month {
            None => Some(current.month),
            Some(number) => u8::try_from(number)
                .ok()
                .and_then(|number| Month::try_from(number).ok())
                .or_else(|| {
                    errors.push(FieldError::new("month", "must be between 1 and 12"));
                    None
                }),
        };

        let year = match year {
            None => Some(current.year),
            Some(number) if (1..=9999).contains(&number) => Some(number as i32),
            Some(_) => {
                errors.push(FieldError::new("year", "must be between 1 and 9999"));
                None
            }
        };

        match (month, year) {
            (Some(month), Some(year)) => Ok(Self::new(year, month)),
            _ => Err(Error::Validation(errors)),
        }
    }

    /// Whether `instant` falls in this month, in `timezone`.
    pub fn contains(&self, instant: OffsetDateTime, timezone: LocalTimezone) -> bool {
        Self::containing(instant, timezone) == *self
    }

    /// The month after this one, rolling December over into the next year.
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self::new(self.year + 1, Month::January),
            month => Self::new(self.year, month.next()),
        }
    }

    /// The month before this one, rolling January back into the previous year.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self::new(self.year - 1, Month::December),
            month => Self::new(self.year, month.previous()),
        }
    }

    /// The date for `day` of this month.
    ///
    /// Days past the end of the month are clamped to the last day, so
    /// day 31 of February 2025 is 28 February 2025.
    pub fn date_on(&self, day: u8) -> Option<Date> {
        let day = day.clamp(1, days_in_month(self.month, self.year));
        Date::from_calendar_date(self.year, self.month, day).ok()
    }

    /// The month as a number from 1 to 12.
    pub fn month_number(&self) -> u8 {
        self.month as u8
    }
}
