//! Resolves the configured timezone used for calendar math.

use std::fmt;

use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// The timezone that calendar dates and months are read in.
///
/// The UTC offset is looked up for each instant, so dates on either side of a
/// daylight saving change land on the right calendar day.
#[derive(Clone, Copy)]
pub enum LocalTimezone {
    /// A named zone, e.g. "Pacific/Auckland".
    Named(&'static Tz),
    /// A zone with the same offset all year.
    Fixed(UtcOffset),
}

impl LocalTimezone {
    /// Coordinated Universal Time.
    pub const UTC: LocalTimezone = LocalTimezone::Fixed(UtcOffset::UTC);

    /// Look up a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Returns `None` if the timezone name is not known.
    pub fn from_name(canonical_timezone: &str) -> Option<Self> {
        time_tz::timezones::get_by_name(canonical_timezone).map(LocalTimezone::Named)
    }

    /// The UTC offset in effect at `instant`.
    pub fn offset_at(self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            LocalTimezone::Named(tz) => tz.get_offset_utc(&instant).to_utc(),
            LocalTimezone::Fixed(offset) => offset,
        }
    }

    /// `instant` as local wall-clock time.
    pub fn to_local(self, instant: OffsetDateTime) -> OffsetDateTime {
        instant.to_offset(self.offset_at(instant))
    }

    /// The instant, in UTC, at which local clocks read `local`.
    ///
    /// A wall-clock time skipped or repeated by a daylight saving change uses
    /// the offset in effect just after the change.
    pub fn from_local(self, local: PrimitiveDateTime) -> OffsetDateTime {
        let first_guess = self.offset_at(local.assume_utc());
        let offset = self.offset_at(local.assume_offset(first_guess));

        local.assume_offset(offset).to_offset(UtcOffset::UTC)
    }

    /// Local midnight at the start of `date`, in UTC.
    pub fn midnight_on(self, date: Date) -> OffsetDateTime {
        self.from_local(date.midnight())
    }
}

impl From<UtcOffset> for LocalTimezone {
    fn from(offset: UtcOffset) -> Self {
        LocalTimezone::Fixed(offset)
    }
}

impl fmt::Debug for LocalTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalTimezone::Named(tz) => f.debug_tuple("Named").field(&tz.name()).finish(),
            LocalTimezone::Fixed(offset) => f.debug_tuple("Fixed").field(offset).finish(),
        }
    }
}

/// Like [LocalTimezone::from_name], but logs and returns an error for unknown
/// timezones.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if `canonical_timezone` is not a
/// canonical timezone name.
pub fn resolve_timezone(canonical_timezone: &str) -> Result<LocalTimezone, Error> {
    LocalTimezone::from_name(canonical_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", canonical_timezone);
        Error::InvalidTimezoneError(canonical_timezone.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use time::{
        UtcOffset,
        macros::{date, datetime, offset},
    };

    use crate::Error;

    use super::{LocalTimezone, resolve_timezone};

    fn auckland() -> LocalTimezone {
        LocalTimezone::from_name("Pacific/Auckland").unwrap()
    }

    #[test]
    fn utc_has_zero_offset() {
        let utc = resolve_timezone("UTC").unwrap();

        assert_eq!(utc.offset_at(datetime!(2025-06-01 00:00 UTC)), UtcOffset::UTC);
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            resolve_timezone("Middle/Earth").unwrap_err(),
            Error::InvalidTimezoneError("Middle/Earth".to_owned())
        );
    }

    #[test]
    fn offset_follows_daylight_saving() {
        let tz = auckland();

        assert_eq!(tz.offset_at(datetime!(2025-03-01 00:00 UTC)), offset!(+13));
        assert_eq!(tz.offset_at(datetime!(2025-06-01 00:00 UTC)), offset!(+12));
    }

    #[test]
    fn midnight_uses_the_offset_of_that_day() {
        let tz = auckland();

        assert_eq!(
            tz.midnight_on(date!(2025 - 04 - 01)),
            datetime!(2025-03-31 11:00 UTC)
        );
        assert_eq!(
            tz.midnight_on(date!(2025 - 04 - 30)),
            datetime!(2025-04-29 12:00 UTC)
        );
    }

    #[test]
    fn fixed_offset_never_changes() {
        let tz = LocalTimezone::from(offset!(+13));

        assert_eq!(
            tz.midnight_on(date!(2025 - 06 - 01)),
            datetime!(2025-05-31 11:00 UTC)
        );
    }
}
