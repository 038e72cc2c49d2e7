//! Slot grid for one scheduling day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Number of scheduling slots in one day.
pub const SLOTS_PER_DAY: usize = 48;

/// Length of one slot in minutes.
pub const SLOT_MINUTES: i64 = 30;

/// Length of one slot in hours.
pub const SLOT_HOURS: f32 = 0.5;

/// Formats a slot index as its local wall-clock start time (`HH:MM`).
///
/// # Examples
///
/// ```
/// use solar_shift::schedule::types::slot_label;
///
/// assert_eq!(slot_label(0), "00:00");
/// assert_eq!(slot_label(21), "10:30");
/// ```
pub fn slot_label(slot: usize) -> String {
    let minutes = slot as i64 * SLOT_MINUTES;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// The 48 half-hour slots of one calendar day in a fixed time zone.
///
/// Every timestamp inside the scheduler is a `(date, slot index)` pair;
/// `DayGrid` is the only place where those pairs become instants, so the
/// scheduler and timeline reducer never convert between zones themselves.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use solar_shift::schedule::types::DayGrid;
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// let grid = DayGrid::new(date, chrono_tz::Africa::Nairobi);
/// assert_eq!(grid.slot_start(20).format("%H:%M").to_string(), "10:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayGrid {
    date: NaiveDate,
    tz: Tz,
}

impl DayGrid {
    /// Creates a grid for `date` in zone `tz`.
    pub fn new(date: NaiveDate, tz: Tz) -> Self {
        Self { date, tz }
    }

    /// Creates a grid for the day after `now`, as seen from zone `tz`.
    pub fn tomorrow_in(tz: Tz, now: DateTime<Utc>) -> Self {
        let today = now.with_timezone(&tz).date_naive();
        Self::new(today.succ_opt().unwrap_or(today), tz)
    }

    /// Target calendar date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Reference time zone.
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Start instant of `slot`. Slot 48 is the end of the day.
    ///
    /// Slots are laid out in absolute time from local midnight, so they
    /// stay ordered and exactly 30 minutes apart across DST changes.
    pub fn slot_start(&self, slot: usize) -> DateTime<Tz> {
        self.day_start() + Duration::minutes(slot as i64 * SLOT_MINUTES)
    }

    /// First instant of the day (inclusive).
    ///
    /// A midnight skipped by a DST change resolves to the first instant
    /// after the gap.
    pub fn day_start(&self) -> DateTime<Tz> {
        let midnight = self.date.and_time(NaiveTime::MIN);
        self.tz
            .from_local_datetime(&midnight)
            .earliest()
            .or_else(|| {
                self.tz
                    .from_local_datetime(&(midnight + Duration::hours(1)))
                    .earliest()
            })
            .unwrap_or_else(|| self.tz.from_utc_datetime(&midnight))
    }

    /// First instant after the day (exclusive), 24 hours after
    /// [`DayGrid::day_start`]. On a DST change day this is not local
    /// midnight.
    pub fn day_end(&self) -> DateTime<Tz> {
        self.slot_start(SLOTS_PER_DAY)
    }

    /// Returns the slot containing `at`, or `None` if `at` falls on another day.
    pub fn slot_of<Z: TimeZone>(&self, at: &DateTime<Z>) -> Option<usize> {
        let at = at.with_timezone(&self.tz);
        if at < self.day_start() || at >= self.day_end() {
            return None;
        }
        let minutes = (at - self.day_start()).num_minutes();
        usize::try_from(minutes / SLOT_MINUTES).ok()
    }
}
