//! Decoded civil time and the raw time/date register block.
//!
//! The DS3231 stores date and time in 7 consecutive registers:
//! seconds, minutes, hours, day of week, date, month (with the century bit)
//! and year. [`CivilTime`] is the decoded snapshot the driver keeps; it is
//! overwritten from the registers on every successful read.
//!
//! Date fields are only refreshed by reads that include the date registers. A
//! time-only read leaves them as they were, and tracking which read mode was
//! last used is up to the caller.

use chrono::{NaiveDate, NaiveDateTime, Weekday};

use crate::codec::{from_bcd, reconcile_hour, to_bcd, twelve_hour};
use crate::dst::iso_weekday;
use crate::registers::Month;

/// Decoded date and time.
///
/// The 12-hour view (`hour12`, `is_pm`) is derived from `hour` and kept in
/// line by every mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilTime {
    second: u8,
    minute: u8,
    hour: u8,
    hour12: u8,
    is_pm: bool,
    weekday: u8,
    day: u8,
    month: u8,
    century: u16,
    year: u8,
}

impl CivilTime {
    /// An empty snapshot (midnight, no date) for the given century base.
    pub const fn new(century: u16) -> Self {
        Self {
            second: 0,
            minute: 0,
            hour: 0,
            hour12: 12,
            is_pm: false,
            weekday: 0,
            day: 0,
            month: 0,
            century,
            year: 0,
        }
    }

    /// Seconds, 0-59.
    pub const fn second(&self) -> u8 {
        self.second
    }

    /// Minutes, 0-59.
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    /// Hour in 24-hour format, 0-23.
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    /// Hour in 12-hour format, 1-12.
    pub const fn hour12(&self) -> u8 {
        self.hour12
    }

    /// True from 12:00 to 23:59.
    pub const fn is_pm(&self) -> bool {
        self.is_pm
    }

    /// Day of week, 1 = Monday .. 7 = Sunday. 0 until a date has been read.
    pub const fn weekday_number(&self) -> u8 {
        self.weekday
    }

    /// Day of week as a chrono [`Weekday`], if a date has been read.
    pub fn weekday(&self) -> Option<Weekday> {
        match self.weekday {
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            7 => Some(Weekday::Sun),
            _ => None,
        }
    }

    /// Day of month, 1-31.
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Month, 1-12.
    pub const fn month(&self) -> u8 {
        self.month
    }

    /// Century base, e.g. 1900 or 2000.
    pub const fn century(&self) -> u16 {
        self.century
    }

    /// Year within the century, 0-99.
    pub const fn year_of_century(&self) -> u8 {
        self.year
    }

    /// Full year. Only meaningful after a read that included the date.
    pub const fn year(&self) -> u16 {
        self.century + self.year as u16
    }

    /// Converts to a chrono [`NaiveDateTime`], `None` if the fields do not
    /// form a valid date (e.g. before the first date read).
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year()),
            u32::from(self.month),
            u32::from(self.day),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
        })
    }

    /// Sets the hour and recomputes the 12-hour view.
    pub(crate) fn set_hour(&mut self, hour: u8) {
        self.hour = hour;
        (self.hour12, self.is_pm) = twelve_hour(hour);
    }

    pub(crate) fn set_second(&mut self, second: u8) {
        self.second = second;
    }

    /// Steps the minute by one with wraparound.
    pub(crate) fn step_minute(&mut self, direction: i8) {
        self.minute = step_wrapping(self.minute, direction, 60);
    }

    /// Steps the hour by one with wraparound.
    pub(crate) fn step_hour(&mut self, direction: i8) {
        self.set_hour(step_wrapping(self.hour, direction, 24));
    }

    /// Loads the seconds, minutes and hours registers.
    pub(crate) fn load_time(&mut self, registers: &[u8]) {
        self.second = from_bcd(registers[0] & 0x7F);
        self.minute = from_bcd(registers[1] & 0x7F);
        self.set_hour(reconcile_hour(registers[2]));
        trace!(
            "time {}:{}:{} raw_hour={}",
            self.hour,
            self.minute,
            self.second,
            registers[2]
        );
    }

    /// Loads the day, date, month and year registers.
    ///
    /// The year is rebuilt from the configured century, plus 100 when the
    /// century bit in the month register is set.
    pub(crate) fn load_date(&mut self, registers: &[u8], century_base: u16) {
        let month = Month::from(registers[2]);
        self.weekday = match from_bcd(registers[0] & 0x07) {
            0 => 7,
            dow => dow,
        };
        self.day = from_bcd(registers[1] & 0x3F);
        self.month = from_bcd(month.bcd_month());
        self.century = century_base + if month.century() { 100 } else { 0 };
        self.year = from_bcd(registers[3]);
        trace!(
            "date {}-{}-{} dow={} century_bit={}",
            self.year(),
            self.month,
            self.day,
            self.weekday,
            month.century()
        );
    }
}

fn step_wrapping(value: u8, direction: i8, modulus: u8) -> u8 {
    match direction {
        d if d > 0 => {
            if value >= modulus - 1 {
                0
            } else {
                value + 1
            }
        }
        d if d < 0 => {
            if value == 0 || value >= modulus {
                modulus - 1
            } else {
                value - 1
            }
        }
        _ => value,
    }
}

/// The seven time/date registers as written in one burst.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct RawDateTime {
    seconds: u8,
    minutes: u8,
    hours: u8,
    day: u8,
    date: u8,
    month: Month,
    year: u8,
}

impl RawDateTime {
    /// Encodes a date and time for the chip in 24-hour mode.
    ///
    /// Inputs wrap into their valid ranges instead of failing: seconds and
    /// minutes modulo 60, hours modulo 24, day into 1-31 and month into 1-12.
    /// The day of week is computed from the full year, and the century bit is
    /// set when `year` lies past `century_base + 99`.
    pub(crate) fn encode(
        second: u8,
        minute: u8,
        hour: u8,
        day: u8,
        month: u8,
        year: u16,
        century_base: u16,
    ) -> Self {
        let day = wrap_one_based(day, 31);
        let month_value = wrap_one_based(month, 12);
        let mut month = Month::default();
        month.set_bcd_month(to_bcd(month_value));
        if year > century_base + 99 {
            debug!("year {} past century {}, setting century bit", year, century_base);
            month.set_century(true);
        }
        let raw = Self {
            seconds: to_bcd(second % 60),
            minutes: to_bcd(minute % 60),
            hours: to_bcd(hour % 24) & 0x3F,
            day: iso_weekday(year, month_value, day),
            date: to_bcd(day) & 0x3F,
            month,
            year: to_bcd((year % 100) as u8),
        };
        debug!(
            "encoded {}-{}-{} {}:{}:{} dow={}",
            year,
            month_value,
            day,
            hour % 24,
            minute % 60,
            second % 60,
            raw.day
        );
        raw
    }
}

/// Wraps a 1-based value into `1..=max`, 0 becomes `max`.
fn wrap_one_based(value: u8, max: u8) -> u8 {
    ((u16::from(value) + u16::from(max) - 1) % u16::from(max)) as u8 + 1
}

impl From<[u8; 7]> for RawDateTime {
    fn from(data: [u8; 7]) -> Self {
        RawDateTime {
            seconds: data[0],
            minutes: data[1],
            hours: data[2],
            day: data[3],
            date: data[4],
            month: Month::from(data[5]),
            year: data[6],
        }
    }
}

impl From<&RawDateTime> for [u8; 7] {
    fn from(dt: &RawDateTime) -> [u8; 7] {
        [
            dt.seconds,
            dt.minutes,
            dt.hours,
            dt.day,
            dt.date,
            dt.month.into(),
            dt.year,
        ]
    }
}
