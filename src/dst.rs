//! Calendar arithmetic and the European daylight saving time rule.
//!
//! DST starts on the last Sunday of March, 03:00 local time (the clock jumps
//! from 03:00 to 04:00), and ends on the last Sunday of October at 04:00 local
//! time (back to 03:00). The rule is only evaluated on the boundary hours: at
//! 03:xx while not in DST and at 04:xx while in DST.

/// Month offsets for Sakamoto's day-of-week method.
const MONTH_OFFSETS: [u8; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];

/// Day of week for a proleptic Gregorian date (after 1752), 0 = Sunday.
///
/// `month` is 1-12. Out of range months wrap instead of panicking.
pub fn day_of_week(year: u16, month: u8, day: u8) -> u8 {
    let year = u32::from(year).saturating_sub(u32::from(month < 3));
    let offset = MONTH_OFFSETS[usize::from((month % 12 + 11) % 12)];
    ((year + year / 4 - year / 100 + year / 400 + u32::from(offset) + u32::from(day)) % 7) as u8
}

/// Day of week in the device convention, 1 = Monday .. 7 = Sunday.
pub fn iso_weekday(year: u16, month: u8, day: u8) -> u8 {
    match day_of_week(year, month, day) {
        0 => 7,
        dow => dow,
    }
}

/// Date of the last Sunday of March.
pub fn last_sunday_of_march(year: u16) -> u8 {
    31 - day_of_week(year, 3, 31)
}

/// Date of the last Sunday of October.
pub fn last_sunday_of_october(year: u16) -> u8 {
    31 - day_of_week(year, 10, 31)
}

/// Hour adjustment requested by the DST rule, also used as the step
/// direction for minute and hour adjustments.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Adjustment {
    /// Move back one step (DST ended)
    Backward = -1,
    /// Leave the clock alone
    Hold = 0,
    /// Move forward one step (DST started)
    Forward = 1,
}

impl Adjustment {
    /// Signed step, -1, 0 or +1.
    pub const fn offset(self) -> i8 {
        self as i8
    }
}

impl From<i8> for Adjustment {
    fn from(direction: i8) -> Self {
        match direction {
            d if d > 0 => Adjustment::Forward,
            d if d < 0 => Adjustment::Backward,
            _ => Adjustment::Hold,
        }
    }
}

impl From<Adjustment> for i8 {
    fn from(adjustment: Adjustment) -> Self {
        adjustment.offset()
    }
}

/// Whether the given local date and hour fall inside European DST.
///
/// Exact on the boundary days only for the hours the rule is evaluated at,
/// which is all [`dst_adjustment`] needs.
pub fn is_dst_active(year: u16, month: u8, day: u8, hour: u8) -> bool {
    match month {
        4..=9 => true,
        3 => {
            let begin = last_sunday_of_march(year);
            day > begin || (day == begin && hour >= 3)
        }
        10 => {
            let end = last_sunday_of_october(year);
            day < end || (day == end && hour < 4)
        }
        _ => false,
    }
}

/// Adjustment needed to keep `dst_active` and the clock in line with the rule.
///
/// Only hour 3 without DST and hour 4 with DST are evaluated; every other
/// hour yields [`Adjustment::Hold`]. A forward result means: advance the clock
/// one hour and set the flag. A backward result means: retreat one hour and
/// clear the flag.
///
/// The 03:xx hour on the last Sunday of October is the one that repeats after
/// falling back, so it never produces a forward step.
pub fn dst_adjustment(year: u16, month: u8, day: u8, hour: u8, dst_active: bool) -> Adjustment {
    let boundary = (hour == 3 && !dst_active) || (hour == 4 && dst_active);
    if !boundary {
        return Adjustment::Hold;
    }
    let dst_now = is_dst_active(year, month, day, hour);
    let repeated_hour = month == 10 && day == last_sunday_of_october(year);
    let adjustment = match (dst_now, dst_active) {
        (true, false) if !repeated_hour => Adjustment::Forward,
        (false, true) => Adjustment::Backward,
        _ => Adjustment::Hold,
    };
    debug!(
        "DST: {}-{}-{} {}h flag={} rule={} -> {}",
        year,
        month,
        day,
        hour,
        dst_active,
        dst_now,
        adjustment.offset()
    );
    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    #[test]
    fn test_day_of_week_known_values() {
        // 2000-01-01 was a Saturday
        assert_eq!(day_of_week(2000, 1, 1), 6);
        assert_eq!(iso_weekday(2000, 1, 1), 6);
        // 2018-01-01 was a Monday
        assert_eq!(day_of_week(2018, 1, 1), 1);
        assert_eq!(iso_weekday(2018, 1, 1), 1);
        // 2018-03-25 was a Sunday
        assert_eq!(day_of_week(2018, 3, 25), 0);
        assert_eq!(iso_weekday(2018, 3, 25), 7);
    }

    #[test]
    fn test_day_of_week_matches_chrono() {
        for year in [1753_u16, 1900, 1999, 2000, 2018, 2024, 2100, 2199] {
            for month in 1..=12_u8 {
                for day in [1_u8, 15, 28] {
                    let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
                        .unwrap();
                    assert_eq!(
                        u32::from(day_of_week(year, month, day)),
                        date.weekday().num_days_from_sunday(),
                        "{}-{}-{}",
                        year,
                        month,
                        day
                    );
                    assert_eq!(
                        u32::from(iso_weekday(year, month, day)),
                        date.weekday().number_from_monday()
                    );
                }
            }
        }
    }

    #[test]
    fn test_last_sundays() {
        assert_eq!(last_sunday_of_march(2018), 25);
        assert_eq!(last_sunday_of_october(2018), 28);
        assert_eq!(last_sunday_of_march(2024), 31);
        assert_eq!(last_sunday_of_october(2024), 27);
    }

    #[test]
    fn test_is_dst_active_march_boundary() {
        assert!(!is_dst_active(2018, 3, 24, 12));
        assert!(!is_dst_active(2018, 3, 25, 2));
        assert!(is_dst_active(2018, 3, 25, 3));
        assert!(is_dst_active(2018, 3, 26, 0));
    }

    #[test]
    fn test_is_dst_active_october_boundary() {
        assert!(is_dst_active(2018, 10, 27, 23));
        assert!(is_dst_active(2018, 10, 28, 3));
        assert!(!is_dst_active(2018, 10, 28, 4));
        assert!(!is_dst_active(2018, 10, 29, 0));
    }

    #[test]
    fn test_is_dst_active_by_month() {
        for month in 4..=9 {
            assert!(is_dst_active(2018, month, 1, 0));
        }
        for month in [1, 2, 11, 12] {
            assert!(!is_dst_active(2018, month, 15, 12));
        }
    }

    #[test]
    fn test_dst_adjustment_only_on_boundary_hours() {
        for hour in (0..24).filter(|h| *h != 3 && *h != 4) {
            assert_eq!(dst_adjustment(2018, 3, 25, hour, false), Adjustment::Hold);
            assert_eq!(dst_adjustment(2018, 10, 28, hour, true), Adjustment::Hold);
            assert_eq!(dst_adjustment(2018, 7, 1, hour, false), Adjustment::Hold);
            assert_eq!(dst_adjustment(2018, 1, 1, hour, true), Adjustment::Hold);
        }
    }

    #[test]
    fn test_dst_adjustment_spring_forward() {
        assert_eq!(dst_adjustment(2018, 3, 25, 3, false), Adjustment::Forward);
        // After the jump the clock reads 04:xx with the flag set: stable
        assert_eq!(dst_adjustment(2018, 3, 25, 4, true), Adjustment::Hold);
        // The day before nothing happens
        assert_eq!(dst_adjustment(2018, 3, 24, 3, false), Adjustment::Hold);
    }

    #[test]
    fn test_dst_adjustment_fall_back() {
        assert_eq!(dst_adjustment(2018, 10, 28, 4, true), Adjustment::Backward);
        // The repeated 03:xx hour with the flag cleared stays put
        assert_eq!(dst_adjustment(2018, 10, 28, 3, false), Adjustment::Hold);
        // The day before, still summer time
        assert_eq!(dst_adjustment(2018, 10, 27, 4, true), Adjustment::Hold);
    }

    #[test]
    fn test_dst_adjustment_corrects_stale_flag() {
        // Summer with the flag cleared at the boundary hour: move forward
        assert_eq!(dst_adjustment(2018, 7, 1, 3, false), Adjustment::Forward);
        // Winter with the flag set at the boundary hour: move back
        assert_eq!(dst_adjustment(2018, 12, 1, 4, true), Adjustment::Backward);
    }

    #[test]
    fn test_adjustment_conversions() {
        assert_eq!(Adjustment::from(1), Adjustment::Forward);
        assert_eq!(Adjustment::from(5), Adjustment::Forward);
        assert_eq!(Adjustment::from(-1), Adjustment::Backward);
        assert_eq!(Adjustment::from(0), Adjustment::Hold);
        assert_eq!(i8::from(Adjustment::Backward), -1);
        assert_eq!(Adjustment::Forward.offset(), 1);
    }
}
