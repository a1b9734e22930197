//! Packed BCD conversion and hour register reconciliation.
//!
//! Every time and date register of the DS3231 holds two decimal digits, one
//! per nibble. The hours register additionally carries the 12/24-hour mode
//! bit and, depending on the mode, either the AM/PM flag or the "twenty"
//! digit in bit 5.

use crate::registers::{Hours, TimeRepresentation};

/// Packs a decimal value (0-99) into BCD.
///
/// Values above 99 produce an unspecified byte; callers wrap or validate
/// before encoding.
pub const fn to_bcd(value: u8) -> u8 {
    (value / 10).wrapping_mul(16).wrapping_add(value % 10)
}

/// Unpacks a BCD byte into its decimal value.
pub const fn from_bcd(byte: u8) -> u8 {
    (byte / 16) * 10 + byte % 16
}

/// Decodes a raw hours register into a 24-hour value.
///
/// In 12-hour mode the register holds 12 for both midnight and noon, so
/// 12 AM decodes to 0 and 12 PM to 12. Every other PM hour gets 12 added.
pub fn reconcile_hour(raw: u8) -> u8 {
    let hours = Hours::from(raw);
    match hours.time_representation() {
        TimeRepresentation::TwentyFourHour => from_bcd(raw & 0x3F),
        TimeRepresentation::TwelveHour => {
            let hour12 = from_bcd(raw & 0x1F);
            match (hour12, hours.pm_or_twenty_hours()) {
                (12, false) => 0,
                (12, true) => 12,
                (h, false) => h,
                (h, true) => h + 12,
            }
        }
    }
}

/// Encodes a 24-hour value (0-23) into an hours register in the given mode.
///
/// The clock core always writes 24-hour mode; the 12-hour encoding exists so
/// that a chip left in 12-hour mode by another master can be handled.
pub fn encode_hour(hour: u8, time_representation: TimeRepresentation) -> u8 {
    let hour = hour % 24;
    let mut value = Hours::default();
    value.set_time_representation(time_representation);
    match time_representation {
        TimeRepresentation::TwentyFourHour => to_bcd(hour) | u8::from(value),
        TimeRepresentation::TwelveHour => {
            let (hour12, is_pm) = twelve_hour(hour);
            value.set_pm_or_twenty_hours(is_pm);
            to_bcd(hour12) | u8::from(value)
        }
    }
}

/// Splits a 24-hour value into its 12-hour view and PM flag.
pub const fn twelve_hour(hour: u8) -> (u8, bool) {
    match hour {
        0 => (12, false),
        1..=11 => (hour, false),
        12 => (12, true),
        _ => (hour - 12, true),
    }
}

/// One register byte split into its two decimal digits.
///
/// Used for display refreshes that only need the digits and skip the full
/// date decode.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BcdDigits {
    /// High nibble
    pub tens: u8,
    /// Low nibble
    pub ones: u8,
}

impl From<u8> for BcdDigits {
    fn from(byte: u8) -> Self {
        Self {
            tens: byte / 16,
            ones: byte % 16,
        }
    }
}

impl BcdDigits {
    /// Decimal value of the pair.
    pub const fn value(self) -> u8 {
        self.tens * 10 + self.ones
    }
}
