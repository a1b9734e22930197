//! Register map and bitfield structures for the DS3231 RTC.
//!
//! Only the registers the clock core touches are modelled here: the seven
//! time/date registers, the alarm 2 trigger registers, control, status and
//! the temperature pair.

use bitfield::bitfield;

/// Register addresses for the DS3231 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59)
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (1-12 + AM/PM or 0-23)
    Hours = 0x02,
    /// Day of week register (1-7)
    Day = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register (1-12) with the century bit
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Alarm 2 minutes register, followed by hours and day/date
    Alarm2Minutes = 0x0B,
    /// Control register
    Control = 0x0E,
    /// Control/Status register
    ControlStatus = 0x0F,
    /// Temperature MSB register
    MSBTemp = 0x11,
    /// Temperature LSB register
    LSBTemp = 0x12,
}

/// Register offsets used by the clock core.
///
/// Injected through [`Config`](crate::Config) so a driver can be pointed at a
/// register-compatible part or a test double without touching globals.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap {
    /// First of the seven consecutive time/date registers.
    pub seconds: u8,
    /// Minutes register.
    pub minutes: u8,
    /// Hours register.
    pub hours: u8,
    /// First of the three alarm 2 trigger registers.
    pub alarm2_minutes: u8,
    /// Control register.
    pub control: u8,
    /// Status register.
    pub status: u8,
    /// Integer part of the temperature (signed).
    pub temperature_msb: u8,
    /// Fractional part of the temperature, quarter degrees in bits 7:6.
    pub temperature_lsb: u8,
}

impl RegisterMap {
    /// The fixed DS3231 register layout.
    pub const DS3231: Self = Self {
        seconds: RegAddr::Seconds as u8,
        minutes: RegAddr::Minutes as u8,
        hours: RegAddr::Hours as u8,
        alarm2_minutes: RegAddr::Alarm2Minutes as u8,
        control: RegAddr::Control as u8,
        status: RegAddr::ControlStatus as u8,
        temperature_msb: RegAddr::MSBTemp as u8,
        temperature_lsb: RegAddr::LSBTemp as u8,
    };
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self::DS3231
    }
}

/// Time representation format for the DS3231.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    TwentyFourHour = 0,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    /// Creates a `TimeRepresentation` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => TimeRepresentation::TwentyFourHour,
            1 => TimeRepresentation::TwelveHour,
            _ => panic!("Invalid value for TimeRepresentation: {}", v),
        }
    }
}
impl From<TimeRepresentation> for u8 {
    /// Converts a `TimeRepresentation` to its raw register value.
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// Oscillator control for the DS3231.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    /// Oscillator is enabled
    Enabled = 0,
    /// Oscillator is disabled when running from battery
    Disabled = 1,
}
impl From<u8> for Oscillator {
    /// Creates an `Oscillator` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => Oscillator::Enabled,
            1 => Oscillator::Disabled,
            _ => panic!("Invalid value for Oscillator: {}", v),
        }
    }
}
impl From<Oscillator> for u8 {
    fn from(v: Oscillator) -> Self {
        v as u8
    }
}

/// Interrupt control mode for the DS3231.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptControl {
    /// Output square wave on INT/SQW pin
    SquareWave = 0,
    /// Output interrupt signal on INT/SQW pin
    Interrupt = 1,
}
impl From<u8> for InterruptControl {
    /// Creates an `InterruptControl` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => InterruptControl::SquareWave,
            1 => InterruptControl::Interrupt,
            _ => panic!("Invalid value for InterruptControl: {}", v),
        }
    }
}
impl From<InterruptControl> for u8 {
    fn from(v: InterruptControl) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Hours register with format selection and BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    /// Time representation format (12/24 hour)
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    /// PM flag (12-hour) or 20-hour bit (24-hour)
    pub pm_or_twenty_hours, set_pm_or_twenty_hours: 5;
    /// Tens place of hours
    pub ten_hours, set_ten_hours: 4, 4;
    /// Ones place of hours
    pub hours, set_hours: 3, 0;
}
from_register_u8!(Hours);

bitfield! {
    /// Month register (1-12) with century flag and BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Month(u8);
    impl Debug;
    /// Century flag, set once the year rolled past the configured century
    pub century, set_century: 7;
    /// BCD month with the century bit stripped
    pub bcd_month, set_bcd_month: 4, 0;
}
from_register_u8!(Month);

bitfield! {
    /// Control register for device configuration.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// Oscillator enable/disable control
    pub from into Oscillator, oscillator_enable, set_oscillator_enable: 7, 7;
    /// Enable square wave output on battery power
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// Force temperature conversion
    pub convert_temperature, set_convert_temperature: 5;
    /// Square wave rate select
    pub square_wave_rate, set_square_wave_rate: 4, 3;
    /// INT/SQW pin function control
    pub from into InterruptControl, interrupt_control, set_interrupt_control: 2, 2;
    /// Enable alarm 2 interrupt
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// Enable alarm 1 interrupt
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

bitfield! {
    /// Status register for device state and flags.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Status(u8);
    impl Debug;
    /// Oscillator stop flag
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// Enable 32kHz output
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// Device busy flag
    pub busy, set_busy: 2;
    /// Both alarm flags as a two bit value
    pub alarm_flags, set_alarm_flags: 1, 0;
    /// Alarm 2 flag
    pub alarm2_flag, set_alarm2_flag: 1;
    /// Alarm 1 flag
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

bitfield! {
    /// One of the alarm 2 trigger registers (minutes, hours, day/date).
    ///
    /// All three share the layout that matters here: a mask bit in bit 7 and
    /// the BCD match value below it.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmMatch(u8);
    impl Debug;
    /// Alarm mask bit (A2M2/A2M3/A2M4), set means "don't care"
    pub alarm_mask, set_alarm_mask: 7;
    /// BCD match value
    pub bcd_value, set_bcd_value: 6, 0;
}
from_register_u8!(AlarmMatch);

bitfield! {
    /// Temperature register (integer part).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Temperature(u8);
    impl Debug;
    /// Temperature in degrees Celsius, two's complement
    pub i8, temperature, set_temperature: 7, 0;
}
from_register_u8!(Temperature);

bitfield! {
    /// Temperature register (fractional part).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct TemperatureFraction(u8);
    impl Debug;
    /// Quarter degrees (0-3)
    pub quarters, set_quarters: 7, 6;
}
from_register_u8!(TemperatureFraction);

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status(");
        if self.oscillator_stop_flag() {
            defmt::write!(f, "OSF ");
        }
        if self.enable_32khz_output() {
            defmt::write!(f, "EN32kHz ");
        }
        defmt::write!(f, "A2F={} A1F={})", self.alarm2_flag(), self.alarm1_flag());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_map_matches_reg_addr() {
        let map = RegisterMap::default();
        assert_eq!(map, RegisterMap::DS3231);
        assert_eq!(map.seconds, 0x00);
        assert_eq!(map.minutes, 0x01);
        assert_eq!(map.hours, 0x02);
        assert_eq!(map.alarm2_minutes, 0x0B);
        assert_eq!(map.control, 0x0E);
        assert_eq!(map.status, 0x0F);
        assert_eq!(map.temperature_msb, 0x11);
        assert_eq!(map.temperature_lsb, 0x12);
    }

    #[test]
    fn test_hours_register_conversions() {
        // 24-hour mode, 23h
        let hours = Hours::from(0x23);
        assert_eq!(
            hours.time_representation(),
            TimeRepresentation::TwentyFourHour
        );
        assert!(hours.pm_or_twenty_hours());
        assert_eq!(hours.ten_hours(), 0);
        assert_eq!(hours.hours(), 3);

        // 12-hour mode, 11 PM
        let hours = Hours::from(0x71);
        assert_eq!(hours.time_representation(), TimeRepresentation::TwelveHour);
        assert!(hours.pm_or_twenty_hours());
        assert_eq!(hours.ten_hours(), 1);
        assert_eq!(hours.hours(), 1);
        assert_eq!(u8::from(hours), 0x71);
    }

    #[test]
    fn test_month_register_conversions() {
        let month = Month::from(0x92);
        assert!(month.century());
        assert_eq!(month.bcd_month(), 0x12);

        let mut month = Month::default();
        month.set_bcd_month(0x07);
        assert_eq!(u8::from(month), 0x07);
        month.set_century(true);
        assert_eq!(u8::from(month), 0x87);
    }

    #[test]
    fn test_control_register_conversions() {
        let mut control = Control::default();
        control.set_interrupt_control(InterruptControl::Interrupt);
        control.set_alarm2_interrupt_enable(true);
        assert_eq!(u8::from(control), 0b0000_0110);
        assert_eq!(control.oscillator_enable(), Oscillator::Enabled);

        let control = Control::from(0b1001_1101);
        assert_eq!(control.oscillator_enable(), Oscillator::Disabled);
        assert_eq!(control.square_wave_rate(), 0b11);
        assert_eq!(control.interrupt_control(), InterruptControl::Interrupt);
        assert!(!control.alarm2_interrupt_enable());
        assert!(control.alarm1_interrupt_enable());
    }

    #[test]
    fn test_status_register_conversions() {
        let status = Status::from(0b1000_1011);
        assert!(status.oscillator_stop_flag());
        assert!(status.enable_32khz_output());
        assert!(!status.busy());
        assert_eq!(status.alarm_flags(), 0b11);
        assert!(status.alarm2_flag());
        assert!(status.alarm1_flag());

        let mut status = status;
        status.set_alarm_flags(0);
        status.set_enable_32khz_output(false);
        assert_eq!(u8::from(status), 0b1000_0000);
    }

    #[test]
    fn test_alarm_match_register_conversions() {
        let mut value = AlarmMatch::default();
        value.set_alarm_mask(true);
        assert_eq!(u8::from(value), 0x80);

        let value = AlarmMatch::from(0x59);
        assert!(!value.alarm_mask());
        assert_eq!(value.bcd_value(), 0x59);
    }

    #[test]
    fn test_temperature_register_conversions() {
        assert_eq!(Temperature::from(0x19).temperature(), 25);
        assert_eq!(Temperature::from(0xF6).temperature(), -10);
        assert_eq!(Temperature::from(0x80).temperature(), i8::MIN);
        assert_eq!(TemperatureFraction::from(0xC0).quarters(), 3);
        assert_eq!(TemperatureFraction::from(0x40).quarters(), 1);
    }

    #[test]
    #[should_panic(expected = "Invalid value for TimeRepresentation")]
    fn test_invalid_time_representation_conversion() {
        let _ = TimeRepresentation::from(2);
    }

    #[test]
    #[should_panic(expected = "Invalid value for Oscillator")]
    fn test_invalid_oscillator_conversion() {
        let _ = Oscillator::from(2);
    }

    #[test]
    #[should_panic(expected = "Invalid value for InterruptControl")]
    fn test_invalid_interrupt_control_conversion() {
        let _ = InterruptControl::from(2);
    }
}
