//! Alarm and power-loss status for the DS3231 RTC.
//!
//! The clock core uses alarm 2 as a once-a-minute tick: all three of its mask
//! bits are set, so it fires at 00 seconds of every minute. The triggered
//! flags and the oscillator-stopped flag live in the status register and are
//! consumed by reading: the driver clears them as part of the same call.

use crate::registers::{AlarmMatch, Control, InterruptControl, Status};

/// Alarm flags taken from the status register.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmFlags {
    /// Alarm 1 had fired
    pub alarm1: bool,
    /// Alarm 2 (the minute tick) had fired
    pub alarm2: bool,
}

impl AlarmFlags {
    /// Both flags as the two low status bits.
    pub const fn bits(self) -> u8 {
        (self.alarm2 as u8) << 1 | self.alarm1 as u8
    }

    /// True when neither alarm fired.
    pub const fn is_empty(self) -> bool {
        !self.alarm1 && !self.alarm2
    }
}

impl From<Status> for AlarmFlags {
    fn from(status: Status) -> Self {
        Self {
            alarm1: status.alarm1_flag(),
            alarm2: status.alarm2_flag(),
        }
    }
}

/// Alarm 2 minutes, hours and day/date registers for a trigger every minute.
pub(crate) fn every_minute_registers() -> [u8; 3] {
    let mut masked = AlarmMatch::default();
    masked.set_alarm_mask(true);
    [masked.into(), masked.into(), masked.into()]
}

/// Control value used by the clock: oscillator running, INT/SQW in interrupt
/// mode and the alarm 2 interrupt enabled.
pub(crate) fn minute_tick_control() -> Control {
    let mut control = Control::default();
    control.set_interrupt_control(InterruptControl::Interrupt);
    control.set_alarm2_interrupt_enable(true);
    control
}

/// Status value to write back after taking the alarm flags, or `None` when no
/// alarm had fired and nothing needs clearing.
pub(crate) fn cleared_alarms(status: Status) -> Option<Status> {
    if status.alarm_flags() == 0 {
        return None;
    }
    let mut cleared = status;
    cleared.set_alarm_flags(0);
    Some(cleared)
}

/// Status value with the oscillator-stopped flag cleared, or `None` if it was
/// not set.
pub(crate) fn cleared_oscillator_stop(status: Status) -> Option<Status> {
    if !status.oscillator_stop_flag() {
        return None;
    }
    let mut cleared = status;
    cleared.set_oscillator_stop_flag(false);
    Some(cleared)
}

/// Status value with the 32kHz output disabled.
pub(crate) fn without_32khz_output(status: Status) -> Status {
    let mut status = status;
    status.set_enable_32khz_output(false);
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_minute_registers() {
        assert_eq!(every_minute_registers(), [0x80, 0x80, 0x80]);
    }

    #[test]
    fn test_minute_tick_control() {
        assert_eq!(u8::from(minute_tick_control()), 0b0000_0110);
    }

    #[test]
    fn test_alarm_flags_from_status() {
        let flags = AlarmFlags::from(Status::from(0b1000_0010));
        assert!(!flags.alarm1);
        assert!(flags.alarm2);
        assert_eq!(flags.bits(), 0b10);
        assert!(!flags.is_empty());

        let flags = AlarmFlags::from(Status::from(0b0000_1011));
        assert_eq!(flags.bits(), 0b11);

        assert!(AlarmFlags::from(Status::from(0x88)).is_empty());
    }

    #[test]
    fn test_cleared_alarms() {
        assert_eq!(cleared_alarms(Status::from(0x88)), None);
        assert_eq!(
            cleared_alarms(Status::from(0x8B)).map(u8::from),
            Some(0x88)
        );
        assert_eq!(cleared_alarms(Status::from(0x01)).map(u8::from), Some(0x00));
    }

    #[test]
    fn test_cleared_oscillator_stop() {
        assert_eq!(cleared_oscillator_stop(Status::from(0x03)), None);
        assert_eq!(
            cleared_oscillator_stop(Status::from(0x83)).map(u8::from),
            Some(0x03)
        );
    }

    #[test]
    fn test_without_32khz_output() {
        assert_eq!(u8::from(without_32khz_output(Status::from(0x8F))), 0x87);
        assert_eq!(u8::from(without_32khz_output(Status::from(0x00))), 0x00);
    }
}
