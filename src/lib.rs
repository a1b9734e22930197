//! Time-keeping core for clocks built around the DS3231 real-time clock.
//!
//! The driver keeps a decoded [`CivilTime`] snapshot of the chip's BCD
//! registers, writes date and time back with the century bit handled, and
//! evaluates the European daylight saving time rule at the boundary hours.
//!
//! # Features
//!
//! - Time-only (3 register) and full date (7 register) reads
//! - Date/time writes with day-of-week computation and century rollover
//! - Minute and hour stepping that writes back a single register
//! - Destructive reads of the alarm and oscillator-stopped flags
//! - Temperature in Celsius or Fahrenheit
//! - DST evaluation with hysteresis at 03:00/04:00 local time
//! - Optional async support (`async` feature), `log` or `defmt` logging
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_clock::{Adjustment, Clock, Config};
//!
//! let mut clock = Clock::new(i2c, Config::default());
//! clock.init()?;
//! let now = clock.read_time(true)?;
//! match clock.dst_self_adjust(dst_flag)? {
//!     Adjustment::Hold => {}
//!     adjustment => {
//!         clock.apply_dst(adjustment)?;
//!         dst_flag = adjustment == Adjustment::Forward;
//!     }
//! }
//! ```
//!
//! # Bus sharing
//!
//! Every operation is a short sequence of blocking transactions and assumes
//! exclusive use of the bus for its duration. Serializing access with other
//! bus users, and any retry policy, is up to the caller.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod alarm;
#[cfg(feature = "async")]
pub mod asynch;
pub mod codec;
pub mod datetime;
pub mod dst;
pub mod registers;

use chrono::{Datelike, NaiveDateTime, Timelike};
use embedded_hal::i2c::I2c;
use paste::paste;

pub use alarm::AlarmFlags;
pub use codec::BcdDigits;
pub use datetime::CivilTime;
pub use dst::{dst_adjustment, is_dst_active, Adjustment};
pub use registers::{
    Control, InterruptControl, Oscillator, RegAddr, RegisterMap, Status, Temperature,
    TemperatureFraction, TimeRepresentation,
};

use datetime::RawDateTime;

/// Default I2C address of the DS3231.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Default century base: 1900, or 2000 with the `century-2000` feature.
pub const DEFAULT_CENTURY: u16 = if cfg!(feature = "century-2000") {
    2000
} else {
    1900
};

/// Returned by [`Clock::read_temperature_or_sentinel`] when the bus fails.
pub const TEMPERATURE_UNAVAILABLE: i8 = i8::MIN;

/// Device configuration injected at construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// I2C address of the device
    pub address: u8,
    /// Century the two digit year register counts from when the century bit
    /// is clear
    pub century_base: u16,
    /// Register offsets
    pub registers: RegisterMap,
}

impl Config {
    /// Default address, century and DS3231 register map.
    pub const fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            century_base: DEFAULT_CENTURY,
            registers: RegisterMap::DS3231,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit for temperature readings.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnit {
    /// Degrees Celsius, as stored by the chip
    Celsius,
    /// Degrees Fahrenheit, rounded and truncated to `i8`
    Fahrenheit,
}

/// Hour and minute digits for a display refresh.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayDigits {
    /// Hours register digits (24-hour mode)
    pub hours: BcdDigits,
    /// Minutes register digits
    pub minutes: BcdDigits,
    /// True when the minutes register reads 00
    pub top_of_hour: bool,
}

impl DisplayDigits {
    fn from_registers(minutes: u8, hours: u8) -> Self {
        Self {
            hours: BcdDigits::from(hours & 0x3F),
            minutes: BcdDigits::from(minutes),
            top_of_hour: minutes == 0x00,
        }
    }
}

/// Converts a Celsius reading to Fahrenheit, `round(c * 1.8 + 32)`,
/// truncated to `i8`.
pub fn celsius_to_fahrenheit(celsius: i8) -> i8 {
    let tenths = i16::from(celsius) * 18 + 320;
    let rounded = if tenths >= 0 {
        (tenths + 5) / 10
    } else {
        (tenths - 5) / 10
    };
    rounded as i8
}

/// Error type for clock operations.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError<I2CE> {
    /// The device did not acknowledge or the bus failed
    I2c(I2CE),
    /// A date/time that cannot be written to the chip
    InvalidDateTime,
}

impl<I2CE> From<I2CE> for ClockError<I2CE> {
    fn from(e: I2CE) -> Self {
        ClockError::I2c(e)
    }
}

/// Splits a chrono date/time into the arguments of `write_date_time`, `None`
/// for years the chip cannot hold.
pub(crate) fn datetime_fields(datetime: &NaiveDateTime) -> Option<(u8, u8, u8, u8, u8, u16)> {
    let year = u16::try_from(datetime.year()).ok()?;
    Some((
        datetime.second() as u8,
        datetime.minute() as u8,
        datetime.hour() as u8,
        datetime.day() as u8,
        datetime.month() as u8,
        year,
    ))
}

/// DS3231 clock driver.
///
/// Owns the bus handle and one [`CivilTime`] snapshot. Failed operations
/// leave the snapshot as it was.
pub struct Clock<I2C: I2c> {
    i2c: I2C,
    config: Config,
    time: CivilTime,
    present: bool,
}

impl<I2C: I2c> Clock<I2C> {
    /// Creates a new driver instance.
    ///
    /// # Arguments
    /// * `i2c` - An initialized I2C bus
    /// * `config` - Address, century base and register map
    pub fn new(i2c: I2C, config: Config) -> Self {
        Self {
            i2c,
            config,
            time: CivilTime::new(config.century_base),
            present: false,
        }
    }

    /// Creates a driver with the default configuration at `address`.
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self::new(
            i2c,
            Config {
                address,
                ..Config::new()
            },
        )
    }

    /// Releases the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// The configuration this driver was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The last decoded snapshot.
    pub fn time(&self) -> &CivilTime {
        &self.time
    }

    /// Whether the last [`init`](Self::init) found the device.
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Probes the device and configures it for the clock.
    ///
    /// Probing is a zero length write; a missing acknowledgement fails the
    /// call. On success alarm 2 is set to fire every minute, the INT/SQW pin
    /// is switched to interrupt mode with the alarm 2 interrupt enabled, and
    /// the 32kHz output is turned off.
    pub fn init(&mut self) -> Result<(), ClockError<I2C::Error>> {
        let address = self.config.address;
        if let Err(e) = self.i2c.write(address, &[]) {
            error!("DS3231: no acknowledge at {:#x}", address);
            self.present = false;
            return Err(ClockError::I2c(e));
        }
        self.present = true;

        let [minutes, hours, day_date] = alarm::every_minute_registers();
        debug!("DS3231: alarm 2 every minute");
        self.i2c.write(
            address,
            &[self.config.registers.alarm2_minutes, minutes, hours, day_date],
        )?;
        let control = alarm::minute_tick_control();
        debug!("DS3231: writing control {}", u8::from(control));
        self.set_control(control)?;
        let status = self.status()?;
        self.set_status(alarm::without_32khz_output(status))?;
        Ok(())
    }

    /// Reads the time, and the date if `include_date` is set.
    ///
    /// Reads 3 registers (seconds, minutes, hours) or 7 (adding day of week,
    /// date, month and year) starting at the seconds register. Without the
    /// date the date fields keep their previous values.
    pub fn read_time(&mut self, include_date: bool) -> Result<CivilTime, ClockError<I2C::Error>> {
        let mut data = [0; 7];
        let len = if include_date { 7 } else { 3 };
        self.i2c.write_read(
            self.config.address,
            &[self.config.registers.seconds],
            &mut data[..len],
        )?;
        self.time.load_time(&data[..3]);
        if include_date {
            self.time.load_date(&data[3..], self.config.century_base);
        }
        debug!(
            "DS3231: read {}:{}:{} date={}",
            self.time.hour(),
            self.time.minute(),
            self.time.second(),
            include_date
        );
        Ok(self.time)
    }

    /// Reads minutes and hours as unpacked digits, without decoding the date.
    pub fn read_display_digits(&mut self) -> Result<DisplayDigits, ClockError<I2C::Error>> {
        let mut data = [0; 2];
        self.i2c.write_read(
            self.config.address,
            &[self.config.registers.minutes],
            &mut data,
        )?;
        Ok(DisplayDigits::from_registers(data[0], data[1]))
    }

    /// Reads the raw packed BCD seconds register.
    pub fn read_seconds_bcd(&mut self) -> Result<u8, ClockError<I2C::Error>> {
        let mut data = [0];
        self.i2c.write_read(
            self.config.address,
            &[self.config.registers.seconds],
            &mut data,
        )?;
        Ok(data[0])
    }

    /// Writes date and time in one burst and clears the oscillator-stopped
    /// flag.
    ///
    /// `year` is the full year. Out of range inputs wrap rather than fail.
    /// The day of week is computed here, and the century bit is set when
    /// `year` is past the configured century base + 99.
    ///
    /// The local snapshot is not touched; read the time back to refresh it.
    pub fn write_date_time(
        &mut self,
        second: u8,
        minute: u8,
        hour: u8,
        day: u8,
        month: u8,
        year: u16,
    ) -> Result<(), ClockError<I2C::Error>> {
        let raw = RawDateTime::encode(
            second,
            minute,
            hour,
            day,
            month,
            year,
            self.config.century_base,
        );
        let data: [u8; 7] = (&raw).into();
        self.i2c.write(
            self.config.address,
            &[
                self.config.registers.seconds,
                data[0],
                data[1],
                data[2],
                data[3],
                data[4],
                data[5],
                data[6],
            ],
        )?;
        let mut status = self.status()?;
        status.set_oscillator_stop_flag(false);
        self.set_status(status)?;
        Ok(())
    }

    /// Writes a chrono date/time, see [`write_date_time`](Self::write_date_time).
    pub fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), ClockError<I2C::Error>> {
        let (second, minute, hour, day, month, year) =
            datetime_fields(datetime).ok_or(ClockError::InvalidDateTime)?;
        self.write_date_time(second, minute, hour, day, month, year)
    }

    /// Zeroes the seconds on the chip and in the snapshot.
    pub fn reset_seconds(&mut self) -> Result<(), ClockError<I2C::Error>> {
        self.i2c
            .write(self.config.address, &[self.config.registers.seconds, 0])?;
        self.time.set_second(0);
        Ok(())
    }

    /// Steps the minutes by one in `direction`, wrapping 59 <-> 0, and writes
    /// only the minutes register.
    ///
    /// With `refresh` the time is read from the chip first.
    pub fn adjust_minutes(
        &mut self,
        direction: Adjustment,
        refresh: bool,
    ) -> Result<(), ClockError<I2C::Error>> {
        if refresh {
            self.read_time(false)?;
        }
        let mut time = self.time;
        time.step_minute(direction.offset());
        self.i2c.write(
            self.config.address,
            &[self.config.registers.minutes, codec::to_bcd(time.minute())],
        )?;
        self.time = time;
        Ok(())
    }

    /// Steps the hours by one in `direction`, wrapping 23 <-> 0, and writes
    /// only the hours register (24-hour mode).
    ///
    /// With `refresh` the time is read from the chip first.
    pub fn adjust_hours(
        &mut self,
        direction: Adjustment,
        refresh: bool,
    ) -> Result<(), ClockError<I2C::Error>> {
        if refresh {
            self.read_time(false)?;
        }
        let mut time = self.time;
        time.step_hour(direction.offset());
        self.i2c.write(
            self.config.address,
            &[
                self.config.registers.hours,
                codec::to_bcd(time.hour()) & 0x3F,
            ],
        )?;
        self.time = time;
        Ok(())
    }

    /// Reads the integer temperature.
    pub fn read_temperature(
        &mut self,
        unit: TemperatureUnit,
    ) -> Result<i8, ClockError<I2C::Error>> {
        let celsius = self.temperature()?.temperature();
        Ok(match unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
        })
    }

    /// Like [`read_temperature`](Self::read_temperature), returning
    /// [`TEMPERATURE_UNAVAILABLE`] when the bus fails.
    pub fn read_temperature_or_sentinel(&mut self, unit: TemperatureUnit) -> i8 {
        self.read_temperature(unit).unwrap_or_else(|_| {
            warn!("DS3231: temperature read failed");
            TEMPERATURE_UNAVAILABLE
        })
    }

    /// Reads the temperature in degrees Celsius with quarter degree
    /// resolution.
    #[cfg(feature = "temperature_f32")]
    pub fn read_temperature_f32(&mut self) -> Result<f32, ClockError<I2C::Error>> {
        let mut data = [0; 2];
        self.i2c.write_read(
            self.config.address,
            &[self.config.registers.temperature_msb],
            &mut data,
        )?;
        let whole = Temperature::from(data[0]).temperature();
        let quarters = TemperatureFraction::from(data[1]).quarters();
        Ok(f32::from(whole) + f32::from(quarters) * 0.25)
    }

    /// Takes the alarm flags: returns which alarms fired and clears them on
    /// the chip in the same call. A second call without a new trigger
    /// returns no flags.
    pub fn take_alarms(&mut self) -> Result<AlarmFlags, ClockError<I2C::Error>> {
        let status = self.status()?;
        let flags = AlarmFlags::from(status);
        if let Some(cleared) = alarm::cleared_alarms(status) {
            debug!("DS3231: clearing alarm flags {}", flags.bits());
            self.set_status(cleared)?;
        }
        Ok(flags)
    }

    /// Takes the oscillator-stopped flag: true once after a power loss, the
    /// flag is cleared on the chip when seen.
    pub fn take_power_loss(&mut self) -> Result<bool, ClockError<I2C::Error>> {
        let status = self.status()?;
        match alarm::cleared_oscillator_stop(status) {
            Some(cleared) => {
                warn!("DS3231: oscillator was stopped, clearing flag");
                self.set_status(cleared)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reads the full date and time and evaluates the DST rule against it.
    ///
    /// `dst_active` is the caller's DST flag. Applying the result and
    /// updating the flag is up to the caller, see [`apply_dst`](Self::apply_dst).
    pub fn dst_self_adjust(
        &mut self,
        dst_active: bool,
    ) -> Result<Adjustment, ClockError<I2C::Error>> {
        let time = self.read_time(true)?;
        Ok(dst_adjustment(
            time.year(),
            time.month(),
            time.day(),
            time.hour(),
            dst_active,
        ))
    }

    /// Moves the clock one hour in the direction of a DST adjustment.
    pub fn apply_dst(&mut self, adjustment: Adjustment) -> Result<(), ClockError<I2C::Error>> {
        if adjustment == Adjustment::Hold {
            return Ok(());
        }
        self.adjust_hours(adjustment, true)
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $field:ident, $typ:ty)),+) => {
        impl<I2C: I2c> Clock<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub fn $name(&mut self) -> Result<$typ, ClockError<I2C::Error>> {
                        let mut data = [0];
                        self.i2c
                            .write_read(self.config.address, &[self.config.registers.$field], &mut data)?;
                        Ok(<$typ>::from(data[0]))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), ClockError<I2C::Error>> {
                        self.i2c.write(
                            self.config.address,
                            &[self.config.registers.$field, value.into()],
                        )?;
                        Ok(())
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (control, control, Control),
    (status, status, Status),
    (temperature, temperature_msb, Temperature)
);
