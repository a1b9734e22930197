//! Async implementation of the clock driver.
//!
//! This module provides the same operations as [`crate::Clock`] on top of the
//! `embedded-hal-async` I2C traits. It is only available when the `async`
//! feature is enabled.
//!
//! # Example
//!
//! ```rust,ignore
//! use ds3231_clock::{asynch::Clock, Config};
//!
//! let mut clock = Clock::new(i2c, Config::default());
//! clock.init().await?;
//! let now = clock.read_time(true).await?;
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::{
    alarm, celsius_to_fahrenheit, codec, datetime::RawDateTime, datetime_fields, dst_adjustment,
    Adjustment, AlarmFlags, CivilTime, ClockError, Config, Control, DisplayDigits, Status,
    Temperature, TemperatureUnit, TEMPERATURE_UNAVAILABLE,
};

/// DS3231 clock async driver.
pub struct Clock<I2C: I2c> {
    i2c: I2C,
    config: Config,
    time: CivilTime,
    present: bool,
}

impl<I2C: I2c> Clock<I2C> {
    /// Creates a new async driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `config` - Address, century base and register map
    pub fn new(i2c: I2C, config: Config) -> Self {
        Self {
            i2c,
            config,
            time: CivilTime::new(config.century_base),
            present: false,
        }
    }

    /// Releases the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// The last decoded snapshot.
    pub fn time(&self) -> &CivilTime {
        &self.time
    }

    /// Whether the last [`init`](Self::init) found the device.
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Probes the device and configures alarm 2, control and status, see
    /// [`crate::Clock::init`].
    pub async fn init(&mut self) -> Result<(), ClockError<I2C::Error>> {
        let address = self.config.address;
        if let Err(e) = self.i2c.write(address, &[]).await {
            error!("DS3231: no acknowledge at {:#x}", address);
            self.present = false;
            return Err(ClockError::I2c(e));
        }
        self.present = true;

        let [minutes, hours, day_date] = alarm::every_minute_registers();
        self.i2c
            .write(
                address,
                &[self.config.registers.alarm2_minutes, minutes, hours, day_date],
            )
            .await?;
        self.set_control(alarm::minute_tick_control()).await?;
        let status = self.status().await?;
        self.set_status(alarm::without_32khz_output(status)).await?;
        Ok(())
    }

    /// Reads the time, and the date if `include_date` is set.
    pub async fn read_time(
        &mut self,
        include_date: bool,
    ) -> Result<CivilTime, ClockError<I2C::Error>> {
        let mut data = [0; 7];
        let len = if include_date { 7 } else { 3 };
        self.i2c
            .write_read(
                self.config.address,
                &[self.config.registers.seconds],
                &mut data[..len],
            )
            .await?;
        self.time.load_time(&data[..3]);
        if include_date {
            self.time.load_date(&data[3..], self.config.century_base);
        }
        Ok(self.time)
    }

    /// Reads minutes and hours as unpacked digits.
    pub async fn read_display_digits(&mut self) -> Result<DisplayDigits, ClockError<I2C::Error>> {
        let mut data = [0; 2];
        self.i2c
            .write_read(
                self.config.address,
                &[self.config.registers.minutes],
                &mut data,
            )
            .await?;
        Ok(DisplayDigits::from_registers(data[0], data[1]))
    }

    /// Writes date and time in one burst and clears the oscillator-stopped
    /// flag, see [`crate::Clock::write_date_time`].
    pub async fn write_date_time(
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
        self.i2c
            .write(
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
            )
            .await?;
        let mut status = self.status().await?;
        status.set_oscillator_stop_flag(false);
        self.set_status(status).await?;
        Ok(())
    }

    /// Writes a chrono date/time.
    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), ClockError<I2C::Error>> {
        let (second, minute, hour, day, month, year) =
            datetime_fields(datetime).ok_or(ClockError::InvalidDateTime)?;
        self.write_date_time(second, minute, hour, day, month, year)
            .await
    }

    /// Zeroes the seconds on the chip and in the snapshot.
    pub async fn reset_seconds(&mut self) -> Result<(), ClockError<I2C::Error>> {
        self.i2c
            .write(self.config.address, &[self.config.registers.seconds, 0])
            .await?;
        self.time.set_second(0);
        Ok(())
    }

    /// Steps the minutes by one, writing only the minutes register.
    pub async fn adjust_minutes(
        &mut self,
        direction: Adjustment,
        refresh: bool,
    ) -> Result<(), ClockError<I2C::Error>> {
        if refresh {
            self.read_time(false).await?;
        }
        let mut time = self.time;
        time.step_minute(direction.offset());
        self.i2c
            .write(
                self.config.address,
                &[self.config.registers.minutes, codec::to_bcd(time.minute())],
            )
            .await?;
        self.time = time;
        Ok(())
    }

    /// Steps the hours by one, writing only the hours register.
    pub async fn adjust_hours(
        &mut self,
        direction: Adjustment,
        refresh: bool,
    ) -> Result<(), ClockError<I2C::Error>> {
        if refresh {
            self.read_time(false).await?;
        }
        let mut time = self.time;
        time.step_hour(direction.offset());
        self.i2c
            .write(
                self.config.address,
                &[
                    self.config.registers.hours,
                    codec::to_bcd(time.hour()) & 0x3F,
                ],
            )
            .await?;
        self.time = time;
        Ok(())
    }

    /// Reads the integer temperature.
    pub async fn read_temperature(
        &mut self,
        unit: TemperatureUnit,
    ) -> Result<i8, ClockError<I2C::Error>> {
        let celsius = self.temperature().await?.temperature();
        Ok(match unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
        })
    }

    /// Like [`read_temperature`](Self::read_temperature), returning
    /// [`TEMPERATURE_UNAVAILABLE`] when the bus fails.
    pub async fn read_temperature_or_sentinel(&mut self, unit: TemperatureUnit) -> i8 {
        match self.read_temperature(unit).await {
            Ok(t) => t,
            Err(_) => TEMPERATURE_UNAVAILABLE,
        }
    }

    /// Takes and clears the alarm flags.
    pub async fn take_alarms(&mut self) -> Result<AlarmFlags, ClockError<I2C::Error>> {
        let status = self.status().await?;
        if let Some(cleared) = alarm::cleared_alarms(status) {
            self.set_status(cleared).await?;
        }
        Ok(AlarmFlags::from(status))
    }

    /// Takes and clears the oscillator-stopped flag.
    pub async fn take_power_loss(&mut self) -> Result<bool, ClockError<I2C::Error>> {
        let status = self.status().await?;
        match alarm::cleared_oscillator_stop(status) {
            Some(cleared) => {
                warn!("DS3231: oscillator was stopped, clearing flag");
                self.set_status(cleared).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reads the full date and time and evaluates the DST rule against it.
    pub async fn dst_self_adjust(
        &mut self,
        dst_active: bool,
    ) -> Result<Adjustment, ClockError<I2C::Error>> {
        let time = self.read_time(true).await?;
        Ok(dst_adjustment(
            time.year(),
            time.month(),
            time.day(),
            time.hour(),
            dst_active,
        ))
    }

    /// Moves the clock one hour in the direction of a DST adjustment.
    pub async fn apply_dst(&mut self, adjustment: Adjustment) -> Result<(), ClockError<I2C::Error>> {
        if adjustment == Adjustment::Hold {
            return Ok(());
        }
        self.adjust_hours(adjustment, true).await
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $field:ident, $typ:ty)),+) => {
        impl<I2C: I2c> Clock<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    pub async fn $name(&mut self) -> Result<$typ, ClockError<I2C::Error>> {
                        let mut data = [0];
                        self.i2c
                            .write_read(self.config.address, &[self.config.registers.$field], &mut data)
                            .await?;
                        Ok(<$typ>::from(data[0]))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), ClockError<I2C::Error>> {
                        self.i2c.write(
                            self.config.address,
                            &[self.config.registers.$field, value.into()],
                        ).await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x68;

    async fn setup_mock(expectations: &[I2cTrans], century_base: u16) -> Clock<I2cMock> {
        Clock::new(
            I2cMock::new(expectations),
            Config {
                century_base,
                ..Config::default()
            },
        )
    }

    fn done(clock: Clock<I2cMock>) {
        let mut i2c = clock.release();
        i2c.done();
    }

    #[tokio::test]
    async fn test_async_init() {
        let mut clock = setup_mock(
            &[
                I2cTrans::write(DEVICE_ADDRESS, vec![]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x0B, 0x80, 0x80, 0x80]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x0E, 0b0000_0110]),
                I2cTrans::write_read(DEVICE_ADDRESS, vec![0x0F], vec![0x08]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x0F, 0x00]),
            ],
            2000,
        )
        .await;
        clock.init().await.unwrap();
        assert!(clock.is_present());
        done(clock);
    }

    #[tokio::test]
    async fn test_async_init_without_device() {
        let mut clock = setup_mock(
            &[I2cTrans::write(DEVICE_ADDRESS, vec![]).with_error(ErrorKind::Other)],
            2000,
        )
        .await;
        assert!(clock.init().await.is_err());
        assert!(!clock.is_present());
        done(clock);
    }

    #[tokio::test]
    async fn test_async_read_time_with_date() {
        let mut clock = setup_mock(
            &[I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![0x00],
                vec![0x59, 0x59, 0x23, 0x07, 0x31, 0x92, 0x99],
            )],
            1900,
        )
        .await;
        let time = clock.read_time(true).await.unwrap();
        // Century bit set over base 1900: 2099
        assert_eq!(time.year(), 2099);
        assert_eq!(time.month(), 12);
        assert_eq!(time.day(), 31);
        assert_eq!(time.hour(), 23);
        assert_eq!(time.hour12(), 11);
        assert!(time.is_pm());
        done(clock);
    }

    #[tokio::test]
    async fn test_async_write_date_time() {
        // 2024-03-14 15:30:00, Thursday
        let mut clock = setup_mock(
            &[
                I2cTrans::write(
                    DEVICE_ADDRESS,
                    vec![0x00, 0x00, 0x30, 0x15, 0x04, 0x14, 0x03, 0x24],
                ),
                I2cTrans::write_read(DEVICE_ADDRESS, vec![0x0F], vec![0x80]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x0F, 0x00]),
            ],
            2000,
        )
        .await;
        clock.write_date_time(0, 30, 15, 14, 3, 2024).await.unwrap();
        done(clock);
    }

    #[tokio::test]
    async fn test_async_adjust_minutes_and_hours() {
        let mut clock = setup_mock(
            &[
                I2cTrans::write_read(DEVICE_ADDRESS, vec![0x00], vec![0x00, 0x59, 0x23]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x01, 0x00]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x02, 0x00]),
            ],
            2000,
        )
        .await;
        clock.adjust_minutes(Adjustment::Forward, true).await.unwrap();
        clock.adjust_hours(Adjustment::Forward, false).await.unwrap();
        assert_eq!(clock.time().minute(), 0);
        assert_eq!(clock.time().hour(), 0);
        assert_eq!(clock.time().hour12(), 12);
        assert!(!clock.time().is_pm());
        done(clock);
    }

    #[tokio::test]
    async fn test_async_take_alarms_and_power_loss() {
        let mut clock = setup_mock(
            &[
                I2cTrans::write_read(DEVICE_ADDRESS, vec![0x0F], vec![0x81]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x0F, 0x80]),
                I2cTrans::write_read(DEVICE_ADDRESS, vec![0x0F], vec![0x80]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x0F, 0x00]),
            ],
            2000,
        )
        .await;
        let flags = clock.take_alarms().await.unwrap();
        assert!(flags.alarm1);
        assert!(!flags.alarm2);
        assert!(clock.take_power_loss().await.unwrap());
        done(clock);
    }

    #[tokio::test]
    async fn test_async_read_temperature() {
        let mut clock = setup_mock(
            &[
                I2cTrans::write_read(DEVICE_ADDRESS, vec![0x11], vec![0x19]),
                I2cTrans::write_read(DEVICE_ADDRESS, vec![0x11], vec![0x00])
                    .with_error(ErrorKind::Other),
            ],
            2000,
        )
        .await;
        assert_eq!(
            clock
                .read_temperature(TemperatureUnit::Fahrenheit)
                .await
                .unwrap(),
            77
        );
        assert_eq!(
            clock
                .read_temperature_or_sentinel(TemperatureUnit::Celsius)
                .await,
            TEMPERATURE_UNAVAILABLE
        );
        done(clock);
    }

    #[tokio::test]
    async fn test_async_dst_self_adjust() {
        // 2018-03-25 03:00:00
        let mut clock = setup_mock(
            &[
                I2cTrans::write_read(
                    DEVICE_ADDRESS,
                    vec![0x00],
                    vec![0x00, 0x00, 0x03, 0x07, 0x25, 0x03, 0x18],
                ),
                I2cTrans::write_read(DEVICE_ADDRESS, vec![0x00], vec![0x00, 0x00, 0x03]),
                I2cTrans::write(DEVICE_ADDRESS, vec![0x02, 0x04]),
            ],
            2000,
        )
        .await;
        let adjustment = clock.dst_self_adjust(false).await.unwrap();
        assert_eq!(adjustment, Adjustment::Forward);
        clock.apply_dst(adjustment).await.unwrap();
        assert_eq!(clock.time().hour(), 4);
        done(clock);
    }
}
