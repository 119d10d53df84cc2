//! Operator commands.

use core::fmt::Write;

use embedded_hal::i2c::I2c;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::{info, warn};
use crate::analog::{AnalogInput, AnalogOutput};
use crate::convert::clamp_temperature;
use crate::eeprom::StoreError;
use crate::instrument::Instrument;
use crate::recorder::record_sample;
use crate::session::Session;

/// Command keys, matched case-exactly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Key {
    /// `i`: set the recording interval
    SetInterval = b'i',
    /// `t`: set the simulated temperature
    SetTemperature = b't',
    /// `s`: start recording
    Start = b's',
    /// `p`: stop recording
    Stop = b'p',
    /// `v`: list stored samples
    View = b'v',
    /// `r`: reset the append pointer
    ResetPointer = b'r',
    /// `g`: get one reading
    Read = b'g',
    /// `z`: record one sample now
    Record = b'z',
}

impl Key {
    /// All keys in prompt order.
    pub const ALL: [Key; 8] = [
        Key::SetInterval,
        Key::SetTemperature,
        Key::Start,
        Key::Stop,
        Key::View,
        Key::ResetPointer,
        Key::Read,
        Key::Record,
    ];

    /// Looks up the command bound to `byte`.
    pub fn from_byte(byte: u8) -> Option<Key> {
        Self::ALL.into_iter().find(|key| key.as_byte() == byte)
    }

    /// The byte the operator types.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A parsed operator command with its argument.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Set the recording interval in whole seconds; negative values mean 0
    SetInterval {
        /// Requested interval
        seconds: i32,
    },
    /// Drive the simulated sensor to a temperature
    SetTemperature {
        /// Requested temperature, clamped on execution
        celsius: f32,
    },
    /// Enable recording
    Start,
    /// Disable recording
    Stop,
    /// List the stored samples
    View,
    /// Mark the store empty
    ResetPointer,
    /// Take one reading and print it
    Read,
    /// Append one sample now
    Record,
}

impl Command {
    /// The key that selects this command.
    pub fn key(&self) -> Key {
        match self {
            Command::SetInterval { .. } => Key::SetInterval,
            Command::SetTemperature { .. } => Key::SetTemperature,
            Command::Start => Key::Start,
            Command::Stop => Key::Stop,
            Command::View => Key::View,
            Command::ResetPointer => Key::ResetPointer,
            Command::Read => Key::Read,
            Command::Record => Key::Record,
        }
    }

    /// Runs the command, printing its outcome to `out`.
    ///
    /// Store failures are printed and returned; nothing is retried.
    pub fn execute<I2C, A, D, W>(
        self,
        instrument: &mut Instrument<I2C, A, D>,
        session: &Session,
        out: &mut W,
    ) -> Result<(), StoreError<I2C::Error>>
    where
        I2C: I2c,
        A: AnalogInput,
        D: AnalogOutput,
        W: Write,
    {
        match self {
            Command::SetInterval { seconds } => {
                let seconds = seconds.max(0).unsigned_abs();
                session.set_interval_ms(seconds.saturating_mul(1000));
                let _ = writeln!(out, "New recording interval: {} seconds!", seconds);
            }
            Command::SetTemperature { celsius } => {
                let celsius = clamp_temperature(celsius);
                let code = instrument.set_celsius(celsius);
                #[cfg(any(feature = "log", feature = "defmt"))]
                info!("simulated temperature set, DAC code {}", code);
                let _ = writeln!(
                    out,
                    "Simulated temperature set at {:.2} C (DAC {})!",
                    celsius, code
                );
            }
            Command::Start => {
                session.start();
                let _ = writeln!(out, "Temperature recording enabled!");
            }
            Command::Stop => {
                session.stop();
                let _ = writeln!(out, "Temperature recording disabled!");
            }
            Command::View => return view(instrument, out),
            Command::ResetPointer => match instrument.store().reset_pointer() {
                Ok(()) => {
                    let _ = writeln!(out, "EEPROM address pointer reset!");
                }
                Err(e) => {
                    let _ = writeln!(out, "Failed to reset pointer: {}", e);
                    return Err(e);
                }
            },
            Command::Read => {
                let celsius = instrument.read_celsius();
                let _ = writeln!(out, "Read {:.2} C from ADC", celsius);
            }
            Command::Record => {
                let append = record_sample(instrument, out, true)?;
                if append.is_complete() {
                    let _ = writeln!(
                        out,
                        "Recorded {:.2} C in slot {}",
                        append.sample.celsius(),
                        append.index
                    );
                }
                return append.sample_write.and(append.pointer_write);
            }
        }
        Ok(())
    }
}

/// Prints every stored sample, oldest first.
fn view<I2C, A, D, W>(
    instrument: &mut Instrument<I2C, A, D>,
    out: &mut W,
) -> Result<(), StoreError<I2C::Error>>
where
    I2C: I2c,
    A: AnalogInput,
    D: AnalogOutput,
    W: Write,
{
    let pointer = match instrument.store().pointer() {
        Ok(pointer) => pointer,
        Err(e) => {
            let _ = writeln!(out, "Failed to read last index: {}", e);
            return Err(e);
        }
    };
    if pointer == 0 {
        let _ = writeln!(out, "No samples recorded");
        return Ok(());
    }

    for index in 1..=pointer {
        match instrument.store().read_sample(index) {
            Ok(sample) => {
                let _ = writeln!(out, "[{}]={:.2}", index, sample.celsius());
            }
            Err(e) => {
                #[cfg(any(feature = "log", feature = "defmt"))]
                warn!("view: slot {} unreadable", index);
                let _ = writeln!(out, "Failed to read slot {}: {}", index, e);
                return Err(e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::analog::Loopback;
    use crate::config::Config;
    use crate::eeprom::POINTER_SLOT;
    use crate::session::RecordingState;
    use alloc::vec;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x50;

    type Out = heapless::String<1024>;

    #[test]
    fn test_key_lookup() {
        assert_eq!(Key::from_byte(b'i'), Some(Key::SetInterval));
        assert_eq!(Key::from_byte(b'z'), Some(Key::Record));
        assert_eq!(Key::from_byte(b'I'), None);
        assert_eq!(Key::from_byte(b'x'), None);
        for key in Key::ALL {
            assert_eq!(Key::from_byte(key.as_byte()), Some(key));
        }
        assert_eq!(Command::View.key(), Key::View);
        assert_eq!(Command::SetInterval { seconds: 3 }.key(), Key::SetInterval);
    }

    #[test]
    fn test_set_interval() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mut instrument = Instrument::new(I2cMock::new(&[]), &wire, &wire, &Config::default());
        let mut out = Out::new();

        Command::SetInterval { seconds: 10 }
            .execute(&mut instrument, &session, &mut out)
            .unwrap();
        assert_eq!(session.interval_ms(), 10_000);
        assert!(out.contains("New recording interval: 10 seconds!"));

        Command::SetInterval { seconds: -3 }
            .execute(&mut instrument, &session, &mut out)
            .unwrap();
        assert_eq!(session.interval_ms(), 0);

        Command::SetInterval { seconds: i32::MAX }
            .execute(&mut instrument, &session, &mut out)
            .unwrap();
        assert_eq!(session.interval_ms(), u32::MAX);
        instrument.release().0.done();
    }

    #[test]
    fn test_set_temperature_drives_dac() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mut instrument = Instrument::new(I2cMock::new(&[]), &wire, &wire, &Config::default());
        let mut out = Out::new();

        Command::SetTemperature { celsius: 23.3 }
            .execute(&mut instrument, &session, &mut out)
            .unwrap();
        assert_eq!(wire.code(), 393);
        assert!(out.contains("Simulated temperature set at 23.30 C (DAC 393)!"));

        Command::SetTemperature { celsius: 99.0 }
            .execute(&mut instrument, &session, &mut out)
            .unwrap();
        assert_eq!(wire.code(), 860);
        instrument.release().0.done();
    }

    #[test]
    fn test_start_and_stop() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mut instrument = Instrument::new(I2cMock::new(&[]), &wire, &wire, &Config::default());
        let mut out = Out::new();

        Command::Start.execute(&mut instrument, &session, &mut out).unwrap();
        assert_eq!(session.state(), RecordingState::Running);
        Command::Stop.execute(&mut instrument, &session, &mut out).unwrap();
        assert_eq!(session.state(), RecordingState::Stopped);
        assert!(out.contains("enabled!"));
        assert!(out.contains("disabled!"));
        instrument.release().0.done();
    }

    #[test]
    fn test_view_empty_store_reads_only_pointer() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mock = I2cMock::new(&[I2cTrans::write_read(DEVICE_ADDRESS, vec![POINTER_SLOT], vec![0])]);
        let mut instrument = Instrument::new(mock, &wire, &wire, &Config::default());
        let mut out = Out::new();

        Command::View.execute(&mut instrument, &session, &mut out).unwrap();
        assert_eq!(out.as_str(), "No samples recorded\n");
        instrument.release().0.done();
    }

    #[test]
    fn test_view_lists_samples() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![POINTER_SLOT], vec![3]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![1], vec![0]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![2], vec![255]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![3], vec![128]),
        ]);
        let mut instrument = Instrument::new(mock, &wire, &wire, &Config::default());
        let mut out = Out::new();

        Command::View.execute(&mut instrument, &session, &mut out).unwrap();
        assert_eq!(out.as_str(), "[1]=0.00\n[2]=51.00\n[3]=25.60\n");
        instrument.release().0.done();
    }

    #[test]
    fn test_view_aborts_on_first_read_error() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![POINTER_SLOT], vec![3]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![1], vec![10]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![2], vec![0]).with_error(ErrorKind::Other),
        ]);
        let mut instrument = Instrument::new(mock, &wire, &wire, &Config::default());
        let mut out = Out::new();

        let result = Command::View.execute(&mut instrument, &session, &mut out);

        assert_eq!(result, Err(StoreError::Bus(ErrorKind::Other)));
        assert!(out.starts_with("[1]=2.00\n"));
        assert!(out.contains("Failed to read slot 2: bus error Other"));
        assert!(!out.contains("[3]"));
        instrument.release().0.done();
    }

    #[test]
    fn test_view_reports_unreadable_pointer() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![POINTER_SLOT], vec![0]).with_error(ErrorKind::Bus)
        ]);
        let mut instrument = Instrument::new(mock, &wire, &wire, &Config::default());
        let mut out = Out::new();

        let result = Command::View.execute(&mut instrument, &session, &mut out);

        assert_eq!(result, Err(StoreError::Bus(ErrorKind::Bus)));
        assert!(out.contains("Failed to read last index"));
        instrument.release().0.done();
    }

    #[test]
    fn test_reset_pointer_writes_zero_to_slot_zero() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mock = I2cMock::new(&[
            I2cTrans::write(DEVICE_ADDRESS, vec![0x00, 0x00]),
            I2cTrans::write(DEVICE_ADDRESS, vec![]),
        ]);
        let mut instrument = Instrument::new(mock, &wire, &wire, &Config::default());
        let mut out = Out::new();

        Command::ResetPointer.execute(&mut instrument, &session, &mut out).unwrap();
        assert!(out.contains("pointer reset!"));
        instrument.release().0.done();
    }

    #[test]
    fn test_read_prints_temperature() {
        let session = Session::new(5000);
        let wire = Loopback::new(393);
        let mut instrument = Instrument::new(I2cMock::new(&[]), &wire, &wire, &Config::default());
        let mut out = Out::new();

        Command::Read.execute(&mut instrument, &session, &mut out).unwrap();
        assert_eq!(out.as_str(), "Read 23.32 C from ADC\n");
        instrument.release().0.done();
    }

    #[test]
    fn test_record_appends_once() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mock = I2cMock::new(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![POINTER_SLOT], vec![0]),
            I2cTrans::write(DEVICE_ADDRESS, vec![1, 0]),
            I2cTrans::write(DEVICE_ADDRESS, vec![]),
            I2cTrans::write(DEVICE_ADDRESS, vec![POINTER_SLOT, 1]),
            I2cTrans::write(DEVICE_ADDRESS, vec![]),
        ]);
        let mut instrument = Instrument::new(mock, &wire, &wire, &Config::default());
        let mut out = Out::new();

        Command::Record.execute(&mut instrument, &session, &mut out).unwrap();
        assert!(out.contains("Last index: 0\n"));
        assert!(out.ends_with("Recorded 0.00 C in slot 1\n"));
        assert_eq!(session.state(), RecordingState::Stopped);
        instrument.release().0.done();
    }
}
