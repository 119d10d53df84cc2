//! The hardware the tick handler and the console operate on.

use core::fmt::Write;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::analog::{AnalogInput, AnalogOutput};
use crate::config::Config;
use crate::convert::{code_to_temperature, code_to_voltage, temperature_to_code, temperature_to_voltage};
use crate::eeprom::Eeprom;
use crate::registers::{AdcChannel, Gain};

/// Values observed by [`Instrument::loopback_check`].
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopbackReading {
    /// Code driven on the DAC
    pub written: u16,
    /// Code read back from the ADC
    pub read: u16,
    /// Temperature the read code stands for
    pub celsius: f32,
}

/// Store, converter input and simulated sensor output of the logger.
///
/// On targets where the timer interrupt can preempt the foreground, keep the
/// instrument in a `critical_section::Mutex<RefCell<_>>` and borrow it for
/// each tick and each command execution.
pub struct Instrument<I2C: I2c, A: AnalogInput, D: AnalogOutput> {
    pub(crate) store: Eeprom<I2C>,
    pub(crate) adc: A,
    pub(crate) dac: D,
    channel: AdcChannel,
    gain: Gain,
}

impl<I2C: I2c, A: AnalogInput, D: AnalogOutput> Instrument<I2C, A, D> {
    /// Assembles an instrument from its buses.
    pub fn new(i2c: I2C, adc: A, dac: D, config: &Config) -> Self {
        Self {
            store: Eeprom::new(i2c, config.address).with_ack_poll_limit(config.ack_poll_limit),
            adc,
            dac,
            channel: config.channel,
            gain: config.gain,
        }
    }

    /// The byte store.
    pub fn store(&mut self) -> &mut Eeprom<I2C> {
        &mut self.store
    }

    /// Takes one raw converter reading from the sensor input.
    pub fn read_code(&mut self) -> u16 {
        self.adc.sample(self.channel, self.gain)
    }

    /// Takes one reading and converts it to degrees Celsius. Not clamped.
    pub fn read_celsius(&mut self) -> f32 {
        code_to_temperature(self.read_code())
    }

    /// Drives the simulated sensor to `celsius` (clamped) and returns the DAC code.
    pub fn set_celsius(&mut self, celsius: f32) -> u16 {
        let code = temperature_to_code(celsius);
        self.dac.output(code);
        code
    }

    /// Drives the sensor output to `celsius`, waits `settle_ms`, and reads it back.
    ///
    /// Both steps are reported on `out` with their voltages and codes.
    pub fn loopback_check<DL: DelayNs, W: Write>(
        &mut self,
        celsius: f32,
        settle_ms: u32,
        delay: &mut DL,
        out: &mut W,
    ) -> LoopbackReading {
        let written = self.set_celsius(celsius);
        let _ = writeln!(
            out,
            "WRITING: Temp: {:.2}, Voltage: {:.3}, DAC: {}",
            celsius,
            temperature_to_voltage(celsius),
            written
        );

        delay.delay_ms(settle_ms);

        let read = self.read_code();
        let reading = LoopbackReading {
            written,
            read,
            celsius: code_to_temperature(read),
        };
        let _ = writeln!(
            out,
            "READING: Temp: {:.2}, Voltage: {:.3}, ADC: {}",
            reading.celsius,
            code_to_voltage(read),
            read
        );
        reading
    }

    /// Takes the instrument apart.
    pub fn release(self) -> (I2C, A, D) {
        (self.store.release(), self.adc, self.dac)
    }
}
