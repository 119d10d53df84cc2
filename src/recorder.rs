//! Periodic recording state machine.
//!
//! The timer interrupt calls [`Recorder::on_tick`] once per period. While
//! the session is running the recorder accumulates elapsed time and, once
//! per interval, appends one sample to the store with [`record_sample`]:
//!
//! 1. sample the converter and convert to a clamped temperature;
//! 2. read the append pointer (abort the cycle if that fails);
//! 3. write the quantized sample at the next slot;
//! 4. write the new pointer, even when step 3 failed.
//!
//! Steps 3 and 4 fail independently; a failed pointer write leaves the
//! pointer behind the last written slot until the operator resets it.

use core::fmt::Write;

use embedded_hal::i2c::I2c;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::{info, warn};
use crate::analog::{AnalogInput, AnalogOutput};
use crate::config::Config;
use crate::convert::{clamp_temperature, Sample};
use crate::eeprom::{StoreError, POINTER_SLOT};
use crate::instrument::Instrument;
use crate::session::{RecordingState, Session};

/// Slot following `pointer`, skipping the pointer slot on wrap-around.
pub fn next_index(pointer: u8) -> u8 {
    match pointer.wrapping_add(1) {
        POINTER_SLOT => POINTER_SLOT + 1,
        next => next,
    }
}

/// Result of one append sequence whose pointer read succeeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Append<E> {
    /// Slot the sample was written to
    pub index: u8,
    /// Quantized sample
    pub sample: Sample,
    /// Clamped temperature the sample was taken from
    pub celsius: f32,
    /// Outcome of the sample write
    pub sample_write: Result<(), StoreError<E>>,
    /// Outcome of the pointer write
    pub pointer_write: Result<(), StoreError<E>>,
}

impl<E> Append<E> {
    /// Returns `true` when both the sample and the pointer reached the store.
    pub fn is_complete(&self) -> bool {
        self.sample_write.is_ok() && self.pointer_write.is_ok()
    }
}

/// What a timer tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick<E> {
    /// Recording is stopped
    Stopped,
    /// The interval has not elapsed yet
    Waiting,
    /// An append was attempted; `Err` means the pointer could not be read
    Recorded(Result<Append<E>, StoreError<E>>),
}

/// Tick-side recording state: elapsed time since the last sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorder {
    period_ms: u32,
    elapsed_ms: u32,
}

impl Recorder {
    /// Creates a recorder ticking every `config.tick_period_ms`.
    pub fn new(config: &Config) -> Self {
        Self {
            period_ms: config.tick_period_ms,
            elapsed_ms: 0,
        }
    }

    /// Time accumulated since the last sample.
    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// Timer interrupt entry point.
    ///
    /// Diagnostics go to `out` unless the session is quiet.
    pub fn on_tick<I2C, A, D, W>(
        &mut self,
        session: &Session,
        instrument: &mut Instrument<I2C, A, D>,
        out: &mut W,
    ) -> Tick<I2C::Error>
    where
        I2C: I2c,
        A: AnalogInput,
        D: AnalogOutput,
        W: Write,
    {
        if session.state() == RecordingState::Stopped {
            return Tick::Stopped;
        }

        self.elapsed_ms = self.elapsed_ms.saturating_add(self.period_ms);
        if self.elapsed_ms < session.interval_ms() {
            return Tick::Waiting;
        }
        self.elapsed_ms = 0;

        let verbose = !session.is_quiet();
        Tick::Recorded(record_sample(instrument, out, verbose))
    }
}

/// Samples the sensor and appends the reading to the store.
///
/// Progress and failures are written to `out` when `verbose` is set.
pub fn record_sample<I2C, A, D, W>(
    instrument: &mut Instrument<I2C, A, D>,
    out: &mut W,
    verbose: bool,
) -> Result<Append<I2C::Error>, StoreError<I2C::Error>>
where
    I2C: I2c,
    A: AnalogInput,
    D: AnalogOutput,
    W: Write,
{
    let celsius = clamp_temperature(instrument.read_celsius());
    if verbose {
        let _ = writeln!(out, "Read {:.2} C from ADC", celsius);
    }

    let pointer = match instrument.store.pointer() {
        Ok(pointer) => pointer,
        Err(e) => {
            #[cfg(any(feature = "log", feature = "defmt"))]
            warn!("recording: append pointer unreadable");
            if verbose {
                let _ = writeln!(out, "Failed to read last index");
            }
            return Err(e);
        }
    };
    if verbose {
        let _ = writeln!(out, "Last index: {}", pointer);
    }

    let index = next_index(pointer);
    let sample = Sample::from_celsius(celsius);
    if verbose {
        let _ = writeln!(out, "Writing {} to slot {}", sample.raw(), index);
    }

    let sample_write = instrument.store.write(index, sample.raw());
    if sample_write.is_err() {
        #[cfg(any(feature = "log", feature = "defmt"))]
        warn!("recording: sample write to slot {} failed", index);
        if verbose {
            let _ = writeln!(out, "Failed to write sample to slot {}", index);
        }
    }

    let pointer_write = instrument.store.set_pointer(index);
    if pointer_write.is_err() {
        #[cfg(any(feature = "log", feature = "defmt"))]
        warn!("recording: pointer write failed, pointer still {}", pointer);
        if verbose {
            let _ = writeln!(out, "Failed to update last index to {}", index);
        }
    }

    #[cfg(any(feature = "log", feature = "defmt"))]
    info!("recording: slot {} <- {}", index, sample.raw());

    Ok(Append {
        index,
        sample,
        celsius,
        sample_write,
        pointer_write,
    })
}
