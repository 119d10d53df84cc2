//! Platform-agnostic core of an EEPROM-backed temperature logger.
//!
//! The instrument simulates an LM35-style sensor by driving a DAC with the
//! voltage the sensor would produce, reads it back through an ADC wired to
//! the DAC output, and appends samples to a 24Cxx EEPROM on a timer. A
//! single-character command console runs over a serial line.
//!
//! The crate is `no_std` and never allocates. Hardware is reached through
//! [`embedded_hal::i2c::I2c`] for the store and through the
//! [`AnalogInput`]/[`AnalogOutput`] traits for the converters. Interrupt
//! handlers are modelled as two callbacks:
//!
//! * the periodic timer calls [`Recorder::on_tick`];
//! * the serial receive interrupt calls [`Session::on_byte_received`].
//!
//! The foreground loop calls [`Console::serve`], which blocks on the
//! receive mailbox, collects a [`Command`] and hands it to
//! [`Command::execute`].
//!
//! # Store layout
//!
//! | Slot      | Contents                                      |
//! |-----------|-----------------------------------------------|
//! | 0         | append pointer (0 = empty, else last sample)  |
//! | 1..=255   | quantized samples in append order             |
//!
//! # Example
//!
//! ```rust,ignore
//! use thermolog::{Command, Config, Console, Instrument, Recorder, Session};
//!
//! static SESSION: Session = Session::new(thermolog::config::DEFAULT_INTERVAL_MS);
//!
//! let config = Config::default();
//! let mut instrument = Instrument::new(i2c, adc, dac, &config);
//! let mut recorder = Recorder::new(&config);
//!
//! // timer interrupt
//! recorder.on_tick(&SESSION, &mut instrument, &mut uart);
//!
//! // foreground
//! let mut console = Console::new(SESSION.mailbox(), uart);
//! loop {
//!     console.serve(&SESSION, |command, out| {
//!         command.execute(&mut instrument, &SESSION, out)
//!     });
//! }
//! ```

#![no_std]

#[cfg(all(feature = "log", not(feature = "defmt")))]
#[allow(unused_imports)]
use log::{debug, info, warn};

#[cfg(feature = "defmt")]
#[allow(unused_imports)]
use defmt::{debug, info, warn};

pub mod analog;
#[cfg(feature = "async")]
pub mod asynch;
pub mod command;
pub mod config;
pub mod console;
pub mod convert;
pub mod eeprom;
pub mod instrument;
pub mod recorder;
pub mod registers;
pub mod session;

#[cfg(test)]
mod fakes;

pub use analog::{Adc0, AdcRegisters, AnalogInput, AnalogOutput, Dac0, DacRegisters, Loopback};
pub use command::{Command, Key};
pub use config::Config;
pub use console::{CharSource, Console, LineBuffer, LineStatus};
pub use convert::Sample;
pub use eeprom::{Eeprom, StoreError};
pub use instrument::{Instrument, LoopbackReading};
pub use recorder::{Append, Recorder, Tick};
pub use registers::{AdcChannel, AdcConfig, AmuxSelect, ControlByte, DacCode, Direction, Gain};
pub use session::{Mailbox, RecordingState, Session};
