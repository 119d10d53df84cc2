//! Analog input and output.
//!
//! [`AnalogInput`] and [`AnalogOutput`] are the seams the rest of the crate
//! uses. [`Adc0`] and [`Dac0`] implement them on top of raw register access,
//! and [`Loopback`] simulates the DAC output wired straight into the ADC
//! input for host use.

use core::cell::Cell;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::warn;
use crate::convert::MAX_CODE;
use crate::registers::{AdcChannel, AdcConfig, AmuxSelect, DacCode, Gain};

/// Completion-flag polls an ADC conversion may take before the result is read anyway.
pub const CONVERSION_POLL_LIMIT: u32 = 10_000;

/// A multiplexed, programmable-gain analog-to-digital converter.
pub trait AnalogInput {
    /// Routes `channel` through `gain`, converts, and returns the raw code.
    fn sample(&mut self, channel: AdcChannel, gain: Gain) -> u16;
}

/// A digital-to-analog converter.
pub trait AnalogOutput {
    /// Drives the output with `code`.
    fn output(&mut self, code: u16);
}

/// Raw access to the SAR converter registers.
pub trait AdcRegisters {
    /// Writes the analog multiplexer select register.
    fn set_amux(&mut self, select: AmuxSelect);
    /// Reads the configuration register.
    fn config(&mut self) -> AdcConfig;
    /// Writes the configuration register.
    fn set_config(&mut self, config: AdcConfig);
    /// Clears the completion flag and starts a conversion.
    fn start_conversion(&mut self);
    /// Returns the completion flag.
    fn conversion_done(&mut self) -> bool;
    /// Reads the right-justified result from the data registers.
    fn result(&mut self) -> u16;
}

/// Raw access to the DAC data registers.
pub trait DacRegisters {
    /// Writes the low data register.
    fn set_low(&mut self, value: u8);
    /// Writes the high data register, which latches the new code.
    fn set_high(&mut self, value: u8);
}

/// Register-level ADC driver.
pub struct Adc0<R: AdcRegisters> {
    regs: R,
}

impl<R: AdcRegisters> Adc0<R> {
    /// Wraps the converter registers.
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Gives the registers back.
    pub fn release(self) -> R {
        self.regs
    }
}

impl<R: AdcRegisters> AnalogInput for Adc0<R> {
    fn sample(&mut self, channel: AdcChannel, gain: Gain) -> u16 {
        let mut select = AmuxSelect::default();
        select.set_channel(channel);
        self.regs.set_amux(select);

        let mut config = self.regs.config();
        config.set_gain(gain);
        self.regs.set_config(config);

        self.regs.start_conversion();
        let mut polls = 0;
        while !self.regs.conversion_done() {
            polls += 1;
            if polls >= CONVERSION_POLL_LIMIT {
                #[cfg(any(feature = "log", feature = "defmt"))]
                warn!("ADC: conversion still busy after {} polls", polls);
                break;
            }
            core::hint::spin_loop();
        }
        self.regs.result()
    }
}

/// Register-level DAC driver.
pub struct Dac0<R: DacRegisters> {
    regs: R,
}

impl<R: DacRegisters> Dac0<R> {
    /// Wraps the DAC registers.
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Gives the registers back.
    pub fn release(self) -> R {
        self.regs
    }
}

impl<R: DacRegisters> AnalogOutput for Dac0<R> {
    fn output(&mut self, code: u16) {
        let code = DacCode::from(code);
        self.regs.set_low(code.low());
        self.regs.set_high(code.high());
    }
}

/// DAC output wired into ADC input `Ain0`.
///
/// Both converters share the reference, so the code read back equals the
/// code written, scaled by the front-end gain. Other inputs read ground.
/// Both traits are implemented on `&Loopback`, so one wire can serve as
/// the input and the output of an instrument at the same time.
#[derive(Debug, Default)]
pub struct Loopback {
    wire: Cell<u16>,
}

impl Loopback {
    /// Creates a wire driven at `code`.
    pub const fn new(code: u16) -> Self {
        Self {
            wire: Cell::new(code),
        }
    }

    /// The code currently driven on the wire.
    pub fn code(&self) -> u16 {
        self.wire.get()
    }
}

impl AnalogOutput for &Loopback {
    fn output(&mut self, code: u16) {
        self.wire.set(code.min(MAX_CODE));
    }
}

impl AnalogInput for &Loopback {
    fn sample(&mut self, channel: AdcChannel, gain: Gain) -> u16 {
        match channel {
            AdcChannel::Ain0 => gain.apply(self.wire.get(), MAX_CODE),
            _ => 0,
        }
    }
}
