//! Instrument configuration.

use crate::eeprom::DEFAULT_ADDRESS;
use crate::registers::{AdcChannel, ControlByte, Direction, Gain};

/// Period of the recording timer, in milliseconds.
pub const DEFAULT_TICK_PERIOD_MS: u32 = 20;

/// Time between two recorded samples until the operator changes it, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u32 = 5000;

/// Busy answers tolerated while waiting for an EEPROM write cycle.
pub const DEFAULT_ACK_POLL_LIMIT: u16 = 1000;

/// Time the loopback check lets the DAC output settle before sampling, in milliseconds.
pub const LOOPBACK_SETTLE_MS: u32 = 5000;

/// Instrument configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// 7-bit bus address of the EEPROM
    pub address: u8,
    /// Period between two timer ticks
    pub tick_period_ms: u32,
    /// Initial recording interval
    pub interval_ms: u32,
    /// Converter input the sensor is wired to
    pub channel: AdcChannel,
    /// Converter gain used for every reading
    pub gain: Gain,
    /// Busy answers tolerated after an EEPROM write
    pub ack_poll_limit: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            interval_ms: DEFAULT_INTERVAL_MS,
            channel: AdcChannel::Ain0,
            gain: Gain::X1,
            ack_poll_limit: DEFAULT_ACK_POLL_LIMIT,
        }
    }
}

impl Config {
    /// Derives the EEPROM address from the levels of its A2..A0 pins.
    pub fn with_chip_select(mut self, chip_select: u8) -> Self {
        self.address = ControlByte::eeprom(chip_select, Direction::Write).address();
        self
    }
}
