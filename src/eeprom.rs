//! Byte store driver for 24Cxx serial EEPROMs.
//!
//! Every call is one complete bus transaction on a single byte. Writes are
//! followed by acknowledge polling: the device does not answer its address
//! while the internal write cycle runs, so the driver re-addresses it until
//! it acknowledges, giving up after a bounded number of attempts.
//!
//! # Example
//!
//! ```rust,ignore
//! use thermolog::Eeprom;
//!
//! let mut store = Eeprom::new(i2c, 0x50);
//! store.write(1, 0x7f)?;
//! assert_eq!(store.read(1)?, 0x7f);
//! ```

use core::fmt;

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::{debug, warn};
use crate::config::DEFAULT_ACK_POLL_LIMIT;
use crate::convert::Sample;

/// Slot holding the append pointer.
pub const POINTER_SLOT: u8 = 0;

/// 7-bit bus address of a 24Cxx with all chip-select pins low (0xA0 on the wire).
pub const DEFAULT_ADDRESS: u8 = 0x50;

/// Errors reported by the byte store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreError<E> {
    /// The bus reported an unexpected status; the transaction was abandoned
    Bus(E),
    /// The device kept refusing its address after a write
    Busy,
}

impl<E> From<E> for StoreError<E> {
    fn from(e: E) -> Self {
        StoreError::Bus(e)
    }
}

impl<E: fmt::Debug> fmt::Display for StoreError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Bus(e) => write!(f, "bus error {:?}", e),
            StoreError::Busy => write!(f, "device busy"),
        }
    }
}

/// Returns `true` when a bus error means "device busy, address not acknowledged".
pub(crate) fn is_busy(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::NoAcknowledge(_))
}

/// Serial EEPROM driver.
pub struct Eeprom<I2C: I2c> {
    pub(crate) i2c: I2C,
    address: u8,
    ack_poll_limit: u16,
}

impl<I2C: I2c> Eeprom<I2C> {
    /// Creates a driver for the device at the given 7-bit address.
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            ack_poll_limit: DEFAULT_ACK_POLL_LIMIT,
        }
    }

    /// Sets how many busy answers a write tolerates before reporting [`StoreError::Busy`].
    pub fn with_ack_poll_limit(mut self, limit: u16) -> Self {
        self.ack_poll_limit = limit;
        self
    }

    /// The 7-bit bus address of the device.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Reads the byte at `address`.
    ///
    /// # Returns
    /// * `Ok(u8)` - The stored byte
    /// * `Err(StoreError::Bus)` - The transaction failed at any phase
    pub fn read(&mut self, address: u8) -> Result<u8, StoreError<I2C::Error>> {
        let mut data = [0];
        self.i2c.write_read(self.address, &[address], &mut data)?;
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("EEPROM: read [{}] = {}", address, data[0]);
        Ok(data[0])
    }

    /// Writes `value` at `address` and waits for the write cycle to finish.
    ///
    /// # Returns
    /// * `Ok(())` - The device acknowledged after its write cycle
    /// * `Err(StoreError::Bus)` - The transaction failed at any phase
    /// * `Err(StoreError::Busy)` - The device never came back
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), StoreError<I2C::Error>> {
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("EEPROM: write [{}] = {}", address, value);
        self.i2c.write(self.address, &[address, value])?;
        self.wait_for_write_cycle()
    }

    fn wait_for_write_cycle(&mut self) -> Result<(), StoreError<I2C::Error>> {
        for _ in 0..self.ack_poll_limit {
            match self.i2c.write(self.address, &[]) {
                Ok(()) => return Ok(()),
                Err(e) if is_busy(e.kind()) => continue,
                Err(e) => return Err(StoreError::Bus(e)),
            }
        }
        #[cfg(any(feature = "log", feature = "defmt"))]
        warn!("EEPROM: no acknowledge after {} polls", self.ack_poll_limit);
        Err(StoreError::Busy)
    }

    /// Reads the append pointer.
    pub fn pointer(&mut self) -> Result<u8, StoreError<I2C::Error>> {
        self.read(POINTER_SLOT)
    }

    /// Overwrites the append pointer.
    pub fn set_pointer(&mut self, index: u8) -> Result<(), StoreError<I2C::Error>> {
        self.write(POINTER_SLOT, index)
    }

    /// Marks the store empty.
    pub fn reset_pointer(&mut self) -> Result<(), StoreError<I2C::Error>> {
        self.set_pointer(0)
    }

    /// Reads the sample stored at `index`.
    pub fn read_sample(&mut self, index: u8) -> Result<Sample, StoreError<I2C::Error>> {
        self.read(index).map(Sample::from_raw)
    }
}
