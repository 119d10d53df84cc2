//! Async byte store driver.
//!
//! The same 24Cxx driver as [`crate::eeprom`] over `embedded-hal-async`
//! traits, issuing the same bus transactions. Only available with the
//! `async` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use thermolog::asynch::Eeprom;
//!
//! let mut store = Eeprom::new(i2c, 0x50);
//! let pointer = store.pointer().await?;
//! store.write(pointer + 1, sample.raw()).await?;
//! ```

use embedded_hal::i2c::Error as _;
use embedded_hal_async::i2c::I2c;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::{debug, warn};
use crate::config::DEFAULT_ACK_POLL_LIMIT;
use crate::convert::Sample;
use crate::eeprom::{is_busy, StoreError, POINTER_SLOT};

/// Serial EEPROM async driver.
pub struct Eeprom<I2C: I2c> {
    i2c: I2C,
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
    pub async fn read(&mut self, address: u8) -> Result<u8, StoreError<I2C::Error>> {
        let mut data = [0];
        self.i2c.write_read(self.address, &[address], &mut data).await?;
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("EEPROM: read [{}] = {}", address, data[0]);
        Ok(data[0])
    }

    /// Writes `value` at `address` and waits for the write cycle to finish.
    pub async fn write(&mut self, address: u8, value: u8) -> Result<(), StoreError<I2C::Error>> {
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("EEPROM: write [{}] = {}", address, value);
        self.i2c.write(self.address, &[address, value]).await?;
        self.wait_for_write_cycle().await
    }

    async fn wait_for_write_cycle(&mut self) -> Result<(), StoreError<I2C::Error>> {
        for _ in 0..self.ack_poll_limit {
            match self.i2c.write(self.address, &[]).await {
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
    pub async fn pointer(&mut self) -> Result<u8, StoreError<I2C::Error>> {
        self.read(POINTER_SLOT).await
    }

    /// Overwrites the append pointer.
    pub async fn set_pointer(&mut self, index: u8) -> Result<(), StoreError<I2C::Error>> {
        self.write(POINTER_SLOT, index).await
    }

    /// Marks the store empty.
    pub async fn reset_pointer(&mut self) -> Result<(), StoreError<I2C::Error>> {
        self.set_pointer(0).await
    }

    /// Reads the sample stored at `index`.
    pub async fn read_sample(&mut self, index: u8) -> Result<Sample, StoreError<I2C::Error>> {
        self.read(index).await.map(Sample::from_raw)
    }
}
