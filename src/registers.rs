//! Register definitions and bitfield structures for the store and converters.
//!
//! This module models the bytes the firmware exchanges with hardware: the
//! control byte that addresses a 24Cxx serial EEPROM, the analog multiplexer
//! select and converter configuration registers of the SAR ADC, and the
//! split low/high data registers of the 12-bit DAC.

use bitfield::bitfield;

/// Device type identifier of 24Cxx serial EEPROMs (upper nibble of the control byte).
pub const EEPROM_DEVICE_TYPE: u8 = 0b1010;

/// Transfer direction encoded in bit 0 of an I2C control byte.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master writes to the device
    Write = 0,
    /// Master reads from the device
    Read = 1,
}
impl From<u8> for Direction {
    /// Creates a `Direction` from the R/W bit. Only bit 0 is considered.
    fn from(v: u8) -> Self {
        match v & 0x01 {
            0 => Direction::Write,
            _ => Direction::Read,
        }
    }
}
impl From<Direction> for u8 {
    fn from(v: Direction) -> Self {
        v as u8
    }
}

/// Analog multiplexer inputs of the converter.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    /// AIN0.0
    Ain0 = 0,
    /// AIN0.1
    Ain1 = 1,
    /// AIN0.2
    Ain2 = 2,
    /// AIN0.3
    Ain3 = 3,
    /// High-voltage differential amplifier
    Hvda = 4,
    /// Analog ground
    Agnd = 5,
    /// Even port 3 pins
    P3Even = 6,
    /// Odd port 3 pins
    P3Odd = 7,
    /// On-chip temperature sensor
    Temperature = 8,
}
impl From<u8> for AdcChannel {
    /// Creates an `AdcChannel` from the AMUX select bits.
    ///
    /// Every select value with bit 3 set routes the temperature sensor.
    fn from(v: u8) -> Self {
        match v & 0x0f {
            0 => AdcChannel::Ain0,
            1 => AdcChannel::Ain1,
            2 => AdcChannel::Ain2,
            3 => AdcChannel::Ain3,
            4 => AdcChannel::Hvda,
            5 => AdcChannel::Agnd,
            6 => AdcChannel::P3Even,
            7 => AdcChannel::P3Odd,
            _ => AdcChannel::Temperature,
        }
    }
}
impl From<AdcChannel> for u8 {
    fn from(v: AdcChannel) -> Self {
        v as u8
    }
}

/// Programmable gain of the converter front-end.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Gain of 1
    X1 = 0,
    /// Gain of 2
    X2 = 1,
    /// Gain of 4
    X4 = 2,
    /// Gain of 8
    X8 = 3,
    /// Gain of 16
    X16 = 4,
    /// Gain of 0.5
    Half = 6,
}
impl From<u8> for Gain {
    /// Creates a `Gain` from the three gain bits.
    ///
    /// Codes `0b10x` both select 16 and `0b11x` both select 0.5.
    fn from(v: u8) -> Self {
        match v & 0b111 {
            0 => Gain::X1,
            1 => Gain::X2,
            2 => Gain::X4,
            3 => Gain::X8,
            4 | 5 => Gain::X16,
            _ => Gain::Half,
        }
    }
}
impl From<Gain> for u8 {
    fn from(v: Gain) -> Self {
        v as u8
    }
}

impl Gain {
    /// Applies the gain to a raw code, saturating at `max`.
    pub fn apply(self, code: u16, max: u16) -> u16 {
        let scaled = match self {
            Gain::X1 => u32::from(code),
            Gain::X2 => u32::from(code) * 2,
            Gain::X4 => u32::from(code) * 4,
            Gain::X8 => u32::from(code) * 8,
            Gain::X16 => u32::from(code) * 16,
            Gain::Half => u32::from(code) / 2,
        };
        u16::try_from(scaled).unwrap_or(u16::MAX).min(max)
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Control byte sent after a START condition to address a serial EEPROM.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct ControlByte(u8);
    impl Debug;
    /// Device type identifier (0b1010 for 24Cxx parts)
    pub device_type, set_device_type: 7, 4;
    /// Levels of the A2..A0 chip-select pins
    pub chip_select, set_chip_select: 3, 1;
    /// Transfer direction
    pub from into Direction, direction, set_direction: 0, 0;
}
from_register_u8!(ControlByte);

impl ControlByte {
    /// Builds the control byte of a 24Cxx EEPROM with the given chip-select pins.
    pub fn eeprom(chip_select: u8, direction: Direction) -> Self {
        let mut value = ControlByte::default();
        value.set_device_type(EEPROM_DEVICE_TYPE);
        value.set_chip_select(chip_select & 0b111);
        value.set_direction(direction);
        value
    }

    /// The 7-bit bus address carried in the upper bits of the control byte.
    pub fn address(&self) -> u8 {
        self.0 >> 1
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ControlByte {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ControlByte(addr={=u8:#x}, {})", self.address(), self.direction());
    }
}

bitfield! {
    /// Analog multiplexer select register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AmuxSelect(u8);
    impl Debug;
    /// Routed input
    pub from into AdcChannel, channel, set_channel: 3, 0;
}
from_register_u8!(AmuxSelect);

bitfield! {
    /// Converter configuration register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AdcConfig(u8);
    impl Debug;
    /// SAR conversion clock divider
    pub sar_clock, set_sar_clock: 7, 3;
    /// Front-end gain
    pub from into Gain, gain, set_gain: 2, 0;
}
from_register_u8!(AdcConfig);

#[cfg(feature = "defmt")]
impl defmt::Format for AdcConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "AdcConfig(sar={=u8}, {})", self.sar_clock(), self.gain());
    }
}

bitfield! {
    /// A right-justified 12-bit DAC code split over the low and high data registers.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct DacCode(u16);
    impl Debug;
    /// Value for the low data register
    pub u8, low, set_low: 7, 0;
    /// Value for the high data register
    pub u8, high, set_high: 11, 8;
}

impl From<u16> for DacCode {
    fn from(v: u16) -> Self {
        DacCode(v & 0x0fff)
    }
}
impl From<DacCode> for u16 {
    fn from(v: DacCode) -> Self {
        v.0
    }
}
