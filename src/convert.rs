//! Unit conversions between temperature, sensor voltage, converter codes
//! and the single-byte stored representation.
//!
//! Every function here is pure and total: inputs outside the physical range
//! are clamped, never rejected. The sensor model is an LM35 (10 mV/°C) and
//! the converters are 12-bit with a 2.43 V reference.

/// Lowest temperature the store can represent, in °C.
pub const MIN_TEMP: f32 = 0.0;

/// Highest temperature the store can represent, in °C.
pub const MAX_TEMP: f32 = 51.0;

/// Sensor output per degree Celsius, in volts.
pub const SENSOR_VOLTS_PER_DEGREE: f32 = 0.01;

/// Converter reference voltage.
pub const VREF: f32 = 2.43;

/// Largest 12-bit converter code.
pub const MAX_CODE: u16 = 4095;

/// Converter codes per volt (2^12 / VREF).
pub const ADC_CODES_PER_VOLT: f32 = 4096.0 / VREF;

/// Width of one quantization step of the stored byte, in °C.
pub const QUANTUM: f32 = MAX_TEMP / 255.0;

/// Clamps a temperature to `[MIN_TEMP, MAX_TEMP]`. NaN maps to `MIN_TEMP`.
pub fn clamp_temperature(celsius: f32) -> f32 {
    if celsius.is_nan() {
        return MIN_TEMP;
    }
    celsius.clamp(MIN_TEMP, MAX_TEMP)
}

/// Quantizes a temperature to its stored byte, rounding to the nearest step.
pub fn temperature_to_byte(celsius: f32) -> u8 {
    let scaled = clamp_temperature(celsius) / MAX_TEMP * 255.0;
    // scaled is within 0..=255 so the saturating cast only truncates the +0.5
    (scaled + 0.5) as u8
}

/// Expands a stored byte back to a temperature.
pub fn byte_to_temperature(value: u8) -> f32 {
    f32::from(value) / 255.0 * MAX_TEMP
}

/// Sensor output voltage for a temperature.
pub fn temperature_to_voltage(celsius: f32) -> f32 {
    celsius * SENSOR_VOLTS_PER_DEGREE
}

/// Temperature indicated by a sensor voltage.
pub fn voltage_to_temperature(volts: f32) -> f32 {
    volts / SENSOR_VOLTS_PER_DEGREE
}

/// Converter code for a voltage, rounded and saturated to `0..=MAX_CODE`.
pub fn voltage_to_code(volts: f32) -> u16 {
    let scaled = volts * ADC_CODES_PER_VOLT;
    if !(scaled > 0.0) {
        return 0;
    }
    let code = (scaled + 0.5) as u32;
    code.min(u32::from(MAX_CODE)) as u16
}

/// Voltage represented by a converter code.
pub fn code_to_voltage(code: u16) -> f32 {
    f32::from(code) / ADC_CODES_PER_VOLT
}

/// DAC code that makes the loopback read `celsius` after clamping.
pub fn temperature_to_code(celsius: f32) -> u16 {
    voltage_to_code(temperature_to_voltage(clamp_temperature(celsius)))
}

/// Temperature indicated by an ADC code. Not clamped.
pub fn code_to_temperature(code: u16) -> f32 {
    voltage_to_temperature(code_to_voltage(code))
}

/// A temperature sample in its stored single-byte form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample(u8);

impl Sample {
    /// Quantizes a temperature.
    pub fn from_celsius(celsius: f32) -> Self {
        Sample(temperature_to_byte(celsius))
    }

    /// Wraps a byte read from the store.
    pub const fn from_raw(raw: u8) -> Self {
        Sample(raw)
    }

    /// The stored byte.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// The temperature this sample stands for.
    pub fn celsius(self) -> f32 {
        byte_to_temperature(self.0)
    }
}

impl From<u8> for Sample {
    fn from(v: u8) -> Self {
        Sample(v)
    }
}

impl From<Sample> for u8 {
    fn from(v: Sample) -> Self {
        v.0
    }
}
