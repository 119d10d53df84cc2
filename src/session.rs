//! State shared between the foreground console and the interrupt handlers.
//!
//! A [`Session`] is meant to live in a `static`: the receive interrupt posts
//! bytes into its [`Mailbox`], the timer tick reads the recording flag, the
//! interval and the suppression flag, and the foreground console writes
//! them. Each field has exactly one writer.
//!
//! Every field sits in a `critical_section::Mutex`, so the session works on
//! cores without atomic read-modify-write or 32-bit atomics.

use core::cell::Cell;

use critical_section::Mutex;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::info;

/// Single-slot receive buffer filled by the serial interrupt.
///
/// Posting while a byte is still pending replaces it; the hardware only
/// buffers one character.
#[derive(Debug)]
pub struct Mailbox {
    slot: Mutex<Cell<Option<u8>>>,
}

impl Mailbox {
    /// Creates an empty mailbox.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Stores a received byte.
    pub fn post(&self, byte: u8) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Some(byte)));
    }

    /// Takes the pending byte, leaving the mailbox empty.
    pub fn take(&self) -> Option<u8> {
        critical_section::with(|cs| self.slot.borrow(cs).take())
    }

    /// Returns `true` when no byte is pending.
    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).get().is_none())
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the timer tick records samples.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordingState {
    /// Ticks do nothing
    Stopped,
    /// Ticks accumulate time and record once per interval
    Running,
}

/// Flags and mailbox shared by the foreground and both interrupt handlers.
#[derive(Debug)]
pub struct Session {
    recording: Mutex<Cell<bool>>,
    interval_ms: Mutex<Cell<u32>>,
    quiet: Mutex<Cell<bool>>,
    mailbox: Mailbox,
}

impl Session {
    /// Creates a stopped session recording every `interval_ms` once started.
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            recording: Mutex::new(Cell::new(false)),
            interval_ms: Mutex::new(Cell::new(interval_ms)),
            quiet: Mutex::new(Cell::new(false)),
            mailbox: Mailbox::new(),
        }
    }

    /// Starts recording. Starting a running session changes nothing.
    pub fn start(&self) {
        critical_section::with(|cs| self.recording.borrow(cs).set(true));
        #[cfg(any(feature = "log", feature = "defmt"))]
        info!("recording started");
    }

    /// Stops recording. Stopping a stopped session changes nothing.
    pub fn stop(&self) {
        critical_section::with(|cs| self.recording.borrow(cs).set(false));
        #[cfg(any(feature = "log", feature = "defmt"))]
        info!("recording stopped");
    }

    /// Current recording state.
    pub fn state(&self) -> RecordingState {
        if critical_section::with(|cs| self.recording.borrow(cs).get()) {
            RecordingState::Running
        } else {
            RecordingState::Stopped
        }
    }

    /// Time between two recorded samples, in milliseconds.
    pub fn interval_ms(&self) -> u32 {
        critical_section::with(|cs| self.interval_ms.borrow(cs).get())
    }

    /// Changes the time between two recorded samples.
    pub fn set_interval_ms(&self, interval_ms: u32) {
        critical_section::with(|cs| self.interval_ms.borrow(cs).set(interval_ms));
        #[cfg(any(feature = "log", feature = "defmt"))]
        info!("recording interval set to {} ms", interval_ms);
    }

    /// Returns `true` while the console owns the serial output.
    pub fn is_quiet(&self) -> bool {
        critical_section::with(|cs| self.quiet.borrow(cs).get())
    }

    /// Sets or clears the suppression flag.
    pub fn set_quiet(&self, quiet: bool) {
        critical_section::with(|cs| self.quiet.borrow(cs).set(quiet));
    }

    /// The receive mailbox.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Receive interrupt entry point.
    pub fn on_byte_received(&self, byte: u8) {
        self.mailbox.post(byte);
    }
}
