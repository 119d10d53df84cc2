//! In-memory stand-ins for the serial line and the EEPROM used by tests.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::console::CharSource;
use crate::eeprom::DEFAULT_ADDRESS;

/// Replays a fixed input; running out of input is a test bug.
pub struct Script<'a> {
    bytes: &'a [u8],
}

impl<'a> Script<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl CharSource for Script<'_> {
    fn poll_char(&mut self) -> Option<u8> {
        match self.bytes {
            [first, rest @ ..] => {
                self.bytes = rest;
                Some(*first)
            }
            [] => panic!("console read past the end of the script"),
        }
    }
}

/// A 256-byte 24Cxx answering at its default address.
///
/// After each data write the device ignores its address for `busy_polls`
/// attempts, like a real part during its write cycle.
pub struct MemoryEeprom {
    pub cells: [u8; 256],
    pub busy_polls: u8,
    pub fail_read: Option<u8>,
    pub fail_write: Option<u8>,
    pending_busy: u8,
    word: u8,
}

impl MemoryEeprom {
    pub fn new() -> Self {
        Self {
            cells: [0; 256],
            busy_polls: 0,
            fail_read: None,
            fail_write: None,
            pending_busy: 0,
            word: 0,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        match *bytes {
            [] => Ok(()),
            [word] => {
                self.word = word;
                Ok(())
            }
            [word, value] => {
                if self.fail_write == Some(word) {
                    return Err(ErrorKind::Other);
                }
                self.cells[usize::from(word)] = value;
                self.word = word.wrapping_add(1);
                self.pending_busy = self.busy_polls;
                Ok(())
            }
            _ => Err(ErrorKind::Overrun),
        }
    }

    fn read_into(&mut self, buffer: &mut [u8]) -> Result<(), ErrorKind> {
        for byte in buffer.iter_mut() {
            if self.fail_read == Some(self.word) {
                return Err(ErrorKind::Other);
            }
            *byte = self.cells[usize::from(self.word)];
            self.word = self.word.wrapping_add(1);
        }
        Ok(())
    }
}

impl ErrorType for MemoryEeprom {
    type Error = ErrorKind;
}

impl I2c for MemoryEeprom {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        if address != DEFAULT_ADDRESS {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        if self.pending_busy > 0 {
            self.pending_busy -= 1;
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.write_bytes(bytes)?,
                Operation::Read(buffer) => self.read_into(buffer)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;
    use crate::analog::Loopback;
    use crate::command::Command;
    use crate::config::Config;
    use crate::console::Console;
    use crate::eeprom::{Eeprom, StoreError};
    use crate::instrument::Instrument;
    use crate::recorder::{Recorder, Tick};
    use crate::session::Session;
    use embedded_hal_bus::i2c::RefCellDevice;

    type Out = heapless::String<4096>;

    #[test]
    fn test_memory_eeprom_busy_after_write() {
        let mut memory = MemoryEeprom::new();
        memory.busy_polls = 2;
        let mut store = Eeprom::new(memory, DEFAULT_ADDRESS).with_ack_poll_limit(3);

        store.write(7, 42).unwrap();
        assert_eq!(store.read(7).unwrap(), 42);

        let mut memory = store.release();
        memory.busy_polls = 5;
        let mut store = Eeprom::new(memory, DEFAULT_ADDRESS).with_ack_poll_limit(3);
        assert_eq!(store.write(8, 1), Err(StoreError::Busy));
    }

    #[test]
    fn test_every_sample_slot_reads_back_what_was_written() {
        let mut store = Eeprom::new(MemoryEeprom::new(), DEFAULT_ADDRESS);

        for value in [0u8, 0x5A, 0xA5, 0xFF] {
            for address in 1..=255u8 {
                let written = value ^ address;
                store.write(address, written).unwrap();
                assert_eq!(store.read(address).unwrap(), written, "slot {}", address);
            }
        }
        assert_eq!(store.pointer().unwrap(), 0);
    }

    #[test]
    fn test_malformed_interval_sets_zero() {
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mut instrument = Instrument::new(MemoryEeprom::new(), &wire, &wire, &Config::default());
        let mut console = Console::new(Script::new(b"iabc\n"), Out::new());

        let result = console.serve(&session, |command, out| {
            assert_eq!(command, Command::SetInterval { seconds: 0 });
            command.execute(&mut instrument, &session, out)
        });

        assert_eq!(result, Some(Ok(())));
        assert_eq!(session.interval_ms(), 0);
        assert!(console.out().contains("New recording interval: 0 seconds!"));
    }

    #[test]
    fn test_failed_sample_write_still_advances_pointer() {
        let mut memory = MemoryEeprom::new();
        memory.cells[0] = 4;
        memory.fail_write = Some(5);
        let wire = Loopback::new(860);
        let mut instrument = Instrument::new(memory, &wire, &wire, &Config::default());
        let mut out = Out::new();

        let append = crate::recorder::record_sample(&mut instrument, &mut out, false).unwrap();

        assert_eq!(append.sample_write, Err(StoreError::Bus(ErrorKind::Other)));
        assert_eq!(append.pointer_write, Ok(()));
        let memory = instrument.release().0;
        assert_eq!(memory.cells[0], 5);
        assert_eq!(memory.cells[5], 0);
    }

    #[test]
    fn test_view_stops_at_unreadable_slot() {
        let mut memory = MemoryEeprom::new();
        memory.cells[..4].copy_from_slice(&[3, 10, 20, 30]);
        memory.fail_read = Some(2);
        let session = Session::new(5000);
        let wire = Loopback::new(0);
        let mut instrument = Instrument::new(memory, &wire, &wire, &Config::default());
        let mut out = Out::new();

        let result = Command::View.execute(&mut instrument, &session, &mut out);

        assert_eq!(result, Err(StoreError::Bus(ErrorKind::Other)));
        assert!(out.starts_with("[1]=2.00\nFailed to read slot 2"));
    }

    #[test]
    fn test_operator_session_on_shared_bus() {
        let bus = RefCell::new(MemoryEeprom::new());
        bus.borrow_mut().busy_polls = 3;
        let session = Session::new(5000);
        let config = Config::default();
        let wire = Loopback::new(0);
        let mut instrument = Instrument::new(RefCellDevice::new(&bus), &wire, &wire, &config);
        let mut recorder = Recorder::new(&config);
        let mut console = Console::new(Script::new(b"i1\nt23.3\nsvrv"), Out::new());

        // set interval to one second, then the simulated temperature
        for _ in 0..2 {
            console
                .serve(&session, |command, out| command.execute(&mut instrument, &session, out))
                .unwrap()
                .unwrap();
        }
        assert_eq!(session.interval_ms(), 1000);
        assert_eq!(wire.code(), 393);

        // start recording and let three intervals pass
        assert_eq!(
            console.serve(&session, |command, out| {
                assert_eq!(command, Command::Start);
                command.execute(&mut instrument, &session, out)
            }),
            Some(Ok(()))
        );
        let mut appended = 0;
        for _ in 0..150 {
            if let Tick::Recorded(Ok(append)) = recorder.on_tick(&session, &mut instrument, console.out()) {
                assert!(append.is_complete());
                appended += 1;
            }
        }
        assert_eq!(appended, 3);
        assert_eq!(bus.borrow().cells[..4], [3, 117, 117, 117]);

        console
            .serve(&session, |command, out| command.execute(&mut instrument, &session, out))
            .unwrap()
            .unwrap();
        assert!(console.out().contains("[1]=23.40\n[2]=23.40\n[3]=23.40\n"));

        console
            .serve(&session, |command, out| command.execute(&mut instrument, &session, out))
            .unwrap()
            .unwrap();
        assert_eq!(bus.borrow().cells[0], 0);

        console
            .serve(&session, |command, out| command.execute(&mut instrument, &session, out))
            .unwrap()
            .unwrap();
        assert!(console.out().ends_with("No samples recorded\n"));
    }
}
