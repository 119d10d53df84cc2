//! Serial console: blocking character input, line editing and the
//! command prompt.
//!
//! The receive interrupt deposits one byte at a time into the session
//! [`Mailbox`]; the console drains it, echoes every character and turns
//! keypresses into [`Command`]s. Numeric arguments are parsed with the
//! lenient prefix rules of C's `atoi`/`atof`: garbage reads as zero.

use core::fmt::Write;

#[cfg(any(feature = "log", feature = "defmt"))]
use crate::debug;
use crate::command::{Command, Key};
use crate::session::{Mailbox, Session};

/// Size of the line buffer, including the reserved terminator byte.
pub const LINE_CAPACITY: usize = 33;

/// Characters a line can hold.
pub const LINE_CHARS: usize = LINE_CAPACITY - 1;

/// Non-blocking source of received bytes.
pub trait CharSource {
    /// Takes the next received byte, if any.
    fn poll_char(&mut self) -> Option<u8>;
}

impl CharSource for &Mailbox {
    fn poll_char(&mut self) -> Option<u8> {
        self.take()
    }
}

/// How [`Console::read_line`] ended.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineStatus {
    /// A line terminator was read
    Complete,
    /// The buffer filled up; remaining input is left unread
    Truncated,
}

/// Fixed-capacity buffer holding the last line read.
#[derive(Debug, Default)]
pub struct LineBuffer {
    chars: heapless::Vec<u8, LINE_CHARS>,
}

impl LineBuffer {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        Self {
            chars: heapless::Vec::new(),
        }
    }

    /// Empties the buffer.
    pub fn clear(&mut self) {
        self.chars.clear();
    }

    /// Appends a byte; returns `false` when the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        self.chars.push(byte).is_ok()
    }

    /// Returns `true` once [`LINE_CHARS`] bytes are buffered.
    pub fn is_full(&self) -> bool {
        self.chars.is_full()
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns `true` when no byte is buffered.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The buffered bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.chars
    }

    /// The line as text, or `""` if it is not valid UTF-8.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.chars).unwrap_or("")
    }
}

/// Interactive console over a byte source and a text sink.
pub struct Console<S: CharSource, W: Write> {
    source: S,
    out: W,
    line: LineBuffer,
    // a line ended in CR; a LF right after it belongs to the same terminator
    after_cr: bool,
}

impl<S: CharSource, W: Write> Console<S, W> {
    /// Creates a console reading from `source` and echoing to `out`.
    pub fn new(source: S, out: W) -> Self {
        Self {
            source,
            out,
            line: LineBuffer::new(),
            after_cr: false,
        }
    }

    /// The output sink.
    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    /// The last line read.
    pub fn line(&self) -> &LineBuffer {
        &self.line
    }

    /// Gives the source and the sink back.
    pub fn release(self) -> (S, W) {
        (self.source, self.out)
    }

    /// Waits for the next byte, consumes it and echoes it.
    ///
    /// A LF directly following the CR that ended the previous line is
    /// dropped, so CRLF terminals send one terminator per line.
    pub fn read_char(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.source.poll_char() {
                if core::mem::take(&mut self.after_cr) && byte == b'\n' {
                    continue;
                }
                let _ = self.out.write_char(char::from(byte));
                return byte;
            }
            core::hint::spin_loop();
        }
    }

    /// Reads one line into the line buffer.
    ///
    /// Stops at CR, LF or CRLF (not stored) or once [`LINE_CHARS`]
    /// characters are buffered, whichever comes first.
    pub fn read_line(&mut self) -> LineStatus {
        self.line.clear();
        while !self.line.is_full() {
            match self.read_char() {
                b'\r' => {
                    self.after_cr = true;
                    return LineStatus::Complete;
                }
                b'\n' => return LineStatus::Complete,
                byte => {
                    self.line.push(byte);
                }
            }
        }
        #[cfg(any(feature = "log", feature = "defmt"))]
        debug!("console: line truncated at {} characters", LINE_CHARS);
        LineStatus::Truncated
    }

    /// Runs one prompt/command cycle.
    ///
    /// Prompts for a command key and, if it is valid, mutes the tick
    /// diagnostics, collects the command's argument and passes the command
    /// to `execute` together with the output sink. Returns what `execute`
    /// returned, or `None` for an unknown key.
    pub fn serve<F, R>(&mut self, session: &Session, execute: F) -> Option<R>
    where
        F: FnOnce(Command, &mut W) -> R,
    {
        let _ = write!(self.out, "Enter operation (i, t, s, p, v, r, g, z): ");
        let byte = self.read_char();
        let _ = writeln!(self.out);

        let Some(key) = Key::from_byte(byte) else {
            #[cfg(any(feature = "log", feature = "defmt"))]
            debug!("console: invalid key {}", byte);
            let _ = writeln!(self.out, "\nInvalid operation, please try again!");
            return None;
        };

        session.set_quiet(true);
        let _ = writeln!(self.out, "Received operation: {}", char::from(key.as_byte()));
        let command = self.collect(key);
        let result = execute(command, &mut self.out);
        session.set_quiet(false);
        Some(result)
    }

    fn collect(&mut self, key: Key) -> Command {
        match key {
            Key::SetInterval => {
                let _ = write!(self.out, "Enter new recording interval (seconds): ");
                self.read_line();
                let _ = writeln!(self.out);
                Command::SetInterval {
                    seconds: parse_int(self.line.as_bytes()),
                }
            }
            Key::SetTemperature => {
                let _ = write!(self.out, "Enter new temperature: ");
                self.read_line();
                let _ = writeln!(self.out);
                Command::SetTemperature {
                    celsius: parse_float(self.line.as_bytes()),
                }
            }
            Key::Start => Command::Start,
            Key::Stop => Command::Stop,
            Key::View => Command::View,
            Key::ResetPointer => Command::ResetPointer,
            Key::Read => Command::Read,
            Key::Record => Command::Record,
        }
    }
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Splits leading whitespace and an optional sign off `text`.
fn split_sign(text: &[u8]) -> (bool, &[u8]) {
    let start = text.iter().position(|b| !is_space(*b)).unwrap_or(text.len());
    match &text[start..] {
        [b'-', rest @ ..] => (true, rest),
        [b'+', rest @ ..] => (false, rest),
        rest => (false, rest),
    }
}

/// Parses the longest integer prefix of `text`, like C's `atoi`.
///
/// Leading whitespace and a sign are accepted; no digits reads as 0 and
/// out-of-range values saturate.
pub fn parse_int(text: &[u8]) -> i32 {
    let (negative, rest) = split_sign(text);
    let mut value: i32 = 0;
    for byte in rest.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = i32::from(byte - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

/// Parses the longest decimal prefix of `text`, like C's `atof`.
///
/// Accepts `.` or `,` as the decimal separator and an optional exponent.
/// No digits reads as 0.
pub fn parse_float(text: &[u8]) -> f32 {
    let (negative, mut rest) = split_sign(text);
    let mut mantissa: f64 = 0.0;
    let mut digits = 0;

    while let [byte @ b'0'..=b'9', tail @ ..] = rest {
        mantissa = mantissa * 10.0 + f64::from(byte - b'0');
        digits += 1;
        rest = tail;
    }
    if let [b'.' | b',', tail @ ..] = rest {
        rest = tail;
        let mut scale = 1.0;
        while let [byte @ b'0'..=b'9', tail @ ..] = rest {
            scale /= 10.0;
            mantissa += f64::from(byte - b'0') * scale;
            digits += 1;
            rest = tail;
        }
    }
    if digits == 0 {
        return 0.0;
    }

    if let [b'e' | b'E', tail @ ..] = rest {
        let (exponent_negative, exponent_digits) = split_exponent_sign(tail);
        if exponent_digits.first().is_some_and(u8::is_ascii_digit) {
            let mut exponent: u32 = 0;
            for byte in exponent_digits.iter().take_while(|b| b.is_ascii_digit()) {
                exponent = exponent.saturating_mul(10).saturating_add(u32::from(byte - b'0'));
            }
            // f32 overflows to infinity or underflows to zero well before this
            for _ in 0..exponent.min(64) {
                if exponent_negative {
                    mantissa /= 10.0;
                } else {
                    mantissa *= 10.0;
                }
            }
        }
    }

    let value = mantissa as f32;
    if negative {
        -value
    } else {
        value
    }
}

fn split_exponent_sign(text: &[u8]) -> (bool, &[u8]) {
    match text {
        [b'-', rest @ ..] => (true, rest),
        [b'+', rest @ ..] => (false, rest),
        rest => (false, rest),
    }
}
