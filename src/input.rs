//! Byte-to-key decoder: wires a [`ByteReader`] through the ANSI
//! sub-parser and the ESC-disambiguation timeout, and keeps the
//! read-back queue sub-states use to "un-peek" a key.
//!
//! Grounded on `readChar`/`ansiAddCharacter`/`pushFrontChar` in
//! `examples/original_source/linenoise.c`; the timer realization is
//! redesigned per `SPEC_FULL.md` §4.C to use `ByteReader`'s timeout
//! instead of a POSIX interval timer.

use std::collections::VecDeque;
use std::time::Duration;

use log::debug;

use crate::ansi::{AnsiDecoder, Outcome};
use crate::error::Result;
use crate::key::Key;
use crate::term::ByteReader;

/// Outcome of asking the decoder for the next key.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodedKey {
    Key(Key),
    /// End of input (read returned 0 bytes / EOF).
    Eof,
}

pub struct Decoder<R> {
    reader: R,
    esc_timeout: Duration,
    read_back: VecDeque<Key>,
    read_back_capacity: usize,
}

impl<R: ByteReader> Decoder<R> {
    pub fn new(reader: R, esc_timeout: Duration, read_back_capacity: usize) -> Decoder<R> {
        Decoder {
            reader,
            esc_timeout,
            read_back: VecDeque::new(),
            read_back_capacity,
        }
    }

    /// Push a key back onto the front of the queue so the next
    /// `next_key` call returns it again. Used by sub-states that peek
    /// a key and decide it belongs to the caller instead.
    pub fn push_front(&mut self, key: Key) {
        if self.read_back.len() >= self.read_back_capacity {
            self.read_back.pop_back();
        }
        self.read_back.push_front(key);
    }

    pub fn next_key(&mut self) -> Result<DecodedKey> {
        if let Some(k) = self.read_back.pop_front() {
            return Ok(DecodedKey::Key(k));
        }

        let first = match self.reader.read_byte(None)? {
            Some(b) => b,
            None => return Ok(DecodedKey::Eof),
        };

        if first != 0x1b {
            return Ok(DecodedKey::Key(Key::from_byte(first)));
        }

        // Bare ESC vs. the start of CSI/SS2/SS3: wait briefly for the
        // next byte before committing to "lone ESC".
        let second = match self.reader.read_byte(Some(self.esc_timeout))? {
            Some(b) => b,
            None => return Ok(DecodedKey::Key(Key::Esc)),
        };

        let mut decoder = AnsiDecoder::new();
        match decoder.feed(second) {
            Outcome::Done(Some(key)) => Ok(DecodedKey::Key(key)),
            Outcome::Done(None) => {
                debug!("recognized but unmapped escape sequence final byte {:#x}", second);
                Ok(DecodedKey::Key(Key::Unknown(second)))
            }
            Outcome::Invalid => {
                debug!("byte {:#x} after ESC did not start a known sequence", second);
                Ok(DecodedKey::Key(Key::Unknown(second)))
            }
            Outcome::Pending => loop {
                let b = match self.reader.read_byte(Some(self.esc_timeout))? {
                    Some(b) => b,
                    None => return Ok(DecodedKey::Key(Key::Unknown(second))),
                };
                match decoder.feed(b) {
                    Outcome::Done(Some(key)) => return Ok(DecodedKey::Key(key)),
                    Outcome::Done(None) | Outcome::Invalid => {
                        debug!("escape sequence terminated with unmapped byte {:#x}", b);
                        return Ok(DecodedKey::Key(Key::Unknown(b)));
                    }
                    Outcome::Pending => continue,
                }
            },
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::collections::VecDeque;

    /// A scripted item fed to [`ScriptedReader`]: either a byte or a
    /// simulated timeout elapsing.
    pub enum Event {
        Byte(u8),
        Timeout,
    }

    /// A [`ByteReader`] that replays a fixed script instead of reading
    /// a real file descriptor, so the decoder can be exercised without
    /// a TTY, real sleeps, or signals.
    pub struct ScriptedReader {
        events: VecDeque<Event>,
    }

    impl ScriptedReader {
        pub fn new(events: Vec<Event>) -> ScriptedReader {
            ScriptedReader {
                events: events.into_iter().collect(),
            }
        }
    }

    impl ByteReader for ScriptedReader {
        fn read_byte(&mut self, timeout: Option<Duration>) -> Result<Option<u8>> {
            match self.events.pop_front() {
                Some(Event::Byte(b)) => Ok(Some(b)),
                Some(Event::Timeout) => Ok(None),
                None if timeout.is_some() => Ok(None),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{Event, ScriptedReader};
    use super::*;

    fn decoder_from(events: Vec<Event>) -> Decoder<ScriptedReader> {
        Decoder::new(ScriptedReader::new(events), Duration::from_millis(50), 32)
    }

    #[test]
    fn plain_printable_byte() {
        let mut d = decoder_from(vec![Event::Byte(b'x')]);
        assert_eq!(d.next_key().unwrap(), DecodedKey::Key(Key::Char('x')));
    }

    #[test]
    fn lone_esc_times_out_to_esc_key() {
        let mut d = decoder_from(vec![Event::Byte(0x1b), Event::Timeout]);
        assert_eq!(d.next_key().unwrap(), DecodedKey::Key(Key::Esc));
    }

    #[test]
    fn csi_left_arrow_decodes_before_timeout() {
        let mut d = decoder_from(vec![Event::Byte(0x1b), Event::Byte(b'['), Event::Byte(b'D')]);
        assert_eq!(d.next_key().unwrap(), DecodedKey::Key(Key::Left));
    }

    #[test]
    fn push_front_replays_key() {
        let mut d = decoder_from(vec![Event::Byte(b'a')]);
        d.push_front(Key::Tab);
        assert_eq!(d.next_key().unwrap(), DecodedKey::Key(Key::Tab));
        assert_eq!(d.next_key().unwrap(), DecodedKey::Key(Key::Char('a')));
    }

    #[test]
    fn eof_on_empty_read() {
        let mut d = decoder_from(vec![]);
        assert_eq!(d.next_key().unwrap(), DecodedKey::Eof);
    }
}
