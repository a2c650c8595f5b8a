//! Raw-mode lifecycle and the byte-level read/write primitives the
//! rest of the crate is built on.
//!
//! The raw-mode flag toggling follows `examples/davazp-rile/src/term.rs`
//! closely; the byte reader is new; it exists so the ESC-disambiguation
//! timeout (`examples/original_source/linenoise.c`'s itimer/SIGALRM
//! pair) can be expressed as a plain `poll` with a millisecond timeout
//! instead of a realtime signal, following `examples/other_examples`'
//! `thomcc-rustyline` `tty-unix.rs`.

use std::io::{self, Write};
use std::os::fd::BorrowedFd;
use std::os::unix::io::RawFd;
use std::time::Duration;

use nix::libc;
use nix::poll::{PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{self, SetArg, Termios};
use nix::unistd;

use crate::error::{Error, Result};

/// Saves the terminal's original mode on construction and restores it
/// on drop, so a panic or early return never leaves the user's shell
/// in raw mode.
pub struct RawModeGuard {
    fd: RawFd,
    original: Termios,
}

impl RawModeGuard {
    pub fn enable(fd: RawFd) -> Result<RawModeGuard> {
        let bfd = unsafe { BorrowedFd::borrow_raw(fd) };
        let original = termios::tcgetattr(bfd).map_err(io_err)?;
        let mut raw = original.clone();

        raw.input_flags &= !termios::InputFlags::IXON;
        raw.input_flags &= !termios::InputFlags::ICRNL;
        raw.input_flags &= !termios::InputFlags::BRKINT;
        raw.input_flags &= !termios::InputFlags::INPCK;
        raw.input_flags &= !termios::InputFlags::ISTRIP;

        raw.output_flags &= !termios::OutputFlags::OPOST;

        raw.local_flags &= !termios::LocalFlags::ECHO;
        raw.local_flags &= !termios::LocalFlags::ICANON;
        raw.local_flags &= !termios::LocalFlags::ISIG;
        raw.local_flags &= !termios::LocalFlags::IEXTEN;

        raw.control_flags |= termios::ControlFlags::CS8;

        raw.control_chars[termios::SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[termios::SpecialCharacterIndices::VTIME as usize] = 0;

        termios::tcsetattr(bfd, SetArg::TCSAFLUSH, &raw).map_err(io_err)?;

        Ok(RawModeGuard { fd, original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let bfd = unsafe { BorrowedFd::borrow_raw(self.fd) };
        let _ = termios::tcsetattr(bfd, SetArg::TCSAFLUSH, &self.original);
    }
}

fn io_err(e: nix::Error) -> Error {
    Error::Io(io::Error::from(e))
}

/// Abstracts the "read one byte, optionally with a timeout" operation
/// so the input decoder can be driven either by a real file descriptor
/// or, in tests, by a scripted byte sequence with simulated timeouts.
pub trait ByteReader {
    /// Blocks until one byte is available and returns it, or returns
    /// `Ok(None)` if `timeout` elapses first. `timeout = None` means
    /// block indefinitely.
    fn read_byte(&mut self, timeout: Option<Duration>) -> Result<Option<u8>>;
}

/// A [`ByteReader`] backed by a real file descriptor, using
/// `nix::poll` to implement the timeout.
pub struct FdReader {
    fd: RawFd,
}

impl FdReader {
    pub fn new(fd: RawFd) -> FdReader {
        FdReader { fd }
    }

    pub fn stdin() -> FdReader {
        FdReader::new(libc::STDIN_FILENO)
    }
}

impl ByteReader for FdReader {
    fn read_byte(&mut self, timeout: Option<Duration>) -> Result<Option<u8>> {
        loop {
            let borrowed = unsafe { BorrowedFd::borrow_raw(self.fd) };
            let mut fds = [PollFd::new(borrowed, PollFlags::POLLIN)];
            let poll_timeout: PollTimeout = match timeout {
                Some(d) => (d.as_millis() as u16).into(),
                None => PollTimeout::NONE,
            };
            match nix::poll::poll(&mut fds, poll_timeout) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    let mut buf = [0u8; 1];
                    match unistd::read(self.fd, &mut buf) {
                        Ok(0) => return Ok(None),
                        Ok(_) => return Ok(Some(buf[0])),
                        Err(nix::Error::EINTR) => continue,
                        Err(e) => return Err(io_err(e)),
                    }
                }
                Err(nix::Error::EINTR) => continue,
                Err(e) => return Err(io_err(e)),
            }
        }
    }
}

/// An append buffer: accumulates escape sequences and text so a full
/// screen refresh reaches the terminal as a single `write`, avoiding
/// visible flicker. Grounded on `examples/davazp-rile/src/term.rs`'s
/// `Term::buffer`/`Term::write`/`Term::flush`.
#[derive(Default)]
pub struct AppendBuffer {
    buf: String,
}

impl AppendBuffer {
    pub fn new() -> AppendBuffer {
        AppendBuffer { buf: String::new() }
    }

    pub fn push_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn csi(&mut self, s: &str) {
        self.buf.push_str("\x1b[");
        self.buf.push_str(s);
    }

    pub fn flush_to<W: Write>(&mut self, w: &mut W) -> Result<()> {
        w.write_all(self.buf.as_bytes())?;
        w.flush()?;
        self.buf.clear();
        Ok(())
    }
}

/// Query the terminal's column count via `TIOCGWINSZ`, falling back
/// to 80 columns if the ioctl fails (e.g. output redirected to a pipe
/// during tests).
pub fn get_columns(fd: RawFd) -> usize {
    unsafe {
        let mut winsize: libc::winsize = std::mem::zeroed();
        if libc::ioctl(fd, libc::TIOCGWINSZ, &mut winsize) == -1 || winsize.ws_col == 0 {
            80
        } else {
            winsize.ws_col as usize
        }
    }
}

pub fn isatty(fd: RawFd) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}
