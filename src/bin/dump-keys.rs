//! Reads and prints decoded keys until 'q' is pressed. Handy for
//! checking that a given terminal emulator's escape sequences decode
//! the way this crate expects.

use std::time::Duration;

use lineread::input::Decoder;
use lineread::key::Key;
use lineread::term::{FdReader, RawModeGuard};

fn main() {
    println!("Reading and printing keys. Press 'q' to exit.\r");

    let guard = RawModeGuard::enable(0);
    let guard = match guard {
        Ok(g) => g,
        Err(e) => {
            eprintln!("could not enable raw mode: {}", e);
            return;
        }
    };

    let mut decoder = Decoder::new(FdReader::stdin(), Duration::from_millis(50), 32);
    loop {
        match decoder.next_key() {
            Ok(lineread::input::DecodedKey::Key(key)) => {
                print!("{:?}\r\n", key);
                if key == Key::Char('q') {
                    break;
                }
            }
            Ok(lineread::input::DecodedKey::Eof) => break,
            Err(e) => {
                eprintln!("read error: {}\r", e);
                break;
            }
        }
    }

    drop(guard);
}
