//! lineread-demo is a small interactive driver for the library: reads
//! lines at a prompt, offers a toy completion callback, and persists
//! history to a file across runs.

use std::io;
use std::path::PathBuf;

use clap::Parser;

use lineread::config::is_unsupported_term;
use lineread::error::ReadlineStatus;
use lineread::term::{FdReader, RawModeGuard};
use lineread::{CompletionSet, Config, Editor};

const PKG_NAME: &str = env!("CARGO_PKG_NAME");
const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = PKG_NAME, version = PKG_VERSION, about = "Interactive line-editing demo")]
struct Args {
    /// Prompt string to show.
    #[arg(short, long, default_value = "> ")]
    prompt: String,

    /// Path to a history file to load and save.
    #[arg(long)]
    history_file: Option<PathBuf>,

    /// Enable multi-line wrapping instead of single-line scrolling.
    #[arg(long)]
    multiline: bool,
}

const WORDS: &[&str] = &["print", "printf", "printk", "push", "pull", "pwd"];

fn complete(buf: &str, _pos: usize, out: &mut CompletionSet) {
    for word in WORDS {
        if word.starts_with(buf) {
            out.add(word, word, word.len());
        }
    }
}

fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let term = std::env::var("TERM").unwrap_or_default();
    if is_unsupported_term(&term) {
        eprintln!("TERM={} does not support raw-mode editing; falling back to plain reads", term);
        return run_plain(&args);
    }

    let cols = lineread::term::get_columns(libc_stdout_fd());
    let config = Config::builder().multiline(args.multiline).build();
    let mut editor = Editor::new(FdReader::stdin(), io::stdout(), cols, config);
    editor.set_completion_callback(Box::new(complete));

    if let Some(path) = &args.history_file {
        let _ = editor.history_load(path);
    }

    let _guard = RawModeGuard::enable(libc_stdin_fd())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    loop {
        match editor.read_line(&args.prompt) {
            Ok(ReadlineStatus::Text(line)) => {
                println!("\r");
                println!("{}", line);
            }
            Ok(ReadlineStatus::Eof) => {
                println!("\r");
                break;
            }
            Ok(ReadlineStatus::Cancelled) => {
                println!("^C\r");
                continue;
            }
            Err(e) => {
                eprintln!("lineread error: {}", e);
                break;
            }
        }
    }

    if let Some(path) = &args.history_file {
        let _ = editor.history_save(path);
    }

    Ok(())
}

fn run_plain(args: &Args) -> io::Result<()> {
    use std::io::BufRead;
    let stdin = io::stdin();
    loop {
        print!("{}", args.prompt);
        io::Write::flush(&mut io::stdout())?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        println!("{}", line.trim_end());
    }
    Ok(())
}

fn libc_stdin_fd() -> std::os::unix::io::RawFd {
    0
}

fn libc_stdout_fd() -> std::os::unix::io::RawFd {
    1
}
