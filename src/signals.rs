//! SIGINT/SIGWINCH flags, following the registration pattern in
//! `examples/davazp-rile/src/bin/rile.rs`
//! (`signal_hook::flag::register(signal_hook::SIGWINCH, ...)`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGWINCH};
use signal_hook::flag;

use crate::error::Result;

/// Owns the flags that SIGINT/SIGWINCH handlers flip; polled from the
/// edit loop instead of acting inside the signal handler itself.
pub struct SignalFlags {
    pub interrupted: Arc<AtomicBool>,
    pub resized: Arc<AtomicBool>,
}

impl SignalFlags {
    /// Registers both handlers. Safe to call once per process; the
    /// underlying `signal-hook` registration is process-global.
    pub fn install() -> Result<SignalFlags> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let resized = Arc::new(AtomicBool::new(false));
        flag::register(SIGINT, interrupted.clone())?;
        flag::register(SIGWINCH, resized.clone())?;
        Ok(SignalFlags { interrupted, resized })
    }

    pub fn take_interrupted(&self) -> bool {
        self.interrupted.swap(false, Ordering::SeqCst)
    }

    pub fn take_resized(&self) -> bool {
        self.resized.swap(false, Ordering::SeqCst)
    }
}
