//! Global interrupt flag set by Ctrl+C.
//!
//! The only process-wide mutable state in the crate: POSIX signal handlers
//! must be plain functions, so this cannot live inside the kernel context.
//! Long-running commands poll the flag; `wait_for_process` observes it and
//! returns early.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SigHandler, Signal};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_sig: i32) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the SIGINT handler. Safe to call more than once.
pub fn install() {
    // SAFETY: handle_sigint only touches an atomic flag, which is
    // async-signal-safe.
    unsafe {
        if signal::signal(Signal::SIGINT, SigHandler::Handler(handle_sigint)).is_err() {
            log::warn!("Failed to install SIGINT handler");
        }
    }
}

pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Acknowledge an interrupt so the next wait starts clean.
pub fn clear() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}
