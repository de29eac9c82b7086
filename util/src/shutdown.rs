//! Shutdown flag raised by a termination signal (Ctrl+C)

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use log::info;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A flag which starts lowered and is raised once when the process is asked to stop.
///
/// Clones share the same underlying flag. It is never lowered again.
#[derive(Clone, Default, Debug)]
pub struct ShutdownFlag {
    raised: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("Could not install the signal handler: {0}")]
    HandlerInstall(ctrlc::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ShutdownFlag {
    /// Create a new lowered flag which isn't connected to any signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new flag which is raised when SIGINT is received.
    ///
    /// Only one handler may be installed per process.
    pub fn on_sigint() -> Result<Self, ShutdownError> {
        let flag = Self::new();
        let handler_flag = flag.clone();

        ctrlc::set_handler(move || {
            info!("Interrupt received, stopping");
            handler_flag.raise();
        })
        .map_err(ShutdownError::HandlerInstall)?;

        Ok(flag)
    }

    /// Raise the flag.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Relaxed);
    }

    /// Returns true if the flag has been raised.
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }
}
