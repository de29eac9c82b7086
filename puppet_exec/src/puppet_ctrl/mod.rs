//! Puppet control module
//!
//! Turns the state of the puppeteer's gamepad into servo demands and motor commands for ROB.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod debounce;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use debounce::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during PuppetCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum PuppetCtrlError {
    #[error("Invalid puppet parameters: {0}")]
    InvalidParams(#[from] crate::params::ParamsError),

    #[error("PuppetCtrl was processed before being initialised")]
    NotInitialised,
}
