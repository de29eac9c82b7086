//! Exit hook
//!
//! The projector is switched off while the crosshair is shown. On exit a shell script switches it
//! back on for normal play.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::process::{Command, ExitStatus};
use log::{info, warn};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HookError {
    #[error("Could not run {0}: {1}")]
    Spawn(String, std::io::Error),

    #[error("{0} exited with {1}")]
    Failed(String, ExitStatus),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Run the hook command, waiting for it to finish.
///
/// The first element of `cmd` is the program, the rest its arguments. An empty command does
/// nothing.
pub fn run_hook(cmd: &[String]) -> Result<(), HookError> {
    let (program, args) = match cmd.split_first() {
        Some(c) => c,
        None => return Ok(())
    };

    info!("Running exit hook: {}", cmd.join(" "));

    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| HookError::Spawn(program.clone(), e))?;

    if !status.success() {
        return Err(HookError::Failed(program.clone(), status))
    }

    info!("Exit hook finished");
    Ok(())
}

/// Run the hook, logging rather than returning any failure.
pub fn run_hook_logged(cmd: &[String]) {
    if let Err(e) = run_hook(cmd) {
        warn!("Exit hook failed: {}", e);
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
