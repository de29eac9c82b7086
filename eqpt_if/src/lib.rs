//! # Equipment interface crate.
//!
//! Provides the capability interfaces to all of ROB's equipment (servo board, command link,
//! gamepads, microphone, display) so that the control logic of the executables never depends on a
//! particular hardware driver.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Capability traits and shared types for each piece of equipment
pub mod eqpt;

/// Simulated equipment, used for testing and for running away from the Pi
pub mod sim;
