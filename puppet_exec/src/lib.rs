//! # Puppet library
//!
//! Control logic of the puppet loop, which lets a puppeteer drive ROB's head, body and original
//! motors from a gamepad while showing a projector alignment crosshair.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Crosshair drawing
pub mod crosshair;

/// Puppet loop execution - startup sequence, poll loop and actuation
pub mod exec;

/// Projector exit hook
pub mod hook;

/// Parameters of the puppet loop
pub mod params;

/// Puppet control module - converts gamepad state into servo demands and motor commands
pub mod puppet_ctrl;

/// Head tilt persistence
pub mod settings;
