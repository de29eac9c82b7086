//! # Hotword library
//!
//! Listens for spoken hotwords ("ROB press A" and friends) and turns each one into a button press
//! or release on a virtual gamepad, so ROB can be played by voice.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Template matching hotword detector
pub mod detector;

/// Hotword to virtual pad action dispatch, with LED feedback
pub mod dispatch;

/// Hotword loop execution
pub mod exec;

/// Parameters of the hotword dispatcher
pub mod params;
