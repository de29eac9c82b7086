//! # Equipment Interface
//!
//! This module defines the traits each piece of equipment must implement, along with the data
//! exchanged with them.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod audio;
pub mod display;
pub mod link;
pub mod pad;
pub mod servo;
pub mod vpad;
