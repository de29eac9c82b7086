//! # Display Equipment
//!
//! A projector shows a fixed-size frame. The puppet loop draws its alignment crosshair into an
//! [`RgbImage`] and hands it to a [`Surface`] to be shown.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use image::RgbImage;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Width of the projected frame in pixels
pub const CANVAS_WIDTH: u32 = 854;

/// Height of the projected frame in pixels
pub const CANVAS_HEIGHT: u32 = 480;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something a frame can be shown on.
pub trait Surface {
    /// Show the frame, replacing whatever was shown before.
    fn present(&mut self, frame: &RgbImage) -> Result<(), SurfaceError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum SurfaceError {
    #[error("Could not open the display: {0}")]
    Open(std::io::Error),

    #[error("Unsupported display format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not write the frame: {0}")]
    Write(std::io::Error)
}
