//! Persisted head tilt
//!
//! The head tilt is the only setting kept between runs. It is stored as a plain decimal integer so
//! it can be edited by hand on the Pi.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{fs, io, path::{Path, PathBuf}};
use log::debug;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of characters of the file which are read
const MAX_DIGITS: usize = 3;

/// Largest head tilt the file can hold
pub const MAX_HEAD_TILT: u16 = 999;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("The settings file {0:?} does not exist")]
    NotFound(PathBuf),

    #[error("Could not access the settings file {0:?}: {1}")]
    Io(PathBuf, io::Error),

    #[error("The settings file {0:?} does not start with a head tilt, found {1:?}")]
    Malformed(PathBuf, String),

    #[error("Head tilt {0} does not fit in the settings file (at most 999)")]
    TooLarge(u16),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read the head tilt from the settings file.
///
/// Only the first three characters (after leading whitespace) are read.
pub fn load_head_tilt<P: AsRef<Path>>(path: P) -> Result<u16, SettingsError> {
    let path = path.as_ref();

    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SettingsError::NotFound(path.to_path_buf()),
        _ => SettingsError::Io(path.to_path_buf(), e),
    })?;

    let digits: String = contents.trim_start().chars().take(MAX_DIGITS).collect();
    let value = digits
        .trim_end()
        .parse()
        .map_err(|_| SettingsError::Malformed(path.to_path_buf(), digits.clone()))?;

    debug!("Loaded head tilt {} from {:?}", value, path);

    Ok(value)
}

/// Overwrite the settings file with the given head tilt.
///
/// Values above [`MAX_HEAD_TILT`] are refused.
pub fn save_head_tilt<P: AsRef<Path>>(path: P, value: u16) -> Result<(), SettingsError> {
    let path = path.as_ref();

    if value > MAX_HEAD_TILT {
        return Err(SettingsError::TooLarge(value))
    }

    fs::write(path, value.to_string())
        .map_err(|e| SettingsError::Io(path.to_path_buf(), e))?;

    debug!("Saved head tilt {} to {:?}", value, path);

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rob_settings.txt");

        save_head_tilt(&path, 487).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "487");
        assert_eq!(load_head_tilt(&path).unwrap(), 487);

        // Overwritten, not appended
        save_head_tilt(&path, 460).unwrap();
        assert_eq!(load_head_tilt(&path).unwrap(), 460);
    }

    #[test]
    fn test_only_three_chars_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rob_settings.txt");

        fs::write(&path, "4871\n").unwrap();
        assert_eq!(load_head_tilt(&path).unwrap(), 487);

        fs::write(&path, "490\n").unwrap();
        assert_eq!(load_head_tilt(&path).unwrap(), 490);
    }

    #[test]
    fn test_largest_tilt_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rob_settings.txt");

        save_head_tilt(&path, MAX_HEAD_TILT).unwrap();
        assert_eq!(load_head_tilt(&path).unwrap(), MAX_HEAD_TILT);

        // A four digit tilt would load back as its first three digits
        assert!(matches!(save_head_tilt(&path, 1003), Err(SettingsError::TooLarge(1003))));
        assert_eq!(load_head_tilt(&path).unwrap(), MAX_HEAD_TILT);
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rob_settings.txt");

        assert!(matches!(load_head_tilt(&path), Err(SettingsError::NotFound(_))));

        fs::write(&path, "abc").unwrap();
        assert!(matches!(load_head_tilt(&path), Err(SettingsError::Malformed(_, _))));

        fs::write(&path, "").unwrap();
        assert!(matches!(load_head_tilt(&path), Err(SettingsError::Malformed(_, _))));
    }
}
