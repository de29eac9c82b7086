//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (ROB_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parameter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "$ROB_SW_ROOT/params" directory. Absolute paths are used
/// as given.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    let path = resolve(param_file_path)?;

    load_from_path(path)
}

/// Load a parameter file from an explicit path.
pub fn load_from_path<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>
{
    // Load the file into a string
    let params_str = read_to_string(path.as_ref())
        .map_err(|e| LoadError::FileLoadError(path.as_ref().to_path_buf(), e))?;

    from_str(&params_str)
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

/// Resolve a path relative to the software root, leaving absolute paths untouched.
pub fn resolve_sw_path(path: &str) -> Result<PathBuf, LoadError> {
    let p = PathBuf::from(path);

    if p.is_absolute() {
        return Ok(p)
    }

    let mut root = crate::host::get_rob_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    root.push(p);

    Ok(root)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn resolve(param_file_path: &str) -> Result<PathBuf, LoadError> {
    if Path::new(param_file_path).is_absolute() {
        return Ok(PathBuf::from(param_file_path))
    }

    // Get the params dir
    let mut path = crate::host::get_rob_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Example {
        sensitivity: f64,
        models: Vec<String>,
    }

    #[test]
    fn test_from_str() {
        let p: Example = from_str(
            "sensitivity = 0.5\nmodels = [\"a.wav\", \"b.wav\"]\n"
        ).unwrap();

        assert_eq!(p, Example {
            sensitivity: 0.5,
            models: vec!["a.wav".into(), "b.wav".into()]
        });

        assert!(matches!(
            from_str::<Example>("sensitivity = \"high\""),
            Err(LoadError::DeserialiseError(_))
        ));
    }

    #[test]
    fn test_absolute_paths_untouched() {
        assert_eq!(
            resolve_sw_path("/home/pi/rob_settings.txt").unwrap(),
            PathBuf::from("/home/pi/rob_settings.txt")
        );
        assert_eq!(
            resolve("/etc/rob/puppet_exec.toml").unwrap(),
            PathBuf::from("/etc/rob/puppet_exec.toml")
        );
    }
}
