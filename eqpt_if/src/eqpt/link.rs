//! # Command Link Equipment
//!
//! ROB's original motors (arms open/close, body up/down) are driven by a secondary
//! microcontroller. It accepts single-byte commands and never replies.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A write-only link to the motor microcontroller.
pub trait CommandLink {
    /// Send a single command. No acknowledgement is read back.
    fn send(&mut self, cmd: RobCmd) -> Result<(), LinkError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands understood by the motor microcontroller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RobCmd {
    Open,
    Close,
    Up,
    Down,
    Home
}

#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("Error writing to the command link: {0}")]
    Write(String),

    #[error("The link accepted {0} bytes, expected 1")]
    ShortWrite(usize)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RobCmd {
    /// The byte sent over the link for this command.
    pub fn code(self) -> u8 {
        match self {
            RobCmd::Open => 1,
            RobCmd::Close => 2,
            RobCmd::Up => 3,
            RobCmd::Down => 4,
            RobCmd::Home => 5,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_codes() {
        let codes: Vec<u8> = [RobCmd::Open, RobCmd::Close, RobCmd::Up, RobCmd::Down, RobCmd::Home]
            .iter()
            .map(|c| c.code())
            .collect();

        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
    }
}
