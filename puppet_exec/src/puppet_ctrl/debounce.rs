//! Edge detection, repeat timing and command spacing for gamepad buttons
//!
//! All timing is taken from a monotonic [`Instant`] supplied by the caller, so nothing in here
//! sleeps and the controller can be driven with synthetic time in tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use eqpt_if::eqpt::link::RobCmd;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of link commands waiting to be sent.
pub const COMMAND_QUEUE_LEN: usize = 8;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Rising edge detector with a cooldown.
///
/// An edge is accepted if the button was released on the previous update and no edge has been
/// accepted within the cooldown.
#[derive(Debug, Clone)]
pub struct Debounce {
    cooldown: Duration,
    was_pressed: bool,
    last_accepted: Option<Instant>,
}

/// Fires while a button is held, at most once per interval. The first fire is immediate.
#[derive(Debug, Clone)]
pub struct Repeat {
    interval: Duration,
    last_fired: Option<Instant>,
}

/// FIFO of link commands released no more often than once per spacing interval.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    pending: VecDeque<RobCmd>,
    spacing: Duration,
    last_sent: Option<Instant>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Debounce {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            was_pressed: false,
            last_accepted: None,
        }
    }

    /// Update with the button's current state, returning true on an accepted rising edge.
    pub fn rising(&mut self, pressed: bool, now: Instant) -> bool {
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;

        if !edge {
            return false
        }

        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.cooldown {
                return false
            }
        }

        self.last_accepted = Some(now);
        true
    }
}

impl Repeat {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    /// Returns true if the action should be applied this cycle.
    pub fn fire(&mut self, held: bool, now: Instant) -> bool {
        if !held {
            self.last_fired = None;
            return false
        }

        match self.last_fired {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_fired = Some(now);
                true
            }
        }
    }
}

impl CommandQueue {
    pub fn new(spacing: Duration) -> Self {
        Self {
            pending: VecDeque::with_capacity(COMMAND_QUEUE_LEN),
            spacing,
            last_sent: None,
        }
    }

    /// Add a command to the back of the queue.
    ///
    /// Returns false, dropping the command, if the queue is full.
    pub fn push(&mut self, cmd: RobCmd) -> bool {
        if self.pending.len() >= COMMAND_QUEUE_LEN {
            return false
        }

        self.pending.push_back(cmd);
        true
    }

    /// Take the next command if one is waiting and the spacing since the last one has elapsed.
    pub fn pop_ready(&mut self, now: Instant) -> Option<RobCmd> {
        if let Some(last) = self.last_sent {
            if now.saturating_duration_since(last) < self.spacing {
                return None
            }
        }

        let cmd = self.pending.pop_front()?;
        self.last_sent = Some(now);

        Some(cmd)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_debounce_edges() {
        let t0 = Instant::now();
        let mut d = Debounce::new(ms(250));

        assert!(d.rising(true, t0));
        // Held: no new edge
        assert!(!d.rising(true, t0 + ms(33)));
        assert!(!d.rising(false, t0 + ms(66)));
        // Second edge inside the cooldown is ignored
        assert!(!d.rising(true, t0 + ms(100)));
        assert!(!d.rising(false, t0 + ms(133)));
        // And accepted once the cooldown is over
        assert!(d.rising(true, t0 + ms(250)));
    }

    #[test]
    fn test_repeat() {
        let t0 = Instant::now();
        let mut r = Repeat::new(ms(50));

        assert!(!r.fire(false, t0));
        assert!(r.fire(true, t0));
        assert!(!r.fire(true, t0 + ms(33)));
        assert!(r.fire(true, t0 + ms(66)));
        assert!(!r.fire(true, t0 + ms(99)));

        // Releasing resets, so a new press fires straight away
        assert!(!r.fire(false, t0 + ms(100)));
        assert!(r.fire(true, t0 + ms(101)));
    }

    #[test]
    fn test_command_queue_spacing() {
        let t0 = Instant::now();
        let mut q = CommandQueue::new(ms(250));

        assert!(q.push(RobCmd::Open));
        assert!(q.push(RobCmd::Close));

        assert_eq!(q.pop_ready(t0), Some(RobCmd::Open));
        assert_eq!(q.pop_ready(t0 + ms(100)), None);
        assert_eq!(q.pop_ready(t0 + ms(250)), Some(RobCmd::Close));
        assert_eq!(q.pop_ready(t0 + ms(1000)), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_command_queue_bounded() {
        let mut q = CommandQueue::new(ms(250));

        for _ in 0..COMMAND_QUEUE_LEN {
            assert!(q.push(RobCmd::Home));
        }
        assert!(!q.push(RobCmd::Open));
        assert_eq!(q.len(), COMMAND_QUEUE_LEN);
    }
}
