//! Implementations for the PuppetCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use std::time::{Duration, Instant};

// Internal
use super::{CommandQueue, Debounce, PuppetCtrlError, Repeat};
use crate::params::{PuppetExecParams, ServoParams};
use eqpt_if::eqpt::{
    link::RobCmd,
    pad::{PadButton, PadSnapshot},
    servo::ServoChannel,
};
use util::{maths::{clamp, lin_map}, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Puppet control module state
pub struct PuppetCtrl {
    params: PuppetExecParams,
    initialised: bool,

    /// Current head tilt pulse, always within the head tilt range
    head_tilt: u16,

    /// While frozen the head pan servo holds its last position
    head_freeze: bool,

    /// While following the body pan servo tracks the head pan stick
    body_follow: bool,

    cmd_buttons: Vec<(PadButton, RobCmd, Debounce)>,
    cmd_queue: CommandQueue,

    tilt_up: Repeat,
    tilt_down: Repeat,

    freeze_toggle: Debounce,
    follow_toggle: Debounce,
}

/// Input data to PuppetCtrl.
#[derive(Debug, Clone, Copy)]
pub struct PadInput {
    /// State of the gamepad this cycle
    pub snapshot: PadSnapshot,

    /// Monotonic time the snapshot was taken
    pub now: Instant,
}

/// A pulse to be written to a servo channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoDem {
    pub channel: ServoChannel,
    pub pulse: u16,
}

/// Actions PuppetCtrl wants performed this cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PuppetOutput {
    /// Servo writes, in the order they should be made
    pub servo_dems: Vec<ServoDem>,

    /// Command to send to the motor microcontroller
    pub link_cmd: Option<RobCmd>,

    /// The exit chord was pressed. The head tilt to persist is `PuppetCtrl::head_tilt`.
    pub exit: bool,
}

/// Status report for PuppetCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusReport {
    pub head_tilt: u16,
    pub head_freeze: bool,
    pub body_follow: bool,

    /// A tilt step was cut short by the tilt range
    pub tilt_limited: bool,

    /// A command press was dropped because the queue was full
    pub cmd_dropped: bool,

    /// Number of commands waiting to be sent
    pub cmds_pending: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PuppetCtrl {
    /// Create a new controller. It must be initialised with the persisted head tilt before use.
    pub fn new(params: PuppetExecParams) -> Self {
        let debounce = Duration::from_millis(params.timing.debounce_ms);
        let repeat = Duration::from_millis(params.timing.tilt_repeat_ms);

        let b = &params.buttons;
        let cmd_buttons = vec![
            (b.open, RobCmd::Open, Debounce::new(debounce)),
            (b.close, RobCmd::Close, Debounce::new(debounce)),
            (b.up, RobCmd::Up, Debounce::new(debounce)),
            (b.down, RobCmd::Down, Debounce::new(debounce)),
            (b.home, RobCmd::Home, Debounce::new(debounce)),
        ];

        Self {
            head_tilt: params.head_tilt.home,
            initialised: false,
            head_freeze: false,
            body_follow: false,
            cmd_buttons,
            cmd_queue: CommandQueue::new(debounce),
            tilt_up: Repeat::new(repeat),
            tilt_down: Repeat::new(repeat),
            freeze_toggle: Debounce::new(debounce),
            follow_toggle: Debounce::new(debounce),
            params,
        }
    }

    /// The current head tilt pulse.
    pub fn head_tilt(&self) -> u16 {
        self.head_tilt
    }

    pub fn head_freeze(&self) -> bool {
        self.head_freeze
    }

    pub fn body_follow(&self) -> bool {
        self.body_follow
    }

    /// Move the head tilt by `delta`, clamped to the tilt range. Returns true if clamping applied.
    fn step_tilt(&mut self, delta: i32) -> bool {
        let range = &self.params.head_tilt;
        let target = self.head_tilt as i32 + delta;
        let clamped = clamp(target, range.min as i32, range.max as i32);

        self.head_tilt = clamped as u16;

        clamped != target
    }
}

impl State for PuppetCtrl {
    type InitData = u16;
    type InitError = PuppetCtrlError;

    type InputData = PadInput;
    type OutputData = PuppetOutput;
    type StatusReport = StatusReport;
    type ProcError = PuppetCtrlError;

    /// Initialise the PuppetCtrl module.
    ///
    /// Expected init data is the persisted head tilt pulse, which is clamped to the tilt range.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.params.are_valid()?;

        let range = &self.params.head_tilt;
        if !range.contains(init_data) {
            warn!(
                "Persisted head tilt {} is outside [{}, {}], clamping",
                init_data, range.min, range.max
            );
        }
        self.head_tilt = clamp(init_data, range.min, range.max);

        self.head_freeze = false;
        self.body_follow = false;
        self.initialised = true;

        debug!("PuppetCtrl initialised with head tilt {}", self.head_tilt);

        Ok(())
    }

    /// Perform one poll cycle of puppet control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        if !self.initialised {
            return Err(PuppetCtrlError::NotInitialised)
        }

        let pad = &input_data.snapshot;
        let now = input_data.now;

        let mut output = PuppetOutput::default();
        let mut report = StatusReport::default();

        // Commands to the motor microcontroller
        for (button, cmd, debounce) in self.cmd_buttons.iter_mut() {
            if debounce.rising(pad.is_pressed(*button), now) {
                if self.cmd_queue.push(*cmd) {
                    trace!("Queued {:?}", cmd);
                }
                else {
                    warn!("Command queue full, dropping {:?}", cmd);
                    report.cmd_dropped = true;
                }
            }
        }
        output.link_cmd = self.cmd_queue.pop_ready(now);

        // Head tilt, up on one shoulder and down on the other
        let step = self.params.tilt_step as i32;
        let tilt_channel = self.params.head_tilt.channel;
        if self.tilt_up.fire(pad.is_pressed(self.params.buttons.tilt_up), now) {
            report.tilt_limited |= self.step_tilt(step);
            output.servo_dems.push(ServoDem { channel: tilt_channel, pulse: self.head_tilt });
        }
        if self.tilt_down.fire(pad.is_pressed(self.params.buttons.tilt_down), now) {
            report.tilt_limited |= self.step_tilt(-step);
            output.servo_dems.push(ServoDem { channel: tilt_channel, pulse: self.head_tilt });
        }

        // Pan, using the freeze and follow modes from before this cycle's toggles
        let head_x = pad.axis(self.params.axes.head_pan);
        let body_x = pad.axis(self.params.axes.body_pan);
        let head = &self.params.head_pan;
        let body = &self.params.body_pan;

        if !self.head_freeze {
            output.servo_dems.push(ServoDem {
                channel: head.channel,
                pulse: map_pan(head_x, head, true),
            });

            if self.body_follow {
                output.servo_dems.push(ServoDem {
                    channel: body.channel,
                    pulse: map_pan(head_x, body, false),
                });
            }
        }
        if !self.body_follow {
            output.servo_dems.push(ServoDem {
                channel: body.channel,
                pulse: map_pan(body_x, body, false),
            });
        }

        // Mode toggles
        if self.freeze_toggle.rising(pad.is_pressed(self.params.buttons.head_freeze), now) {
            self.head_freeze = !self.head_freeze;
            debug!("Head freeze {}", if self.head_freeze { "on" } else { "off" });
        }
        if self.follow_toggle.rising(pad.is_pressed(self.params.buttons.body_follow), now) {
            self.body_follow = !self.body_follow;
            debug!("Body follow {}", if self.body_follow { "on" } else { "off" });
        }

        // Exit on the chord
        let [a, b] = self.params.buttons.exit_chord;
        output.exit = pad.is_pressed(a) && pad.is_pressed(b);

        report.head_tilt = self.head_tilt;
        report.head_freeze = self.head_freeze;
        report.body_follow = self.body_follow;
        report.cmds_pending = self.cmd_queue.len();

        trace!("PuppetCtrl output: {:?}", output);

        Ok((output, report))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a stick position in `[-1, 1]` onto a servo's range.
///
/// With `inverted` the stick's -1 maps to the range's max rather than its min. The pulse is
/// truncated toward zero.
pub fn map_pan(x: f32, range: &ServoParams, inverted: bool) -> u16 {
    let (min, max) = (range.min as f64, range.max as f64);
    let target = if inverted { (max, min) } else { (min, max) };

    let pulse = lin_map((-1.0, 1.0), target, x as f64);

    // Sticks are clamped to [-1, 1] so this stays in range, but don't rely on it
    clamp(pulse, min, max) as u16
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::test_params;
    use eqpt_if::eqpt::pad::PadAxis;

    const HEAD_PAN: u8 = 0;
    const HEAD_TILT: u8 = 1;
    const BODY_PAN: u8 = 3;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn ctrl(tilt: u16) -> PuppetCtrl {
        let mut c = PuppetCtrl::new(test_params());
        c.init(tilt).unwrap();
        c
    }

    fn run(c: &mut PuppetCtrl, snapshot: PadSnapshot, now: Instant) -> PuppetOutput {
        c.proc(&PadInput { snapshot, now }).unwrap().0
    }

    fn pulses(output: &PuppetOutput, channel: u8) -> Vec<u16> {
        output.servo_dems
            .iter()
            .filter(|d| d.channel.index() == channel)
            .map(|d| d.pulse)
            .collect()
    }

    #[test]
    fn test_uninitialised() {
        let mut c = PuppetCtrl::new(test_params());
        assert!(matches!(
            c.proc(&PadInput { snapshot: PadSnapshot::neutral(), now: Instant::now() }),
            Err(PuppetCtrlError::NotInitialised)
        ));
    }

    #[test]
    fn test_init_clamps_tilt() {
        assert_eq!(ctrl(600).head_tilt(), 510);
        assert_eq!(ctrl(100).head_tilt(), 460);
        assert_eq!(ctrl(487).head_tilt(), 487);
    }

    #[test]
    fn test_map_pan() {
        let p = test_params();

        assert_eq!(map_pan(-1.0, &p.head_pan, true), 540);
        assert_eq!(map_pan(0.0, &p.head_pan, true), 375);
        assert_eq!(map_pan(1.0, &p.head_pan, true), 210);

        assert_eq!(map_pan(-1.0, &p.body_pan, false), 230);
        assert_eq!(map_pan(0.0, &p.body_pan, false), 415);
        assert_eq!(map_pan(1.0, &p.body_pan, false), 600);

        // 230 + 1.25 * 370 / 2 = 461.25, truncated
        assert_eq!(map_pan(0.25, &p.body_pan, false), 461);

        // Monotonic across the stick range
        let mut last = map_pan(-1.0, &p.body_pan, false);
        for i in -99..=100 {
            let pulse = map_pan(i as f32 / 100.0, &p.body_pan, false);
            assert!(pulse >= last);
            last = pulse;
        }
    }

    #[test]
    fn test_neutral_pan() {
        let mut c = ctrl(485);
        let out = run(&mut c, PadSnapshot::neutral(), Instant::now());

        assert_eq!(pulses(&out, HEAD_PAN), vec![375]);
        assert_eq!(pulses(&out, BODY_PAN), vec![415]);
        assert!(pulses(&out, HEAD_TILT).is_empty());
        assert_eq!(out.link_cmd, None);
        assert!(!out.exit);
    }

    #[test]
    fn test_head_freeze() {
        let p = test_params();
        let mut c = ctrl(485);
        let t0 = Instant::now();
        let stick = PadSnapshot::neutral().with_axis(PadAxis::LeftStickX, 1.0);
        let freeze = stick.with_pressed(p.buttons.head_freeze);

        // The toggle takes effect from the next cycle
        let out = run(&mut c, freeze, t0);
        assert_eq!(pulses(&out, HEAD_PAN), vec![210]);
        assert!(c.head_freeze());

        // Frozen: no head pan writes, body still on its own stick
        let out = run(&mut c, stick, t0 + ms(33));
        assert!(pulses(&out, HEAD_PAN).is_empty());
        assert_eq!(pulses(&out, BODY_PAN), vec![415]);

        // Unfreeze after the cooldown, mapping resumes unchanged
        let out = run(&mut c, freeze, t0 + ms(300));
        assert!(pulses(&out, HEAD_PAN).is_empty());
        assert!(!c.head_freeze());
        let out = run(&mut c, stick, t0 + ms(333));
        assert_eq!(pulses(&out, HEAD_PAN), vec![210]);
    }

    #[test]
    fn test_toggle_cooldown() {
        let p = test_params();
        let mut c = ctrl(485);
        let t0 = Instant::now();
        let press = PadSnapshot::neutral().with_pressed(p.buttons.body_follow);

        run(&mut c, press, t0);
        run(&mut c, PadSnapshot::neutral(), t0 + ms(33));
        run(&mut c, press, t0 + ms(66));
        assert!(c.body_follow());

        run(&mut c, PadSnapshot::neutral(), t0 + ms(100));
        run(&mut c, press, t0 + ms(260));
        assert!(!c.body_follow());
    }

    #[test]
    fn test_body_follow() {
        let p = test_params();
        let mut c = ctrl(485);
        let t0 = Instant::now();

        run(&mut c, PadSnapshot::neutral().with_pressed(p.buttons.body_follow), t0);
        assert!(c.body_follow());

        // Body tracks the head stick and ignores its own
        let sticks = PadSnapshot::neutral()
            .with_axis(PadAxis::LeftStickX, -1.0)
            .with_axis(PadAxis::RightStickX, 1.0);
        let out = run(&mut c, sticks, t0 + ms(33));
        assert_eq!(pulses(&out, HEAD_PAN), vec![540]);
        assert_eq!(pulses(&out, BODY_PAN), vec![230]);

        // Freezing the head while following holds the body too
        run(&mut c, sticks.with_pressed(p.buttons.head_freeze), t0 + ms(66));
        let out = run(&mut c, sticks, t0 + ms(100));
        assert!(pulses(&out, HEAD_PAN).is_empty());
        assert!(pulses(&out, BODY_PAN).is_empty());
    }

    #[test]
    fn test_five_commands_spaced() {
        let p = test_params();
        let mut c = ctrl(485);
        let t0 = Instant::now();
        let b = &p.buttons;
        let presses = [b.open, b.close, b.up, b.down, b.home];

        // Press each button on its own cycle, with releases in between
        let mut sent = Vec::new();
        let mut t = t0;
        for button in presses.iter() {
            let out = run(&mut c, PadSnapshot::neutral().with_pressed(*button), t);
            if let Some(cmd) = out.link_cmd {
                sent.push((cmd, t));
            }
            t += ms(33);
            let out = run(&mut c, PadSnapshot::neutral(), t);
            if let Some(cmd) = out.link_cmd {
                sent.push((cmd, t));
            }
            t += ms(33);
        }

        // Keep cycling until the queue drains
        while t < t0 + ms(2000) {
            let out = run(&mut c, PadSnapshot::neutral(), t);
            if let Some(cmd) = out.link_cmd {
                sent.push((cmd, t));
            }
            t += ms(33);
        }

        let codes: Vec<u8> = sent.iter().map(|(c, _)| c.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);

        for pair in sent.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= ms(250));
            assert!(pair[1].1 - pair[0].1 < ms(250 + 33));
        }
    }

    #[test]
    fn test_held_command_sent_once() {
        let p = test_params();
        let mut c = ctrl(485);
        let t0 = Instant::now();
        let held = PadSnapshot::neutral().with_pressed(p.buttons.open);

        let mut count = 0;
        for i in 0..60 {
            if run(&mut c, held, t0 + ms(33 * i)).link_cmd.is_some() {
                count += 1;
            }
        }
        assert_eq!(count, 1);
    }

    #[test]
    fn test_tilt_repeat_and_clamp() {
        let p = test_params();
        let mut c = ctrl(505);
        let t0 = Instant::now();
        let up = PadSnapshot::neutral().with_pressed(p.buttons.tilt_up);

        let out = run(&mut c, up, t0);
        assert_eq!(pulses(&out, HEAD_TILT), vec![508]);

        // Inside the repeat interval
        let out = run(&mut c, up, t0 + ms(33));
        assert!(pulses(&out, HEAD_TILT).is_empty());

        // Clamped at the top of the range
        let (out, report) = c.proc(&PadInput { snapshot: up, now: t0 + ms(66) }).unwrap();
        assert_eq!(pulses(&out, HEAD_TILT), vec![510]);
        assert!(report.tilt_limited);
        let out = run(&mut c, up, t0 + ms(133));
        assert_eq!(pulses(&out, HEAD_TILT), vec![510]);

        let down = PadSnapshot::neutral().with_pressed(p.buttons.tilt_down);
        let out = run(&mut c, down, t0 + ms(166));
        assert_eq!(pulses(&out, HEAD_TILT), vec![507]);
        assert_eq!(c.head_tilt(), 507);
    }

    #[test]
    fn test_exit_chord() {
        let p = test_params();
        let mut c = ctrl(485);
        let t0 = Instant::now();
        let [a, b] = p.buttons.exit_chord;

        assert!(!run(&mut c, PadSnapshot::neutral().with_pressed(a), t0).exit);
        assert!(!run(&mut c, PadSnapshot::neutral().with_pressed(b), t0).exit);
        assert!(run(&mut c, PadSnapshot::neutral().with_pressed(a).with_pressed(b), t0).exit);
    }
}
