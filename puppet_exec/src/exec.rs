//! Puppet loop execution
//!
//! Owns the equipment and the controller, and runs the startup sequence and the 30 Hz poll loop.
//! The equipment is held behind the capability traits so the whole loop can run against
//! simulated equipment.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use embedded_hal::blocking::delay::DelayMs;
use log::{debug, error, info, warn};
use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};
use thiserror::Error;

// Internal
use crate::{
    crosshair::draw_crosshair,
    hook::run_hook_logged,
    params::{PuppetExecParams, ServoParams},
    puppet_ctrl::{PadInput, PuppetCtrl, PuppetCtrlError, PuppetOutput},
    settings::{self, SettingsError},
};
use eqpt_if::eqpt::{
    display::{RgbImage, Surface, SurfaceError},
    link::CommandLink,
    pad::{Gamepad, PadError},
    servo::{ServoDriver, ServoError},
};
use util::{module::State, shutdown::ShutdownFlag};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// While the gamepad keeps failing, only every this many errors is logged (10 s at 30 Hz)
const PAD_ERROR_LOG_INTERVAL: u64 = 300;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// All the equipment the puppet loop drives.
pub struct Equipment {
    pub servos: Box<dyn ServoDriver>,
    pub link: Box<dyn CommandLink>,
    pub pad: Box<dyn Gamepad>,
    pub surface: Box<dyn Surface>,
    pub delay: Box<dyn DelayMs<u16>>,
}

pub struct PuppetExec {
    params: PuppetExecParams,
    ctrl: PuppetCtrl,
    eqpt: Equipment,
    frame: RgbImage,

    /// Where the head tilt is saved on exit
    settings_path: PathBuf,

    num_cycles: u64,
    num_pad_errors: u64,

    /// Gamepad errors since the last successful poll
    pad_error_run: u64,

    /// Link commands still queued when the exit chord was pressed
    cmds_discarded: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What the loop should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Exit,
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("PuppetCtrl error: {0}")]
    Ctrl(#[from] PuppetCtrlError),

    #[error("Servo driver error: {0}")]
    Servo(#[from] ServoError),

    #[error("Gamepad error: {0}")]
    Pad(#[from] PadError),

    #[error("Display error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PuppetExec {
    /// Build the loop, initialising the controller with the persisted head tilt.
    pub fn new(
        params: PuppetExecParams,
        head_tilt: u16,
        settings_path: PathBuf,
        eqpt: Equipment,
    ) -> Result<Self, ExecError> {
        let mut ctrl = PuppetCtrl::new(params.clone());
        ctrl.init(head_tilt)?;

        Ok(Self {
            params,
            ctrl,
            eqpt,
            frame: draw_crosshair(),
            settings_path,
            num_cycles: 0,
            num_pad_errors: 0,
            pad_error_run: 0,
            cmds_discarded: 0,
        })
    }

    /// The crosshair frame shown every cycle.
    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }

    pub fn ctrl(&self) -> &PuppetCtrl {
        &self.ctrl
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn num_pad_errors(&self) -> u64 {
        self.num_pad_errors
    }

    /// Number of link commands which were never sent because the loop exited first.
    pub fn cmds_discarded(&self) -> usize {
        self.cmds_discarded
    }

    /// Bring ROB to its start position and show the crosshair.
    ///
    /// Each servo is moved in turn and given time to settle, so they don't all draw current at
    /// once. Any failure here is fatal.
    pub fn startup(&mut self) -> Result<(), ExecError> {
        let p = &self.params;
        let servos = &mut self.eqpt.servos;

        servos.set_pwm_freq(p.pwm_freq_hz)?;
        servos.set_pulse(p.led.channel, p.led.on_pulse)?;
        debug!("LED on");

        let moves: [(&ServoParams, u16, &str); 3] = [
            (&p.head_pan, p.head_pan.home, "Head pan"),
            (&p.head_tilt, self.ctrl.head_tilt(), "Head tilt"),
            (&p.body_pan, p.body_pan.home, "Body pan"),
        ];
        for (servo, pulse, name) in moves.iter() {
            servos.set_pulse(servo.channel, *pulse)?;
            self.eqpt.delay.delay_ms(p.timing.settle_ms);
            debug!("{} at {}", name, pulse);
        }

        self.eqpt.surface.present(&self.frame)?;

        info!("Startup complete");

        Ok(())
    }

    /// Run a single poll cycle.
    pub fn step(&mut self, now: Instant) -> Result<StepOutcome, ExecError> {
        self.num_cycles += 1;

        let snapshot = match self.eqpt.pad.poll() {
            Ok(s) => s,
            Err(e) => {
                self.num_pad_errors += 1;
                self.pad_error_run += 1;
                if pad_error_logged(self.pad_error_run) {
                    warn!(
                        "Could not poll the gamepad ({} consecutive errors): {}",
                        self.pad_error_run, e
                    );
                }
                return Ok(StepOutcome::Continue)
            }
        };

        if self.pad_error_run > 0 {
            info!("Gamepad recovered after {} errors", self.pad_error_run);
            self.pad_error_run = 0;
        }

        let (output, report) = self.ctrl.proc(&PadInput { snapshot, now })?;

        if report.cmd_dropped {
            warn!("Command queue full, press dropped ({} waiting)", report.cmds_pending);
        }

        actuate(&output, self.eqpt.servos.as_mut(), self.eqpt.link.as_mut());

        if let Err(e) = self.eqpt.surface.present(&self.frame) {
            warn!("Could not redraw the crosshair: {}", e);
        }

        if output.exit {
            info!("Exit chord pressed");

            if report.cmds_pending > 0 {
                self.cmds_discarded = report.cmds_pending;
                warn!("{} queued link commands discarded on exit", report.cmds_pending);
            }

            self.persist();
            run_hook_logged(&self.params.projector_hook);

            return Ok(StepOutcome::Exit)
        }

        Ok(StepOutcome::Continue)
    }

    /// Run the loop at the cycle frequency until the exit chord is pressed or `shutdown` is
    /// raised.
    ///
    /// Stopping on `shutdown` does not save the head tilt.
    pub fn run(&mut self, shutdown: &ShutdownFlag) -> Result<(), ExecError> {
        let period = Duration::from_secs_f64(1.0 / self.params.cycle_frequency_hz);

        info!("Beginning main loop");

        loop {
            let cycle_start = Instant::now();

            if shutdown.is_raised() {
                info!("Shutdown requested, head tilt not saved");
                break
            }

            if self.step(cycle_start)? == StepOutcome::Exit {
                break
            }

            match period.checked_sub(cycle_start.elapsed()) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_start.elapsed().as_secs_f64() - period.as_secs_f64()
                ),
            }
        }

        info!(
            "Main loop ended after {} cycles ({} gamepad errors)",
            self.num_cycles, self.num_pad_errors
        );

        Ok(())
    }

    fn persist(&self) {
        let tilt = self.ctrl.head_tilt();

        match settings::save_head_tilt(&self.settings_path, tilt) {
            Ok(()) => info!("Head tilt {} saved", tilt),
            Err(e) => error!("Could not save the head tilt: {}", e),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply the controller's output to the hardware.
///
/// Failed writes are logged and the remaining writes are still attempted.
pub fn actuate(
    output: &PuppetOutput,
    servos: &mut dyn ServoDriver,
    link: &mut dyn CommandLink,
) {
    if let Some(cmd) = output.link_cmd {
        match link.send(cmd) {
            Ok(()) => debug!("Sent {:?}", cmd),
            Err(e) => warn!("Error with i2c device, {:?} not sent: {}", cmd, e),
        }
    }

    for dem in output.servo_dems.iter() {
        if let Err(e) = servos.set_pulse(dem.channel, dem.pulse) {
            warn!("Error with i2c device, {} not set to {}: {}", dem.channel, dem.pulse, e);
        }
    }
}

/// Whether the `run`th consecutive gamepad error is logged: the first, then every
/// [`PAD_ERROR_LOG_INTERVAL`].
fn pad_error_logged(run: u64) -> bool {
    run == 1 || run % PAD_ERROR_LOG_INTERVAL == 0
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::test_params;
    use eqpt_if::{
        eqpt::{link::RobCmd, pad::PadSnapshot, servo::ServoChannel},
        sim::*,
    };
    use crate::puppet_ctrl::ServoDem;
    use eqpt_if::eqpt::pad::{Gamepad, PadError};
    use std::fs;

    /// Gamepad which fails a number of polls before behaving like a neutral pad.
    struct UnpluggedPad {
        failures: u64,
    }

    impl Gamepad for UnpluggedPad {
        fn poll(&mut self) -> Result<PadSnapshot, PadError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(PadError::NotConnected)
            }
            Ok(PadSnapshot::neutral())
        }
    }

    fn exec(
        journal: &Journal,
        script: Vec<PadSnapshot>,
        tilt: u16,
        dir: &tempfile::TempDir,
    ) -> PuppetExec {
        let mut params = test_params();
        params.projector_hook = vec!["true".into()];

        let eqpt = Equipment {
            servos: Box::new(SimServoDriver::new(journal)),
            link: Box::new(SimLink::new(journal)),
            pad: Box::new(SimGamepad::new(script)),
            surface: Box::new(SimSurface::new(journal)),
            delay: Box::new(SimDelay::new(journal)),
        };

        PuppetExec::new(params, tilt, dir.path().join("rob_settings.txt"), eqpt).unwrap()
    }

    #[test]
    fn test_startup_sequence() {
        let journal = Journal::new();
        let dir = tempfile::tempdir().unwrap();
        let mut e = exec(&journal, vec![], 490, &dir);

        e.startup().unwrap();

        assert_eq!(journal.events(), vec![
            SimEvent::PwmFreq(60.0),
            SimEvent::Pulse { channel: 4, pulse: 4000 },
            SimEvent::Pulse { channel: 0, pulse: 375 },
            SimEvent::DelayMs(500),
            SimEvent::Pulse { channel: 1, pulse: 490 },
            SimEvent::DelayMs(500),
            SimEvent::Pulse { channel: 3, pulse: 415 },
            SimEvent::DelayMs(500),
            SimEvent::Frame,
        ]);
    }

    #[test]
    fn test_exit_chord_persists_tilt() {
        let p = test_params();
        let journal = Journal::new();
        let dir = tempfile::tempdir().unwrap();
        let [a, b] = p.buttons.exit_chord;
        let up = PadSnapshot::neutral().with_pressed(p.buttons.tilt_up);
        let t0 = Instant::now();

        let mut e = exec(
            &journal,
            vec![up, PadSnapshot::neutral(), PadSnapshot::neutral().with_pressed(a).with_pressed(b)],
            490,
            &dir,
        );

        assert_eq!(e.step(t0).unwrap(), StepOutcome::Continue);
        assert_eq!(e.step(t0 + Duration::from_millis(33)).unwrap(), StepOutcome::Continue);
        assert_eq!(e.step(t0 + Duration::from_millis(66)).unwrap(), StepOutcome::Exit);

        let path = dir.path().join("rob_settings.txt");
        assert_eq!(fs::read_to_string(&path).unwrap(), "493");
        assert_eq!(settings::load_head_tilt(&path).unwrap(), e.ctrl().head_tilt());
    }

    #[test]
    fn test_link_errors_continue() {
        let journal = Journal::new();
        let mut servos = SimServoDriver::new(&journal);
        let mut link = SimLink::new(&journal);
        link.fail_next(1);
        servos.fail_next(1);

        let output = PuppetOutput {
            servo_dems: vec![
                ServoDem { channel: ServoChannel::new(0).unwrap(), pulse: 300 },
                ServoDem { channel: ServoChannel::new(3).unwrap(), pulse: 400 },
            ],
            link_cmd: Some(RobCmd::Open),
            exit: false,
        };

        actuate(&output, &mut servos, &mut link);
        assert!(journal.link_bytes().is_empty());
        assert!(journal.pulses(0).is_empty());
        assert_eq!(journal.pulses(3), vec![400]);

        actuate(&output, &mut servos, &mut link);
        assert_eq!(journal.link_bytes(), vec![1]);
        assert_eq!(journal.pulses(0), vec![300]);
    }

    #[test]
    fn test_run_stops_on_chord() {
        let p = test_params();
        let journal = Journal::new();
        let dir = tempfile::tempdir().unwrap();
        let [a, b] = p.buttons.exit_chord;
        let open = PadSnapshot::neutral().with_pressed(p.buttons.open);

        let mut e = exec(
            &journal,
            vec![
                open,
                PadSnapshot::neutral(),
                PadSnapshot::neutral().with_pressed(a).with_pressed(b),
            ],
            485,
            &dir,
        );

        e.run(&ShutdownFlag::new()).unwrap();

        assert_eq!(e.num_cycles(), 3);
        assert_eq!(journal.link_bytes(), vec![1]);
        assert_eq!(
            journal.events().iter().filter(|ev| **ev == SimEvent::Frame).count(),
            3
        );
        assert!(dir.path().join("rob_settings.txt").exists());
    }

    #[test]
    fn test_run_shutdown_does_not_persist() {
        let journal = Journal::new();
        let dir = tempfile::tempdir().unwrap();
        let mut e = exec(&journal, vec![], 485, &dir);

        let shutdown = ShutdownFlag::new();
        shutdown.raise();
        e.run(&shutdown).unwrap();

        assert_eq!(e.num_cycles(), 0);
        assert!(!dir.path().join("rob_settings.txt").exists());
    }

    #[test]
    fn test_exit_reports_discarded_commands() {
        let p = test_params();
        let journal = Journal::new();
        let dir = tempfile::tempdir().unwrap();
        let [a, b] = p.buttons.exit_chord;
        let t0 = Instant::now();

        let mut e = exec(
            &journal,
            vec![
                PadSnapshot::neutral().with_pressed(p.buttons.open),
                PadSnapshot::neutral().with_pressed(p.buttons.home),
                PadSnapshot::neutral().with_pressed(a).with_pressed(b),
            ],
            485,
            &dir,
        );

        assert_eq!(e.step(t0).unwrap(), StepOutcome::Continue);
        assert_eq!(e.step(t0 + Duration::from_millis(33)).unwrap(), StepOutcome::Continue);
        assert_eq!(e.step(t0 + Duration::from_millis(66)).unwrap(), StepOutcome::Exit);

        // Open went out straight away, home was still waiting for its slot
        assert_eq!(journal.link_bytes(), vec![1]);
        assert_eq!(e.cmds_discarded(), 1);
    }

    #[test]
    fn test_pad_errors_continue() {
        let journal = Journal::new();
        let dir = tempfile::tempdir().unwrap();
        let mut e = exec(&journal, vec![], 485, &dir);
        e.eqpt.pad = Box::new(UnpluggedPad { failures: 3 });
        let t0 = Instant::now();

        for i in 0..5 {
            let now = t0 + Duration::from_millis(33 * i);
            assert_eq!(e.step(now).unwrap(), StepOutcome::Continue);
        }

        assert_eq!(e.num_cycles(), 5);
        assert_eq!(e.num_pad_errors(), 3);
        assert_eq!(e.pad_error_run, 0);
    }

    #[test]
    fn test_pad_error_log_rate() {
        let logged: Vec<u64> = (1..=1000).filter(|r| pad_error_logged(*r)).collect();
        assert_eq!(logged, vec![1, 300, 600, 900]);
    }
}
