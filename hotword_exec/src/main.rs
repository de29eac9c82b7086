//! Hotword dispatcher executable entry point.
//!
//! # Architecture
//!
//! - Initialise the session, logger and parameters
//! - Load the hotword templates
//! - Open the equipment (real or simulated)
//! - Centre the virtual stick and switch the LED on
//! - Main loop:
//!     - Take captured audio
//!     - Detect hotwords
//!     - Press or release the bound virtual button and flash the LED
//! - On Ctrl+C stop capture and exit

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use embedded_hal::blocking::delay::DelayMs;
use log::{info, warn};
use structopt::StructOpt;

// Internal
use eqpt_drv::delay::StdDelay;
use eqpt_if::{
    eqpt::{audio::AudioSource, servo::ServoDriver, vpad::VirtualPad},
    sim::*,
};
use hotword_lib::{
    detector::HotwordDetector,
    dispatch::{Binding, Dispatcher, LedFlasher},
    exec::HotwordExec,
    params::HotwordExecParams,
};
use util::{
    host,
    logger::{logger_init, parse_level, LevelFilter},
    session::Session,
    shutdown::ShutdownFlag,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "hotword_exec", about = "Play ROB by voice")]
struct Opts {
    /// Parameter file, relative to $ROB_SW_ROOT/params unless absolute
    #[structopt(long, default_value = "hotword_exec.toml")]
    params: String,

    /// Use simulated equipment instead of the real hardware
    #[structopt(long)]
    sim: bool,

    /// Minimum level of log messages (info, debug or trace)
    #[structopt(long, default_value = "info", parse(try_from_str = parse_level))]
    log_level: LevelFilter,
}

/// Everything the dispatcher drives or reads from.
struct Equipment {
    servos: Box<dyn ServoDriver>,
    vpad: Box<dyn VirtualPad>,
    audio: Box<dyn AudioSource>,
    delay: Box<dyn DelayMs<u16>>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("hotword_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("ROB Hotword Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: HotwordExecParams = util::params::load(&opts.params)
        .wrap_err("Could not load hotword params")?;
    params.are_valid().wrap_err("Invalid hotword params")?;

    info!("Exec parameters loaded");

    // ---- LOAD HOTWORDS ----

    let model_paths = params.bindings
        .iter()
        .map(|b| util::params::resolve_sw_path(&b.model))
        .collect::<Result<Vec<_>, _>>()
        .wrap_err("Could not resolve the hotword template paths")?;

    let detector = HotwordDetector::from_wavs(
        &model_paths,
        params.sensitivity,
        params.audio_gain,
        &params.detector,
    ).wrap_err("Could not load the hotword templates")?;

    let bindings: Vec<Binding> = detector.templates()
        .iter()
        .zip(params.bindings.iter())
        .map(|(t, b)| Binding { model: t.name.clone(), action: b.action })
        .collect();

    // ---- INITIALISE EQUIPMENT ----

    let use_sim = opts.sim || !eqpt_drv::hardware_available();
    let eqpt = if use_sim {
        if !opts.sim {
            warn!("Hardware drivers are not available on this target, using simulated equipment");
        }
        sim_equipment()
    }
    else {
        hardware_equipment(&params)?
    };

    info!("Equipment initialised ({})", if use_sim { "simulated" } else { "hardware" });

    let shutdown = ShutdownFlag::on_sigint()
        .wrap_err("Failed to install the Ctrl+C handler")?;

    let led = LedFlasher::new(
        eqpt.servos,
        eqpt.delay,
        params.led.channel,
        params.led.on_pulse,
        params.led.flash_step_ms,
    );
    let dispatcher = Dispatcher::new(bindings, eqpt.vpad, led);

    let mut exec = HotwordExec::new(detector, dispatcher, eqpt.audio, params.sleep_time_ms);

    // ---- STARTUP ----

    exec.startup(params.pwm_freq_hz).wrap_err("Startup failed")?;

    // ---- MAIN LOOP ----

    exec.run(&shutdown);

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}

/// Equipment which logs what it is asked to do. The microphone hears nothing.
fn sim_equipment() -> Equipment {
    let journal = Journal::log_only();

    Equipment {
        servos: Box::new(SimServoDriver::new(&journal)),
        vpad: Box::new(SimVirtualPad::new(&journal)),
        audio: Box::new(SimAudio::new(Vec::new())),
        delay: Box::new(StdDelay),
    }
}

#[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
fn hardware_equipment(params: &HotwordExecParams) -> Result<Equipment, Report> {
    use eqpt_drv::{audio::MicCapture, open_i2c, servo_ctrl::Pca9685Board, vpad::UinputPad};

    let servos = Pca9685Board::new(
        open_i2c(params.i2c_bus).wrap_err("Could not open the servo board's I2C bus")?,
        params.pwm_address
    ).wrap_err("Could not initialise the servo board")?;
    info!("Servo board initialised");

    let vpad = UinputPad::create(&params.vpad_name)
        .wrap_err("Could not create the virtual gamepad")?;
    info!("Virtual gamepad \"{}\" created", params.vpad_name);

    let audio = MicCapture::open().wrap_err("Could not open the microphone")?;
    info!("Microphone initialised");

    Ok(Equipment {
        servos: Box::new(servos),
        vpad: Box::new(vpad),
        audio: Box::new(audio),
        delay: Box::new(StdDelay),
    })
}

#[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
fn hardware_equipment(_params: &HotwordExecParams) -> Result<Equipment, Report> {
    Err(color_eyre::eyre::eyre!("Hardware drivers are not built for this target"))
}
