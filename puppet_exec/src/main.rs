//! Puppet loop executable entry point.
//!
//! # Architecture
//!
//! - Initialise the session, logger and parameters
//! - Load the persisted head tilt
//! - Open the equipment (real or simulated)
//! - Run the startup sequence
//! - Main loop at 30 Hz:
//!     - Poll the gamepad
//!     - Puppet control processing
//!     - Actuation of servos and the command link
//!     - Crosshair redraw
//! - On the exit chord save the head tilt and re-enable the projector

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use structopt::StructOpt;

// Internal
use eqpt_if::sim::*;
use eqpt_drv::delay::StdDelay;
use puppet_lib::{
    exec::{Equipment, PuppetExec},
    params::PuppetExecParams,
    settings::{self, SettingsError},
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
#[structopt(name = "puppet_exec", about = "Puppeteer ROB from a gamepad")]
struct Opts {
    /// Parameter file, relative to $ROB_SW_ROOT/params unless absolute
    #[structopt(long, default_value = "puppet_exec.toml")]
    params: String,

    /// Use simulated equipment instead of the real hardware
    #[structopt(long)]
    sim: bool,

    /// Minimum level of log messages (info, debug or trace)
    #[structopt(long, default_value = "info", parse(try_from_str = parse_level))]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("puppet_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("ROB Puppet Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: PuppetExecParams = util::params::load(&opts.params)
        .wrap_err("Could not load puppet params")?;
    params.are_valid().wrap_err("Invalid puppet params")?;

    info!("Exec parameters loaded");

    // ---- LOAD SETTINGS ----

    let settings_path = util::params::resolve_sw_path(&params.settings_file)
        .wrap_err("Could not resolve the settings file path")?;

    let head_tilt = match settings::load_head_tilt(&settings_path) {
        Ok(t) => t,
        Err(SettingsError::NotFound(p)) => {
            warn!(
                "No settings file at {:?}, using the default head tilt of {}",
                p, params.head_tilt.home
            );
            params.head_tilt.home
        },
        Err(e) => return Err(e).wrap_err("Failed to load the head tilt"),
    };

    info!("Head tilt: {}", head_tilt);

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

    let mut exec = PuppetExec::new(params, head_tilt, settings_path, eqpt)
        .wrap_err("Failed to initialise PuppetCtrl")?;

    // Keep a copy of the crosshair with the session for checking the alignment later
    if let Err(e) = exec.frame().save(session.path("crosshair.png")) {
        warn!("Could not save the crosshair image: {}", e);
    }

    // ---- STARTUP ----

    exec.startup().wrap_err("Startup sequence failed")?;

    // ---- MAIN LOOP ----

    exec.run(&shutdown).wrap_err("Main loop failed")?;

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}

/// Equipment which logs what it is asked to do. The gamepad stays neutral.
fn sim_equipment() -> Equipment {
    let journal = Journal::log_only();

    Equipment {
        servos: Box::new(SimServoDriver::new(&journal)),
        link: Box::new(SimLink::new(&journal)),
        pad: Box::new(SimGamepad::new(Vec::new())),
        surface: Box::new(SimSurface::new(&journal)),
        delay: Box::new(StdDelay),
    }
}

#[cfg(any(target_arch = "arm", target_arch = "aarch64"))]
fn hardware_equipment(params: &PuppetExecParams) -> Result<Equipment, Report> {
    use eqpt_drv::{
        framebuffer::FbSurface,
        gamepad::GilrsPad,
        link::I2cLink,
        open_i2c,
        servo_ctrl::Pca9685Board,
    };

    let servos = Pca9685Board::new(
        open_i2c(params.i2c_bus).wrap_err("Could not open the servo board's I2C bus")?,
        params.pwm_address
    ).wrap_err("Could not initialise the servo board")?;
    info!("Servo board initialised");

    let link = I2cLink::new(
        open_i2c(params.i2c_bus).wrap_err("Could not open the command link's I2C bus")?,
        params.link_address
    );
    info!("Command link initialised");

    let pad = GilrsPad::open().wrap_err("Could not open the gamepad")?;
    info!("Gamepad initialised");

    let surface = FbSurface::open(&params.framebuffer)
        .wrap_err("Could not open the framebuffer")?;
    info!("Framebuffer initialised: {:?}", surface.info());

    Ok(Equipment {
        servos: Box::new(servos),
        link: Box::new(link),
        pad: Box::new(pad),
        surface: Box::new(surface),
        delay: Box::new(StdDelay),
    })
}

#[cfg(not(any(target_arch = "arm", target_arch = "aarch64")))]
fn hardware_equipment(_params: &PuppetExecParams) -> Result<Equipment, Report> {
    Err(color_eyre::eyre::eyre!("Hardware drivers are not built for this target"))
}
