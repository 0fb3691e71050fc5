use std::process;

#[allow(unused_imports)]
use log::{error, warn, info, debug, trace};

use joyport::{
    gpio::NullPinDriver,
    registry::ScanError,
    Emulator, EmulatorConfig, ExitReason, PortAssignment, ShutdownSignal, StartupError
};
#[cfg(feature = "mcp23017")]
use joyport_core::mcp23017::Mcp23017;

mod args;

type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>;

fn main() {
    let matches = args::app().get_matches();

    env_logger::Builder::new()
        .filter_level(args::log_level(&matches))
        .parse_default_env()
        .init();

    let config = match args::config_from(&matches) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            process::exit(1)
        }
    };
    debug!("{:?}", config);

    let code = match run(&config, matches.is_present("dry_run")) {
        Ok(ExitReason::Requested) => 0,
        Ok(_) => 1,
        Err(err) => {
            error!("{} - exiting", err);
            if let Some(hint) = hint(&err) {
                error!("{}", hint);
            }
            1
        }
    };
    process::exit(code)
}

fn run(config: &EmulatorConfig, dry_run: bool) -> core::result::Result<ExitReason, StartupError> {
    let shutdown = ShutdownSignal::new();
    if let Err(err) = install_signal_handler(&shutdown) {
        warn!("can't handle the termination signals: {}", err);
    }
    let devices = joyport_utils::scan(config)?;
    if devices.is_empty() {
        return Err(StartupError::NoUsableDevices)
    }
    let assignment = PortAssignment::resolve(config, devices.has_mouse(), devices.joysticks.len())?;
    let emulator = if dry_run {
        warn!("dry run, the I/O expander is not used");
        Emulator::start_with_signal(config, assignment, devices, NullPinDriver, shutdown)?
    }
    else {
        start_with_expander(config, assignment, devices, shutdown)?
    };
    Ok(emulator.wait())
}

/// Requests the `shutdown` on SIGINT, SIGTERM or SIGHUP so the port lines get released.
fn install_signal_handler(shutdown: &ShutdownSignal) -> core::result::Result<(), ctrlc::Error> {
    let shutdown = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("termination requested");
        shutdown.request();
    })
}

#[cfg(feature = "mcp23017")]
fn start_with_expander(
        config: &EmulatorConfig,
        assignment: PortAssignment,
        devices: joyport::registry::DeviceSet,
        shutdown: ShutdownSignal
    ) -> core::result::Result<Emulator, StartupError>
{
    let driver = Mcp23017::open(config.i2c_bus, config.i2c_address)?;
    Emulator::start_with_signal(config, assignment, devices, driver, shutdown)
}

#[cfg(not(feature = "mcp23017"))]
fn start_with_expander(
        config: &EmulatorConfig,
        assignment: PortAssignment,
        devices: joyport::registry::DeviceSet,
        shutdown: ShutdownSignal
    ) -> core::result::Result<Emulator, StartupError>
{
    warn!("built without the I/O expander support");
    Emulator::start_with_signal(config, assignment, devices, NullPinDriver, shutdown)
}

fn hint(err: &StartupError) -> Option<&'static str> {
    Some(match err {
        StartupError::Scan(ScanError::NoDevices) => {
            "make sure your devices are powered on and paired"
        }
        StartupError::Scan(ScanError::Access(..)) => {
            "make sure you have permission to access /dev/input"
        }
        StartupError::NoUsableDevices => {
            "no input device is suitable for emulating either a mouse or a joystick"
        }
        _ => return None
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::{Duration, Instant};

    #[test]
    fn termination_signal_requests_shutdown() {
        let shutdown = ShutdownSignal::new();
        install_signal_handler(&shutdown).unwrap();
        let status = Command::new("kill")
                     .args(&["-TERM", &process::id().to_string()])
                     .status().unwrap();
        assert!(status.success());
        let start = Instant::now();
        while !shutdown.is_requested() && start.elapsed() < Duration::from_secs(5) {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(shutdown.is_requested());
    }
}
