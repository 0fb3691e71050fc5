use core::time::Duration;

use clap::{clap_app, App, ArgMatches};

use joyport::config::EmulatorConfig;
use joyport::input::Role;

use crate::Result;

const LOG_LEVELS: [log::LevelFilter;5] = [
    log::LevelFilter::Error,
    log::LevelFilter::Warn,
    log::LevelFilter::Info,
    log::LevelFilter::Debug,
    log::LevelFilter::Trace,
];
const DEFAULT_LOG_LEVEL: usize = 2;

pub fn app() -> App<'static, 'static> {
    clap_app!(joyportd =>
        (version: env!("CARGO_PKG_VERSION"))
        (about: "Emulates joystick and mouse ports of retro computers with Linux input devices")
        (@arg verbose: -v ... "Adds verbosity")
        (@arg quiet: -q ... "Adds quietness")
        (@arg bus: -i --bus +takes_value "I2C bus number of the I/O expander (default: 1)")
        (@arg address: -a --address +takes_value "I2C address of the I/O expander as a hexadecimal byte (default: 0x20)")
        (@arg device: -d --device +takes_value ... "Event device number for a role: m:N, j1:N or j2:N")
        (@arg mouse_port: -m --("mouse-port") +takes_value "Mouse port: 1 (default) or 2")
        (@arg joystick_port: -j --("joystick-port") +takes_value "First joystick port: 1 or 2 (default)")
        (@arg speed: -s --speed +takes_value "Mouse speed multiplier (default: 1.3)")
        (@arg pinout: --pinout +takes_value "Mouse wiring: amiga (default) or atari")
        (@arg period: --("period-ms") +takes_value "Port I/O cycle period in milliseconds (default: 4)")
        (@arg max_steps: --("max-steps") +takes_value "Maximum mouse steps per axis in a cycle (default: 8)")
        (@arg dry_run: --("dry-run") "Only logs the port levels instead of driving the I/O expander")
    )
}

/// Returns the logging level selected with `-v` and `-q`.
pub fn log_level(matches: &ArgMatches) -> log::LevelFilter {
    let verbose = matches.occurrences_of("verbose") as isize;
    let quiet = matches.occurrences_of("quiet") as isize;
    let index = (DEFAULT_LOG_LEVEL as isize + verbose - quiet).max(0).min(LOG_LEVELS.len() as isize - 1);
    LOG_LEVELS[index as usize]
}

/// Builds and validates the configuration from the command line.
pub fn config_from(matches: &ArgMatches) -> Result<EmulatorConfig> {
    let mut config = EmulatorConfig::default();
    if let Some(bus) = matches.value_of("bus") {
        config.i2c_bus = bus.parse().map_err(|_| format!("Invalid I2C bus number: {}", bus))?;
    }
    if let Some(address) = matches.value_of("address") {
        config.i2c_address = parse_address(address)?;
    }
    if let Some(devices) = matches.values_of("device") {
        for device in devices {
            let (role, number) = parse_device(device)?;
            match role {
                Role::Mouse => config.devices.mouse = Some(number),
                Role::Joystick1 => config.devices.joystick1 = Some(number),
                Role::Joystick2 => config.devices.joystick2 = Some(number),
            }
        }
    }
    if let Some(port) = matches.value_of("mouse_port") {
        config.mouse_port = port.parse()?;
    }
    if let Some(port) = matches.value_of("joystick_port") {
        config.joystick_port = port.parse()?;
    }
    if let Some(speed) = matches.value_of("speed") {
        config.mouse_speed = speed.parse().map_err(|_| format!("Invalid mouse speed: {}", speed))?;
    }
    if let Some(pinout) = matches.value_of("pinout") {
        config.mouse_pinout = pinout.parse()?;
    }
    if let Some(period) = matches.value_of("period") {
        let millis: u64 = period.parse().map_err(|_| format!("Invalid cycle period: {}", period))?;
        config.cycle_period = Duration::from_millis(millis);
    }
    if let Some(steps) = matches.value_of("max_steps") {
        config.max_steps_per_cycle = steps.parse()
                                     .map_err(|_| format!("Invalid number of steps: {}", steps))?;
    }
    config.validate()?;
    Ok(config)
}

/// Parses a hexadecimal I2C address with or without the `0x` prefix.
pub fn parse_address(address: &str) -> Result<u16> {
    let digits = address.strip_prefix("0x")
                        .or_else(|| address.strip_prefix("0X"))
                        .unwrap_or(address);
    let address = u16::from_str_radix(digits, 16)
                  .map_err(|_| format!("Invalid I2C address: {}", address))?;
    Ok(address)
}

/// Parses an event device number selected for a role, e.g. `j1:5`.
pub fn parse_device(device: &str) -> Result<(Role, u32)> {
    let mut parts = device.splitn(2, ':');
    let role = match parts.next() {
        Some("m") => Role::Mouse,
        Some("j1") => Role::Joystick1,
        Some("j2") => Role::Joystick2,
        _ => return Err(format!("Invalid device role in: {}, select one of: m, j1, j2", device).into())
    };
    let number = parts.next()
                 .and_then(|n| n.parse().ok())
                 .ok_or_else(|| format!("Invalid event device number in: {}", device))?;
    Ok((role, number))
}
