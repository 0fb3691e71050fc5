/*
    Copyright (C) 2026  The JOYPORT authors

    This file is part of JOYPORT, a retro joystick and mouse port emulator.

    For the full copyright notice, see the lib.rs file.
*/
//! Discovery of the input devices.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[allow(unused_imports)]
use log::{warn, info, debug};

#[cfg(feature = "evdev")]
use joyport::{
    config::EmulatorConfig,
    input::{EventSource, Role},
    registry::{select_devices, Candidate, DeviceSet, ScanError}
};

/// The directory of the Linux event devices.
pub const INPUT_DIR: &str = "/dev/input";

const EVENT_PREFIX: &str = "event";

/// Returns the device number from a file name of an event device, e.g. `event5` is 5.
pub fn device_number(file_name: &str) -> Option<u32> {
    let digits = file_name.strip_prefix(EVENT_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None
    }
    digits.parse().ok()
}

/// Returns the paths of the event devices in `dir` with their numbers, ordered by number.
pub fn list_event_devices<P: AsRef<Path>>(dir: P) -> io::Result<Vec<(u32, PathBuf)>> {
    let mut devices = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let number = match entry.file_name().to_str().and_then(device_number) {
            Some(number) => number,
            None => continue
        };
        devices.push((number, entry.path()));
    }
    devices.sort_unstable();
    Ok(devices)
}

/// Scans the event devices in [INPUT_DIR] and opens the mouse and the joysticks
/// for emulation.
#[cfg(feature = "evdev")]
pub fn scan(config: &EmulatorConfig) -> Result<DeviceSet, ScanError> {
    scan_dir(INPUT_DIR, config)
}

/// Scans the event devices in `dir` and opens the mouse and the joysticks for emulation.
///
/// Returns [ScanError::NoDevices] if there are no event devices at all and [ScanError::Access]
/// if the directory can't be read or none of the devices can be opened because of missing
/// permissions. Otherwise returns the selected devices which may be empty if none of them
/// is usable.
#[cfg(feature = "evdev")]
pub fn scan_dir<P: AsRef<Path>>(dir: P, config: &EmulatorConfig) -> Result<DeviceSet, ScanError> {
    use crate::evdev::{capabilities, EvdevSource};

    let paths = list_event_devices(dir)?;
    if paths.is_empty() {
        return Err(ScanError::NoDevices)
    }
    let mut candidates = Vec::with_capacity(paths.len());
    let mut denied = None;
    for (number, path) in paths {
        match ::evdev::Device::open(&path) {
            Ok(device) => {
                let name = device.name().unwrap_or("unnamed").to_string();
                let capabilities = capabilities(&device);
                debug!("{}: {} {:?}", path.display(), name, capabilities);
                candidates.push(Candidate { number, name, capabilities, device });
            }
            Err(err) => {
                debug!("{}: {}", path.display(), err);
                if err.kind() == io::ErrorKind::PermissionDenied {
                    denied = Some(err);
                }
            }
        }
    }
    if candidates.is_empty() {
        if let Some(err) = denied {
            return Err(ScanError::Access(err))
        }
    }

    let mut devices = DeviceSet::default();
    for (role, candidate) in select_devices(candidates, &config.devices).into_roles() {
        info!("{}: {} (event{})", role, candidate.name, candidate.number);
        let source: Box<dyn EventSource> = Box::new(
            EvdevSource::new(role, candidate.name, candidate.device, config.mouse_speed));
        match role {
            Role::Mouse => devices.mouse = Some(source),
            Role::Joystick1|Role::Joystick2 => devices.joysticks.push(source)
        }
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn device_number_works() {
        assert_eq!(device_number("event0"), Some(0));
        assert_eq!(device_number("event17"), Some(17));
        assert_eq!(device_number("event"), None);
        assert_eq!(device_number("event+1"), None);
        assert_eq!(device_number("mouse0"), None);
        assert_eq!(device_number("by-id"), None);
    }

    #[test]
    fn list_event_devices_works() {
        let dir = std::env::temp_dir().join(format!("joyport-scan-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in &["event10", "event2", "mice", "mouse0", "js0", "event0"] {
            File::create(dir.join(name)).unwrap();
        }
        let devices = list_event_devices(&dir).unwrap();
        let numbers: Vec<_> = devices.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, [0, 2, 10]);
        assert_eq!(devices[1].1, dir.join("event2"));
        fs::remove_dir_all(&dir).unwrap();

        assert!(list_event_devices(&dir).is_err());
    }

    #[cfg(feature = "evdev")]
    #[test]
    fn scan_reports_missing_devices() {
        let config = EmulatorConfig::default();
        let dir = std::env::temp_dir().join(format!("joyport-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        File::create(dir.join("mice")).unwrap();
        assert!(matches!(scan_dir(&dir, &config), Err(ScanError::NoDevices)));
        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(scan_dir(&dir, &config), Err(ScanError::Access(..))));
    }
}
