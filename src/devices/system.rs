use super::{BluetoothDevice, DeviceController, OutputSink};
use anyhow::{bail, Context, Result};
use std::process::Command;
use tracing::{debug, warn};

/// Drives `bluetoothctl` and `pactl`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDeviceController;

impl SystemDeviceController {
    fn run(program: &str, args: &[&str]) -> Result<String> {
        debug!("Running {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to run {program}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} {} failed: {}", program, args.join(" "), stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DeviceController for SystemDeviceController {
    fn bluetooth_devices(&self) -> Result<Vec<BluetoothDevice>> {
        Ok(parse_bluetooth_devices(&Self::run("bluetoothctl", &["devices"])?))
    }

    fn connect(&self, device: &BluetoothDevice) -> Result<()> {
        // Already-paired devices make `pair` fail; `connect` decides
        if let Err(e) = Self::run("bluetoothctl", &["pair", &device.address]) {
            warn!("Pairing {} reported: {:#}", device.address, e);
        }
        Self::run("bluetoothctl", &["trust", &device.address])?;
        Self::run("bluetoothctl", &["connect", &device.address])?;
        Ok(())
    }

    fn sinks(&self) -> Result<Vec<OutputSink>> {
        Ok(parse_sinks(&Self::run("pactl", &["list", "short", "sinks"])?))
    }

    fn set_default_sink(&self, sink: &OutputSink) -> Result<()> {
        Self::run("pactl", &["set-default-sink", &sink.name])?;
        Ok(())
    }

    fn set_volume(&self, sink: &OutputSink, percent: u8) -> Result<()> {
        let volume = format!("{}%", percent.min(100));
        Self::run("pactl", &["set-sink-volume", &sink.name, &volume])?;
        Ok(())
    }
}

/// Lines look like `Device AA:BB:CC:DD:EE:FF Some Name`.
fn parse_bluetooth_devices(output: &str) -> Vec<BluetoothDevice> {
    output
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (address, name) = rest.split_once(' ').unwrap_or((rest, rest));
            Some(BluetoothDevice {
                address: address.to_string(),
                name: name.trim().to_string(),
            })
        })
        .collect()
}

/// Tab-separated: `id  name  module  format  state`.
fn parse_sinks(output: &str) -> Vec<OutputSink> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let id = fields.next()?.trim();
            let name = fields.next()?.trim();
            if id.is_empty() || name.is_empty() {
                return None;
            }
            Some(OutputSink {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bluetoothctl_devices() {
        let out = "Device 00:11:22:33:44:55 JBL Flip 5\nnoise\nDevice AA:BB:CC:DD:EE:FF Buds\n";
        let devices = parse_bluetooth_devices(out);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name, "JBL Flip 5");
        assert_eq!(devices[1].address, "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn parses_pactl_short_sinks() {
        let out = "0\talsa_output.pci.analog-stereo\tmodule-alsa-card.c\ts16le 2ch 44100Hz\tSUSPENDED\n\n";
        let sinks = parse_sinks(out);
        assert_eq!(
            sinks,
            vec![OutputSink {
                id: "0".into(),
                name: "alsa_output.pci.analog-stereo".into()
            }]
        );
    }
}
