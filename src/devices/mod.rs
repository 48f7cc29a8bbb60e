// Audio device configuration reached from the Settings screen.
// The OS side (bluetoothctl / pactl) sits behind `DeviceController`; the flow
// itself is a plain state machine driven one key at a time.

mod system;

pub use system::SystemDeviceController;

use crate::ui::events::Key;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BluetoothDevice {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSink {
    pub id: String,
    pub name: String,
}

pub trait DeviceController {
    fn bluetooth_devices(&self) -> Result<Vec<BluetoothDevice>>;
    fn connect(&self, device: &BluetoothDevice) -> Result<()>;
    fn sinks(&self) -> Result<Vec<OutputSink>>;
    fn set_default_sink(&self, sink: &OutputSink) -> Result<()>;
    fn set_volume(&self, sink: &OutputSink, percent: u8) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFlow {
    DeviceList {
        devices: Vec<BluetoothDevice>,
        selected: usize,
    },
    Pairing {
        device: BluetoothDevice,
    },
    SinkSelect {
        sinks: Vec<OutputSink>,
        selected: usize,
    },
    VolumeInput {
        sink: OutputSink,
        input: String,
    },
}

/// Result of feeding one key to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStep {
    /// `None` once the flow has finished or been backed out of.
    pub next: Option<DeviceFlow>,
    pub message: Option<String>,
}

impl FlowStep {
    fn stay(flow: DeviceFlow) -> Self {
        Self {
            next: Some(flow),
            message: None,
        }
    }

    fn to(flow: DeviceFlow, message: impl Into<String>) -> Self {
        Self {
            next: Some(flow),
            message: Some(message.into()),
        }
    }

    fn close(message: Option<String>) -> Self {
        Self {
            next: None,
            message,
        }
    }
}

impl DeviceFlow {
    /// Begin at the bluetooth device list.
    pub fn bluetooth(ctl: &dyn DeviceController) -> Result<Self> {
        Ok(DeviceFlow::DeviceList {
            devices: ctl.bluetooth_devices()?,
            selected: 0,
        })
    }

    /// Begin directly at output sink selection.
    pub fn output(ctl: &dyn DeviceController) -> Result<Self> {
        Ok(DeviceFlow::SinkSelect {
            sinks: ctl.sinks()?,
            selected: 0,
        })
    }

    pub fn title(&self) -> &'static str {
        match self {
            DeviceFlow::DeviceList { .. } => "Bluetooth Devices",
            DeviceFlow::Pairing { .. } => "Pair",
            DeviceFlow::SinkSelect { .. } => "Output",
            DeviceFlow::VolumeInput { .. } => "Volume",
        }
    }

    /// Lines to show for the current state, plus which one is highlighted.
    pub fn lines(&self) -> (Vec<String>, Option<usize>) {
        match self {
            DeviceFlow::DeviceList { devices, selected } => {
                if devices.is_empty() {
                    (vec!["No bluetooth devices found".to_string()], None)
                } else {
                    let lines = devices
                        .iter()
                        .map(|d| format!("{} ({})", d.name, d.address))
                        .collect();
                    (lines, Some(*selected))
                }
            }
            DeviceFlow::Pairing { device } => (
                vec![
                    format!("Pair and connect {}?", device.name),
                    "Enter: connect   Left: back".to_string(),
                ],
                None,
            ),
            DeviceFlow::SinkSelect { sinks, selected } => {
                if sinks.is_empty() {
                    (vec!["No output sinks found".to_string()], None)
                } else {
                    (sinks.iter().map(|s| s.name.clone()).collect(), Some(*selected))
                }
            }
            DeviceFlow::VolumeInput { sink, input } => (
                vec![
                    format!("Volume for {} (0-100)", sink.name),
                    format!("> {}_", input),
                ],
                None,
            ),
        }
    }

    /// The single dispatch table for the flow: (state, key) -> next state.
    pub fn handle(self, key: Key, ctl: &dyn DeviceController) -> FlowStep {
        match (self, key) {
            (DeviceFlow::DeviceList { devices, selected }, Key::Up) => {
                FlowStep::stay(DeviceFlow::DeviceList {
                    selected: selected.saturating_sub(1),
                    devices,
                })
            }
            (DeviceFlow::DeviceList { devices, selected }, Key::Down) => {
                let last = devices.len().saturating_sub(1);
                FlowStep::stay(DeviceFlow::DeviceList {
                    selected: (selected + 1).min(last),
                    devices,
                })
            }
            (DeviceFlow::DeviceList { devices, selected }, Key::Enter) => {
                match devices.get(selected).cloned() {
                    Some(device) => FlowStep::stay(DeviceFlow::Pairing { device }),
                    None => FlowStep::stay(DeviceFlow::DeviceList { devices, selected }),
                }
            }
            (DeviceFlow::DeviceList { .. }, Key::Left | Key::Back) => FlowStep::close(None),

            (DeviceFlow::Pairing { device }, Key::Enter) => match ctl.connect(&device) {
                Ok(()) => match ctl.sinks() {
                    Ok(sinks) => FlowStep::to(
                        DeviceFlow::SinkSelect { sinks, selected: 0 },
                        format!("Connected {}", device.name),
                    ),
                    Err(e) => FlowStep::close(Some(format!("Connected, but listing sinks failed: {e}"))),
                },
                Err(e) => FlowStep::to(
                    DeviceFlow::Pairing { device },
                    format!("Pairing failed: {e}"),
                ),
            },
            (DeviceFlow::Pairing { .. }, Key::Left | Key::Back) => match DeviceFlow::bluetooth(ctl) {
                Ok(list) => FlowStep::stay(list),
                Err(e) => FlowStep::close(Some(format!("Listing devices failed: {e}"))),
            },

            (DeviceFlow::SinkSelect { sinks, selected }, Key::Up) => {
                FlowStep::stay(DeviceFlow::SinkSelect {
                    selected: selected.saturating_sub(1),
                    sinks,
                })
            }
            (DeviceFlow::SinkSelect { sinks, selected }, Key::Down) => {
                let last = sinks.len().saturating_sub(1);
                FlowStep::stay(DeviceFlow::SinkSelect {
                    selected: (selected + 1).min(last),
                    sinks,
                })
            }
            (DeviceFlow::SinkSelect { sinks, selected }, Key::Enter) => {
                match sinks.get(selected).cloned() {
                    Some(sink) => match ctl.set_default_sink(&sink) {
                        Ok(()) => FlowStep::to(
                            DeviceFlow::VolumeInput {
                                sink: sink.clone(),
                                input: String::new(),
                            },
                            format!("Output set to {}", sink.name),
                        ),
                        Err(e) => FlowStep::to(
                            DeviceFlow::SinkSelect { sinks, selected },
                            format!("Switching output failed: {e}"),
                        ),
                    },
                    None => FlowStep::stay(DeviceFlow::SinkSelect { sinks, selected }),
                }
            }
            (DeviceFlow::SinkSelect { .. }, Key::Left | Key::Back) => FlowStep::close(None),

            (DeviceFlow::VolumeInput { sink, mut input }, Key::Char(c)) => {
                if c.is_ascii_digit() && input.len() < 3 {
                    input.push(c);
                }
                FlowStep::stay(DeviceFlow::VolumeInput { sink, input })
            }
            (DeviceFlow::VolumeInput { sink, mut input }, Key::Backspace) => {
                input.pop();
                FlowStep::stay(DeviceFlow::VolumeInput { sink, input })
            }
            (DeviceFlow::VolumeInput { sink, input }, Key::Enter) => {
                match input.parse::<u8>().ok().filter(|v| *v <= 100) {
                    Some(percent) => match ctl.set_volume(&sink, percent) {
                        Ok(()) => FlowStep::close(Some(format!("Volume {}% on {}", percent, sink.name))),
                        Err(e) => FlowStep::to(
                            DeviceFlow::VolumeInput { sink, input },
                            format!("Setting volume failed: {e}"),
                        ),
                    },
                    None => FlowStep::to(
                        DeviceFlow::VolumeInput {
                            sink,
                            input: String::new(),
                        },
                        "Enter a number from 0 to 100",
                    ),
                }
            }
            (DeviceFlow::VolumeInput { .. }, Key::Left | Key::Back) => match ctl.sinks() {
                Ok(sinks) => FlowStep::stay(DeviceFlow::SinkSelect { sinks, selected: 0 }),
                Err(e) => FlowStep::close(Some(format!("Listing sinks failed: {e}"))),
            },

            (flow, _) => FlowStep::stay(flow),
        }
    }
}
