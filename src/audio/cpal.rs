// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info};

use super::output::{Output as AudioOutput, OutputFormat, Stream as AudioStream};
use super::synth::Synth;
use crate::config;

/// The device name that selects the host's default output device.
const DEFAULT_DEVICE: &str = "default";

/// An output device known to cpal.
pub struct DeviceInfo {
    /// The name of the device.
    pub name: String,
    /// The maximum number of channels the device supports.
    pub max_channels: u16,
    /// The host ID of the device.
    pub host_id: cpal::HostId,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

/// Lists cpal output devices.
#[allow(deprecated)]
pub fn list_devices() -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
    // Suppress noisy output here.
    let _shh_stdout = shh::stdout()?;
    let _shh_stderr = shh::stderr()?;

    let mut devices: Vec<DeviceInfo> = Vec::new();
    for host_id in cpal::available_hosts() {
        let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
            Ok(host_devices) => host_devices,
            Err(e) => {
                error!(
                    err = e.to_string(),
                    host = host_id.name(),
                    "Unable to list devices for host"
                );
                continue;
            }
        };

        for device in host_devices {
            let max_channels = match device.supported_output_configs() {
                Ok(configs) => configs.map(|config| config.channels()).max().unwrap_or(0),
                Err(_) => continue,
            };

            if max_channels > 0 {
                devices.push(DeviceInfo {
                    name: device.name()?,
                    max_channels,
                    host_id,
                });
            }
        }
    }

    devices.sort_by_key(|device| device.name.to_string());
    Ok(devices)
}

/// Finds the given output device on the default host.
#[allow(deprecated)]
fn find_device(name: &str) -> Result<cpal::Device, Box<dyn Error>> {
    let host = cpal::default_host();
    if name == DEFAULT_DEVICE {
        return host
            .default_output_device()
            .ok_or_else(|| "no default output device".into());
    }

    host.output_devices()?
        .find(|device| {
            device
                .name()
                .map(|device_name| device_name.trim() == name)
                .unwrap_or(false)
        })
        .ok_or_else(|| format!("no device found with name {}", name).into())
}

/// A cpal backed output.
pub struct Output {
    /// The name of the device.
    device_name: String,
    /// Overrides the device's default sample rate.
    sample_rate: Option<u32>,
    /// Overrides the device's default channel count.
    channels: Option<u16>,
    /// How long to wait for the stream to start on resume.
    resume_timeout: Duration,
}

impl Output {
    /// Creates a new cpal output from the audio configuration.
    pub fn new(config: &config::Audio) -> Result<Output, Box<dyn Error>> {
        Ok(Output {
            device_name: config.device().to_string(),
            sample_rate: config.sample_rate(),
            channels: config.channels(),
            resume_timeout: config.resume_timeout()?,
        })
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (CPAL)", self.device_name)
    }
}

/// Commands sent to the thread that owns the cpal stream.
enum Command {
    Resume(Sender<Result<(), String>>),
}

/// Handle to a cpal stream living on its own thread. cpal streams can't move between threads
/// on every platform, so the stream is built, driven and dropped there.
struct Stream {
    commands: Sender<Command>,
    running: Arc<AtomicBool>,
    resume_timeout: Duration,
}

impl AudioStream for Stream {
    fn resume(&self) -> Result<(), Box<dyn Error>> {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        self.commands.send(Command::Resume(ack_tx))?;
        ack_rx.recv_timeout(self.resume_timeout)??;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl AudioOutput for Output {
    fn format(&self) -> Result<OutputFormat, Box<dyn Error>> {
        let device = find_device(&self.device_name)?;
        let default = device.default_output_config()?;
        Ok(OutputFormat {
            sample_rate: self.sample_rate.unwrap_or(default.sample_rate()),
            channels: self.channels.unwrap_or(default.channels()),
        })
    }

    fn open(
        &self,
        format: OutputFormat,
        synth: Synth,
    ) -> Result<Box<dyn AudioStream>, Box<dyn Error>> {
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<bool, String>>(1);
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<Command>();
        let running = Arc::new(AtomicBool::new(false));

        let device_name = self.device_name.clone();
        let stream_running = running.clone();
        thread::spawn(move || {
            let stream = match build_stream(&device_name, format, synth) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            // Start suspended. Some backends can't pause, in which case the stream is already
            // pulling audio.
            let suspended = match stream.pause() {
                Ok(()) => true,
                Err(e) => {
                    debug!(err = e.to_string(), "Unable to suspend CPAL stream");
                    false
                }
            };
            stream_running.store(!suspended, Ordering::Relaxed);
            let _ = ready_tx.send(Ok(suspended));

            run_stream(stream, command_rx, stream_running);
        });

        let suspended = ready_rx.recv()??;
        info!(
            device = self.device_name,
            sample_rate = format.sample_rate,
            channels = format.channels,
            suspended,
            "CPAL output stream opened"
        );

        Ok(Box::new(Stream {
            commands: command_tx,
            running,
            resume_timeout: self.resume_timeout,
        }))
    }
}

/// Builds the cpal stream that renders from the synth.
fn build_stream(
    device_name: &str,
    format: OutputFormat,
    synth: Synth,
) -> Result<cpal::Stream, Box<dyn Error>> {
    let device = find_device(device_name)?;
    let config = cpal::StreamConfig {
        channels: format.channels,
        sample_rate: format.sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    Ok(device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| synth.render(data),
        |err| error!("CPAL output stream error: {}", err),
        None,
    )?)
}

/// Keeps the stream alive and services commands until every handle has been dropped.
fn run_stream(stream: cpal::Stream, commands: Receiver<Command>, running: Arc<AtomicBool>) {
    while let Ok(command) = commands.recv() {
        match command {
            Command::Resume(ack) => {
                let result = stream.play().map_err(|e| e.to_string());
                if result.is_ok() {
                    running.store(true, Ordering::Relaxed);
                }
                let _ = ack.send(result);
            }
        }
    }
    debug!("CPAL output stream closed");
}
