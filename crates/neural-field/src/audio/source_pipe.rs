//! Audio device capture and stream management.
//!
//! Handles audio input from system devices using cpal, managing device
//! enumeration, stream creation, and a ring buffer for sample storage.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

use super::analyzer::AudioInput;
use super::node::FFT_SIZE;
use crate::error::AudioError;

/// Samples kept in the ring buffer, one FFT window
pub const BUFFER_SIZE: usize = FFT_SIZE;

pub struct DeviceInfo {
    pub device: cpal::Device,
    pub name: String,
    pub is_input: bool,
}

pub struct SourcePipe {
    buffer: Arc<Mutex<VecDeque<f32>>>,
    stream: Option<Stream>,
    sample_rate: Option<f32>,
}

impl SourcePipe {
    /// Open a capture stream on `preferred` (by name) or the best available
    /// device. A pipe without a stream is still valid; it reports
    /// `AudioError::NoDevice` to the extractor.
    pub fn new(preferred: Option<&str>, timeout: Duration) -> Self {
        let devices = Self::collect_devices();
        let buffer = Arc::new(Mutex::new(VecDeque::from(vec![0.0; BUFFER_SIZE])));

        let mut pipe = Self {
            buffer,
            stream: None,
            sample_rate: None,
        };

        let Some(index) = Self::pick_device(&devices, preferred) else {
            warn!("No audio devices found, running without audio");
            return pipe;
        };

        let info = &devices[index];
        match Self::build_stream(info, Arc::clone(&pipe.buffer), timeout) {
            Ok((stream, sample_rate)) => {
                let device_type = if info.is_input { "input" } else { "output" };
                info!(
                    "[{}] Selected: {} ({}, {} Hz)",
                    index, info.name, device_type, sample_rate
                );
                pipe.stream = Some(stream);
                pipe.sample_rate = Some(sample_rate);
            }
            Err(e) => warn!("[{}] {} unusable: {}", index, info.name, e),
        }

        pipe
    }

    fn pick_device(devices: &[DeviceInfo], preferred: Option<&str>) -> Option<usize> {
        if devices.is_empty() {
            return None;
        }

        preferred
            .and_then(|name| devices.iter().position(|d| d.name == name))
            .or_else(|| {
                // Prefer pipewire or pulse input devices (more reliable on Linux)
                devices
                    .iter()
                    .position(|d| d.is_input && d.name == "pipewire")
            })
            .or_else(|| devices.iter().position(|d| d.is_input && d.name == "pulse"))
            .or_else(|| {
                // Fall back to default output device for loopback capture
                let host = cpal::default_host();
                let default_output_name = host.default_output_device().and_then(|d| d.name().ok());
                default_output_name
                    .and_then(|name| devices.iter().position(|d| !d.is_input && d.name == name))
            })
            .or(Some(0))
    }

    pub fn list_devices() {
        let host = cpal::default_host();
        println!("\n=== Audio Devices ===");

        for (idx, info) in Self::collect_devices().iter().enumerate() {
            let device_type = if info.is_input { "input" } else { "output" };
            println!("  [{}] {} ({})", idx, info.name, device_type);
        }
        println!("Host: {:?}", host.id());
        println!("Set audio_device in the config file to pick one\n");
    }

    fn collect_devices() -> Vec<DeviceInfo> {
        let host = cpal::default_host();
        let mut devices = Vec::new();

        if let Ok(input_devices) = host.input_devices() {
            for device in input_devices {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        device,
                        name,
                        is_input: true,
                    });
                }
            }
        }

        if let Ok(output_devices) = host.output_devices() {
            for device in output_devices {
                if let Ok(name) = device.name() {
                    devices.push(DeviceInfo {
                        device,
                        name,
                        is_input: false,
                    });
                }
            }
        }

        devices
    }

    /// Get device config with timeout (the config call often hangs on bad devices)
    fn get_config_with_timeout(
        device: &Device,
        is_input: bool,
        timeout: Duration,
    ) -> Result<StreamConfig, AudioError> {
        let device_clone = device.clone();

        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            let config = if is_input {
                device_clone.default_input_config()
            } else {
                device_clone.default_output_config()
            };
            let _ = tx.send(config);
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(config)) => Ok(config.into()),
            Ok(Err(e)) => Err(AudioError::Config(e.to_string())),
            Err(_) => Err(AudioError::Config(format!(
                "device config timed out after {:?}",
                timeout
            ))),
        }
    }

    fn build_stream(
        device_info: &DeviceInfo,
        audio_buffer: Arc<Mutex<VecDeque<f32>>>,
        timeout: Duration,
    ) -> Result<(Stream, f32), AudioError> {
        let stream_config =
            Self::get_config_with_timeout(&device_info.device, device_info.is_input, timeout)?;
        let channels = (stream_config.channels as usize).max(1);
        let sample_rate = stream_config.sample_rate.0 as f32;

        let err_fn = |err| error!("Audio stream error: {}", err);

        let stream = device_info.device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // A poisoned lock only means a previous callback panicked; skip the chunk
                let Ok(mut buffer) = audio_buffer.lock() else {
                    return;
                };
                for chunk in data.chunks(channels) {
                    let sample: f32 = chunk.iter().sum::<f32>() / channels as f32;
                    buffer.push_back(sample);
                }
                while buffer.len() > BUFFER_SIZE {
                    buffer.pop_front();
                }
            },
            err_fn,
            None,
        )?;

        stream.play()?;
        Ok((stream, sample_rate))
    }
}

impl AudioInput for SourcePipe {
    fn sample_rate(&self) -> Result<f32, AudioError> {
        self.sample_rate.ok_or(AudioError::NoDevice)
    }

    fn read_samples(&mut self, out: &mut Vec<f32>) -> Result<(), AudioError> {
        let buffer = self.buffer.lock().map_err(|_| AudioError::Poisoned)?;
        out.clear();
        out.extend(buffer.iter().copied());
        Ok(())
    }

    // Without a stream there is nothing to resume or pause
    fn resume(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.stream.as_ref() {
            stream.play()?;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.stream.as_ref() {
            stream.pause()?;
        }
        Ok(())
    }
}
