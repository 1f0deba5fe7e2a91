//! Microphone capture session management.
//!
//! Opens the configured input device, converts incoming audio to mono i16,
//! and accumulates it as a sequence of chunks. Dropping or stopping the
//! session stops the cpal stream, which releases the microphone back to the
//! OS. An optional tap forwards each chunk to the speech recognizer.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// A live microphone stream plus the chunks it has captured so far.
///
/// Invariant: at most one active session per screen. The session owns the
/// stream exclusively; [`CaptureSession::stop`] (or drop) releases the
/// hardware. Stop is idempotent.
pub struct CaptureSession {
    /// Active input stream. `None` once stopped.
    stream: Option<cpal::Stream>,
    /// Actual sample rate the device records at.
    sample_rate: u32,
    /// Captured audio as the sequence of callback-sized chunks (mono i16).
    chunks: Arc<Mutex<Vec<Vec<i16>>>>,
}

impl CaptureSession {
    /// Opens the input device and starts capturing.
    ///
    /// `device_spec` is "default", a numeric index, or a device name, as in
    /// the config file. When `tap` is given, every captured chunk is also
    /// forwarded over it (for the recognition engine); a full or closed tap
    /// never blocks the audio callback.
    ///
    /// # Errors
    /// - If the device is unavailable or refuses to open (the desktop
    ///   equivalent of a denied microphone permission)
    /// - If stream creation or start fails
    pub fn open(
        device_spec: &str,
        requested_sample_rate: u32,
        tap: Option<Sender<Vec<i16>>>,
    ) -> Result<Self> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if device_spec == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, device_spec)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device.default_input_config()?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Capturing at device rate.",
                requested_sample_rate,
                device_sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            device_sample_rate,
            num_channels
        );

        let chunks: Arc<Mutex<Vec<Vec<i16>>>> = Arc::new(Mutex::new(Vec::new()));
        let chunks_arc = Arc::clone(&chunks);

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let mono = downmix_to_mono(data, num_channels);
                if mono.is_empty() {
                    return;
                }
                if let Some(tap) = &tap {
                    // try_send: the audio callback must never block
                    let _ = tap.try_send(mono.clone());
                }
                chunks_arc.lock().unwrap().push(mono);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;

        tracing::debug!("Audio stream started");
        Ok(Self {
            stream: Some(stream),
            sample_rate: device_sample_rate,
            chunks,
        })
    }

    /// Actual sample rate of the capture.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples captured so far.
    pub fn sample_count(&self) -> usize {
        self.chunks.lock().unwrap().iter().map(Vec::len).sum()
    }

    /// Stops capture, releases the hardware, and drains the captured chunks.
    ///
    /// Safe to call when already stopped: the stream is released only once
    /// and subsequent calls return an empty chunk list.
    pub fn stop(&mut self) -> Vec<Vec<i16>> {
        if self.stream.take().is_some() {
            tracing::info!("Capture stopped, microphone released");
        }
        std::mem::take(&mut *self.chunks.lock().unwrap())
    }
}

/// Converts an interleaved buffer to mono by averaging channels.
fn downmix_to_mono(data: &[i16], num_channels: usize) -> Vec<i16> {
    match num_channels {
        0 => Vec::new(),
        1 => data.to_vec(),
        2 => data
            .chunks_exact(2)
            .map(|chunk| {
                let left = chunk[0] as i32;
                let right = chunk[1] as i32;
                ((left + right) / 2) as i16
            })
            .collect(),
        n => data
            .chunks_exact(n)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / n as i32) as i16
            })
            .collect(),
    }
}

/// Finds an audio input device by numeric index or by exact name, in a
/// single enumeration pass.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let wanted_index: Option<usize> = device_spec.parse().ok();
    let mut total = 0;

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for (index, device) in devices.enumerate() {
        let found = match wanted_index {
            Some(wanted) => index == wanted,
            None => device.name().is_ok_and(|name| name == device_spec),
        };
        if found {
            return Ok(device);
        }
        total = index + 1;
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found ({total} devices present). Use 'parleur list-devices' to see them."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_mono_passthrough() {
        let data = vec![1i16, 2, 3, 4];
        assert_eq!(downmix_to_mono(&data, 1), data);
    }

    #[test]
    fn downmix_stereo_averages_pairs() {
        let data = vec![100i16, 200, -100, 100];
        assert_eq!(downmix_to_mono(&data, 2), vec![150, 0]);
    }

    #[test]
    fn downmix_four_channels_averages_all() {
        let data = vec![100i16, 200, 300, 400];
        assert_eq!(downmix_to_mono(&data, 4), vec![250]);
    }

    #[test]
    fn downmix_drops_trailing_partial_frame() {
        let data = vec![100i16, 200, 300];
        assert_eq!(downmix_to_mono(&data, 2), vec![150]);
    }
}
