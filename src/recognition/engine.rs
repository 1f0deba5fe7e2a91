//! Whisper-backed recognition engine.
//!
//! A probed [`Recognizer`] holds a loaded whisper model. Each session runs one
//! worker thread that consumes PCM frames from the capture tap, accumulates
//! the current utterance, and emits interim events at a fixed cadence. An
//! utterance is finalized when the input stays below the silence threshold
//! long enough; the final event advances the result index and the buffer
//! resets for the next utterance.
//!
//! Sessions do not restart themselves: when the frame channel closes the
//! worker exits and the screen returns to idle until the user toggles again.
//!
//! # Feature Gate
//!
//! Inference requires the `whisper` feature (enabled by default, needs cmake).
//! Without it, probing reports the capability as unavailable.

use crate::config::RecognitionConfig;
use crate::recognition::{RecognitionEvent, RecognitionSegment};
use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    install_logging_hooks, FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters,
};

/// Sample rate whisper inference expects.
const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Shortest utterance worth running inference on (whisper degrades below ~1s).
const MIN_INFERENCE_SAMPLES: usize = WHISPER_SAMPLE_RATE as usize;

/// Longest utterance kept in the buffer (whisper's context window is 30s).
/// Reaching the cap forces finalization even while the speaker continues.
const MAX_UTTERANCE_SAMPLES: usize = WHISPER_SAMPLE_RATE as usize * 30;

/// Leading context kept while waiting for speech. Without this cap a session
/// left running in silence or steady sub-threshold noise would grow the
/// buffer without limit.
const PRE_ROLL_SAMPLES: usize = WHISPER_SAMPLE_RATE as usize;

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// A resolved speech-recognition capability.
pub struct Recognizer {
    config: RecognitionConfig,
    #[cfg(feature = "whisper")]
    context: Arc<Mutex<WhisperContext>>,
}

impl Recognizer {
    /// Probes for the recognition capability and loads the model.
    ///
    /// # Errors
    /// - If the crate was built without the `whisper` feature
    /// - If the configured model file does not exist or fails to load
    #[cfg(feature = "whisper")]
    pub fn probe(config: &RecognitionConfig) -> Result<Self> {
        // Install logging hooks to keep whisper.cpp quiet (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(anyhow!(
                "Speech recognition model not found at {}. Download a whisper ggml model and set recognition.model_path in parleur.toml.",
                config.model_path.display()
            ));
        }

        let model_path = config
            .model_path
            .to_str()
            .ok_or_else(|| anyhow!("Invalid UTF-8 in model path"))?;

        let context =
            WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
                .map_err(|e| anyhow!("Failed to load whisper model: {e}"))?;

        tracing::info!(
            "Recognition engine ready: model={}, language={}",
            config.model_path.display(),
            config.language
        );

        Ok(Self {
            config: config.clone(),
            context: Arc::new(Mutex::new(context)),
        })
    }

    /// Probing without the `whisper` feature always reports unavailability.
    #[cfg(not(feature = "whisper"))]
    pub fn probe(_config: &RecognitionConfig) -> Result<Self> {
        Err(anyhow!(
            "This build has no speech recognition support (compiled without the 'whisper' feature)"
        ))
    }

    /// Starts a continuous recognition session over the given frame stream.
    ///
    /// `frames` carries mono i16 chunks at `sample_rate`; the worker resamples
    /// to the model's rate as needed. The session ends when [`RecognitionSession::stop`]
    /// is called or the frame channel closes.
    pub fn start_session(
        &self,
        sample_rate: u32,
        frames: Receiver<Vec<i16>>,
    ) -> RecognitionSession {
        let (event_tx, event_rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let stop = Arc::clone(&stop);
            let config = self.config.clone();
            #[cfg(feature = "whisper")]
            let context = Arc::clone(&self.context);

            std::thread::spawn(move || {
                #[cfg(feature = "whisper")]
                session_loop(&context, &config, sample_rate, frames, event_tx, &stop);
                #[cfg(not(feature = "whisper"))]
                {
                    let _ = (config, sample_rate, frames, event_tx);
                    let _ = stop;
                }
            })
        };

        tracing::debug!("Recognition session started at {}Hz input", sample_rate);
        RecognitionSession {
            events: event_rx,
            stop,
            worker: Some(worker),
        }
    }
}

/// A running continuous recognition session.
///
/// Events are drained with [`RecognitionSession::events`]; the session stops
/// when asked to or when its input closes, and never restarts on its own.
pub struct RecognitionSession {
    events: Receiver<RecognitionEvent>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl RecognitionSession {
    /// Channel of recognition events, drained non-blockingly by the UI.
    pub fn events(&self) -> &Receiver<RecognitionEvent> {
        &self.events
    }

    /// Signals the worker to exit without waiting for it.
    ///
    /// An in-flight inference pass over a long utterance can take seconds;
    /// the caller must not stall on it, so the worker is joined on a
    /// background thread instead. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            std::thread::spawn(move || {
                if worker.join().is_err() {
                    tracing::error!("Recognition worker panicked");
                }
                tracing::debug!("Recognition session stopped");
            });
        }
    }
}

impl Drop for RecognitionSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The per-session worker loop.
#[cfg(feature = "whisper")]
fn session_loop(
    context: &Mutex<WhisperContext>,
    config: &RecognitionConfig,
    sample_rate: u32,
    frames: Receiver<Vec<i16>>,
    events: Sender<RecognitionEvent>,
    stop: &AtomicBool,
) {
    let interim_interval = Duration::from_millis(config.interim_interval_ms);
    let endpoint_silence = Duration::from_millis(config.endpoint_silence_ms);

    let mut utterance: Vec<i16> = Vec::new();
    let mut result_index: usize = 0;
    let mut heard_speech = false;
    let mut last_voice = Instant::now();
    let mut last_interim = Instant::now();

    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        match frames.recv_timeout(Duration::from_millis(100)) {
            Ok(frame) => {
                if rms(&frame) >= config.silence_threshold {
                    heard_speech = true;
                    last_voice = Instant::now();
                }
                utterance.extend(resample(&frame, sample_rate, WHISPER_SAMPLE_RATE));
                if !heard_speech {
                    trim_pre_roll(&mut utterance);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if endpoint_reached(heard_speech, last_voice.elapsed(), endpoint_silence, utterance.len()) {
            // End of utterance: settle it and advance the index
            match transcribe(context, config, &utterance) {
                Ok(text) if !text.is_empty() => {
                    let event = RecognitionEvent {
                        result_index,
                        segments: vec![RecognitionSegment::final_text(text, 1.0)],
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                    result_index += 1;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Final inference failed: {e}"),
            }
            utterance.clear();
            heard_speech = false;
            last_interim = Instant::now();
        } else if heard_speech
            && utterance.len() >= MIN_INFERENCE_SAMPLES
            && last_interim.elapsed() >= interim_interval
        {
            match transcribe(context, config, &utterance) {
                Ok(text) if !text.is_empty() => {
                    let event = RecognitionEvent {
                        result_index,
                        segments: vec![RecognitionSegment::interim(text, 0.5)],
                    };
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Interim inference failed: {e}"),
            }
            last_interim = Instant::now();
        }
    }
}

/// Runs whisper inference over the given utterance samples.
#[cfg(feature = "whisper")]
fn transcribe(
    context: &Mutex<WhisperContext>,
    config: &RecognitionConfig,
    samples: &[i16],
) -> Result<String> {
    let mut audio = convert_audio(samples);
    // Whisper degrades on very short input; pad the tail with silence
    if audio.len() < MIN_INFERENCE_SAMPLES {
        audio.resize(MIN_INFERENCE_SAMPLES, 0.0);
    }

    let context = context
        .lock()
        .map_err(|e| anyhow!("Failed to acquire context lock: {e}"))?;

    let mut state = context
        .create_state()
        .map_err(|e| anyhow!("Failed to create whisper state: {e}"))?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
    params.set_language(Some(&config.language));
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    state
        .full(params, &audio)
        .map_err(|e| anyhow!("Whisper inference failed: {e}"))?;

    let mut text = String::new();
    for segment in state.as_iter() {
        text.push_str(&segment.to_string());
    }

    Ok(text.trim().to_string())
}

/// Converts i16 PCM to the f32 range whisper expects.
#[cfg(feature = "whisper")]
fn convert_audio(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| sample as f32 / 32768.0)
        .collect()
}

/// Whether the current utterance should be finalized.
///
/// Either the speaker has been quiet past the endpoint threshold, or the
/// buffer hit its cap and must be settled before it keeps growing.
fn endpoint_reached(
    heard_speech: bool,
    silence: Duration,
    endpoint_silence: Duration,
    utterance_len: usize,
) -> bool {
    heard_speech && (silence >= endpoint_silence || utterance_len >= MAX_UTTERANCE_SAMPLES)
}

/// Drops all but the most recent pre-roll worth of samples.
///
/// Applied while no speech has been heard yet, so that leading silence
/// cannot accumulate indefinitely.
fn trim_pre_roll(utterance: &mut Vec<i16>) {
    if utterance.len() > PRE_ROLL_SAMPLES {
        let excess = utterance.len() - PRE_ROLL_SAMPLES;
        utterance.drain(..excess);
    }
}

/// Root-mean-square level of a frame, normalized to 0.0 - 1.0.
fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64 / 32768.0;
            v * v
        })
        .sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_zero() {
        assert_eq!(rms(&[0i16; 1600]), 0.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn rms_of_full_scale_square_wave_is_near_one() {
        let samples: Vec<i16> = (0..1600)
            .map(|i| if i % 2 == 0 { i16::MAX } else { i16::MIN })
            .collect();
        assert!(rms(&samples) > 0.99);
    }

    #[test]
    fn rms_distinguishes_speech_from_noise_floor() {
        let quiet = vec![50i16; 1600];
        let loud = vec![8000i16; 1600];
        let threshold = 0.012;
        assert!(rms(&quiet) < threshold);
        assert!(rms(&loud) > threshold);
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![100i16, 200, 300];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_halves_length_when_downsampling() {
        let samples = vec![0i16; 3200];
        let out = resample(&samples, 32000, 16000);
        assert_eq!(out.len(), 1600);
    }

    #[test]
    fn resample_interpolates_when_upsampling() {
        let samples = vec![0i16, 1000];
        let out = resample(&samples, 8000, 16000);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0);
        assert!(out[1] > 0 && out[1] < 1000);
    }

    #[test]
    fn resample_empty_is_empty() {
        assert!(resample(&[], 48000, 16000).is_empty());
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn convert_audio_normalizes_to_unit_range() {
        let converted = convert_audio(&[0, 16384, -32768]);
        assert_eq!(converted[0], 0.0);
        assert!((converted[1] - 0.5).abs() < 0.01);
        assert_eq!(converted[2], -1.0);
    }

    #[test]
    fn stop_returns_without_waiting_for_a_busy_worker() {
        let stop = Arc::new(AtomicBool::new(false));
        let worker = {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                // Stands in for an inference pass that only notices the
                // flag once it finishes
                while !stop.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(5));
                }
                std::thread::sleep(Duration::from_millis(300));
            })
        };
        let (_tx, events) = unbounded();
        let mut session = RecognitionSession {
            events,
            stop,
            worker: Some(worker),
        };

        let started = Instant::now();
        session.stop();
        assert!(started.elapsed() < Duration::from_millis(100));
        // Second stop is a no-op
        session.stop();
    }

    #[test]
    fn silence_past_the_endpoint_finalizes() {
        assert!(endpoint_reached(
            true,
            Duration::from_millis(800),
            Duration::from_millis(700),
            MIN_INFERENCE_SAMPLES,
        ));
        assert!(!endpoint_reached(
            true,
            Duration::from_millis(100),
            Duration::from_millis(700),
            MIN_INFERENCE_SAMPLES,
        ));
    }

    #[test]
    fn full_buffer_finalizes_even_during_speech() {
        assert!(endpoint_reached(
            true,
            Duration::ZERO,
            Duration::from_millis(700),
            MAX_UTTERANCE_SAMPLES,
        ));
    }

    #[test]
    fn no_finalization_before_any_speech() {
        assert!(!endpoint_reached(
            false,
            Duration::from_secs(60),
            Duration::from_millis(700),
            MAX_UTTERANCE_SAMPLES,
        ));
    }

    #[test]
    fn pre_roll_keeps_only_the_tail() {
        let mut utterance: Vec<i16> = (0..PRE_ROLL_SAMPLES as i32 + 100)
            .map(|i| (i % 1000) as i16)
            .collect();
        let expected_first = utterance[100];
        trim_pre_roll(&mut utterance);
        assert_eq!(utterance.len(), PRE_ROLL_SAMPLES);
        assert_eq!(utterance[0], expected_first);
    }

    #[test]
    fn pre_roll_leaves_short_buffers_alone() {
        let mut utterance = vec![7i16; 64];
        trim_pre_roll(&mut utterance);
        assert_eq!(utterance.len(), 64);
    }

    #[test]
    fn probe_fails_for_missing_model() {
        let config = RecognitionConfig {
            model_path: std::path::PathBuf::from("/nonexistent/model.bin"),
            ..RecognitionConfig::default()
        };
        assert!(Recognizer::probe(&config).is_err());
    }
}
