//! The differential-gain activity detector: the heart of the gateway.
//!
//! A per-sample state machine over a smoothed running mean, mirroring
//! `examples/original_source/src/audio/wav.go`'s `ScanActivity` field for
//! field (the sentinel-based scalars, the `if`/`else if` chain and its
//! tie-break ordering are preserved exactly — see DESIGN.md for why this
//! stays flat instead of becoming a tagged enum). The teacher's own
//! `examples/poodle64-thoth/src-tauri/src/audio/vad.rs` shows the shape
//! a VAD module takes in this codebase (config struct with `Default`,
//! dedicated error enum, `#[cfg(test)] mod tests`) without sharing any of
//! this algorithm, which wraps a third-party detector instead.

use std::time::Duration;

use thiserror::Error;

use super::gain::Gain;
use super::ring::RingBank;
use super::wav::WaveFormat;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(&'static str),
}

/// Checks the preflight invariants required before the detector runs:
/// mono, 16-bit, linear PCM. Any violation is fatal to the stream.
pub fn validate_format(format: &WaveFormat) -> Result<(), DetectorError> {
    if format.channels != 1 {
        return Err(DetectorError::UnsupportedFormat("channels must be 1"));
    }
    if format.bits_per_sample != 16 {
        return Err(DetectorError::UnsupportedFormat(
            "bits_per_sample must be 16",
        ));
    }
    if format.format_code != 1 {
        return Err(DetectorError::UnsupportedFormat(
            "format_code must be 1 (PCM)",
        ));
    }
    Ok(())
}

/// Detector configuration. Durations are carried in milliseconds rather
/// than a floating-point seconds count so that window lengths derive from
/// integer arithmetic the same way the reference implementation's
/// `time.Duration` (integer nanoseconds) does — no boundary-sample drift
/// from floating-point rounding.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub threshold: Gain,
    pub gain_smooth: f64,
    pub activity_timeout_ms: u64,
    pub buffer_duration_ms: u64,
    pub context_prefix_ms: u64,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            threshold: Gain::linear(0.1),
            gain_smooth: 0.9,
            activity_timeout_ms: 300,
            buffer_duration_ms: 10_000,
            context_prefix_ms: 20,
            sample_rate: 16_000,
            bits_per_sample: 16,
        }
    }
}

fn window_samples(duration_ms: u64, sample_rate: u32) -> i64 {
    (duration_ms as u128 * sample_rate as u128 / 1000) as i64
}

fn samples_to_duration(samples: i64, sample_rate: u32) -> Duration {
    let samples = samples.max(0) as u64;
    Duration::from_nanos((samples as u128 * 1_000_000_000 / sample_rate as u128) as u64)
}

/// An emitted clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub start: Duration,
    pub duration: Duration,
    pub mean: Gain,
    pub frames: Vec<u8>,
}

/// Mutable per-stream scalars driving the state machine. See §3 of the
/// design document for the semantics of each field; `begin_active_frame`
/// uses `-1` as the Idle sentinel, matching the reference implementation.
#[derive(Debug, Clone, Copy)]
struct DetectorState {
    at_sample: i64,
    gain_ema: f64,
    n_high: u32,
    n_low: u32,
    begin_active_frame: i64,
    begin_low: u32,
    begin_high: u32,
    end_low: u32,
    end_high: u32,
    close_not_before: i64,
    mean_active_gain: f64,
    mean_active_gain_count: u64,
}

impl DetectorState {
    fn new() -> Self {
        DetectorState {
            at_sample: 0,
            gain_ema: 0.0,
            n_high: 0,
            n_low: 0,
            begin_active_frame: -1,
            begin_low: 0,
            begin_high: 0,
            end_low: 0,
            end_high: 0,
            close_not_before: i64::MAX,
            mean_active_gain: 0.0,
            mean_active_gain_count: 0,
        }
    }
}

/// Owns the per-stream `DetectorState` and its `RingBank`, consuming PCM
/// samples one at a time and emitting `Activity` clips.
pub struct ActivityDetector {
    config: DetectorConfig,
    state: DetectorState,
    ring: RingBank,
    activation_window: i64,
    deactivation_window: i64,
    context_frames: i64,
    half_scale: f64,
}

impl ActivityDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let activation_window = window_samples(16, config.sample_rate);
        let deactivation_window = window_samples(config.activity_timeout_ms, config.sample_rate);
        let context_frames = window_samples(config.context_prefix_ms, config.sample_rate);
        let ring_capacity = (config.buffer_duration_ms as u128
            * config.sample_rate as u128
            * 2
            / 1000) as usize;
        let half_scale = 2f64.powi((config.bits_per_sample - 1) as i32);
        ActivityDetector {
            config,
            state: DetectorState::new(),
            ring: RingBank::new(ring_capacity),
            activation_window,
            deactivation_window,
            context_frames,
            half_scale,
        }
    }

    /// Processes one signed 16-bit PCM sample, returning an emitted
    /// `Activity` if this sample closed one.
    pub fn process_sample(&mut self, sample: i16) -> Option<Activity> {
        let threshold = self.config.threshold.as_linear();
        let inst_gain = sample as f64 / self.half_scale;
        self.state.gain_ema =
            self.state.gain_ema * self.config.gain_smooth + inst_gain * (1.0 - self.config.gain_smooth);
        let dg = inst_gain - self.state.gain_ema;

        let mut active = false;
        if dg >= threshold {
            self.state.n_high += 1;
            active = true;
        } else if dg <= -threshold {
            self.state.n_low += 1;
            active = true;
        }

        let mut emitted = None;

        if self.state.begin_active_frame == -1 {
            if active {
                self.state.begin_low = self.state.n_low;
                self.state.begin_high = self.state.n_high;
                self.state.begin_active_frame = self.state.at_sample;
            }
        } else if self.state.at_sample - self.state.begin_active_frame == self.activation_window {
            if self.state.n_high - self.state.begin_high > 1 && self.state.n_low - self.state.begin_low > 1 {
                self.state.close_not_before = self.state.at_sample + self.deactivation_window;
                self.state.end_low = self.state.n_low;
                self.state.end_high = self.state.n_high;
                self.state.mean_active_gain = 0.0;
                self.state.mean_active_gain_count = 0;
            } else {
                self.state.begin_active_frame = -1;
                self.ring.reset_active();
            }
        } else if self.state.at_sample >= self.state.close_not_before - self.deactivation_window
            && self.state.at_sample < self.state.close_not_before
        {
            if self.state.n_high - self.state.end_high > 1 || self.state.n_low - self.state.end_low > 1 {
                self.state.close_not_before = self.state.at_sample + self.deactivation_window;
                self.state.end_low = self.state.n_low;
                self.state.end_high = self.state.n_high;
            }
        } else if self.state.at_sample == self.state.close_not_before {
            if self.state.n_high - self.state.end_high <= 1 && self.state.n_low - self.state.end_low <= 1 {
                let data = self.ring.active_bytes();
                let lastn = ((self.state.at_sample - self.state.begin_active_frame + self.context_frames) * 2)
                    .max(0) as usize;
                let lastn = lastn.min(data.len());
                let frames = data[data.len() - lastn..].to_vec();
                let mean = self.state.mean_active_gain / self.state.mean_active_gain_count as f64;

                emitted = Some(Activity {
                    start: samples_to_duration(self.state.begin_active_frame, self.config.sample_rate),
                    duration: samples_to_duration(
                        self.state.at_sample - self.state.begin_active_frame,
                        self.config.sample_rate,
                    ),
                    mean: Gain::linear(mean),
                    frames,
                });

                self.ring.rotate();
                self.state.begin_active_frame = -1;
                self.state.mean_active_gain = 0.0;
                self.state.mean_active_gain_count = 0;
            } else {
                self.state.close_not_before = self.state.at_sample + self.deactivation_window;
                self.state.end_low = self.state.n_low;
                self.state.end_high = self.state.n_high;
            }
        }

        // Exactly one write per sample, regardless of which branch ran above,
        // so the clip's pre-roll reflects uninterrupted audio.
        self.ring.write_active(&sample.to_le_bytes());

        self.state.mean_active_gain += dg.abs();
        self.state.mean_active_gain_count += 1;
        self.state.at_sample += 1;

        emitted
    }

    /// Decodes `chunk` as little-endian i16 samples and feeds each to
    /// [`process_sample`], collecting any emitted clips in order.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Vec<Activity> {
        let mut out = Vec::new();
        for pair in chunk.chunks_exact(2) {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            if let Some(activity) = self.process_sample(sample) {
                out.push(activity);
            }
        }
        out
    }
}
