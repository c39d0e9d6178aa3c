//! Wires the header reader and the activity detector together into a
//! single per-stream task pair: publish the parsed `WaveFormat` once, then
//! publish every emitted `Activity` on a capacity-1 clip channel, exactly
//! as `examples/original_source/src/audio/wav.go`'s `ScanActivity` does
//! with its `nfo`/`c` channel parameters.
//!
//! The header reader and the detector's sample loop are both synchronous
//! (`std::io::Read`), matching the reference implementation's blocking
//! `io.Reader`. To drive them from a transcoded child's async stdout this
//! runs inside `tokio::task::spawn_blocking`, bridged with
//! `tokio_util::io::SyncIoBridge` — the standard way to cross the
//! async/sync boundary for a CPU-bound, read-heavy loop.

use std::io::Read;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::detector::{validate_format, ActivityDetector, DetectorConfig};
use super::wav::{read_header, WaveFormat};
use crate::error::GatewayError;

const CLIP_CHANNEL_CAPACITY: usize = 1;
/// Read buffer size for the detector's sample loop.
const READ_CHUNK_BYTES: usize = 4096;
const PROGRESS_TICK: std::time::Duration = std::time::Duration::from_secs(5);

/// Handles returned to the driver's caller.
pub struct PipelineHandles {
    pub format_rx: oneshot::Receiver<WaveFormat>,
    pub clip_rx: mpsc::Receiver<super::detector::Activity>,
}

/// Runs the header read + per-sample detector loop against `source`,
/// publishing the format once and every clip on the returned channels.
/// `source` is any synchronous reader (typically a `SyncIoBridge` wrapping
/// a transcoder child's stdout); the blocking loop runs on a dedicated
/// blocking thread so it never stalls the async runtime.
pub fn drive<R>(mut source: R, config: DetectorConfig, cancel: CancellationToken) -> PipelineHandles
where
    R: Read + Send + 'static,
{
    let (format_tx, format_rx) = oneshot::channel();
    let (clip_tx, clip_rx) = mpsc::channel(CLIP_CHANNEL_CAPACITY);

    tokio::task::spawn_blocking(move || {
        let format = match read_header(&mut source) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "header parse failed, closing stream");
                return;
            }
        };
        if let Err(e) = validate_format(&format) {
            tracing::warn!(error = %e, "unsupported stream format, closing stream");
            return;
        }
        if format_tx.send(format).is_err() {
            return; // receiver dropped; nothing more to do
        }

        let mut detector = ActivityDetector::new(config);
        let mut buf = [0u8; READ_CHUNK_BYTES];
        let mut total_samples: u64 = 0;
        let mut last_tick = std::time::Instant::now();

        loop {
            if cancel.is_cancelled() {
                tracing::debug!("cancellation observed, draining without emission");
                return;
            }
            let n = match source.read(&mut buf) {
                Ok(0) => return, // clean EOF
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(error = %e, "read error, closing stream");
                    return;
                }
            };
            let clips = detector.process_chunk(&buf[..n]);
            total_samples += (n / 2) as u64;

            if last_tick.elapsed() >= PROGRESS_TICK {
                tracing::info!(samples_processed = total_samples, "scanning audio activity");
                last_tick = std::time::Instant::now();
            }

            for clip in clips {
                if clip_tx.blocking_send(clip).is_err() {
                    return; // receiver dropped
                }
            }
        }
    });

    PipelineHandles { format_rx, clip_rx }
}

/// Convenience wrapper turning [`drive`]'s channel closure into the
/// crate's [`GatewayError`] policy (§7: `ClipChannelClosed` is a clean
/// termination, not a fatal stream error).
pub async fn next_clip(
    clip_rx: &mut mpsc::Receiver<super::detector::Activity>,
) -> Result<super::detector::Activity, GatewayError> {
    clip_rx.recv().await.ok_or(GatewayError::ClipChannelClosed)
}
