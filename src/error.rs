//! Crate-wide error hierarchy.
//!
//! Each subsystem defines its own error enum (`vad::wav::WavError`,
//! `vad::detector::DetectorError`, `asr::AsrError`); this module composes
//! them into [`GatewayError`] so a caller that doesn't care which subsystem
//! failed can match on policy instead (fatal to stream, fatal to process,
//! warning only) per the error handling design.

use thiserror::Error;

use crate::asr::AsrError;
use crate::vad::detector::DetectorError;
use crate::vad::wav::WavError;

/// Top-level error type, composed from each subsystem's own error enum.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Wav(#[from] WavError),

    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error(transparent)]
    Asr(#[from] AsrError),

    #[error("cancellation requested")]
    CancellationRequested,

    #[error("clip channel closed")]
    ClipChannelClosed,
}

impl GatewayError {
    /// Whether this error should terminate only the current stream, leaving
    /// the rest of the process (and the ASR supervisor) running.
    pub fn is_fatal_to_stream(&self) -> bool {
        matches!(
            self,
            GatewayError::Wav(_)
                | GatewayError::Detector(_)
                | GatewayError::ClipChannelClosed
                | GatewayError::CancellationRequested
        )
    }

    /// Whether this error indicates an uncorrectable state divergence that
    /// must bring down the whole process (currently only worker protocol
    /// violations qualify).
    pub fn is_fatal_to_process(&self) -> bool {
        matches!(self, GatewayError::Asr(AsrError::ProtocolViolation(_)))
    }
}
