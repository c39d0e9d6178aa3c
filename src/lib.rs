//! Streaming voice-activity gateway.
//!
//! Clients push raw audio over a persistent connection; an external
//! transcoder turns it into canonical PCM; [`vad`] scans the stream for
//! bursts of speech-like activity and extracts clips; [`asr`] hands each
//! clip to a long-running recognizer child and returns the transcription.
//! The connection transport itself, and the transcoder process, are
//! external collaborators this crate only describes the interface to —
//! see `SPEC_FULL.md` for the full boundary.

pub mod asr;
pub mod config;
pub mod error;
pub mod session;
pub mod transcoder;
pub mod vad;

pub use config::GatewayConfig;
pub use error::GatewayError;
