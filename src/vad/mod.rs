//! Streaming voice-activity detection: header parsing, ring-buffered
//! retention, and the differential-gain detector that drives clip
//! extraction. See `examples/original_source/src/audio/wav.go` for the
//! reference algorithm this module reimplements idiomatically.

pub mod detector;
pub mod gain;
pub mod pipeline;
pub mod ring;
pub mod wav;

pub use detector::{Activity, ActivityDetector, DetectorConfig, DetectorError};
pub use gain::{Gain, GainParseError};
pub use ring::RingBank;
pub use wav::{read_header, write_header, WaveFormat, WavError};
