//! In-core configuration surface.
//!
//! Parsing a config *file* format (YAML/TOML/...) off disk is out of
//! scope (an explicit Non-goal); `GatewayConfig` is the in-memory
//! construction surface a caller (the out-of-scope WS/HTTP shell) builds
//! however it likes, including directly from `serde_json` for tests. The
//! `#[serde(default)]` + hand-written `Default` shape mirrors
//! `examples/poodle64-thoth/src-tauri/src/config.rs`'s sub-config structs.

use serde::{Deserialize, Serialize};

use crate::asr::AsrWorkerConfig;
use crate::vad::DetectorConfig;

/// Top-level gateway configuration: the detector's tuning knobs plus the
/// recognizer child's invocation shape.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    pub detector: DetectorConfig,
    pub asr: AsrWorkerConfig,
}
