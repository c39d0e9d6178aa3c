//! Recognizer child invocation shape.
//!
//! Grounded directly in `examples/original_source/src/asr.go`'s
//! `NewRunner` and `examples/original_source/src/config.go`'s `Flashlight`
//! config section — the spec's distillation only says "spawns the
//! recognizer child"; the argv shape itself is a supplement pulled from
//! the original source so the supervisor has something concrete to spawn
//! in tests.

use serde::{Deserialize, Serialize};

/// CLI invocation shape for the external ASR worker process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsrWorkerConfig {
    pub executable: String,
    pub acoustic_model: String,
    pub language_model: String,
    pub tokens: String,
    pub lexicon: String,
    pub beam_size: u32,
    pub beam_size_token: u32,
    pub beam_threshold: f64,
    pub language_model_weight: f64,
    pub word_score: f64,
}

impl Default for AsrWorkerConfig {
    fn default() -> Self {
        AsrWorkerConfig {
            executable: String::new(),
            acoustic_model: String::new(),
            language_model: String::new(),
            tokens: String::new(),
            lexicon: String::new(),
            beam_size: 50,
            beam_size_token: 10,
            beam_threshold: 20.0,
            language_model_weight: 1.0,
            word_score: -1.0,
        }
    }
}

impl AsrWorkerConfig {
    /// Builds the child's argv, in the order `examples/original_source/src/asr.go`'s
    /// `NewRunner` builds it.
    pub fn argv(&self) -> Vec<String> {
        vec![
            format!("--am_path={}", self.acoustic_model),
            format!("--tokens_path={}", self.tokens),
            format!("--lexicon_path={}", self.lexicon),
            format!("--lm_path={}", self.language_model),
            "--logtostderr=true".to_string(),
            "--sample_rate=16000".to_string(),
            format!("--beam_size={}", self.beam_size),
            format!("--beam_size_token={}", self.beam_size_token),
            format!("--beam_threshold={}", self.beam_threshold),
            format!("--lm_weight={}", self.language_model_weight),
            format!("--word_score={}", self.word_score),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_orders_flags_as_expected() {
        let config = AsrWorkerConfig {
            acoustic_model: "am.bin".into(),
            tokens: "tokens.txt".into(),
            lexicon: "lex.txt".into(),
            language_model: "lm.bin".into(),
            ..Default::default()
        };
        let argv = config.argv();
        assert_eq!(argv[0], "--am_path=am.bin");
        assert_eq!(argv[1], "--tokens_path=tokens.txt");
        assert_eq!(argv[2], "--lexicon_path=lex.txt");
        assert_eq!(argv[3], "--lm_path=lm.bin");
        assert_eq!(argv[4], "--logtostderr=true");
    }
}
