//! Exercises `ClientSession::predict_clip`'s temp-file lifecycle (§5: named
//! after the client id and a monotonic counter, removed after the matching
//! prediction returns regardless of outcome) against a real recognizer
//! child.

mod common;

use std::sync::Arc;
use std::time::Duration;

use flapi_gateway::asr::AsrSupervisor;
use flapi_gateway::session::ClientSession;
use flapi_gateway::vad::{Activity, Gain, WaveFormat};

fn sample_clip() -> Activity {
    Activity {
        start: Duration::from_secs(1),
        duration: Duration::from_millis(320),
        mean: Gain::linear(0.2),
        frames: vec![0u8; 640],
    }
}

#[tokio::test]
async fn predict_clip_writes_and_removes_its_temp_file() {
    let script = common::echo_worker();
    let asr = Arc::new(AsrSupervisor::spawn(&common::config_for(&script)).unwrap());
    let clip_dir = tempfile::tempdir().unwrap();
    let session = ClientSession::new(
        "client-a".to_string(),
        asr.clone(),
        clip_dir.path().to_path_buf(),
    );

    let format = WaveFormat::canonical(16_000, 0);
    let prediction = session.predict_clip(&format, &sample_clip()).await.unwrap();

    assert_eq!(prediction.input_file, format!("{}/client-a-0.wav", clip_dir.path().display()));
    assert_eq!(prediction.text, format!("echo:{}", prediction.input_file));

    let leftover: Vec<_> = std::fs::read_dir(clip_dir.path()).unwrap().collect();
    assert!(leftover.is_empty(), "clip temp file should be removed after prediction returns");

    Arc::try_unwrap(asr).unwrap().close().await;
}

#[tokio::test]
async fn predict_clip_removes_temp_file_even_when_the_worker_rejects_it() {
    let script = common::mismatched_worker();
    let asr = Arc::new(AsrSupervisor::spawn(&common::config_for(&script)).unwrap());
    let clip_dir = tempfile::tempdir().unwrap();
    let session = ClientSession::new(
        "client-b".to_string(),
        asr.clone(),
        clip_dir.path().to_path_buf(),
    );

    let format = WaveFormat::canonical(16_000, 0);
    let result = session.predict_clip(&format, &sample_clip()).await;
    assert!(result.is_err());

    let leftover: Vec<_> = std::fs::read_dir(clip_dir.path()).unwrap().collect();
    assert!(leftover.is_empty(), "clip temp file should be removed even on failure");

    Arc::try_unwrap(asr).unwrap().close().await;
}
