//! Minimal demo binary: wires the transcoder, the VAD pipeline, and the
//! ASR supervisor together over a single stdin-fed stream.
//!
//! This stands in for the out-of-scope WebSocket/HTTP shell (§1) just
//! enough to exercise the wiring end to end from a terminal; it is not
//! itself part of the specified system.

use std::sync::Arc;

use flapi_gateway::asr::AsrSupervisor;
use flapi_gateway::config::GatewayConfig;
use flapi_gateway::session::ClientSession;
use flapi_gateway::vad::pipeline;
use tokio_util::io::SyncIoBridge;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = GatewayConfig::default();
    let transcoder_program = std::env::var("FLAPI_TRANSCODER").unwrap_or_else(|_| "ffmpeg".to_string());

    let mut transcoder = flapi_gateway::transcoder::spawn(&transcoder_program, config.detector.sample_rate)?;
    let mut transcoder_stdin = transcoder.stdin.take().expect("stdin piped");
    let transcoder_stdout = transcoder.stdout.take().expect("stdout piped");

    let ingress = tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let _ = tokio::io::copy(&mut stdin, &mut transcoder_stdin).await;
    });

    let bridge = SyncIoBridge::new(transcoder_stdout);
    let cancel = CancellationToken::new();
    let mut handles = pipeline::drive(bridge, config.detector, cancel.clone());

    let asr = Arc::new(AsrSupervisor::spawn(&config.asr)?);
    let session = ClientSession::new(
        flapi_gateway::session::new_client_id(),
        asr.clone(),
        std::env::temp_dir(),
    );

    let format = handles.format_rx.await?;
    tracing::info!(?format, "stream format established");

    while let Ok(clip) = pipeline::next_clip(&mut handles.clip_rx).await {
        match session.predict_clip(&format, &clip).await {
            Ok(prediction) => println!("{}\t{}", prediction.input_file, prediction.text),
            Err(e) => tracing::warn!(error = %e, "clip prediction failed"),
        }
    }

    ingress.abort();
    Arc::try_unwrap(asr)
        .unwrap_or_else(|_| panic!("ASR supervisor still shared at shutdown"))
        .close()
        .await;
    Ok(())
}
