//! Supervises the long-running recognizer child process.
//!
//! Grounded in `examples/other_examples/962a9ed1_serenity-rs-serenity__src-voice-streamer.rs.rs`
//! for the "spawn a child, pipe its stdio, kill it on drop" shape, adapted
//! to `tokio::process::Command` for the async request/response pump that
//! `examples/original_source/src/asr.go`'s `ASRRunner` describes.

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::config::AsrWorkerConfig;
use super::parser::{LineEvent, ParserState, RawPrediction};

const REQUEST_QUEUE_CAPACITY: usize = 64;
const INITIAL_STALL_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum AsrError {
    #[error("failed to spawn recognizer child: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("i/o error talking to recognizer child: {0}")]
    Io(#[source] std::io::Error),
    #[error("worker protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("recognizer child exited")]
    WorkerExited,
}

/// A completed, path-matched prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct AsrPrediction {
    pub input_file: String,
    pub text: String,
}

struct PendingRequest {
    path: String,
    respond: oneshot::Sender<Result<AsrPrediction, AsrError>>,
}

/// Owns the recognizer child and the two cooperating tasks that pump its
/// stdin and parse its stderr. Intended to be constructed once per process
/// and shared (typically behind an `Arc`) across client sessions.
pub struct AsrSupervisor {
    request_tx: Option<mpsc::Sender<PendingRequest>>,
    stdin_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
    child: Child,
}

impl AsrSupervisor {
    /// Spawns the recognizer child and starts its stdin/stderr pump tasks.
    pub fn spawn(config: &AsrWorkerConfig) -> Result<Self, AsrError> {
        let mut child = Command::new(&config.executable)
            .args(config.argv())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(AsrError::Spawn)?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let (request_tx, request_rx) = mpsc::channel::<PendingRequest>(REQUEST_QUEUE_CAPACITY);
        let (wait_tx, wait_rx) = mpsc::channel::<()>(1);
        let (handoff_tx, handoff_rx) = mpsc::channel::<PendingRequest>(REQUEST_QUEUE_CAPACITY);

        let stdin_task = tokio::spawn(stdin_pump(stdin, request_rx, wait_rx, handoff_tx));
        let stderr_task = tokio::spawn(stderr_pump(stderr, wait_tx, handoff_rx));

        Ok(AsrSupervisor {
            request_tx: Some(request_tx),
            stdin_task,
            stderr_task,
            child,
        })
    }

    /// Submits `path` and awaits the matching prediction. Serializes
    /// concurrent callers FIFO; a response whose `input_file` doesn't
    /// match is a bug in this supervisor, not in the caller — it surfaces
    /// as [`AsrError::ProtocolViolation`] and poisons all future calls.
    pub async fn predict(&self, path: impl Into<String>) -> Result<AsrPrediction, AsrError> {
        let tx = self.request_tx.as_ref().ok_or(AsrError::WorkerExited)?;
        let (respond, response) = oneshot::channel();
        tx.send(PendingRequest {
            path: path.into(),
            respond,
        })
        .await
        .map_err(|_| AsrError::WorkerExited)?;
        response.await.map_err(|_| AsrError::WorkerExited)?
    }

    /// Closes the request channel, drains in-flight work, and waits for
    /// both cooperating tasks to finish. Logs a warning if the child did
    /// not exit cleanly within the grace period.
    pub async fn close(mut self) {
        self.request_tx.take();
        let _ = tokio::join!(self.stdin_task, self.stderr_task);
        match tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(Ok(status)) if status.success() => {}
            Ok(Ok(status)) => tracing::warn!(?status, "recognizer child exited non-zero"),
            Ok(Err(e)) => tracing::warn!(error = %e, "error waiting for recognizer child"),
            Err(_) => tracing::warn!("recognizer child did not exit promptly; leaking process handle"),
        }
    }
}

async fn stdin_pump(
    mut stdin: tokio::process::ChildStdin,
    mut requests: mpsc::Receiver<PendingRequest>,
    mut wait_rx: mpsc::Receiver<()>,
    handoff: mpsc::Sender<PendingRequest>,
) {
    while let Some(request) = requests.recv().await {
        let epoch = std::time::Instant::now();
        let mut timeout = INITIAL_STALL_TIMEOUT;
        loop {
            tokio::select! {
                got = wait_rx.recv() => {
                    if got.is_none() {
                        let _ = request.respond.send(Err(AsrError::WorkerExited));
                        return;
                    }
                    break;
                }
                _ = tokio::time::sleep(timeout) => {
                    tracing::warn!(elapsed = ?epoch.elapsed(), "process is falling behind");
                    timeout *= 2;
                }
            }
        }

        let line = format!("{}\n", request.path);
        if let Err(e) = stdin.write_all(line.as_bytes()).await {
            tracing::error!(error = %e, "failed to send input to ASR worker");
            let _ = request.respond.send(Err(AsrError::Io(e)));
            return;
        }
        if handoff.send(request).await.is_err() {
            return;
        }
    }
    // Closing stdin signals end-of-input to the child.
    let _ = stdin.shutdown().await;
}

async fn stderr_pump(
    stderr: tokio::process::ChildStderr,
    wait_tx: mpsc::Sender<()>,
    mut handoff: mpsc::Receiver<PendingRequest>,
) {
    let mut lines = BufReader::new(stderr).lines();
    let mut parser = ParserState::new();
    let mut pending: VecDeque<PendingRequest> = VecDeque::new();
    let mut handoff_open = true;

    loop {
        tokio::select! {
            biased;
            incoming = handoff.recv(), if handoff_open => {
                match incoming {
                    Some(request) => pending.push_back(request),
                    // stdin task is done sending new requests; keep draining stderr
                    None => handoff_open = false,
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(text)) => {
                        match parser.feed_line(&text) {
                            LineEvent::Waiting { completed } => {
                                if let Some(RawPrediction { input_file, text }) = completed {
                                    if let Some(request) = pending.pop_front() {
                                        if request.path == input_file {
                                            let _ = request.respond.send(Ok(AsrPrediction { input_file, text }));
                                        } else {
                                            let msg = format!(
                                                "received prediction for '{}' instead of '{}'",
                                                input_file, request.path
                                            );
                                            let _ = request.respond.send(Err(AsrError::ProtocolViolation(msg.clone())));
                                            fail_all_violation(&mut pending, &msg);
                                            return;
                                        }
                                    }
                                }
                                let _ = wait_tx.send(()).await;
                            }
                            LineEvent::ProtocolViolation(line) => {
                                let msg = format!("stdio parse state violation at predicted output: '{}'", line);
                                tracing::error!("{msg}");
                                fail_all_violation(&mut pending, &msg);
                                return;
                            }
                            LineEvent::Forwarded(text) => println!("{text}"),
                            LineEvent::Accumulating => {}
                        }
                    }
                    Ok(None) => {
                        fail_all_exited(&mut pending);
                        return;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "error reading ASR worker stderr");
                        fail_all_exited(&mut pending);
                        return;
                    }
                }
            }
        }
    }
}

fn fail_all_violation(pending: &mut VecDeque<PendingRequest>, message: &str) {
    while let Some(request) = pending.pop_front() {
        let _ = request
            .respond
            .send(Err(AsrError::ProtocolViolation(message.to_string())));
    }
}

fn fail_all_exited(pending: &mut VecDeque<PendingRequest>) {
    while let Some(request) = pending.pop_front() {
        let _ = request.respond.send(Err(AsrError::WorkerExited));
    }
}
