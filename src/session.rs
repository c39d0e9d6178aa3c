//! The client-session seam: the shape an external WebSocket/HTTP shell
//! (out of scope, §1) would drive. Owns the per-client temp clip file
//! lifecycle and the shared client registry, grounded in
//! `examples/original_source/src/ws_client.go`'s `predict()` and
//! `examples/original_source/src/ws.go`'s mutex-guarded `clients` map.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;

use crate::asr::{AsrPrediction, AsrSupervisor};
use crate::vad::{write_header, Activity, WaveFormat};

/// Generates a fresh client identifier. The WS/HTTP shell (out of scope,
/// §1) is free to hand its own ids to [`ClientSession::new`] instead; this
/// is offered for callers with no natural id of their own, such as the
/// demo binary.
pub fn new_client_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Registry of active client sessions, used for event broadcast. The only
/// shared mutable structure in the system (§5); everything else
/// communicates through channels.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, Arc<ClientSession>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session: Arc<ClientSession>) {
        self.clients.lock().insert(session.client_id.clone(), session);
    }

    pub fn unregister(&self, client_id: &str) {
        self.clients.lock().remove(client_id);
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }
}

/// One client's view of the gateway: a handle to the process-singleton
/// ASR supervisor plus a monotonic counter for naming this client's
/// temporary clip files.
pub struct ClientSession {
    client_id: String,
    asr: Arc<AsrSupervisor>,
    clip_seq: AtomicU64,
    clip_dir: PathBuf,
}

impl ClientSession {
    /// `clip_dir` is where per-clip temporary WAV files are written before
    /// being handed to the ASR supervisor; the demo binary passes
    /// `std::env::temp_dir()`, tests pass a scratch directory so file
    /// lifecycle can be asserted without touching the real system temp dir.
    pub fn new(client_id: String, asr: Arc<AsrSupervisor>, clip_dir: PathBuf) -> Self {
        ClientSession {
            client_id,
            asr,
            clip_seq: AtomicU64::new(0),
            clip_dir,
        }
    }

    /// Serializes `clip` to a temporary WAV file named after this client
    /// and a monotonic counter, submits it to the ASR supervisor, and
    /// removes the file regardless of outcome — the `tokio::fs::remove_file`
    /// below runs whether `predict` succeeded or not, the async equivalent
    /// of `examples/original_source/src/ws_client.go`'s `defer os.Remove(path)`.
    pub async fn predict_clip(
        &self,
        format: &WaveFormat,
        clip: &Activity,
    ) -> Result<AsrPrediction, crate::asr::AsrError> {
        let seq = self.clip_seq.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("{}-{}.wav", self.client_id, seq);
        let path = self.clip_dir.join(file_name);

        let clip_format = WaveFormat::canonical(format.sample_rate, clip.frames.len() as u32);
        let write_result = async {
            let mut file = tokio::fs::File::create(&path).await?;
            let mut header = Vec::new();
            write_header(&mut header, &clip_format)?;
            file.write_all(&header).await?;
            file.write_all(&clip.frames).await?;
            file.flush().await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        let result = match write_result {
            Ok(()) => self.asr.predict(path.to_string_lossy().into_owned()).await,
            Err(e) => {
                tracing::warn!(error = %e, "failed to write clip temp file, dropping clip");
                Err(crate::asr::AsrError::Io(e))
            }
        };

        let _ = tokio::fs::remove_file(&path).await;
        result
    }
}
