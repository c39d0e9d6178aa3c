//! Shared helper for integration tests that need a real child process
//! speaking the recognizer's stderr protocol (§4.E, §8 properties 9/10,
//! scenario S3). A `/bin/sh` script is simpler and just as faithful to the
//! line-oriented protocol as a compiled fixture binary would be.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;

use flapi_gateway::asr::AsrWorkerConfig;

/// A worker that echoes `echo:<path>` back as the prediction text for every
/// path it receives on stdin, looping until stdin closes.
pub fn echo_worker() -> tempfile::NamedTempFile {
    script(
        r#"#!/bin/sh
echo "[Inference tutorial for CTC]: Waiting the input" >&2
while IFS= read -r path; do
  echo "[Inference tutorial for CTC]: predicted output for $path" >&2
  echo "echo:$path" >&2
  echo "[Inference tutorial for CTC]: Waiting the input" >&2
done
"#,
    )
}

/// A worker that answers the first request with a prediction for the wrong
/// path, to exercise the protocol-violation path.
pub fn mismatched_worker() -> tempfile::NamedTempFile {
    script(
        r#"#!/bin/sh
echo "[Inference tutorial for CTC]: Waiting the input" >&2
read -r path
echo "[Inference tutorial for CTC]: predicted output for /other" >&2
echo "oops" >&2
echo "[Inference tutorial for CTC]: Waiting the input" >&2
"#,
    )
}

/// A worker that exits the moment it starts, without ever signaling
/// readiness — exercises `AsrError::WorkerExited` (§7).
pub fn script_that_exits_immediately() -> tempfile::NamedTempFile {
    script("#!/bin/sh\nexit 0\n")
}

fn script(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".sh").tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file.flush().unwrap();
    let mut perms = file.as_file().metadata().unwrap().permissions();
    perms.set_mode(0o755);
    file.as_file().set_permissions(perms).unwrap();
    file
}

pub fn config_for(script: &tempfile::NamedTempFile) -> AsrWorkerConfig {
    AsrWorkerConfig {
        executable: script.path().to_string_lossy().into_owned(),
        ..Default::default()
    }
}
