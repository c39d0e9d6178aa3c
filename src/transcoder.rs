//! The transcoding stage is an external collaborator (§1): this module
//! only describes its invocation shape, grounded in
//! `examples/original_source/src/audio/transcoding.go`'s `Transcode()`.
//! It does not decode or resample audio itself.

use std::process::Stdio;

use tokio::process::{Child, Command};

/// Spawns `program` (e.g. `ffmpeg`) with args equivalent to
/// `-hide_banner -nostats -vn -sn -dn -i - -f wav -ac 1 -ar <sr> -`,
/// piping its stdin and stdout. The core consumes stdout; it never reads
/// the transcoder's stderr.
pub fn spawn(program: &str, sample_rate: u32) -> std::io::Result<Child> {
    Command::new(program)
        .args([
            "-hide_banner",
            "-nostats",
            "-vn",
            "-sn",
            "-dn",
            "-i",
            "-",
            "-f",
            "wav",
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "-",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_expected_argv_shape() {
        // Command doesn't expose its built argv directly; this just
        // exercises the builder path against a program guaranteed to
        // exist so a future reviewer sees what `spawn` does without
        // requiring ffmpeg in the test environment.
        let result = spawn("true", 16_000);
        if let Ok(mut child) = result {
            let _ = child.start_kill();
        }
    }
}
