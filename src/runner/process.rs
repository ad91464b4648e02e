//! Child processes with a hard deadline.
//!
//! Both agents and test runners are external commands that may hang. They are
//! run here with piped output, drained concurrently, and killed outright when
//! the deadline passes; whatever they printed before that is kept.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long pipe readers may keep going after the child has exited or been
/// killed. Grandchildren that inherited the pipes can otherwise keep them
/// open indefinitely.
const READER_GRACE: Duration = Duration::from_secs(2);

/// Outcome of a bounded process run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code, or -1 when killed or terminated by a signal.
    pub exit_code: i32,
    /// Captured stdout (lossy UTF-8).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
    /// Whether the deadline expired and the child was killed.
    pub timed_out: bool,
    /// Time from spawn to exit or termination.
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// True if the process exited on its own with status zero.
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Runs `cmd` to completion or until `timeout` expires.
///
/// Stdin is closed. Spawn failures are returned as errors; everything after
/// a successful spawn is reported through [`ProcessOutput`].
pub async fn run_with_timeout(mut cmd: Command, timeout: Duration) -> std::io::Result<ProcessOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let mut child = cmd.spawn()?;

    let stdout_buf = Arc::new(Mutex::new(Vec::new()));
    let stderr_buf = Arc::new(Mutex::new(Vec::new()));
    let readers: Vec<JoinHandle<()>> = [
        child.stdout.take().map(|pipe| tokio::spawn(drain(pipe, Arc::clone(&stdout_buf)))),
        child.stderr.take().map(|pipe| tokio::spawn(drain(pipe, Arc::clone(&stderr_buf)))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => (status?.code().unwrap_or(-1), false),
        Err(_) => {
            debug!(timeout = ?timeout, "Deadline expired, killing child");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill timed-out child");
            }
            (-1, true)
        }
    };
    let elapsed = start.elapsed();

    for mut reader in readers {
        if tokio::time::timeout(READER_GRACE, &mut reader).await.is_err() {
            debug!("Output pipe still open after exit, abandoning reader");
            reader.abort();
        }
    }

    Ok(ProcessOutput {
        exit_code,
        stdout: take_text(&stdout_buf),
        stderr: take_text(&stderr_buf),
        timed_out,
        elapsed,
    })
}

async fn drain<R: AsyncRead + Unpin>(mut pipe: R, buf: Arc<Mutex<Vec<u8>>>) {
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut data) = buf.lock() {
                    data.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }
}

fn take_text(buf: &Mutex<Vec<u8>>) -> String {
    buf.lock()
        .map(|mut data| String::from_utf8_lossy(&std::mem::take(&mut *data)).into_owned())
        .unwrap_or_default()
}
