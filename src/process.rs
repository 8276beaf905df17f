//! External CLI invocation.
//!
//! Two flavors: `run_collect` buffers everything and resolves once on exit
//! (fast commands like `ollama list`), `run_streaming` forwards output
//! chunks the moment they arrive (slow commands like `ollama pull`).
//!
//! Arguments are always passed as a discrete vector, never interpolated
//! into a shell string, so caller-supplied model names cannot smuggle in
//! shell metacharacters.

use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process exited with code {}", .code.unwrap_or(-1))]
    NonZeroExit {
        code: Option<i32>,
        stderr: String,
    },
}

impl ProcessError {
    /// The stderr captured from the failed process, when there is any.
    pub fn captured_stderr(&self) -> Option<&str> {
        match self {
            ProcessError::NonZeroExit { stderr, .. } if !stderr.trim().is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Runs the program to completion and returns its stdout. Non-zero exit
/// fails with the captured stderr attached; stderr on success is only
/// logged (some CLIs chatter on stderr even when they succeed).
pub async fn run_collect(program: &str, args: &[&str]) -> Result<String, ProcessError> {
    tracing::debug!("Running (collect): {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(ProcessError::NonZeroExit {
            code: output.status.code(),
            stderr,
        });
    }

    if !stderr.trim().is_empty() {
        tracing::debug!("{} stderr: {}", program, stderr.trim_end());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Runs the program with piped output, forwarding stdout and stderr data
/// verbatim through `tx` as it arrives, then returns the exit code.
///
/// Chunks are raw reads, not lines: progress bars that repaint a line with
/// `\r` and never emit a newline still stream through immediately.
///
/// No timeout and no cancellation: the call resolves when the child exits.
pub async fn run_streaming(
    program: &str,
    args: &[&str],
    tx: mpsc::Sender<String>,
) -> Result<Option<i32>, ProcessError> {
    tracing::debug!("Running (streaming): {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_tx = tx.clone();
    let stdout_task = tokio::spawn(async move {
        if let Some(stdout) = stdout {
            forward_chunks(stdout, stdout_tx).await;
        }
    });

    let stderr_task = tokio::spawn(async move {
        if let Some(stderr) = stderr {
            forward_chunks(stderr, tx).await;
        }
    });

    // Drain both pipes before waiting so a chatty child cannot dead-lock
    // on a full pipe buffer.
    let _ = stdout_task.await;
    let _ = stderr_task.await;

    let status = child.wait().await.map_err(|source| ProcessError::Spawn {
        program: program.to_string(),
        source,
    })?;

    Ok(status.code())
}

async fn forward_chunks<R>(mut reader: R, tx: mpsc::Sender<String>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collect_captures_stdout() {
        let stdout = run_collect("sh", &["-c", "echo hello"]).await.unwrap();
        assert_eq!(stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn collect_nonzero_exit_carries_stderr() {
        let err = run_collect("sh", &["-c", "echo broken >&2; exit 3"])
            .await
            .unwrap_err();

        match err {
            ProcessError::NonZeroExit { code, ref stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("broken"));
            }
            other => panic!("expected NonZeroExit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn collect_missing_program_is_spawn_error() {
        let err = run_collect("ollamadesk-no-such-binary", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[tokio::test]
    async fn collect_args_are_not_shell_interpreted() {
        // A metacharacter-laden argument must arrive as a literal argv
        // entry, not be expanded by a shell.
        let stdout = run_collect("echo", &["$(whoami); rm -rf /"]).await.unwrap();
        assert_eq!(stdout.trim(), "$(whoami); rm -rf /");
    }

    #[tokio::test]
    async fn streaming_delivers_output_in_order_then_exit_code() {
        let (tx, mut rx) = mpsc::channel(16);
        let code = run_streaming("sh", &["-c", "echo one; echo two; echo three >&2"], tx)
            .await
            .unwrap();

        assert_eq!(code, Some(0));

        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }

        // stdout order is guaranteed; stderr interleaving is not, so only
        // check relative stdout order and overall membership. Adjacent
        // writes may arrive coalesced into one chunk.
        let joined = chunks.concat();
        assert!(joined.find("one").unwrap() < joined.find("two").unwrap());
        assert!(joined.contains("three"));
    }

    #[tokio::test]
    async fn streaming_forwards_unterminated_output_before_exit() {
        // `ollama pull` repaints its progress bar with carriage returns and
        // may never write a newline; data must flow the moment it arrives,
        // not at pipe EOF.
        let (tx, mut rx) = mpsc::channel(16);
        let runner = tokio::spawn(async move {
            run_streaming("sh", &["-c", "printf 'pulling abc123'; sleep 2"], tx).await
        });

        let chunk = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("output should arrive while the child is still running")
            .unwrap();
        assert!(chunk.contains("pulling abc123"));

        let code = runner.await.unwrap().unwrap();
        assert_eq!(code, Some(0));
    }

    #[tokio::test]
    async fn streaming_reports_nonzero_exit_code() {
        let (tx, _rx) = mpsc::channel(16);
        let code = run_streaming("sh", &["-c", "exit 1"], tx).await.unwrap();
        assert_eq!(code, Some(1));
    }

    #[tokio::test]
    async fn streaming_missing_program_is_spawn_error() {
        let (tx, _rx) = mpsc::channel(16);
        let err = run_streaming("ollamadesk-no-such-binary", &[], tx)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
