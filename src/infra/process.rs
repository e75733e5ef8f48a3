use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

const STDERR_TAIL_BYTES: usize = 4 * 1024;

/// A single subprocess call: program, arguments and an optional file piped to stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg:?}")?;
        }
        if let Some(path) = &self.stdin {
            write!(f, " < {}", path.display())?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("I/O error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("`{program}` wrote more than {limit} bytes to stdout")]
    OutputLimit { program: String, limit: usize },
    #[error("`{program}` produced no output")]
    EmptyOutput { program: String },
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs to completion and returns captured stdout.
    async fn run(&self, invocation: &Invocation) -> Result<String, AttemptError>;
}

/// Runs invocations as child processes, capping each captured stream at `output_limit` bytes.
pub struct ProcessRunner {
    output_limit: usize,
}

impl ProcessRunner {
    pub fn new(output_limit: usize) -> Self {
        Self { output_limit }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<String, AttemptError> {
        let program = invocation.program.clone();
        let io_error = |source| AttemptError::Io {
            program: program.clone(),
            source,
        };

        let input = match &invocation.stdin {
            Some(path) => Some(tokio::fs::read(path).await.map_err(io_error)?),
            None => None,
        };

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| AttemptError::Launch {
            program: program.clone(),
            source,
        })?;

        let feeder = match (child.stdin.take(), input) {
            (Some(mut pipe), Some(bytes)) => Some(tokio::spawn(async move {
                // the tool may exit without draining stdin
                let _ = pipe.write_all(&bytes).await;
            })),
            _ => None,
        };

        let limit = self.output_limit;
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(read_capped(stderr, limit)));

        let captured = match child.stdout.take() {
            Some(stdout) => read_capped(stdout, limit).await,
            None => Ok((Vec::new(), false)),
        };
        let (stdout, overflowed) = match captured {
            Ok(captured) => captured,
            Err(source) => {
                let _ = child.kill().await;
                return Err(io_error(source));
            }
        };
        if overflowed {
            let _ = child.kill().await;
            return Err(AttemptError::OutputLimit { program, limit });
        }

        let status = child.wait().await.map_err(io_error)?;
        if let Some(feeder) = feeder {
            let _ = feeder.await;
        }
        let stderr = match stderr_task {
            Some(task) => match task.await {
                Ok(Ok((bytes, _))) => stderr_tail(&bytes),
                _ => String::new(),
            },
            None => String::new(),
        };

        if !status.success() {
            return Err(AttemptError::Exit {
                program,
                status,
                stderr,
            });
        }

        let text = String::from_utf8_lossy(&stdout).into_owned();
        if text.trim().is_empty() {
            return Err(AttemptError::EmptyOutput { program });
        }
        Ok(text)
    }
}

/// Last `STDERR_TAIL_BYTES` of captured stderr, trimmed, with `...` marking a cut.
fn stderr_tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

async fn read_capped<R>(reader: R, limit: usize) -> io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut buffer)
        .await?;
    let overflowed = buffer.len() > limit;
    buffer.truncate(limit);
    Ok((buffer, overflowed))
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn prompt_file(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("prompt.md");
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn captures_stdout_of_file_argument() {
        let dir = TempDir::new().unwrap();
        let path = prompt_file(&dir, "plan the work\n");

        let output = ProcessRunner::new(1024)
            .run(&Invocation::new("cat").arg(path.display().to_string()))
            .await
            .unwrap();
        assert_eq!(output, "plan the work\n");
    }

    #[tokio::test]
    async fn pipes_prompt_through_stdin() {
        let dir = TempDir::new().unwrap();
        let path = prompt_file(&dir, "from stdin");

        let output = ProcessRunner::new(1024)
            .run(&Invocation::new("cat").stdin_from(&path))
            .await
            .unwrap();
        assert_eq!(output, "from stdin");
    }

    #[tokio::test]
    async fn non_zero_exit_fails_attempt() {
        let err = ProcessRunner::new(1024)
            .run(&Invocation::new("false"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::Exit { .. }), "{err}");
    }

    #[tokio::test]
    async fn exit_error_keeps_only_stderr_tail() {
        let script = concat!(
            "head -c 20000 /dev/zero | tr '\\0' x >&2; ",
            "printf 'last words' >&2; exit 3"
        );
        let err = ProcessRunner::new(1 << 20)
            .run(&Invocation::new("sh").arg("-c").arg(script))
            .await
            .unwrap_err();

        let AttemptError::Exit { stderr, .. } = &err else {
            panic!("expected exit failure, got {err}");
        };
        assert!(stderr.starts_with("..."), "{stderr}");
        assert!(stderr.ends_with("last words"));
        assert_eq!(stderr.len(), STDERR_TAIL_BYTES + 3);
    }

    #[test]
    fn short_stderr_is_kept_whole() {
        assert_eq!(stderr_tail(b"  boom\n"), "boom");
        let cut = stderr_tail("é".repeat(STDERR_TAIL_BYTES).as_bytes());
        assert!(cut.starts_with("...é"));
        assert!(cut.len() <= STDERR_TAIL_BYTES + 3);
    }

    #[tokio::test]
    async fn missing_binary_fails_to_launch() {
        let err = ProcessRunner::new(1024)
            .run(&Invocation::new("definitely-not-installed-4f1c"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::Launch { .. }), "{err}");
    }

    #[tokio::test]
    async fn oversized_output_fails_attempt() {
        let dir = TempDir::new().unwrap();
        let path = prompt_file(&dir, "0123456789abcdef");

        let err = ProcessRunner::new(8)
            .run(&Invocation::new("cat").arg(path.display().to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::OutputLimit { limit: 8, .. }), "{err}");
    }

    #[tokio::test]
    async fn blank_output_fails_attempt() {
        let err = ProcessRunner::new(1024)
            .run(&Invocation::new("true"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::EmptyOutput { .. }), "{err}");
    }

    #[test]
    fn displays_invocation() {
        let invocation = Invocation::new("claude")
            .arg("-p")
            .arg("think")
            .stdin_from("/tmp/prompt.md");
        assert_eq!(
            invocation.to_string(),
            "claude \"-p\" \"think\" < /tmp/prompt.md"
        );
    }
}
