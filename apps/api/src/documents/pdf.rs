use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

const SOURCE_FILE: &str = "document.tex";
const OUTPUT_FILE: &str = "document.pdf";
const LOG_FILE: &str = "document.log";
/// Lines of compiler log kept in the error.
const LOG_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("build directory I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not start '{bin}': {message}")]
    Spawn { bin: String, message: String },

    #[error("LaTeX compilation timed out after {0:?}")]
    Timeout(Duration),

    #[error("LaTeX compilation failed:\n{log_tail}")]
    Compile { log_tail: String },
}

/// Compiles LaTeX source to PDF in a throwaway directory.
///
/// Runs `latex_bin -interaction=nonstopmode -halt-on-error document.tex`;
/// the process is killed if it outlives `timeout`.
pub async fn compile_pdf(
    latex: &str,
    latex_bin: &str,
    timeout: Duration,
) -> Result<Bytes, RenderError> {
    let dir = tempfile::tempdir()?;
    tokio::fs::write(dir.path().join(SOURCE_FILE), latex).await?;

    let child = Command::new(latex_bin)
        .arg("-interaction=nonstopmode")
        .arg("-halt-on-error")
        .arg(SOURCE_FILE)
        .current_dir(dir.path())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(RenderError::Spawn {
                bin: latex_bin.to_string(),
                message: e.to_string(),
            })
        }
        Err(_) => {
            warn!("{latex_bin} exceeded {timeout:?}, killed");
            return Err(RenderError::Timeout(timeout));
        }
    };

    let pdf_path = dir.path().join(OUTPUT_FILE);
    if !output.status.success() || !pdf_path.exists() {
        let log = tokio::fs::read_to_string(dir.path().join(LOG_FILE))
            .await
            .unwrap_or_else(|_| String::from_utf8_lossy(&output.stdout).into_owned());
        return Err(RenderError::Compile {
            log_tail: log_tail(&log, LOG_TAIL_LINES),
        });
    }

    let pdf = tokio::fs::read(pdf_path).await?;
    debug!("Compiled PDF ({} bytes)", pdf.len());
    Ok(Bytes::from(pdf))
}

fn log_tail(log: &str, lines: usize) -> String {
    let all: Vec<&str> = log.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_tail_keeps_last_lines() {
        let log = (1..=30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let tail = log_tail(&log, 3);
        assert_eq!(tail, "line 28\nline 29\nline 30");
    }

    #[test]
    fn test_log_tail_short_log() {
        assert_eq!(log_tail("only", 20), "only");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let err = compile_pdf(
            "\\documentclass{article}",
            "definitely-not-a-latex-binary",
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }
}
