//! `--jq` post-processing through an external jq binary

use std::io::{self, Write};
use std::process::{Command, Stdio};

use thiserror::Error;

const JQ_BIN: &str = "jq";

#[derive(Debug, Error)]
pub(crate) enum JqError {
    #[error("jq not found. Install jq to use --jq")]
    NotFound,

    #[error("Failed to {stage} jq: {source}")]
    Io {
        stage: &'static str,
        source: io::Error,
    },

    #[error("jq produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("jq error: {0}")]
    Filter(String),
}

fn io_error(stage: &'static str) -> impl FnOnce(io::Error) -> JqError {
    move |source| JqError::Io { stage, source }
}

/// A filter expression as given on the command line
#[derive(Debug, Clone, Copy)]
pub(crate) struct JqFilter<'a> {
    expr: &'a str,
}

impl<'a> JqFilter<'a> {
    pub(crate) fn new(expr: &'a str) -> Self {
        Self { expr }
    }

    /// `.` and blank filters leave the document as is and need no jq
    pub(crate) fn is_identity(&self) -> bool {
        matches!(self.expr.trim(), "" | ".")
    }

    pub(crate) fn apply(&self, json: &str) -> Result<String, JqError> {
        if self.is_identity() {
            return Ok(format!("{json}\n"));
        }

        let mut child = Command::new(JQ_BIN)
            .arg(self.expr)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => JqError::NotFound,
                _ => JqError::Io {
                    stage: "start",
                    source: e,
                },
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(json.as_bytes()).map_err(io_error("feed"))?;
        }
        let output = child.wait_with_output().map_err(io_error("wait for"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(JqError::Filter(stderr.trim().to_string()));
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}
