//! Destinations for the emitted record batch

use async_trait::async_trait;
use mailgate_errors::{Error, OpsError};
use mailgate_types::{RecordFormat, VerificationRecord};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Receives the ordered batch of records at the end of a run
#[async_trait]
pub trait RecordSink: Send {
    /// Short description used in progress output
    fn name(&self) -> String;

    /// Accept one batch of records
    async fn push(&mut self, records: &[VerificationRecord]) -> Result<(), Error>;
}

/// Render a batch in the requested format, newline-terminated
///
/// # Errors
///
/// Returns an error if a record cannot be serialized.
pub fn render_records(records: &[VerificationRecord], format: RecordFormat) -> Result<String, Error> {
    let mut out = match format {
        RecordFormat::Json => serde_json::to_string_pretty(records)?,
        RecordFormat::Jsonl => {
            let lines = records
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?;
            lines.join("\n")
        }
    };
    out.push('\n');
    Ok(out)
}

/// Writes the batch to a file, replacing any previous content
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    format: RecordFormat,
}

impl JsonFileSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, format: RecordFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn failure(&self, error: &impl std::fmt::Display) -> Error {
        OpsError::SinkFailed {
            sink: self.path.display().to_string(),
            message: error.to_string(),
        }
        .into()
    }
}

#[async_trait]
impl RecordSink for JsonFileSink {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn push(&mut self, records: &[VerificationRecord]) -> Result<(), Error> {
        let contents = render_records(records, self.format)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.failure(&e))?;
        }
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| self.failure(&e))?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "records written");
        Ok(())
    }
}

/// Streams the batch to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    format: RecordFormat,
}

impl StdoutSink {
    #[must_use]
    pub fn new(format: RecordFormat) -> Self {
        Self { format }
    }
}

#[async_trait]
impl RecordSink for StdoutSink {
    fn name(&self) -> String {
        "stdout".to_string()
    }

    async fn push(&mut self, records: &[VerificationRecord]) -> Result<(), Error> {
        let contents = render_records(records, self.format)?;
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(contents.as_bytes())
            .await
            .map_err(|e| sink_error("stdout", &e))?;
        stdout.flush().await.map_err(|e| sink_error("stdout", &e))?;
        Ok(())
    }
}

fn sink_error(sink: &str, error: &std::io::Error) -> Error {
    OpsError::SinkFailed {
        sink: sink.to_string(),
        message: error.to_string(),
    }
    .into()
}

/// Keeps every pushed batch in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Vec<Vec<VerificationRecord>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn batches(&self) -> &[Vec<VerificationRecord>] {
        &self.batches
    }

    /// All records across batches, in push order
    #[must_use]
    pub fn records(&self) -> Vec<VerificationRecord> {
        self.batches.iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    fn name(&self) -> String {
        "memory".to_string()
    }

    async fn push(&mut self, records: &[VerificationRecord]) -> Result<(), Error> {
        self.batches.push(records.to_vec());
        Ok(())
    }
}
