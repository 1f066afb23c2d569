//! Row sinks.
//!
//! A sink takes one row of string fields, writes it as a CSV line to every
//! destination, and flushes each destination before returning.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Accepts formatted rows.
pub trait Sink: Send {
    /// Write one row and flush it.
    fn write_row(&mut self, fields: &[String]) -> io::Result<()>;
}

/// Fan-out sink over zero or more writers.
pub struct WriterSink {
    destinations: Vec<Box<dyn Write + Send>>,
}

impl WriterSink {
    pub fn new(destinations: Vec<Box<dyn Write + Send>>) -> Self {
        Self { destinations }
    }

    /// Number of destinations rows are written to.
    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }
}

impl Sink for WriterSink {
    fn write_row(&mut self, fields: &[String]) -> io::Result<()> {
        let line = format_csv_line(fields);
        for destination in &mut self.destinations {
            destination.write_all(line.as_bytes())?;
            destination.flush()?;
        }
        Ok(())
    }
}

/// Encode one CSV line, quoting fields that need it.
pub fn format_csv_line(fields: &[String]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        if field.contains([',', '"', '\r', '\n']) {
            line.push('"');
            line.push_str(&field.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(field);
        }
    }
    line.push('\n');
    line
}

/// Errors opening the output destinations.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("File {} already exists. Use -f flag to force overwrite", .path.display())]
    Conflict { path: PathBuf },

    #[error("failed to create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Open the sink for a run.
///
/// With a path, refuses to touch an existing file unless `force` is set,
/// in which case the file is truncated. Stdout is added when `stdout` is set.
pub fn open_output(
    path: Option<&Path>,
    force: bool,
    stdout: bool,
) -> Result<WriterSink, OutputError> {
    let mut destinations: Vec<Box<dyn Write + Send>> = Vec::new();

    if let Some(path) = path {
        if path.exists() && !force {
            return Err(OutputError::Conflict {
                path: path.to_path_buf(),
            });
        }
        let file = File::create(path).map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Writing samples to {}", path.display());
        destinations.push(Box::new(file));
    }

    if stdout {
        destinations.push(Box::new(io::stdout()));
    }

    Ok(WriterSink::new(destinations))
}
