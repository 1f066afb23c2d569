//! CSV record emission.
//!
//! The emitter owns the sink for the lifetime of the run. It writes the
//! header once on creation and then one row per snapshot, in call order.

use super::sink::Sink;
use crate::analysis::predicates::header;
use crate::models::Snapshot;
use std::io;
use tracing::debug;

/// Format of the `time` column (local wall-clock time).
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Errors while emitting rows. Any of these ends the run.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to write sample row: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot columns {got:?} do not match header {expected:?}")]
    Schema {
        expected: Vec<&'static str>,
        got: Vec<&'static str>,
    },
}

/// Writes snapshots as rows under a fixed header.
pub struct Emitter {
    sink: Box<dyn Sink>,
    columns: Vec<&'static str>,
    rows_written: u64,
}

impl Emitter {
    /// Create an emitter and write the header row.
    pub fn new(mut sink: Box<dyn Sink>) -> Result<Self, EmitError> {
        let columns = header();
        let fields: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        sink.write_row(&fields)?;

        Ok(Self {
            sink,
            columns,
            rows_written: 0,
        })
    }

    /// Serialize a snapshot and write it through the sink.
    pub fn emit(&mut self, snapshot: &Snapshot) -> Result<(), EmitError> {
        let got: Vec<&'static str> = snapshot.values.iter().map(|(name, _)| *name).collect();
        if got[..] != self.columns[1..] {
            return Err(EmitError::Schema {
                expected: self.columns.clone(),
                got,
            });
        }

        let mut fields = Vec::with_capacity(self.columns.len());
        fields.push(snapshot.taken_at.format(TIME_FORMAT).to_string());
        fields.extend(snapshot.values.iter().map(|(_, value)| value.to_string()));

        self.sink.write_row(&fields)?;
        self.rows_written += 1;
        debug!("Emitted row {}", self.rows_written);
        Ok(())
    }

    /// Number of data rows written so far (excluding the header).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::sink::WriterSink;
    use chrono::{Local, TimeZone};
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn emitter_over(buffers: &[SharedBuffer]) -> Emitter {
        let destinations: Vec<Box<dyn Write + Send>> = buffers
            .iter()
            .map(|b| Box::new(b.clone()) as Box<dyn Write + Send>)
            .collect();
        Emitter::new(Box::new(WriterSink::new(destinations))).unwrap()
    }

    fn snapshot(values: Vec<(&'static str, u64)>) -> Snapshot {
        Snapshot {
            taken_at: Local.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap(),
            values,
        }
    }

    fn full_values() -> Vec<(&'static str, u64)> {
        header()[1..].iter().enumerate().map(|(i, c)| (*c, i as u64)).collect()
    }

    #[test]
    fn test_header_written_on_creation() {
        let buffer = SharedBuffer::default();
        let _emitter = emitter_over(&[buffer.clone()]);

        assert_eq!(buffer.contents(), format!("{}\n", header().join(",")));
    }

    #[test]
    fn test_row_follows_header_order() {
        let buffer = SharedBuffer::default();
        let mut emitter = emitter_over(&[buffer.clone()]);

        emitter.emit(&snapshot(full_values())).unwrap();

        let contents = buffer.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "13:04:05,0,1,2,3,4,5,6,7,8,9,10,11");
        assert_eq!(emitter.rows_written(), 1);
    }

    #[test]
    fn test_fan_out_to_every_destination() {
        let first = SharedBuffer::default();
        let second = SharedBuffer::default();
        let mut emitter = emitter_over(&[first.clone(), second.clone()]);

        emitter.emit(&snapshot(full_values())).unwrap();
        assert_eq!(first.contents(), second.contents());
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let buffer = SharedBuffer::default();
        let mut emitter = emitter_over(&[buffer.clone()]);

        let result = emitter.emit(&snapshot(vec![("node_total", 1)]));
        assert!(matches!(result, Err(EmitError::Schema { .. })));
        assert_eq!(buffer.contents().lines().count(), 1);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let destinations: Vec<Box<dyn Write + Send>> = vec![Box::new(BrokenPipe)];
        let result = Emitter::new(Box::new(WriterSink::new(destinations)));
        assert!(matches!(result, Err(EmitError::Io(_))));
    }
}
