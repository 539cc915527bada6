use crate::model::snapshot::{Analysis, DataSink, Record, RunHeader, Snapshot};
use opinet_core::Result;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes every record as one JSON line.
pub struct JsonlSink<W: Write> {
    writer: W,
    lines: u64,
}

impl JsonlSink<BufWriter<File>> {
    /// Creates (or truncates) `path`, creating missing parent directories.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        writeln!(self.writer, "{}", json)?;
        self.lines += 1;
        Ok(())
    }
}

impl<W: Write> DataSink for JsonlSink<W> {
    fn write_header(&mut self, header: &RunHeader) -> Result<()> {
        self.write_line(&Record::Header(header.clone()))
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.write_line(&Record::Snapshot(snapshot.clone()))
    }

    fn write_analysis(&mut self, analysis: &Analysis) -> Result<()> {
        self.write_line(&Record::Analysis(analysis.clone()))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Discards everything, for runs that are only timed or logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DataSink for NullSink {
    fn write_snapshot(&mut self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }

    fn write_analysis(&mut self, _analysis: &Analysis) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::network::UserNetwork;

    #[test]
    fn test_jsonl_lines() {
        let users = UserNetwork::with_vertices(3);
        let mut sink = JsonlSink::new(Vec::new());
        sink.write_snapshot(&Snapshot::capture(0, &users, None, 0))
            .unwrap();
        sink.write_analysis(&Analysis::capture(0, &users, 0.1, -1.0))
            .unwrap();
        assert_eq!(sink.lines(), 2);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let records: Vec<Record> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert!(matches!(records[0], Record::Snapshot(_)));
        assert!(matches!(records[1], Record::Analysis(_)));
    }
}
