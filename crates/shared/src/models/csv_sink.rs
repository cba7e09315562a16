use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};

use crate::errors::{ConvertError, ConvertResult};
use crate::models::row::Row;

/// Comma delimited, minimal quoting, CRLF terminated
fn csv_builder() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF);
    builder
}

/// Append-only CSV destination
pub struct CsvSink {
    path: PathBuf,
    writer: Writer<File>,
    rows_written: usize,
}

impl CsvSink {
    /// Create or truncate `path` and write a single header line
    pub fn write_header<P, I, S>(path: P, fields: I) -> ConvertResult<()>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let path = path.as_ref();
        let mut writer = csv_builder()
            .from_path(path)
            .map_err(|e| ConvertError::sink_write(path, e))?;
        writer
            .write_record(fields)
            .map_err(|e| ConvertError::sink_write(path, e))?;
        writer.flush().map_err(|e| ConvertError::sink_write(path, e))
    }

    /// Open `path` in append mode, creating it when missing
    pub fn open_append<P: AsRef<Path>>(path: P) -> ConvertResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| ConvertError::sink_write(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: csv_builder().from_writer(file),
            rows_written: 0,
        })
    }

    /// Write one line with the row's values in the row's own key order
    pub fn append(&mut self, row: &Row) -> ConvertResult<()> {
        self.writer
            .write_record(row.values().map(|value| value.to_string()))
            .map_err(|e| ConvertError::sink_write(&self.path, e))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush buffered lines and return the number of rows written
    pub fn finish(mut self) -> ConvertResult<usize> {
        self.writer
            .flush()
            .map_err(|e| ConvertError::sink_write(&self.path, e))?;
        Ok(self.rows_written)
    }
}
