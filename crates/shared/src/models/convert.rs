//! The DBC to CSV conversion command.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::errors::{ConvertError, ConvertResult};
use crate::models::csv_sink::CsvSink;
use crate::models::dbc::{open_dbc, write_dbf};
use crate::models::progress::{ProgressReporter, summary_line};
use crate::models::row_source::{DbfRowSource, TextEncoding};

/// Default name of the intermediate DBF, relative to the working directory
pub const DEFAULT_TEMP_FILE: &str = "tmp.dbf";

/// Configuration for a conversion run
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Where the decompressed DBF is written while the conversion runs
    pub temp_path: PathBuf,
    /// Encoding used to decode character fields
    pub encoding: TextEncoding,
    /// Whether to draw the per-row progress bar
    pub show_progress: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            temp_path: PathBuf::from(DEFAULT_TEMP_FILE),
            encoding: TextEncoding::default(),
            show_progress: true,
        }
    }
}

/// Outcome of [`dbc_to_csv`]
#[derive(Debug, Clone)]
pub struct ConvertSummary {
    /// Records in the DBF not flagged as deleted
    pub total: usize,
    /// Rows appended to the CSV
    pub rows_written: usize,
    /// Whether the destination was created with a header line
    pub header_written: bool,
    /// Time spent streaming rows
    pub elapsed: Duration,
}

impl ConvertSummary {
    pub fn message(&self) -> String {
        summary_line(self.rows_written, self.elapsed)
    }
}

/// Decompressed DBF owned for the duration of one command.
///
/// [`TempDbf::remove`] deletes it and reports failures. If the guard is
/// dropped instead, on an error path, deletion is attempted and a failure is
/// only logged.
pub struct TempDbf {
    path: PathBuf,
    armed: bool,
}

impl TempDbf {
    /// Decompress `dbc_path` into `temp_path`.
    ///
    /// Nothing is created when the DBC header is invalid; a partially
    /// written file is removed when decompression fails.
    pub fn decode<P: AsRef<Path>, Q: AsRef<Path>>(
        dbc_path: P,
        temp_path: Q,
    ) -> ConvertResult<Self> {
        let dbc_path = dbc_path.as_ref();
        let dbf_reader = open_dbc(dbc_path)?;

        let guard = Self {
            path: temp_path.as_ref().to_path_buf(),
            armed: true,
        };
        write_dbf(dbf_reader, dbc_path, &guard.path)?;
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remove(mut self) -> ConvertResult<()> {
        self.armed = false;
        fs::remove_file(&self.path).map_err(|e| ConvertError::temp_file(&self.path, e))?;
        debug!("Removed {}", self.path.display());
        Ok(())
    }
}

impl Drop for TempDbf {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {} after a failed run", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

/// Convert `dbc_path` into `csv_path`.
///
/// A new destination gets a header line taken from the DBF field names; an
/// existing one only has rows appended.
pub fn dbc_to_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    dbc_path: P,
    csv_path: Q,
    config: &ConvertConfig,
) -> ConvertResult<ConvertSummary> {
    let dbc_path = dbc_path.as_ref();
    let csv_path = csv_path.as_ref();
    info!("Converting {} into {}", dbc_path.display(), csv_path.display());

    let temp = TempDbf::decode(dbc_path, &config.temp_path)?;

    let summary = {
        let mut source = DbfRowSource::open(temp.path(), config.encoding)?;

        let header_written = if csv_path.exists() {
            debug!("{} exists, appending without header", csv_path.display());
            false
        } else {
            CsvSink::write_header(csv_path, source.field_names())?;
            debug!(
                "Created {} with {} columns",
                csv_path.display(),
                source.field_names().len()
            );
            true
        };

        let (rows_written, elapsed) = write_rows(&mut source, csv_path, config.show_progress)?;

        ConvertSummary {
            total: source.total(),
            rows_written,
            header_written,
            elapsed,
        }
    };

    temp.remove()?;
    info!(
        "Wrote {} rows to {} in {:?}",
        summary.rows_written,
        csv_path.display(),
        summary.elapsed
    );
    Ok(summary)
}

/// Stream every row of `source` onto the end of `csv_path`
pub fn write_rows(
    source: &mut DbfRowSource,
    csv_path: &Path,
    show_progress: bool,
) -> ConvertResult<(usize, Duration)> {
    let start = Instant::now();
    let mut sink = CsvSink::open_append(csv_path)?;
    let progress = ProgressReporter::new(source.total() as u64, show_progress);

    for row in progress.track(source.rows()) {
        sink.append(&row?)?;
    }
    progress.finish();

    let rows_written = sink.finish()?;
    Ok((rows_written, start.elapsed()))
}
