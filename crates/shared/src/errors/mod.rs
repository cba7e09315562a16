use std::io;
use std::path::Path;

use thiserror::Error;

/// Centralized error type for the DBC to CSV pipeline.
///
/// Each variant names the stage that failed so the command layer can report
/// it without inspecting the underlying library error.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The DBC file could not be read or decompressed
    #[error("Failed to decode DBC file {path}: {message}")]
    Decode { path: String, message: String },

    /// The decompressed DBF could not be opened or one of its records is malformed
    #[error("Failed to read DBF file {path}: {message}")]
    SourceRead { path: String, message: String },

    /// The CSV destination could not be created, appended to or flushed
    #[error("Failed to write CSV file {path}: {message}")]
    SinkWrite { path: String, message: String },

    /// The temporary DBF could not be created, written or removed
    #[error("Temporary file error with {path}: {source}")]
    TempFile {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ConvertError {
    pub fn decode<P: AsRef<Path>, S: ToString>(path: P, message: S) -> Self {
        Self::Decode {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn source_read<P: AsRef<Path>, S: ToString>(path: P, message: S) -> Self {
        Self::SourceRead {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn sink_write<P: AsRef<Path>, S: ToString>(path: P, message: S) -> Self {
        Self::SinkWrite {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    pub fn temp_file<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Self::TempFile {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Alias for fallible operations in the shared crate
pub type ConvertResult<T> = Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            ConvertError::decode("in.dbc", "Missing or invalid DBC header"),
            ConvertError::source_read("tmp.dbf", "invalid utf-8"),
            ConvertError::sink_write("out.csv", "permission denied"),
            ConvertError::temp_file(
                "tmp.dbf",
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ),
        ];

        for err in errors {
            let display_str = format!("{err}");
            assert!(!display_str.is_empty(), "Error display should not be empty");
        }
    }

    #[test]
    fn test_error_helper_functions() {
        let err = ConvertError::decode("/data/PAAC2301.dbc", "bad header");
        assert!(matches!(
            err,
            ConvertError::Decode { ref path, ref message }
                if path == "/data/PAAC2301.dbc" && message == "bad header"
        ));
        assert_eq!(
            err.to_string(),
            "Failed to decode DBC file /data/PAAC2301.dbc: bad header"
        );

        match ConvertError::source_read("tmp.dbf", "truncated record") {
            ConvertError::SourceRead { message, .. } => assert_eq!(message, "truncated record"),
            other => panic!("unexpected error: {}", other),
        }

        let err = ConvertError::sink_write("out.csv", "disk full");
        assert!(matches!(err, ConvertError::SinkWrite { ref path, .. } if path == "out.csv"));
    }

    #[test]
    fn test_temp_file_error_keeps_source() {
        use std::error::Error as StdError;

        let err = ConvertError::temp_file(
            "tmp.dbf",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let source = err.source().expect("temp file error should expose its io source");
        assert_eq!(source.to_string(), "gone");
    }
}
