pub mod convert;
pub mod csv_sink;
pub mod dbc;
pub mod describe;
pub mod progress;
pub mod row;
pub mod row_source;

pub use convert::{ConvertConfig, ConvertSummary, DEFAULT_TEMP_FILE, TempDbf, dbc_to_csv};
pub use csv_sink::CsvSink;
pub use dbc::{DbcPreHeader, decompress_dbc_to_dbf};
pub use describe::{DbfFieldInfo, DbfSummary, describe_dbc, describe_dbf};
pub use progress::{ProgressReporter, format_elapsed, summary_line};
pub use row::{CellValue, Row, numeric_cell};
pub use row_source::{DbfRowSource, TextEncoding};
