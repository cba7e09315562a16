use std::path::Path;

use serde::Serialize;

use crate::errors::ConvertResult;
use crate::models::convert::{ConvertConfig, TempDbf};
use crate::models::row_source::{DbfRowSource, TextEncoding};

/// Information about a DBF field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbfFieldInfo {
    /// Field name
    pub name: String,
    /// dBase field type as string
    pub dbase_type: String,
    /// Length of the field
    pub length: u8,
}

/// Summary information about a DBF table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbfSummary {
    /// Number of columns (fields) in the table
    pub n_columns: usize,
    /// Number of rows (records not flagged as deleted) in the table
    pub n_rows: usize,
    pub fields: Vec<DbfFieldInfo>,
}

/// Describe an already decompressed DBF
pub fn describe_dbf<P: AsRef<Path>>(
    dbf_path: P,
    encoding: TextEncoding,
) -> ConvertResult<DbfSummary> {
    let source = DbfRowSource::open(dbf_path, encoding)?;

    let fields: Vec<DbfFieldInfo> = source
        .fields()
        .iter()
        .map(|field| DbfFieldInfo {
            name: field.name().to_string(),
            dbase_type: format!("{:?}", field.field_type()),
            length: field.length(),
        })
        .collect();

    Ok(DbfSummary {
        n_columns: fields.len(),
        n_rows: source.total(),
        fields,
    })
}

/// Decompress `dbc_path` to the configured temporary DBF and describe it
pub fn describe_dbc<P: AsRef<Path>>(
    dbc_path: P,
    config: &ConvertConfig,
) -> ConvertResult<DbfSummary> {
    let temp = TempDbf::decode(dbc_path, &config.temp_path)?;
    let summary = describe_dbf(temp.path(), config.encoding)?;
    temp.remove()?;
    Ok(summary)
}
