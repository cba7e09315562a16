use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};

use dbase::encoding::{Unicode, UnicodeLossy};
use dbase::{FieldIOError, FieldInfo, FieldIterator, FieldType, ReadableRecord, Reader};
use log::debug;

use crate::errors::{ConvertError, ConvertResult};
use crate::models::row::{CellValue, Row, numeric_cell};

/// Name some dbase versions give to the record deletion marker when listing fields
const DELETION_FLAG: &str = "DeletionFlag";

/// First byte of a record flagged as deleted
const DELETED_RECORD: u8 = b'*';

/// Text encoding used to decode character fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8, invalid sequences are a read error
    #[default]
    Utf8,
    /// UTF-8, invalid sequences are replaced with U+FFFD
    Utf8Lossy,
}

impl ReadableRecord for Row {
    fn read_using<Source, MemoSource>(
        field_iterator: &mut FieldIterator<Source, MemoSource>,
    ) -> Result<Self, FieldIOError>
    where
        Source: Read + Seek,
        MemoSource: Read + Seek,
    {
        let mut row = Row::new();
        for field in field_iterator {
            let field = field?;
            if field.name != DELETION_FLAG {
                row.push(field.name, CellValue::from(&field.value));
            }
        }
        Ok(row)
    }
}

/// An `N` or `F` column: where it sits in the row and in the raw record
#[derive(Debug, Clone)]
struct NumericColumn {
    index: usize,
    bytes: Range<usize>,
    field_type: FieldType,
}

/// Raw bytes of the records that are not flagged as deleted
struct LiveRecords {
    reader: BufReader<File>,
    record: Vec<u8>,
    remaining: u32,
}

impl LiveRecords {
    fn open(path: &Path, offset: u64, record_size: usize, num_records: u32) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        reader.seek(SeekFrom::Start(offset))?;
        Ok(Self {
            reader,
            record: vec![0u8; record_size],
            remaining: num_records,
        })
    }

    /// Next live record without its deletion flag. A short final record ends
    /// the table.
    fn next_live(&mut self) -> io::Result<Option<&[u8]>> {
        while self.remaining > 0 {
            self.remaining -= 1;
            match self.reader.read_exact(&mut self.record) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    self.remaining = 0;
                    break;
                }
                Err(e) => return Err(e),
            }
            if self.record.first() != Some(&DELETED_RECORD) {
                return Ok(Some(&self.record[1..]));
            }
        }
        Ok(None)
    }

    fn count(mut self) -> io::Result<usize> {
        let mut live = 0;
        while self.next_live()?.is_some() {
            live += 1;
        }
        Ok(live)
    }
}

/// Streaming reader over a decompressed DBF.
///
/// The file stays open for as long as the source lives and is closed when it
/// is dropped, whether iteration finished or not. `N` and `F` values are
/// taken from the stored text so whole numbers keep every digit.
pub struct DbfRowSource {
    path: PathBuf,
    reader: Reader<BufReader<File>>,
    fields: Vec<FieldInfo>,
    field_names: Vec<String>,
    numeric_columns: Vec<NumericColumn>,
    raw_records: LiveRecords,
    total: usize,
}

impl DbfRowSource {
    pub fn open<P: AsRef<Path>>(path: P, encoding: TextEncoding) -> ConvertResult<Self> {
        let path = path.as_ref();

        let reader = match encoding {
            TextEncoding::Utf8 => Reader::from_path_with_encoding(path, Unicode),
            TextEncoding::Utf8Lossy => Reader::from_path_with_encoding(path, UnicodeLossy),
        }
        .map_err(|e| ConvertError::source_read(path, e))?;

        let fields: Vec<FieldInfo> = reader
            .fields()
            .iter()
            .filter(|field| field.name() != DELETION_FLAG)
            .cloned()
            .collect();
        let field_names = fields.iter().map(|field| field.name().to_string()).collect();
        let numeric_columns = numeric_columns(reader.fields());

        let header = *reader.header();
        let open_raw = || {
            LiveRecords::open(
                path,
                u64::from(header.offset_to_first_record),
                usize::from(header.size_of_record),
                header.num_records,
            )
        };
        let total = open_raw()
            .and_then(LiveRecords::count)
            .map_err(|e| ConvertError::source_read(path, e))?;
        let raw_records = open_raw().map_err(|e| ConvertError::source_read(path, e))?;

        debug!(
            "Opened {} ({} fields, {} of {} records live, {:?})",
            path.display(),
            fields.len(),
            total,
            header.num_records,
            encoding
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            fields,
            field_names,
            numeric_columns,
            raw_records,
            total,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Column names in declaration order
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of records not flagged as deleted
    pub fn total(&self) -> usize {
        self.total
    }

    /// Lazily yield the live records in on-disk order.
    pub fn rows(&mut self) -> impl Iterator<Item = ConvertResult<Row>> + '_ {
        let path = &self.path;
        let numeric_columns = &self.numeric_columns;
        let raw_records = &mut self.raw_records;

        self.reader.iter_records_as::<Row>().map(move |record_result| {
            let mut row = record_result.map_err(|e| ConvertError::source_read(path, e))?;
            if numeric_columns.is_empty() {
                return Ok(row);
            }

            let raw = raw_records
                .next_live()
                .map_err(|e| ConvertError::source_read(path, e))?;
            if let Some(raw) = raw {
                for column in numeric_columns {
                    let value = raw
                        .get(column.bytes.clone())
                        .and_then(|text| numeric_cell(text, column.field_type));
                    if let Some(value) = value {
                        row.set(column.index, value);
                    }
                }
            }
            Ok(row)
        })
    }
}

fn numeric_columns(all_fields: &[FieldInfo]) -> Vec<NumericColumn> {
    let mut columns = Vec::new();
    let mut offset = 0;
    let mut index = 0;
    for field in all_fields {
        let length = usize::from(field.length());
        if field.name() != DELETION_FLAG {
            if matches!(field.field_type(), FieldType::Numeric | FieldType::Float) {
                columns.push(NumericColumn {
                    index,
                    bytes: offset..offset + length,
                    field_type: field.field_type(),
                });
            }
            index += 1;
        }
        offset += length;
    }
    columns
}
