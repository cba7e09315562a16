//! DBC decoding.
//!
//! A DBC file is a DBF whose record area has been compressed with the PKWare
//! DCL "implode" algorithm. The DBF header is stored uncompressed, followed by
//! a CRC32 and the compressed records:
//!
//! ```text
//! pre-header (10 bytes) | rest of header (header_size - 10) | crc32 (4) | imploded records
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Chain, Cursor, Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use explode::ExplodeReader;
use log::debug;

use crate::errors::{ConvertError, ConvertResult};

/// Size of the DBF pre-header that opens every DBC file
pub const PRE_HEADER_SIZE: usize = 10;

const CRC32_SIZE: usize = 4;
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Type alias for a DBF reader that chains pre-header, header, and decompressed content
pub type DbfReader<R> =
    Chain<Chain<Cursor<[u8; PRE_HEADER_SIZE]>, Cursor<Vec<u8>>>, ExplodeReader<R>>;

/// Metadata carried by the first ten bytes of a DBC (and DBF) file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbcPreHeader {
    /// DBF version byte
    pub version: u8,
    /// Date of last update, `None` when the stored bytes are not a valid date
    pub last_update: Option<NaiveDate>,
    /// Number of records in the table
    pub num_records: u32,
    /// Length of the full DBF header, pre-header included
    pub header_size: u16,
}

impl DbcPreHeader {
    pub fn parse(bytes: &[u8; PRE_HEADER_SIZE]) -> io::Result<Self> {
        let header_size = u16::from_le_bytes([bytes[8], bytes[9]]);
        if usize::from(header_size) < PRE_HEADER_SIZE {
            return Err(invalid_data(format!(
                "Invalid header size: {} (must be >= {})",
                header_size, PRE_HEADER_SIZE
            )));
        }

        Ok(Self {
            version: bytes[0],
            last_update: NaiveDate::from_ymd_opt(
                1900 + i32::from(bytes[1]),
                u32::from(bytes[2]),
                u32::from(bytes[3]),
            ),
            num_records: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            header_size,
        })
    }
}

fn invalid_data<S: Into<String>>(message: S) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

/// Transform a DBC reader into a DBF reader for streaming decompression.
///
/// The uncompressed header and the CRC are consumed eagerly so that a file
/// which is not a DBC fails here rather than halfway through the copy.
pub fn dbc_to_dbf_reader<R: Read>(mut dbc_reader: R) -> io::Result<DbfReader<R>> {
    let mut pre_header = [0u8; PRE_HEADER_SIZE];
    dbc_reader
        .read_exact(&mut pre_header)
        .map_err(|_| invalid_data("Missing or invalid DBC header"))?;

    let parsed = DbcPreHeader::parse(&pre_header)?;

    let mut header = vec![0u8; usize::from(parsed.header_size) - PRE_HEADER_SIZE];
    dbc_reader
        .read_exact(&mut header)
        .map_err(|_| invalid_data("Invalid header size in DBC file"))?;

    // The CRC is skipped, not validated
    let mut crc32 = [0u8; CRC32_SIZE];
    dbc_reader
        .read_exact(&mut crc32)
        .map_err(|_| invalid_data("Missing CRC32 in DBC file"))?;

    let dbf_reader = Cursor::new(pre_header)
        .chain(Cursor::new(header))
        .chain(ExplodeReader::new(dbc_reader));

    Ok(dbf_reader)
}

/// Open a DBC file and validate its header, ready to stream the DBF out
pub fn open_dbc<P: AsRef<Path>>(dbc_path: P) -> ConvertResult<DbfReader<BufReader<File>>> {
    let dbc_path = dbc_path.as_ref();
    let dbc_file = File::open(dbc_path).map_err(|e| ConvertError::decode(dbc_path, e))?;
    dbc_to_dbf_reader(BufReader::new(dbc_file)).map_err(|e| ConvertError::decode(dbc_path, e))
}

/// Drain `dbf_reader` into `dbf_path` (created or truncated).
///
/// Read failures are decode errors against `dbc_path`, write failures are
/// temporary file errors. Returns the number of bytes written.
pub fn write_dbf<R: Read>(
    mut dbf_reader: R,
    dbc_path: &Path,
    dbf_path: &Path,
) -> ConvertResult<u64> {
    let dbf_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dbf_path)
        .map_err(|e| ConvertError::temp_file(dbf_path, e))?;
    let mut dbf_writer = BufWriter::new(dbf_file);

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut written = 0u64;
    loop {
        let n = match dbf_reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ConvertError::decode(dbc_path, e)),
        };
        dbf_writer
            .write_all(&buffer[..n])
            .map_err(|e| ConvertError::temp_file(dbf_path, e))?;
        written += n as u64;
    }
    dbf_writer
        .flush()
        .map_err(|e| ConvertError::temp_file(dbf_path, e))?;

    debug!(
        "Decompressed {} into {} ({} bytes)",
        dbc_path.display(),
        dbf_path.display(),
        written
    );
    Ok(written)
}

/// Decompress a DBC file to a DBF file on disk.
///
/// The destination is only created once the DBC header has been read
/// successfully. Returns the number of bytes written.
pub fn decompress_dbc_to_dbf<P: AsRef<Path>, Q: AsRef<Path>>(
    dbc_path: P,
    dbf_path: Q,
) -> ConvertResult<u64> {
    let dbf_reader = open_dbc(dbc_path.as_ref())?;
    write_dbf(dbf_reader, dbc_path.as_ref(), dbf_path.as_ref())
}
