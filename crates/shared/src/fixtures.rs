//! In-memory DBF and DBC builders used by the test suites.
//!
//! The DBC builder compresses the record area with a literal-only PKWare DCL
//! stream: every byte is sent as an uncoded literal and the stream is closed
//! with the length-519 end marker. It is valid input for any DCL decoder.

/// Field descriptor for a synthetic DBF
#[derive(Debug, Clone)]
pub struct DbfField {
    pub name: String,
    pub kind: u8,
    pub length: u8,
    pub decimals: u8,
}

impl DbfField {
    fn new(name: &str, kind: u8, length: u8, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            kind,
            length,
            decimals,
        }
    }

    pub fn character(name: &str, length: u8) -> Self {
        Self::new(name, b'C', length, 0)
    }

    pub fn numeric(name: &str, length: u8, decimals: u8) -> Self {
        Self::new(name, b'N', length, decimals)
    }

    pub fn float(name: &str, length: u8, decimals: u8) -> Self {
        Self::new(name, b'F', length, decimals)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, b'D', 8, 0)
    }

    pub fn logical(name: &str) -> Self {
        Self::new(name, b'L', 1, 0)
    }
}

fn header_size(fields: &[DbfField]) -> usize {
    32 + 32 * fields.len() + 1
}

/// Build a dBase III file. Character values are left aligned, every other
/// type is right aligned, both padded with spaces to the field length.
pub fn build_dbf<S: AsRef<[u8]>>(fields: &[DbfField], rows: &[Vec<S>]) -> Vec<u8> {
    build_dbf_with_deleted(fields, rows, &[])
}

/// Like [`build_dbf`], flagging the rows at the `deleted` indexes with `*`
pub fn build_dbf_with_deleted<S: AsRef<[u8]>>(
    fields: &[DbfField],
    rows: &[Vec<S>],
    deleted: &[usize],
) -> Vec<u8> {
    let header_size = header_size(fields);
    let record_size = 1 + fields.iter().map(|f| usize::from(f.length)).sum::<usize>();

    let mut out = Vec::with_capacity(header_size + record_size * rows.len() + 1);
    out.push(0x03);
    // last update 2023-06-15
    out.extend_from_slice(&[123, 6, 15]);
    out.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    out.extend_from_slice(&(header_size as u16).to_le_bytes());
    out.extend_from_slice(&(record_size as u16).to_le_bytes());
    out.extend_from_slice(&[0u8; 20]);

    for field in fields {
        let mut descriptor = [0u8; 32];
        let name = field.name.as_bytes();
        descriptor[..name.len().min(10)].copy_from_slice(&name[..name.len().min(10)]);
        descriptor[11] = field.kind;
        descriptor[16] = field.length;
        descriptor[17] = field.decimals;
        out.extend_from_slice(&descriptor);
    }
    out.push(0x0D);

    for (i, row) in rows.iter().enumerate() {
        out.push(if deleted.contains(&i) { b'*' } else { b' ' });
        for (field, value) in fields.iter().zip(row.iter()) {
            let value = value.as_ref();
            let width = usize::from(field.length);
            let value = &value[..value.len().min(width)];
            let padding = vec![b' '; width - value.len()];
            if field.kind == b'C' {
                out.extend_from_slice(value);
                out.extend_from_slice(&padding);
            } else {
                out.extend_from_slice(&padding);
                out.extend_from_slice(value);
            }
        }
    }
    out.push(0x1A);
    out
}

/// Compress `data` into a literal-only PKWare DCL stream
pub fn implode_literals(data: &[u8]) -> Vec<u8> {
    struct BitWriter {
        out: Vec<u8>,
        acc: u32,
        count: u32,
    }

    impl BitWriter {
        fn put(&mut self, value: u32, bits: u32) {
            self.acc |= value << self.count;
            self.count += bits;
            while self.count >= 8 {
                self.out.push((self.acc & 0xFF) as u8);
                self.acc >>= 8;
                self.count -= 8;
            }
        }

        fn finish(mut self) -> Vec<u8> {
            if self.count > 0 {
                self.out.push((self.acc & 0xFF) as u8);
            }
            self.out
        }
    }

    // uncoded literals, 4 KiB dictionary
    let mut writer = BitWriter {
        out: vec![0, 6],
        acc: 0,
        count: 0,
    };
    for &byte in data {
        writer.put(0, 1);
        writer.put(u32::from(byte), 8);
    }
    // length symbol 15 is the inverted 7-bit code 1111111; base 264 + 255 = 519
    writer.put(1, 1);
    writer.put(0, 7);
    writer.put(0xFF, 8);
    writer.finish()
}

/// Build a DBC file holding the same table as [`build_dbf`]
pub fn build_dbc<S: AsRef<[u8]>>(fields: &[DbfField], rows: &[Vec<S>]) -> Vec<u8> {
    build_dbc_with_deleted(fields, rows, &[])
}

/// Build a DBC file holding the same table as [`build_dbf_with_deleted`]
pub fn build_dbc_with_deleted<S: AsRef<[u8]>>(
    fields: &[DbfField],
    rows: &[Vec<S>],
    deleted: &[usize],
) -> Vec<u8> {
    let dbf = build_dbf_with_deleted(fields, rows, deleted);
    let (header, records) = dbf.split_at(header_size(fields));

    let mut out = header.to_vec();
    out.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    out.extend_from_slice(&implode_literals(records));
    out
}
