use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use dbase::{FieldType, FieldValue};

/// A scalar DBF value as reported by the table reader
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i128),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Boolean(bool),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Number(n) => fmt_float(f, *n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Boolean(true) => write!(f, "True"),
            CellValue::Boolean(false) => write!(f, "False"),
        }
    }
}

/// Shortest round-trip digits, `.0` on whole numbers, exponent form outside
/// `1e-4 <= |n| < 1e16`
fn fmt_float(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        return write!(f, "nan");
    }
    if n.is_infinite() {
        return write!(f, "{}", if n > 0.0 { "inf" } else { "-inf" });
    }

    let abs = n.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let exp = format!("{:e}", n);
        return match exp.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                write!(f, "{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => write!(f, "{}", exp),
        };
    }

    let plain = n.to_string();
    if plain.contains('.') {
        write!(f, "{}", plain)
    } else {
        write!(f, "{}.0", plain)
    }
}

/// Value of an `N` or `F` field read from its stored text.
///
/// Whole numbers in `N` fields stay exact integers, anything else becomes a
/// double. Blank and `*`-filled fields are null. Returns `None` when the text
/// is not a number.
pub fn numeric_cell(raw: &[u8], field_type: FieldType) -> Option<CellValue> {
    let text = std::str::from_utf8(raw).ok()?;
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '*' || c == '\0');
    if text.is_empty() {
        return Some(CellValue::Null);
    }

    if field_type == FieldType::Numeric {
        if let Ok(n) = text.parse::<i128>() {
            return Some(CellValue::Integer(n));
        }
        return text.replace(',', ".").parse().ok().map(CellValue::Number);
    }
    text.parse().ok().map(CellValue::Number)
}

impl From<&FieldValue> for CellValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Character(opt_string) => match opt_string {
                Some(s) => CellValue::Text(s.clone()),
                None => CellValue::Null,
            },
            FieldValue::Numeric(opt_num) => match opt_num {
                Some(num) => CellValue::Number(*num),
                None => CellValue::Null,
            },
            FieldValue::Logical(opt_bool) => match opt_bool {
                Some(b) => CellValue::Boolean(*b),
                None => CellValue::Null,
            },
            FieldValue::Date(opt_date) => match opt_date {
                Some(date) => dbase_date(date).map_or(CellValue::Null, CellValue::Date),
                None => CellValue::Null,
            },
            // Go through the f32's own digits so 1.1 does not widen to 1.100000023841858
            FieldValue::Float(opt_num) => match opt_num {
                Some(num) => {
                    CellValue::Number(num.to_string().parse().unwrap_or(f64::from(*num)))
                }
                None => CellValue::Null,
            },
            FieldValue::Integer(num) => CellValue::Integer(i128::from(*num)),
            FieldValue::Currency(val) => CellValue::Number(*val),
            FieldValue::DateTime(datetime) => {
                let time = datetime.time();
                dbase_date(&datetime.date())
                    .and_then(|date| {
                        date.and_hms_opt(
                            time.hours() as u32,
                            time.minutes() as u32,
                            time.seconds() as u32,
                        )
                    })
                    .map_or(CellValue::Null, CellValue::DateTime)
            }
            FieldValue::Double(num) => CellValue::Number(*num),
            FieldValue::Memo(memo_str) => CellValue::Text(memo_str.clone()),
        }
    }
}

fn dbase_date(date: &dbase::Date) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year() as i32, date.month() as u32, date.day() as u32)
}

/// One record of the table, values kept in field-declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    entries: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push<S: Into<String>>(&mut self, name: S, value: CellValue) {
        self.entries.push((name.into(), value));
    }

    /// Replace the value at `index`, keeping its column name
    pub fn set(&mut self, index: usize, value: CellValue) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.1 = value;
        }
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, CellValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, CellValue)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Text("BELEM".to_string()).to_string(), "BELEM");
        assert_eq!(CellValue::Integer(-3).to_string(), "-3");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Boolean(true).to_string(), "True");
        assert_eq!(CellValue::Boolean(false).to_string(), "False");

        let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "2023-06-15");
        let datetime = date.and_hms_opt(8, 5, 0).unwrap();
        assert_eq!(CellValue::DateTime(datetime).to_string(), "2023-06-15 08:05:00");
    }

    #[test]
    fn test_number_display() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42.0");
        assert_eq!(CellValue::Number(-0.0).to_string(), "-0.0");
        assert_eq!(CellValue::Number(0.1).to_string(), "0.1");
        assert_eq!(CellValue::Number(1e15).to_string(), "1000000000000000.0");
        assert_eq!(CellValue::Number(1e16).to_string(), "1e+16");
        assert_eq!(CellValue::Number(1.5e-5).to_string(), "1.5e-05");
        assert_eq!(CellValue::Number(2.5e-123).to_string(), "2.5e-123");
        assert_eq!(CellValue::Number(f64::INFINITY).to_string(), "inf");
        assert_eq!(
            CellValue::Integer(1234567890123456789).to_string(),
            "1234567890123456789"
        );
    }

    #[test]
    fn test_numeric_cell() {
        assert_eq!(
            numeric_cell(b" 1234567890123456789", FieldType::Numeric),
            Some(CellValue::Integer(1234567890123456789))
        );
        assert_eq!(
            numeric_cell(b" 42.00", FieldType::Numeric),
            Some(CellValue::Number(42.0))
        );
        assert_eq!(
            numeric_cell(b"  -7", FieldType::Numeric),
            Some(CellValue::Integer(-7))
        );
        assert_eq!(
            numeric_cell(b"  1,5", FieldType::Numeric),
            Some(CellValue::Number(1.5))
        );
        assert_eq!(numeric_cell(b"    ", FieldType::Numeric), Some(CellValue::Null));
        assert_eq!(numeric_cell(b"****", FieldType::Numeric), Some(CellValue::Null));
        assert_eq!(numeric_cell(b"  ab", FieldType::Numeric), None);
    }

    #[test]
    fn test_numeric_cell_float_field() {
        assert_eq!(numeric_cell(b"    1.10", FieldType::Float), Some(CellValue::Number(1.1)));
        assert_eq!(numeric_cell(b"      42", FieldType::Float), Some(CellValue::Number(42.0)));
        assert_eq!(
            numeric_cell(b"    1.10", FieldType::Float).map(|v| v.to_string()),
            Some("1.1".to_string())
        );
    }

    #[test]
    fn test_from_field_value() {
        assert_eq!(
            CellValue::from(&FieldValue::Character(Some("PA".to_string()))),
            CellValue::Text("PA".to_string())
        );
        assert_eq!(CellValue::from(&FieldValue::Character(None)), CellValue::Null);
        assert_eq!(
            CellValue::from(&FieldValue::Numeric(Some(7.0))),
            CellValue::Number(7.0)
        );
        assert_eq!(CellValue::from(&FieldValue::Numeric(None)), CellValue::Null);
        assert_eq!(
            CellValue::from(&FieldValue::Float(Some(1.1))).to_string(),
            "1.1"
        );
        assert_eq!(
            CellValue::from(&FieldValue::Logical(Some(false))),
            CellValue::Boolean(false)
        );
        assert_eq!(CellValue::from(&FieldValue::Integer(12)), CellValue::Integer(12));
        assert_eq!(CellValue::from(&FieldValue::Double(0.25)), CellValue::Number(0.25));
        assert_eq!(
            CellValue::from(&FieldValue::Memo("obs".to_string())),
            CellValue::Text("obs".to_string())
        );
    }

    #[test]
    fn test_row_keeps_insertion_order() {
        let mut row = Row::with_capacity(3);
        row.push("ZETA", CellValue::Integer(1));
        row.push("ALFA", CellValue::Integer(2));
        row.push("MEIO", CellValue::Null);

        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["ZETA", "ALFA", "MEIO"]);
        assert_eq!(row.get("ALFA"), Some(&CellValue::Integer(2)));
        assert_eq!(row.get("NADA"), None);

        row.set(2, CellValue::Integer(3));
        row.set(9, CellValue::Null);
        assert_eq!(row.get("MEIO"), Some(&CellValue::Integer(3)));
        assert_eq!(row.len(), 3);
        assert!(!row.is_empty());
    }

    #[test]
    fn test_row_from_iter() {
        let row: Row = vec![("A", CellValue::Boolean(true)), ("B", CellValue::Null)]
            .into_iter()
            .collect();
        let rendered: Vec<String> = row.values().map(|v| v.to_string()).collect();
        assert_eq!(rendered, vec!["True", ""]);
    }
}
