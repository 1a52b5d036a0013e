//! Forward-only row cursor over decoded records
//!
//! `DataReader` walks any sequence of records (a sequential scan, a filtered
//! scan or an index scan) one row at a time and exposes the current row's
//! columns through typed getters.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use paradox_engine::{FieldType, ParadoxError, ParadoxResult, Record, TableHeader, Value};

/// Where the cursor stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    BeforeFirst,
    OnRow,
    AfterLast,
}

/// Row cursor over the records of one table
pub struct DataReader<'a, I> {
    header: &'a TableHeader,
    rows: I,
    current: Option<Record>,
    position: Position,
}

impl<'a, I> DataReader<'a, I>
where
    I: Iterator<Item = ParadoxResult<Record>>,
{
    pub fn new(header: &'a TableHeader, rows: I) -> Self {
        DataReader {
            header,
            rows,
            current: None,
            position: Position::BeforeFirst,
        }
    }

    /// Number of declared columns
    pub fn field_count(&self) -> usize {
        self.header.field_count as usize
    }

    fn check_column(&self, column: usize) -> ParadoxResult<()> {
        if column < self.field_count() {
            Ok(())
        } else {
            Err(ParadoxError::ColumnOutOfRange(column))
        }
    }

    /// Column name; index files have no names and report an empty string
    pub fn name(&self, column: usize) -> ParadoxResult<&str> {
        self.check_column(column)?;
        Ok(self.header.field_name(column).unwrap_or(""))
    }

    /// Column number for a name, compared case-insensitively
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.header
            .field_names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn field_type(&self, column: usize) -> ParadoxResult<FieldType> {
        self.check_column(column)?;
        Ok(self.header.fields[column].field_type)
    }

    /// Paradox type of a column
    pub fn type_name(&self, column: usize) -> ParadoxResult<&'static str> {
        Ok(self.field_type(column)?.name())
    }

    /// Advance to the next row. Returns `false` once the rows are exhausted.
    pub fn read(&mut self) -> ParadoxResult<bool> {
        if self.position == Position::AfterLast {
            return Ok(false);
        }
        match self.rows.next() {
            Some(Ok(record)) => {
                self.current = Some(record);
                self.position = Position::OnRow;
                Ok(true)
            }
            Some(Err(e)) => {
                self.current = None;
                self.position = Position::AfterLast;
                Err(e)
            }
            None => {
                self.current = None;
                self.position = Position::AfterLast;
                Ok(false)
            }
        }
    }

    /// The current record
    pub fn record(&self) -> ParadoxResult<&Record> {
        match (&self.current, self.position) {
            (Some(record), Position::OnRow) => Ok(record),
            _ => Err(ParadoxError::NoCurrentRow),
        }
    }

    pub fn value(&self, column: usize) -> ParadoxResult<&Value> {
        self.check_column(column)?;
        let record = self.record()?;
        record
            .value(column)
            .ok_or(ParadoxError::ColumnOutOfRange(column))
    }

    pub fn is_null(&self, column: usize) -> ParadoxResult<bool> {
        Ok(self.value(column)?.is_null())
    }

    fn mismatch(column: usize, expected: &'static str, found: &Value) -> ParadoxError {
        ParadoxError::TypeMismatch {
            column,
            expected,
            found: found.type_name(),
        }
    }

    pub fn get_i16(&self, column: usize) -> ParadoxResult<i16> {
        match self.value(column)? {
            Value::Short(v) => Ok(*v),
            other => Err(Self::mismatch(column, "short", other)),
        }
    }

    /// Long and AutoInc columns, and Short widened
    pub fn get_i32(&self, column: usize) -> ParadoxResult<i32> {
        match self.value(column)? {
            Value::Long(v) | Value::AutoInc(v) => Ok(*v),
            Value::Short(v) => Ok(*v as i32),
            other => Err(Self::mismatch(column, "long", other)),
        }
    }

    /// Number and Currency columns, and integers widened
    pub fn get_f64(&self, column: usize) -> ParadoxResult<f64> {
        match self.value(column)? {
            Value::Number(v) | Value::Currency(v) => Ok(*v),
            Value::Long(v) | Value::AutoInc(v) => Ok(*v as f64),
            Value::Short(v) => Ok(*v as f64),
            other => Err(Self::mismatch(column, "number", other)),
        }
    }

    pub fn get_bool(&self, column: usize) -> ParadoxResult<bool> {
        match self.value(column)? {
            Value::Logical(v) => Ok(*v),
            other => Err(Self::mismatch(column, "logical", other)),
        }
    }

    pub fn get_str(&self, column: usize) -> ParadoxResult<&str> {
        match self.value(column)? {
            Value::Text(s) => Ok(s),
            other => Err(Self::mismatch(column, "text", other)),
        }
    }

    pub fn get_date(&self, column: usize) -> ParadoxResult<NaiveDate> {
        match self.value(column)? {
            Value::Date(d) => Ok(*d),
            other => Err(Self::mismatch(column, "date", other)),
        }
    }

    /// Timestamp columns, and dates at midnight
    pub fn get_datetime(&self, column: usize) -> ParadoxResult<NaiveDateTime> {
        match self.value(column)? {
            Value::Timestamp(ts) => Ok(*ts),
            Value::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
            other => Err(Self::mismatch(column, "timestamp", other)),
        }
    }

    /// Time of day as an offset from midnight
    pub fn get_time(&self, column: usize) -> ParadoxResult<Duration> {
        match self.value(column)? {
            Value::Time(t) => Ok(*t),
            other => Err(Self::mismatch(column, "time", other)),
        }
    }

    pub fn get_bytes(&self, column: usize) -> ParadoxResult<&[u8]> {
        match self.value(column)? {
            Value::Blob(b) | Value::Bytes(b) => Ok(b),
            other => Err(Self::mismatch(column, "bytes", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use paradox_engine::storage::RecordAddress;
    use paradox_engine::ErrorKind;
    use std::io::Cursor;

    /// Version 4 table header (no extended block)
    fn header(fields: &[(u8, u8)], names: &[&str]) -> TableHeader {
        let record_size: u16 = fields.iter().map(|(_, s)| *s as u16).sum();
        let mut buf = vec![0u8; 0x58];
        buf[0..2].copy_from_slice(&record_size.to_le_bytes());
        buf[2..4].copy_from_slice(&2048u16.to_le_bytes());
        buf[4] = 2;
        buf[5] = 2;
        buf[0x21..0x23].copy_from_slice(&(fields.len() as i16).to_le_bytes());
        buf[0x39] = 4;
        for (t, s) in fields {
            buf.extend_from_slice(&[*t, *s]);
        }
        buf.extend_from_slice(&[0u8; 4]);
        for _ in fields {
            buf.extend_from_slice(&[0u8; 4]);
        }
        buf.extend_from_slice(&[0u8; 79]);
        for n in names {
            buf.extend_from_slice(n.as_bytes());
            buf.push(0);
        }
        TableHeader::read_from(&mut Cursor::new(buf)).unwrap()
    }

    fn record(header: &TableHeader, raw: Vec<u8>) -> ParadoxResult<Record> {
        Record::decode(RecordAddress::new(0, 0), Bytes::from(raw), &header.fields, None)
    }

    /// Id Long, Name Alpha(6), Qty Short, Paid Logical, Due Date
    fn orders() -> TableHeader {
        header(
            &[(0x04, 4), (0x01, 6), (0x03, 2), (0x09, 1), (0x02, 4)],
            &["Id", "Name", "Qty", "Paid", "Due"],
        )
    }

    fn row(id: i32, name: &str, qty: i16, paid: bool, due_days: i32) -> Vec<u8> {
        let mut raw = Vec::new();
        let mut b = id.to_be_bytes();
        b[0] ^= 0x80;
        raw.extend_from_slice(&b);
        let mut n = [0u8; 6];
        n[..name.len()].copy_from_slice(name.as_bytes());
        raw.extend_from_slice(&n);
        let mut q = qty.to_be_bytes();
        q[0] ^= 0x80;
        raw.extend_from_slice(&q);
        raw.push(if paid { 129 } else { 128 });
        let mut d = due_days.to_be_bytes();
        d[0] ^= 0x80;
        raw.extend_from_slice(&d);
        raw
    }

    #[test]
    fn test_schema_accessors() {
        let h = orders();
        let reader = DataReader::new(&h, std::iter::empty::<ParadoxResult<Record>>());
        assert_eq!(reader.field_count(), 5);
        assert_eq!(reader.name(1).unwrap(), "Name");
        assert_eq!(reader.ordinal("qty"), Some(2));
        assert_eq!(reader.ordinal("missing"), None);
        assert_eq!(reader.type_name(4).unwrap(), "date");
        assert_eq!(reader.field_type(3).unwrap(), FieldType::Logical);
        assert!(matches!(reader.name(5), Err(ParadoxError::ColumnOutOfRange(5))));
    }

    #[test]
    fn test_read_rows_with_typed_getters() {
        let h = orders();
        let rows = vec![
            record(&h, row(1, "bolt", 12, true, 730120)),
            record(&h, row(2, "nut", -3, false, 1)),
        ];
        let mut reader = DataReader::new(&h, rows.into_iter());

        assert!(reader.read().unwrap());
        assert_eq!(reader.get_i32(0).unwrap(), 1);
        assert_eq!(reader.get_str(1).unwrap(), "bolt");
        assert_eq!(reader.get_i16(2).unwrap(), 12);
        assert_eq!(reader.get_i32(2).unwrap(), 12);
        assert_eq!(reader.get_f64(2).unwrap(), 12.0);
        assert!(reader.get_bool(3).unwrap());
        assert_eq!(reader.get_date(4).unwrap(), NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(
            reader.get_datetime(4).unwrap(),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );

        assert!(reader.read().unwrap());
        assert_eq!(reader.get_i16(2).unwrap(), -3);
        assert!(!reader.get_bool(3).unwrap());
        assert_eq!(reader.get_date(4).unwrap(), NaiveDate::from_ymd_opt(1, 1, 1).unwrap());

        assert!(!reader.read().unwrap());
        assert!(!reader.read().unwrap());
    }

    #[test]
    fn test_type_mismatch() {
        let h = orders();
        let mut reader = DataReader::new(&h, vec![record(&h, row(7, "x", 1, true, 5))].into_iter());
        reader.read().unwrap();

        match reader.get_str(0) {
            Err(ParadoxError::TypeMismatch { column, expected, found }) => {
                assert_eq!(column, 0);
                assert_eq!(expected, "text");
                assert_eq!(found, "long");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(reader.get_i16(0).is_err());
        assert!(reader.get_bytes(1).is_err());
        assert!(reader.get_time(4).is_err());
    }

    #[test]
    fn test_null_columns() {
        let h = orders();
        let mut raw = row(3, "", 0, true, 0);
        raw[10..12].copy_from_slice(&[0, 0]);
        raw[13..17].copy_from_slice(&[0, 0, 0, 0]);
        let mut reader = DataReader::new(&h, vec![record(&h, raw)].into_iter());
        reader.read().unwrap();

        assert!(reader.is_null(1).unwrap());
        assert!(reader.is_null(2).unwrap());
        assert!(reader.is_null(4).unwrap());
        assert!(!reader.is_null(0).unwrap());
        let err = reader.get_i16(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_no_current_row() {
        let h = orders();
        let mut reader = DataReader::new(&h, vec![record(&h, row(1, "a", 1, true, 1))].into_iter());
        assert!(matches!(reader.value(0), Err(ParadoxError::NoCurrentRow)));
        reader.read().unwrap();
        assert!(reader.value(0).is_ok());
        assert!(!reader.read().unwrap());
        assert!(matches!(reader.get_i32(0), Err(ParadoxError::NoCurrentRow)));
    }

    #[test]
    fn test_error_ends_rows() {
        let h = orders();
        let rows = vec![Err(ParadoxError::format("bad block")), record(&h, row(1, "a", 1, true, 1))];
        let mut reader = DataReader::new(&h, rows.into_iter());
        assert_eq!(reader.read().unwrap_err().kind(), ErrorKind::Format);
        assert!(!reader.read().unwrap());
    }
}
