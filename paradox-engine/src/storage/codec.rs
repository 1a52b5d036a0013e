//! Record decoding
//!
//! Paradox stores numbers in an order-preserving form: big-endian, with the
//! sign bit inverted so that an unsigned byte comparison sorts values
//! correctly. Doubles additionally have all bits complemented when negative.
//! Decoding undoes that on a private copy of each field's bytes, so the record
//! buffer itself is never modified and can be decoded any number of times.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::blob::{BlobReference, BlobResolver};
use super::field::{FieldDescriptor, FieldType};
use super::value::Value;
use crate::error::{ParadoxError, ParadoxResult};

/// Size of the reference trailer at the end of a memo field
const MEMO_TRAILER_SIZE: usize = 10;

/// Decode text stored in a single-byte code page
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Undo the integer/date encoding: flip the sign bit, then reverse the bytes
/// so the result reads as little-endian.
pub fn standard_transform(bytes: &mut [u8]) {
    if let Some(first) = bytes.first_mut() {
        *first ^= 0x80;
    }
    bytes.reverse();
}

/// Undo the floating-point encoding.
///
/// Positive values only had their sign bit set; negative values were fully
/// complemented; zero is stored as all zero bytes.
pub fn float_transform(bytes: &mut [u8]) {
    let n = bytes.len().min(8);
    if n == 0 {
        return;
    }
    if bytes[0] & 0x80 != 0 {
        bytes[0] &= 0x7F;
    } else if bytes[..n].iter().any(|&b| b != 0) {
        for b in &mut bytes[..n] {
            *b = !*b;
        }
    }
    bytes.reverse();
}

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Day count (1 = 0001-01-01) to a calendar date
pub fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days)
}

/// Milliseconds counted from the day before 0001-01-01 to a timestamp
pub fn timestamp_from_millis(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() {
        return None;
    }
    let ms = ms.round();
    if ms.abs() > (i32::MAX as f64) * (MILLIS_PER_DAY as f64) {
        return None;
    }
    let ms = ms as i64;
    let days = i32::try_from(ms.div_euclid(MILLIS_PER_DAY)).ok()?;
    let rem = ms.rem_euclid(MILLIS_PER_DAY);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        (rem / 1000) as u32,
        (rem % 1000) as u32 * 1_000_000,
    )?;
    Some(date_from_days(days)?.and_time(time))
}

fn fixed<const N: usize>(bytes: &[u8]) -> ParadoxResult<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| ParadoxError::format(format!("numeric field shorter than {} bytes", N)))
}

/// Text truncated at the first zero byte
fn decode_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    latin1(&bytes[..end])
}

/// Memo fields keep a leader of the text inline; only that part is returned.
fn decode_memo(bytes: &[u8]) -> ParadoxResult<String> {
    if bytes.len() < MEMO_TRAILER_SIZE {
        return Err(ParadoxError::format(format!(
            "memo field of {} bytes has no trailer",
            bytes.len()
        )));
    }
    let (leader, trailer) = bytes.split_at(bytes.len() - MEMO_TRAILER_SIZE);
    let reference = BlobReference::from_bytes(trailer)?;
    let stored = reference.size.max(0) as usize;
    let leader = &leader[..stored.min(leader.len())];
    Ok(decode_text(leader))
}

/// Decode one field's bytes. `bytes` has exactly the field's decode size.
pub fn decode_field(
    field: &FieldDescriptor,
    bytes: &[u8],
    blobs: Option<&dyn BlobResolver>,
) -> ParadoxResult<Value> {
    if bytes.iter().all(|&b| b == 0) {
        return Ok(Value::Null);
    }

    let value = match field.field_type {
        FieldType::Alpha => Value::Text(decode_text(bytes)),
        FieldType::Memo => Value::Text(decode_memo(bytes)?),
        FieldType::Short => {
            let mut b = fixed::<2>(bytes)?;
            standard_transform(&mut b);
            Value::Short(i16::from_le_bytes(b))
        }
        FieldType::Long | FieldType::AutoInc => {
            let mut b = fixed::<4>(bytes)?;
            standard_transform(&mut b);
            let v = i32::from_le_bytes(b);
            if field.field_type == FieldType::AutoInc {
                Value::AutoInc(v)
            } else {
                Value::Long(v)
            }
        }
        FieldType::Currency => {
            let mut b = fixed::<8>(bytes)?;
            standard_transform(&mut b);
            Value::Currency(f64::from_le_bytes(b))
        }
        FieldType::Number => {
            let mut b = fixed::<8>(bytes)?;
            float_transform(&mut b);
            let v = f64::from_le_bytes(b);
            if v.is_nan() {
                Value::Null
            } else {
                Value::Number(v)
            }
        }
        FieldType::Date => {
            let mut b = fixed::<4>(bytes)?;
            standard_transform(&mut b);
            let days = i32::from_le_bytes(b);
            match date_from_days(days) {
                Some(d) => Value::Date(d),
                None => {
                    tracing::warn!(days, "date out of range");
                    Value::Null
                }
            }
        }
        FieldType::Timestamp => {
            let mut b = fixed::<8>(bytes)?;
            standard_transform(&mut b);
            let ms = f64::from_le_bytes(b);
            match timestamp_from_millis(ms) {
                Some(ts) => Value::Timestamp(ts),
                None => {
                    tracing::warn!(ms, "timestamp out of range");
                    Value::Null
                }
            }
        }
        FieldType::Time => {
            let mut b = fixed::<4>(bytes)?;
            standard_transform(&mut b);
            Value::Time(Duration::milliseconds(i32::from_le_bytes(b) as i64))
        }
        FieldType::Logical => Value::Logical(bytes[0] as i32 - 128 > 0),
        FieldType::Blob | FieldType::FmtMemo | FieldType::Ole | FieldType::Graphic => {
            match blobs {
                Some(resolver) => {
                    let reference = BlobReference::from_field(bytes)?;
                    resolver.read_blob(&reference)?.map_or(Value::Null, Value::Blob)
                }
                None => Value::Null,
            }
        }
        FieldType::Bytes => Value::Bytes(bytes.to_vec()),
        FieldType::Bcd | FieldType::Unknown(_) => Value::Null,
    };
    Ok(value)
}

/// Decode all columns of one record
pub fn decode_record(
    fields: &[FieldDescriptor],
    record: &[u8],
    blobs: Option<&dyn BlobResolver>,
) -> ParadoxResult<Vec<Value>> {
    let mut values = Vec::with_capacity(fields.len());
    let mut offset = 0usize;

    for (column, field) in fields.iter().enumerate() {
        let size = field.decode_size();
        let bytes = record.get(offset..offset + size).ok_or_else(|| {
            ParadoxError::format(format!(
                "column {} ({} bytes at offset {}) exceeds record size {}",
                column,
                size,
                offset,
                record.len()
            ))
        })?;
        values.push(decode_field(field, bytes, blobs)?);
        offset += size;
    }

    Ok(values)
}
