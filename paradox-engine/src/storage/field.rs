//! Field descriptors for Paradox tables
//!
//! Each column is declared in the header as a one-byte type tag followed by a
//! one-byte size. The size is the number of bytes the column occupies inside
//! every record.

use byteorder::ReadBytesExt;
use std::io::{self, Read};

/// Field data types known to Paradox 3.x - 7.x
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Fixed-width text, zero padded
    Alpha,
    /// Days since 0001-01-01
    Date,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Long,
    /// IEEE double, money semantics
    Currency,
    /// IEEE double
    Number,
    /// Boolean (128 = false, 129 = true)
    Logical,
    /// Memo text with an inline leader
    Memo,
    /// Binary large object
    Blob,
    /// Formatted memo
    FmtMemo,
    /// OLE object
    Ole,
    /// Graphic (image) blob
    Graphic,
    /// Milliseconds since midnight
    Time,
    /// Milliseconds since 0001-01-01, stored as a double
    Timestamp,
    /// Auto-incrementing 32-bit integer
    AutoInc,
    /// Packed decimal (always 17 bytes on disk)
    Bcd,
    /// Raw bytes
    Bytes,
    /// Tag not known to this decoder
    Unknown(u8),
}

impl FieldType {
    /// On-disk size of a BCD field, whatever its declared size says
    pub const BCD_SIZE: usize = 17;

    pub fn from_raw(value: u8) -> Self {
        match value {
            0x01 => FieldType::Alpha,
            0x02 => FieldType::Date,
            0x03 => FieldType::Short,
            0x04 => FieldType::Long,
            0x05 => FieldType::Currency,
            0x06 => FieldType::Number,
            0x09 => FieldType::Logical,
            0x0C => FieldType::Memo,
            0x0D => FieldType::Blob,
            0x0E => FieldType::FmtMemo,
            0x0F => FieldType::Ole,
            0x10 => FieldType::Graphic,
            0x14 => FieldType::Time,
            0x15 => FieldType::Timestamp,
            0x16 => FieldType::AutoInc,
            0x17 => FieldType::Bcd,
            0x18 => FieldType::Bytes,
            other => FieldType::Unknown(other),
        }
    }

    pub fn as_raw(&self) -> u8 {
        match self {
            FieldType::Alpha => 0x01,
            FieldType::Date => 0x02,
            FieldType::Short => 0x03,
            FieldType::Long => 0x04,
            FieldType::Currency => 0x05,
            FieldType::Number => 0x06,
            FieldType::Logical => 0x09,
            FieldType::Memo => 0x0C,
            FieldType::Blob => 0x0D,
            FieldType::FmtMemo => 0x0E,
            FieldType::Ole => 0x0F,
            FieldType::Graphic => 0x10,
            FieldType::Time => 0x14,
            FieldType::Timestamp => 0x15,
            FieldType::AutoInc => 0x16,
            FieldType::Bcd => 0x17,
            FieldType::Bytes => 0x18,
            FieldType::Unknown(tag) => *tag,
        }
    }

    /// Whether values of this type live (at least partly) in the blob file
    pub fn is_blob(&self) -> bool {
        matches!(
            self,
            FieldType::Blob | FieldType::FmtMemo | FieldType::Ole | FieldType::Graphic
        )
    }

    /// Short name used by the row-cursor adapter and the dump tool
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Alpha => "alpha",
            FieldType::Date => "date",
            FieldType::Short => "short",
            FieldType::Long => "long",
            FieldType::Currency => "currency",
            FieldType::Number => "number",
            FieldType::Logical => "logical",
            FieldType::Memo => "memo",
            FieldType::Blob => "blob",
            FieldType::FmtMemo => "fmtmemo",
            FieldType::Ole => "ole",
            FieldType::Graphic => "graphic",
            FieldType::Time => "time",
            FieldType::Timestamp => "timestamp",
            FieldType::AutoInc => "autoinc",
            FieldType::Bcd => "bcd",
            FieldType::Bytes => "bytes",
            FieldType::Unknown(_) => "unknown",
        }
    }
}

/// Declared type and size of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field_type: FieldType,
    /// Declared size in bytes
    pub size: u8,
}

impl FieldDescriptor {
    /// Size of a descriptor in the header
    pub const SIZE: usize = 2;

    pub fn new(field_type: FieldType, size: u8) -> Self {
        FieldDescriptor { field_type, size }
    }

    /// Read a (type, size) pair
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let field_type = FieldType::from_raw(reader.read_u8()?);
        let size = reader.read_u8()?;
        Ok(FieldDescriptor { field_type, size })
    }

    /// Number of record bytes this field actually occupies
    pub fn decode_size(&self) -> usize {
        match self.field_type {
            FieldType::Bcd => FieldType::BCD_SIZE,
            _ => self.size as usize,
        }
    }
}
