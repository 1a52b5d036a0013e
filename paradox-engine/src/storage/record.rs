//! Records read from data and index blocks
//!
//! A record keeps the raw bytes it was decoded from alongside its decoded
//! column values. Decoding happens once, when the record is produced, and
//! works on copies so the raw bytes stay as they were read.

use bytes::Bytes;

use super::blob::BlobResolver;
use super::block::DataBlock;
use super::codec::decode_record;
use super::field::FieldDescriptor;
use super::value::Value;
use crate::error::ParadoxResult;

/// Physical address of a record (block + slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordAddress {
    /// Physical (0-based) block id
    pub block: u32,
    /// Position of the record inside the block
    pub slot: u16,
}

impl RecordAddress {
    pub fn new(block: u32, slot: u16) -> Self {
        RecordAddress { block, slot }
    }
}

/// A decoded record
#[derive(Debug, Clone)]
pub struct Record {
    pub address: RecordAddress,
    raw: Bytes,
    values: Vec<Value>,
}

impl Record {
    /// Decode `raw` against the given field layout
    pub fn decode(
        address: RecordAddress,
        raw: Bytes,
        fields: &[FieldDescriptor],
        blobs: Option<&dyn BlobResolver>,
    ) -> ParadoxResult<Self> {
        let values = decode_record(fields, &raw, blobs)?;
        Ok(Record { address, raw, values })
    }

    /// Decode every record held by a block
    pub fn from_block(
        block: &DataBlock,
        fields: &[FieldDescriptor],
        blobs: Option<&dyn BlobResolver>,
    ) -> ParadoxResult<Vec<Record>> {
        (0..block.record_count())
            .filter_map(|slot| {
                block.record_bytes(slot).map(|raw| {
                    Record::decode(RecordAddress::new(block.block_id, slot as u16), raw, fields, blobs)
                })
            })
            .collect()
    }

    /// The bytes as stored in the block
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decoded column values, in column order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, column: usize) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
