//! Block I/O for Paradox files
//!
//! After the header, a Paradox file is a sequence of fixed-size blocks
//! (`max_table_size` KiB each). Every block starts with a 6-byte header
//! followed by a packed run of records:
//! - Offset 0: next_block (u16)
//! - Offset 2: block_number (u16)
//! - Offset 4: add_data_size (i16) = (records in block - 1) * record_size

use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use std::io::{Read, Seek, SeekFrom};

use super::header::TableHeader;
use crate::error::{ParadoxError, ParadoxResult};

/// Block header as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Next block in the chain
    pub next_block: u16,
    /// Block number as recorded by the writer
    pub block_number: u16,
    /// Bytes used beyond the first record; negative in an empty block
    pub add_data_size: i16,
}

impl BlockHeader {
    pub const SIZE: usize = 6;

    pub fn read_from<R: Read>(r: &mut R) -> ParadoxResult<Self> {
        let next_block = r.read_u16::<LittleEndian>()?;
        let block_number = r.read_u16::<LittleEndian>()?;
        let add_data_size = r.read_i16::<LittleEndian>()?;
        Ok(BlockHeader {
            next_block,
            block_number,
            add_data_size,
        })
    }

    /// Records held by the block: `add_data_size / record_size + 1`
    pub fn record_count(&self, record_size: u16) -> ParadoxResult<usize> {
        if record_size == 0 {
            return Err(ParadoxError::format("record size is zero"));
        }
        // i32 division truncates toward zero like the writer expects
        let count = self.add_data_size as i32 / record_size as i32 + 1;
        if count < 0 {
            return Err(ParadoxError::format(format!(
                "block {} reports {} records",
                self.block_number, count
            )));
        }
        Ok(count as usize)
    }
}

/// A block read from disk
#[derive(Clone)]
pub struct DataBlock {
    /// Physical (0-based) position the block was read from
    pub block_id: u32,
    pub header: BlockHeader,
    record_size: usize,
    record_count: usize,
    payload: Bytes,
}

impl DataBlock {
    /// Build a block from its header and exactly `record_count * record_size` bytes
    pub fn new(block_id: u32, header: BlockHeader, record_size: u16, payload: Bytes) -> ParadoxResult<Self> {
        let record_count = header.record_count(record_size)?;
        if payload.len() != record_count * record_size as usize {
            return Err(ParadoxError::format(format!(
                "block {} payload is {} bytes, expected {}",
                block_id,
                payload.len(),
                record_count * record_size as usize
            )));
        }
        Ok(DataBlock {
            block_id,
            header,
            record_size: record_size as usize,
            record_count,
            payload,
        })
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Raw bytes of one record, sharing the block's buffer
    pub fn record_bytes(&self, index: usize) -> Option<Bytes> {
        if index >= self.record_count {
            return None;
        }
        let start = index * self.record_size;
        Some(self.payload.slice(start..start + self.record_size))
    }
}

impl std::fmt::Debug for DataBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataBlock")
            .field("block_id", &self.block_id)
            .field("next_block", &self.header.next_block)
            .field("block_number", &self.header.block_number)
            .field("record_count", &self.record_count)
            .finish()
    }
}

/// Block reads against one file handle
pub struct BlockIO<'a, F> {
    file: &'a mut F,
    header: &'a TableHeader,
}

impl<'a, F: Read + Seek> BlockIO<'a, F> {
    pub fn new(file: &'a mut F, header: &'a TableHeader) -> Self {
        BlockIO { file, header }
    }

    /// Read a physical (0-based) block
    pub fn read_block(&mut self, block_id: u32) -> ParadoxResult<DataBlock> {
        let offset = self.header.block_offset(block_id);
        self.file.seek(SeekFrom::Start(offset))?;

        let block_header = BlockHeader::read_from(&mut *self.file)?;
        let count = block_header.record_count(self.header.record_size)?;

        let mut data = vec![0u8; count * self.header.record_size as usize];
        self.file.read_exact(&mut data)?;

        tracing::trace!(block_id, records = count, "read block");
        DataBlock::new(block_id, block_header, self.header.record_size, Bytes::from(data))
    }
}
