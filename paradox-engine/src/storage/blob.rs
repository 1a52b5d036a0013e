//! Large-object (.MB) companion file
//!
//! Blob columns keep a 10-byte reference at the end of their record bytes:
//! - Bytes 0-3: offset into the .MB file, low byte holds a sub-block index
//! - Bytes 4-7: blob length (i32)
//! - Bytes 8-9: modification number (i16)
//!
//! At the referenced offset the .MB file has a 9-byte header whose bytes 3-6
//! repeat the blob length, followed by the blob itself.

use byteorder::{LittleEndian, ReadBytesExt};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{ParadoxError, ParadoxResult};

/// Size of the header in front of every blob
pub const BLOB_HEADER_SIZE: usize = 9;

/// Reference to a blob stored in the companion file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobReference {
    /// Byte offset of the blob header (low byte masked off)
    pub offset: u32,
    /// Sub-block index (0xFF for a dedicated blob block)
    pub index: u8,
    /// Declared blob length
    pub size: i32,
    /// Modification (generation) number
    pub mod_number: i16,
}

impl BlobReference {
    pub const SIZE: usize = 10;

    /// Unpack the 10-byte reference
    pub fn from_bytes(data: &[u8]) -> ParadoxResult<Self> {
        if data.len() < Self::SIZE {
            return Err(ParadoxError::format("blob reference too short"));
        }
        let mut cursor = Cursor::new(data);
        let offset_and_index = cursor.read_u32::<LittleEndian>()?;
        let size = cursor.read_i32::<LittleEndian>()?;
        let mod_number = cursor.read_i16::<LittleEndian>()?;
        Ok(BlobReference {
            offset: offset_and_index & 0xFFFF_FF00,
            index: (offset_and_index & 0xFF) as u8,
            size,
            mod_number,
        })
    }

    /// The reference held in the trailing bytes of a blob field
    pub fn from_field(field: &[u8]) -> ParadoxResult<Self> {
        if field.len() < Self::SIZE {
            return Err(ParadoxError::format(format!(
                "blob field of {} bytes cannot hold a reference",
                field.len()
            )));
        }
        Self::from_bytes(&field[field.len() - Self::SIZE..])
    }
}

/// Resolves blob references to their contents
pub trait BlobResolver {
    /// `Ok(None)` when the reference is empty or does not match the file
    fn read_blob(&self, reference: &BlobReference) -> ParadoxResult<Option<Vec<u8>>>;
}

/// An open .MB file
pub struct BlobFile<R = File> {
    file: Mutex<R>,
}

impl BlobFile<File> {
    pub fn open(path: &Path) -> ParadoxResult<Self> {
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "opened blob file");
        Ok(BlobFile::from_reader(file))
    }
}

impl<R: Read + Seek> BlobFile<R> {
    pub fn from_reader(reader: R) -> Self {
        BlobFile {
            file: Mutex::new(reader),
        }
    }
}

impl<R: Read + Seek> BlobResolver for BlobFile<R> {
    fn read_blob(&self, reference: &BlobReference) -> ParadoxResult<Option<Vec<u8>>> {
        if reference.size <= 0 {
            return Ok(None);
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(reference.offset as u64))?;

        let mut head = [0u8; BLOB_HEADER_SIZE];
        file.read_exact(&mut head)?;
        let stored_size = i32::from_le_bytes([head[3], head[4], head[5], head[6]]);
        if stored_size != reference.size {
            tracing::debug!(
                offset = reference.offset,
                declared = reference.size,
                stored = stored_size,
                "blob size mismatch"
            );
            return Ok(None);
        }

        let mut data = vec![0u8; reference.size as usize];
        file.read_exact(&mut data)?;
        Ok(Some(data))
    }
}
