//! An open Paradox file
//!
//! Tables (.DB) and primary indexes (.PX) share one layout: a header followed
//! by blocks of fixed-size records. `ParadoxFile` owns the handle and the
//! parsed header and hands out blocks and lazy record scans.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{ParadoxError, ParadoxResult};
use crate::query::Condition;
use crate::storage::blob::BlobResolver;
use crate::storage::block::{BlockIO, DataBlock};
use crate::storage::header::TableHeader;
use crate::storage::record::Record;

/// An open Paradox table or index file
pub struct ParadoxFile<R = File> {
    /// File path, when opened from disk
    pub path: Option<PathBuf>,
    header: TableHeader,
    file: Mutex<R>,
}

impl ParadoxFile<File> {
    /// Open an existing file read-only
    pub fn open(path: &Path) -> ParadoxResult<Self> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ParadoxError::TableNotFound(path.to_path_buf())
            } else {
                ParadoxError::Io(e)
            }
        })?;
        let mut opened = ParadoxFile::from_reader(file)?;
        tracing::debug!(
            path = %path.display(),
            file_type = ?opened.header.file_type,
            version = opened.header.version_name(),
            records = opened.header.record_count,
            "opened paradox file"
        );
        opened.path = Some(path.to_path_buf());
        Ok(opened)
    }
}

impl<R: Read + Seek> ParadoxFile<R> {
    /// Parse the header from any seekable reader
    pub fn from_reader(mut reader: R) -> ParadoxResult<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = TableHeader::read_from(&mut reader)?;
        if header.is_encrypted() {
            tracing::warn!(table = %header.table_name, "file is encrypted; values will not decode");
        }
        Ok(ParadoxFile {
            path: None,
            header,
            file: Mutex::new(reader),
        })
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    /// Read a physical (0-based) block
    pub fn read_block(&self, block_id: u32) -> ParadoxResult<DataBlock> {
        let mut file = self.file.lock();
        BlockIO::new(&mut *file, &self.header).read_block(block_id)
    }

    /// Decode every record of one physical block
    pub fn read_records(
        &self,
        block_id: u32,
        blobs: Option<&dyn BlobResolver>,
    ) -> ParadoxResult<Vec<Record>> {
        let block = self.read_block(block_id)?;
        Record::from_block(&block, &self.header.fields, blobs)
    }

    /// All records in physical block order
    pub fn scan<'a>(&'a self, blobs: Option<&'a dyn BlobResolver>) -> Scan<'a, R> {
        Scan {
            file: self,
            blobs,
            next_block: 0,
            block_count: self.header.file_blocks as u32,
            pending: Vec::new().into_iter(),
            failed: false,
        }
    }

    /// Records that satisfy `condition`, in physical block order
    pub fn scan_where<'a>(
        &'a self,
        blobs: Option<&'a dyn BlobResolver>,
        condition: &'a Condition,
    ) -> impl Iterator<Item = ParadoxResult<Record>> + 'a {
        self.scan(blobs).filter(move |r| match r {
            Ok(record) => condition.is_data_ok(record.values()),
            Err(_) => true,
        })
    }
}

/// Sequential scan over a file's blocks
///
/// Blocks are read one at a time as the iterator advances. After an error the
/// scan yields nothing further.
pub struct Scan<'a, R> {
    file: &'a ParadoxFile<R>,
    blobs: Option<&'a dyn BlobResolver>,
    next_block: u32,
    block_count: u32,
    pending: std::vec::IntoIter<Record>,
    failed: bool,
}

impl<'a, R: Read + Seek> Iterator for Scan<'a, R> {
    type Item = ParadoxResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }
            if let Some(record) = self.pending.next() {
                return Some(Ok(record));
            }
            if self.next_block >= self.block_count {
                return None;
            }
            let block_id = self.next_block;
            self.next_block += 1;
            match self.file.read_records(block_id, self.blobs) {
                Ok(records) => self.pending = records.into_iter(),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<'a, R: Read + Seek> std::iter::FusedIterator for Scan<'a, R> {}
