//! Primary index (.PX) range scans
//!
//! A primary index is a B-tree stored as an ordinary Paradox file. Each
//! entry holds the key columns followed by three synthetic columns: the
//! 1-based block id of the child, the child's record count, and an unused
//! slot. At depth 0 the child block id addresses a data block of the table
//! itself; above that it addresses another block of the index file.
//!
//! Entry `i` of an index block covers keys in `[entry[i], entry[i + 1])`,
//! the last entry being unbounded. The scan only descends into entries whose
//! range could contain a row satisfying the condition, which yields rows in
//! ascending key order.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::{ParadoxError, ParadoxResult};
use crate::file::ParadoxFile;
use crate::query::Condition;
use crate::storage::blob::BlobResolver;
use crate::storage::header::TableHeader;
use crate::storage::record::Record;
use crate::storage::value::Value;

/// An open primary index file
pub struct PrimaryIndex<R = File> {
    file: ParadoxFile<R>,
}

impl PrimaryIndex<File> {
    pub fn open(path: &Path) -> ParadoxResult<Self> {
        PrimaryIndex::from_file(ParadoxFile::open(path)?)
    }
}

impl<R: Read + Seek> PrimaryIndex<R> {
    /// Wrap an open file, which must be a primary index
    pub fn from_file(file: ParadoxFile<R>) -> ParadoxResult<Self> {
        if !file.header().is_primary_index() {
            return Err(ParadoxError::format(format!(
                "expected a primary index, found {:?}",
                file.header().file_type
            )));
        }
        Ok(PrimaryIndex { file })
    }

    pub fn header(&self) -> &TableHeader {
        self.file.header()
    }

    pub fn file(&self) -> &ParadoxFile<R> {
        &self.file
    }

    /// Rows of `table` satisfying `condition`, in primary-key order
    pub fn scan<'a, T: Read + Seek>(
        &'a self,
        table: &'a ParadoxFile<T>,
        blobs: Option<&'a dyn BlobResolver>,
        condition: &'a Condition,
    ) -> IndexScan<'a, R, T> {
        let header = self.file.header();
        let stack = match header.root_block.checked_sub(1) {
            Some(root) => vec![Frame::Unvisited {
                block_id: root as u32,
                depth: header.level_count,
            }],
            None => Vec::new(),
        };
        let failed = if stack.is_empty() {
            Some(ParadoxError::format("index has no root block"))
        } else {
            None
        };
        IndexScan {
            index: self,
            table,
            blobs,
            condition,
            stack,
            pending_error: failed,
            done: false,
        }
    }

    /// Physical block id of the child an entry points to
    fn child_block(&self, entry: &Record) -> ParadoxResult<u32> {
        let field = self
            .header()
            .descent_field()
            .ok_or_else(|| ParadoxError::format("index has no descent field"))?;
        match entry.value(field) {
            // stored as an unsigned 1-based block id
            Some(Value::Short(id)) if *id != 0 => Ok(*id as u16 as u32 - 1),
            other => Err(ParadoxError::format(format!(
                "bad descent pointer {:?} in index block {}",
                other, entry.address.block
            ))),
        }
    }
}

enum Frame {
    /// Block not read yet
    Unvisited { block_id: u32, depth: u8 },
    /// Entries of an index block, `next` being the next one to test
    Entries {
        entries: Vec<Record>,
        next: usize,
        depth: u8,
    },
    /// Rows of a table data block
    Rows(std::vec::IntoIter<Record>),
}

/// Lazy index-guided scan
///
/// Traversal state lives on an explicit stack whose height is bounded by
/// the index level count. After an error the scan yields nothing further.
pub struct IndexScan<'a, R, T> {
    index: &'a PrimaryIndex<R>,
    table: &'a ParadoxFile<T>,
    blobs: Option<&'a dyn BlobResolver>,
    condition: &'a Condition,
    stack: Vec<Frame>,
    pending_error: Option<ParadoxError>,
    done: bool,
}

impl<'a, R: Read + Seek, T: Read + Seek> IndexScan<'a, R, T> {
    fn visit(&self, block_id: u32, depth: u8) -> ParadoxResult<Frame> {
        tracing::trace!(block_id, depth, "index descent");
        if depth == 0 {
            let rows = self.table.read_records(block_id, self.blobs)?;
            Ok(Frame::Rows(rows.into_iter()))
        } else {
            let entries = self.index.file.read_records(block_id, None)?;
            Ok(Frame::Entries {
                entries,
                next: 0,
                depth,
            })
        }
    }

    fn step(&mut self) -> ParadoxResult<Option<Record>> {
        while let Some(frame) = self.stack.last_mut() {
            match frame {
                Frame::Unvisited { block_id, depth } => {
                    let (block_id, depth) = (*block_id, *depth);
                    let visited = self.visit(block_id, depth)?;
                    if let Some(top) = self.stack.last_mut() {
                        *top = visited;
                    }
                }
                Frame::Rows(rows) => match rows.next() {
                    Some(row) => {
                        if self.condition.is_data_ok(row.values()) {
                            return Ok(Some(row));
                        }
                    }
                    None => {
                        self.stack.pop();
                    }
                },
                Frame::Entries {
                    entries,
                    next,
                    depth,
                } => {
                    let i = *next;
                    if i >= entries.len() {
                        self.stack.pop();
                        continue;
                    }
                    *next += 1;
                    let low = entries[i].values();
                    let high = entries.get(i + 1).map(Record::values);
                    if self.condition.is_index_possible(low, high) {
                        let child = self.index.child_block(&entries[i])?;
                        let child_depth = *depth - 1;
                        self.stack.push(Frame::Unvisited {
                            block_id: child,
                            depth: child_depth,
                        });
                    }
                }
            }
        }
        Ok(None)
    }
}

impl<'a, R: Read + Seek, T: Read + Seek> Iterator for IndexScan<'a, R, T> {
    type Item = ParadoxResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(e) = self.pending_error.take() {
            self.done = true;
            return Some(Err(e));
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}

impl<'a, R: Read + Seek, T: Read + Seek> std::iter::FusedIterator for IndexScan<'a, R, T> {}
