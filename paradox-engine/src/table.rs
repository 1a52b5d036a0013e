//! A Paradox table with its companion files
//!
//! `<name>.DB` holds the rows. An optional `<name>.PX` primary index enables
//! key-range scans and an optional `<name>.MB` holds blob contents. All three
//! are opened together and closed when the table is dropped.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use crate::error::{ParadoxError, ParadoxResult};
use crate::file::{ParadoxFile, Scan};
use crate::index::{IndexScan, PrimaryIndex};
use crate::query::Condition;
use crate::storage::blob::{BlobFile, BlobResolver};
use crate::storage::header::TableHeader;
use crate::storage::record::Record;

/// Files found next to a table
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Companions {
    pub data: Option<PathBuf>,
    pub primary_index: Option<PathBuf>,
    pub blobs: Option<PathBuf>,
}

impl Companions {
    /// Look in `dir` for `<name>.DB`, `<name>.PX` and `<name>.MB`.
    ///
    /// Names and extensions match case-insensitively; entries are visited in
    /// sorted order and the first match of each kind wins.
    pub fn discover(dir: &Path, name: &str) -> ParadoxResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ParadoxError::TableNotFound(dir.join(format!("{}.DB", name)))
            } else {
                ParadoxError::Io(e)
            }
        })?;
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        paths.sort();

        let mut found = Companions::default();
        for path in paths {
            if !path.is_file() {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if !stem.eq_ignore_ascii_case(name) {
                continue;
            }
            let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
            let slot = if ext.eq_ignore_ascii_case("db") {
                &mut found.data
            } else if ext.eq_ignore_ascii_case("px") {
                &mut found.primary_index
            } else if ext.eq_ignore_ascii_case("mb") {
                &mut found.blobs
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(path);
            }
        }
        Ok(found)
    }
}

/// A table and its optional primary index and blob file
pub struct ParadoxTable<R = File> {
    data: ParadoxFile<R>,
    primary_index: Option<PrimaryIndex<R>>,
    blobs: Option<BlobFile<R>>,
}

impl ParadoxTable<File> {
    /// Open table `name` in `dir` along with any companion files
    pub fn open(dir: &Path, name: &str) -> ParadoxResult<Self> {
        let found = Companions::discover(dir, name)?;
        let data_path = found
            .data
            .ok_or_else(|| ParadoxError::TableNotFound(dir.join(format!("{}.DB", name))))?;
        let data = ParadoxFile::open(&data_path)?;

        let primary_index = match found.primary_index {
            Some(path) => Some(PrimaryIndex::open(&path)?),
            None => None,
        };
        let blobs = match found.blobs {
            Some(path) => Some(BlobFile::open(&path)?),
            None => None,
        };

        tracing::debug!(
            table = %data_path.display(),
            primary_index = primary_index.is_some(),
            blobs = blobs.is_some(),
            "opened table"
        );
        Ok(ParadoxTable::from_parts(data, primary_index, blobs))
    }

    /// Open a table from the path of its .DB file
    pub fn open_path(path: &Path) -> ParadoxResult<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ParadoxError::TableNotFound(path.to_path_buf()))?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        ParadoxTable::open(dir, name)
    }
}

impl<R: Read + Seek> ParadoxTable<R> {
    /// Assemble a table from files that are already open
    pub fn from_parts(
        data: ParadoxFile<R>,
        primary_index: Option<PrimaryIndex<R>>,
        blobs: Option<BlobFile<R>>,
    ) -> Self {
        ParadoxTable {
            data,
            primary_index,
            blobs,
        }
    }

    pub fn header(&self) -> &TableHeader {
        self.data.header()
    }

    pub fn data_file(&self) -> &ParadoxFile<R> {
        &self.data
    }

    pub fn primary_index(&self) -> Option<&PrimaryIndex<R>> {
        self.primary_index.as_ref()
    }

    fn blob_resolver(&self) -> Option<&dyn BlobResolver> {
        self.blobs.as_ref().map(|b| b as &dyn BlobResolver)
    }

    /// Every row in physical order
    pub fn records(&self) -> Scan<'_, R> {
        self.data.scan(self.blob_resolver())
    }

    /// Rows satisfying `condition`, in physical order
    pub fn records_where<'a>(
        &'a self,
        condition: &'a Condition,
    ) -> impl Iterator<Item = ParadoxResult<Record>> + 'a {
        self.data.scan_where(self.blob_resolver(), condition)
    }

    /// Rows satisfying `condition`, in primary-key order, via the index
    pub fn scan_index<'a>(&'a self, condition: &'a Condition) -> ParadoxResult<IndexScan<'a, R, R>> {
        let index = self.primary_index.as_ref().ok_or(ParadoxError::NoPrimaryIndex)?;
        Ok(index.scan(&self.data, self.blob_resolver(), condition))
    }
}
