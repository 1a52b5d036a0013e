//! Paradox file header
//!
//! Every Paradox file (table, primary index, secondary index) starts with the
//! same 0x58-byte common header. Layout of the fields that matter:
//! - Offset 0x00: record_size (u16)
//! - Offset 0x02: header_size (u16)
//! - Offset 0x04: file_type (u8)
//! - Offset 0x05: max_table_size (u8, block size in KiB)
//! - Offset 0x06: record_count (i32)
//! - Offset 0x0C: file_blocks (u16)
//! - Offset 0x1E: root_block (u16, index files, 1-based)
//! - Offset 0x20: level_count (u8, index files)
//! - Offset 0x21: field_count (i16)
//! - Offset 0x39: version (u8)
//!
//! Version 4.0+ tables carry a 32-byte extension at 0x58. After that come the
//! field descriptors, the table name and (tables only) the field names.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use super::codec::latin1;
use super::field::{FieldDescriptor, FieldType};
use crate::error::{ParadoxError, ParadoxResult};

/// Paradox file kinds (header offset 0x04)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Keyed table (.DB with a primary index)
    IndexedTable,
    /// Primary index (.PX)
    PrimaryIndex,
    /// Unkeyed table (.DB)
    NonIndexedTable,
    /// Non-incremental secondary index (.Xnn)
    SecondaryNonInc,
    /// Secondary index data (.Ynn)
    SecondaryData,
    /// Incremental secondary index (.Xnn)
    SecondaryInc,
    /// Non-incremental composite secondary index (.Xgn)
    CompositeNonInc,
    /// Composite secondary index data (.Ygn)
    CompositeData,
    /// Incremental composite secondary index (.Xgn)
    CompositeInc,
    /// Tag not known to this decoder
    Unknown(u8),
}

impl FileType {
    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => FileType::IndexedTable,
            1 => FileType::PrimaryIndex,
            2 => FileType::NonIndexedTable,
            3 => FileType::SecondaryNonInc,
            4 => FileType::SecondaryData,
            5 => FileType::SecondaryInc,
            6 => FileType::CompositeNonInc,
            7 => FileType::CompositeData,
            8 => FileType::CompositeInc,
            other => FileType::Unknown(other),
        }
    }

    pub fn as_raw(&self) -> u8 {
        match self {
            FileType::IndexedTable => 0,
            FileType::PrimaryIndex => 1,
            FileType::NonIndexedTable => 2,
            FileType::SecondaryNonInc => 3,
            FileType::SecondaryData => 4,
            FileType::SecondaryInc => 5,
            FileType::CompositeNonInc => 6,
            FileType::CompositeData => 7,
            FileType::CompositeInc => 8,
            FileType::Unknown(tag) => *tag,
        }
    }

    /// Table files carry field names
    pub fn is_table(&self) -> bool {
        matches!(self, FileType::IndexedTable | FileType::NonIndexedTable)
    }

    /// Files that get the 4.0+ extended header when the version allows it
    fn has_extended_header(&self) -> bool {
        matches!(
            self,
            FileType::IndexedTable | FileType::NonIndexedTable | FileType::SecondaryNonInc
        )
    }
}

/// Header extension present in version 4.0+ table files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedHeader {
    pub file_version_id2: i16,
    pub file_version_id3: i16,
    pub encryption: i32,
    /// Only maintained by Paradox 4.0
    pub file_update_time: i32,
    pub hi_field_id: u16,
    pub hi_field_id_info: u16,
    pub sometimes_num_fields: i16,
    pub dos_code_page: u16,
    pub change_count: i16,
}

impl ExtendedHeader {
    pub const SIZE: usize = 32;

    fn read_from<R: Read>(r: &mut R) -> ParadoxResult<Self> {
        let file_version_id2 = r.read_i16::<LittleEndian>()?;
        let file_version_id3 = r.read_i16::<LittleEndian>()?;
        let encryption = r.read_i32::<LittleEndian>()?;
        let file_update_time = r.read_i32::<LittleEndian>()?;
        let hi_field_id = r.read_u16::<LittleEndian>()?;
        let hi_field_id_info = r.read_u16::<LittleEndian>()?;
        let sometimes_num_fields = r.read_i16::<LittleEndian>()?;
        let dos_code_page = r.read_u16::<LittleEndian>()?;
        skip(r, 4)?; // 0x6C..0x6F
        let change_count = r.read_i16::<LittleEndian>()?;
        skip(r, 6)?; // 0x72..0x77

        Ok(ExtendedHeader {
            file_version_id2,
            file_version_id3,
            encryption,
            file_update_time,
            hi_field_id,
            hi_field_id_info,
            sometimes_num_fields,
            dos_code_page,
            change_count,
        })
    }
}

/// Parsed header of a Paradox file
#[derive(Debug, Clone)]
pub struct TableHeader {
    /// Fixed record length in bytes
    pub record_size: u16,
    /// Offset of block 0 from the start of the file
    pub header_size: u16,
    pub file_type: FileType,
    /// Block size in KiB (1, 2, 3, 4, 8, 16 or 32)
    pub max_table_size: u8,
    pub record_count: i32,
    pub next_block: u16,
    /// Number of blocks in use
    pub file_blocks: u16,
    pub first_block: u16,
    pub last_block: u16,
    pub modified_flags1: u8,
    pub index_field_number: u8,
    /// Root of the index tree (1-based, index files only)
    pub root_block: u16,
    /// Height of the index tree; 0 means the root points at data blocks
    pub level_count: u8,
    /// Number of fields declared in the file
    pub field_count: u16,
    pub primary_key_fields: i16,
    pub encryption: i32,
    pub sort_order: u8,
    pub modified_flags2: u8,
    pub change_count1: u8,
    pub change_count2: u8,
    pub write_protected: bool,
    pub version: u8,
    pub max_blocks: u16,
    pub aux_passwords: u8,
    pub auto_inc: i32,
    pub index_update_required: bool,
    pub ref_integrity: u8,
    pub extended: Option<ExtendedHeader>,
    /// One descriptor per column (declared fields plus synthetic index fields)
    pub fields: Vec<FieldDescriptor>,
    pub table_name: String,
    /// Empty for index files
    pub field_names: Vec<String>,
}

impl TableHeader {
    /// Size of the common header
    pub const COMMON_SIZE: usize = 0x58;

    /// Number of trailing fields the parser appends to primary index files
    pub const INDEX_SYNTHETIC_FIELDS: usize = 3;

    /// Parse a header from a stream positioned at the start of the file
    pub fn read_from<R: Read>(r: &mut R) -> ParadoxResult<Self> {
        let record_size = r.read_u16::<LittleEndian>()?;
        let header_size = r.read_u16::<LittleEndian>()?;
        let file_type = FileType::from_raw(r.read_u8()?);
        let max_table_size = r.read_u8()?;
        let record_count = r.read_i32::<LittleEndian>()?;
        let next_block = r.read_u16::<LittleEndian>()?;
        let file_blocks = r.read_u16::<LittleEndian>()?;
        let first_block = r.read_u16::<LittleEndian>()?;
        let last_block = r.read_u16::<LittleEndian>()?;
        skip(r, 2)?; // 0x12
        let modified_flags1 = r.read_u8()?;
        let index_field_number = r.read_u8()?;
        let _primary_index_workspace = r.read_i32::<LittleEndian>()?;
        let _unknown_ptr = r.read_i32::<LittleEndian>()?;
        let root_block = r.read_u16::<LittleEndian>()?;
        let level_count = r.read_u8()?;
        let raw_field_count = r.read_i16::<LittleEndian>()?;
        let primary_key_fields = r.read_i16::<LittleEndian>()?;
        let encryption = r.read_i32::<LittleEndian>()?;
        let sort_order = r.read_u8()?;
        let modified_flags2 = r.read_u8()?;
        skip(r, 2)?; // 0x2B..0x2C
        let change_count1 = r.read_u8()?;
        let change_count2 = r.read_u8()?;
        skip(r, 1)?; // 0x2F
        let _table_name_ptr_ptr = r.read_i32::<LittleEndian>()?;
        let _field_info_ptr = r.read_i32::<LittleEndian>()?;
        let write_protected = r.read_u8()? != 0;
        let version = r.read_u8()?;
        let max_blocks = r.read_u16::<LittleEndian>()?;
        skip(r, 1)?; // 0x3C
        let aux_passwords = r.read_u8()?;
        skip(r, 2)?; // 0x3E..0x3F
        let _crypt_info_start = r.read_i32::<LittleEndian>()?;
        let _crypt_info_end = r.read_i32::<LittleEndian>()?;
        skip(r, 1)?; // 0x48
        let auto_inc = r.read_i32::<LittleEndian>()?;
        skip(r, 2)?; // 0x4D..0x4E
        let index_update_required = r.read_u8()? != 0;
        skip(r, 5)?; // 0x50..0x54
        let ref_integrity = r.read_u8()?;
        skip(r, 2)?; // 0x56..0x57

        if raw_field_count < 0 {
            return Err(ParadoxError::format(format!(
                "negative field count {}",
                raw_field_count
            )));
        }
        let field_count = raw_field_count as u16;

        let extended = if file_type.has_extended_header() && version >= 5 {
            Some(ExtendedHeader::read_from(r)?)
        } else {
            None
        };

        let mut fields = Vec::with_capacity(field_count as usize + Self::INDEX_SYNTHETIC_FIELDS);
        for _ in 0..field_count {
            fields.push(FieldDescriptor::read_from(r)?);
        }
        if file_type == FileType::PrimaryIndex {
            // descent pointer, subtree record count, unused
            for _ in 0..Self::INDEX_SYNTHETIC_FIELDS {
                fields.push(FieldDescriptor::new(FieldType::Short, 2));
            }
        }

        let _table_name_ptr = r.read_i32::<LittleEndian>()?;
        if file_type.is_table() {
            for _ in 0..field_count {
                let _field_name_ptr = r.read_i32::<LittleEndian>()?;
            }
        }

        let name_capacity = if version >= 12 { 261 } else { 79 };
        let mut name_buf = vec![0u8; name_capacity];
        r.read_exact(&mut name_buf)?;
        let name_len = name_buf.iter().position(|&b| b == 0).unwrap_or(name_capacity);
        let table_name = latin1(&name_buf[..name_len]);

        let mut field_names = Vec::new();
        if file_type.is_table() {
            field_names.reserve(field_count as usize);
            for _ in 0..field_count {
                field_names.push(read_cstring(r)?);
            }
        }

        Ok(TableHeader {
            record_size,
            header_size,
            file_type,
            max_table_size,
            record_count,
            next_block,
            file_blocks,
            first_block,
            last_block,
            modified_flags1,
            index_field_number,
            root_block,
            level_count,
            field_count,
            primary_key_fields,
            encryption,
            sort_order,
            modified_flags2,
            change_count1,
            change_count2,
            write_protected,
            version,
            max_blocks,
            aux_passwords,
            auto_inc,
            index_update_required,
            ref_integrity,
            extended,
            fields,
            table_name,
            field_names,
        })
    }

    /// Block size in bytes
    pub fn block_size(&self) -> u64 {
        self.max_table_size as u64 * 1024
    }

    /// File offset of a physical (0-based) block
    pub fn block_offset(&self, block: u32) -> u64 {
        block as u64 * self.block_size() + self.header_size as u64
    }

    pub fn is_primary_index(&self) -> bool {
        self.file_type == FileType::PrimaryIndex
    }

    /// Number of decoded columns per record
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Column holding the 1-based child block id in index entries
    pub fn descent_field(&self) -> Option<usize> {
        if self.is_primary_index() {
            Some(self.fields.len() - Self::INDEX_SYNTHETIC_FIELDS)
        } else {
            None
        }
    }

    pub fn field_name(&self, column: usize) -> Option<&str> {
        self.field_names.get(column).map(String::as_str)
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption != 0 || self.extended.as_ref().map_or(false, |x| x.encryption != 0)
    }

    /// Paradox release that writes files with this version id
    pub fn version_name(&self) -> &'static str {
        match self.version {
            3 => "3.0",
            4 => "3.5",
            5..=9 => "4.x",
            10 | 11 => "5.x",
            12 => "7.x",
            _ => "unknown",
        }
    }
}

fn skip<R: Read>(r: &mut R, n: usize) -> ParadoxResult<()> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf[..n])?;
    Ok(())
}

fn read_cstring<R: Read>(r: &mut R) -> ParadoxResult<String> {
    let mut bytes = Vec::new();
    loop {
        match r.read_u8()? {
            0 => break,
            b => bytes.push(b),
        }
    }
    Ok(latin1(&bytes))
}
