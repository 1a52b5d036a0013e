//! Storage layer for the Paradox file format
//!
//! This module handles the low-level binary format of Paradox files:
//! - Header parsing (.DB tables and .PX primary indexes)
//! - Block I/O
//! - Field decoding
//! - Blob (.MB) resolution

pub mod header;
pub mod field;
pub mod block;
pub mod codec;
pub mod value;
pub mod blob;
pub mod record;

pub use header::{ExtendedHeader, FileType, TableHeader};
pub use field::{FieldDescriptor, FieldType};
pub use block::{BlockHeader, BlockIO, DataBlock};
pub use codec::{decode_field, decode_record};
pub use value::Value;
pub use blob::{BlobFile, BlobReference, BlobResolver};
pub use record::{Record, RecordAddress};
