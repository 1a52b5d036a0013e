//! Paradox Engine - read-only decoder for Paradox database files
//!
//! This crate reads Paradox tables (.DB), their primary indexes (.PX) and
//! blob files (.MB) without the Borland Database Engine.

pub mod error;
pub mod storage;
pub mod query;
pub mod file;
pub mod index;
pub mod table;

pub use error::{ErrorKind, ParadoxError, ParadoxResult};
pub use file::{ParadoxFile, Scan};
pub use index::{IndexScan, PrimaryIndex};
pub use query::{CompareOp, Condition};
pub use storage::{FieldDescriptor, FieldType, FileType, Record, TableHeader, Value};
pub use table::{Companions, ParadoxTable};
