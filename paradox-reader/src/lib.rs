//! Paradox Reader Library
//!
//! Provides a forward-only row cursor over Paradox tables, in the style of a
//! database driver's data reader.

pub mod data_reader;

use std::io::{Read, Seek};

use paradox_engine::{Condition, IndexScan, ParadoxResult, ParadoxTable, Scan};

pub use data_reader::DataReader;
pub use paradox_engine::{ParadoxError, Value};

/// Reader over every row of a table, in physical order
pub fn table_reader<R: Read + Seek>(table: &ParadoxTable<R>) -> DataReader<'_, Scan<'_, R>> {
    DataReader::new(table.header(), table.records())
}

/// Reader over the rows matching `condition`, in primary-key order
pub fn index_reader<'a, R: Read + Seek>(
    table: &'a ParadoxTable<R>,
    condition: &'a Condition,
) -> ParadoxResult<DataReader<'a, IndexScan<'a, R, R>>> {
    Ok(DataReader::new(table.header(), table.scan_index(condition)?))
}
