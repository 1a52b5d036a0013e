//! Writes small Paradox tables to disk for the integration tests.
//!
//! The ORDERS fixture has 101 rows keyed 1700..=1800, spread over 11 data
//! blocks of 10 rows each (the last holds one). Data blocks are stored out of
//! key order so a physical scan and an index scan produce different orders.
//! The primary index has two levels: a root block whose entries point at
//! three index blocks, which point at the data blocks.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

pub const HEADER_SIZE: usize = 2048;
pub const BLOCK_SIZE: usize = 1024;

pub const FIRST_KEY: i32 = 1700;
pub const LAST_KEY: i32 = 1800;
pub const ROWS_PER_BLOCK: usize = 10;

/// Physical data block holding each key-ordered chunk
pub const CHUNK_PLACEMENT: [usize; 11] = [4, 9, 0, 7, 2, 10, 5, 1, 8, 3, 6];

/// Key whose blob reference disagrees with the stored blob header
pub const MISMATCHED_BLOB_KEY: i32 = 1750;

// Id Long(4), Name Alpha(10), Price Currency(8), Photo Graphic(14)
const TABLE_FIELDS: [(u8, u8); 4] = [(0x04, 4), (0x01, 10), (0x05, 8), (0x10, 14)];
const TABLE_NAMES: [&str; 4] = ["Id", "Name", "Price", "Photo"];
const RECORD_SIZE: u16 = 36;
const INDEX_RECORD_SIZE: u16 = 10;

pub fn encode_long(v: i32) -> [u8; 4] {
    let mut b = v.to_be_bytes();
    b[0] ^= 0x80;
    b
}

pub fn encode_short(v: i16) -> [u8; 2] {
    let mut b = v.to_be_bytes();
    b[0] ^= 0x80;
    b
}

pub fn encode_currency(v: f64) -> [u8; 8] {
    let mut b = v.to_be_bytes();
    b[0] ^= 0x80;
    b
}

pub fn name_of(key: i32) -> String {
    format!("item{}", key)
}

pub fn price_of(key: i32) -> f64 {
    (key - FIRST_KEY) as f64 * 1.25
}

/// Rows with a multiple-of-ten key carry a photo
pub fn photo_of(key: i32) -> Option<Vec<u8>> {
    if key % 10 == 0 && key != MISMATCHED_BLOB_KEY {
        Some(format!("photo-{}", key).into_bytes())
    } else {
        None
    }
}

pub fn all_keys() -> Vec<i32> {
    (FIRST_KEY..=LAST_KEY).collect()
}

/// Keys grouped the way they are stored, one chunk per data block
fn chunks() -> Vec<Vec<i32>> {
    all_keys().chunks(ROWS_PER_BLOCK).map(|c| c.to_vec()).collect()
}

/// Keys in physical block order
pub fn physical_keys() -> Vec<i32> {
    let chunks = chunks();
    let mut by_block = vec![Vec::new(); chunks.len()];
    for (chunk, block) in chunks.into_iter().zip(CHUNK_PLACEMENT) {
        by_block[block] = chunk;
    }
    by_block.into_iter().flatten().collect()
}

struct HeaderLayout<'a> {
    file_type: u8,
    record_size: u16,
    record_count: i32,
    file_blocks: u16,
    root_block: u16,
    level_count: u8,
    fields: &'a [(u8, u8)],
    names: &'a [&'a str],
}

fn header(layout: &HeaderLayout) -> Vec<u8> {
    let is_table = layout.file_type == 0 || layout.file_type == 2;
    let mut buf = vec![0u8; 0x58];
    buf[0x00..0x02].copy_from_slice(&layout.record_size.to_le_bytes());
    buf[0x02..0x04].copy_from_slice(&(HEADER_SIZE as u16).to_le_bytes());
    buf[0x04] = layout.file_type;
    buf[0x05] = (BLOCK_SIZE / 1024) as u8;
    buf[0x06..0x0A].copy_from_slice(&layout.record_count.to_le_bytes());
    buf[0x0C..0x0E].copy_from_slice(&layout.file_blocks.to_le_bytes());
    buf[0x0E..0x10].copy_from_slice(&1u16.to_le_bytes());
    buf[0x10..0x12].copy_from_slice(&layout.file_blocks.to_le_bytes());
    buf[0x1E..0x20].copy_from_slice(&layout.root_block.to_le_bytes());
    buf[0x20] = layout.level_count;
    buf[0x21..0x23].copy_from_slice(&(layout.fields.len() as i16).to_le_bytes());
    buf[0x23..0x25].copy_from_slice(&1i16.to_le_bytes());
    buf[0x39] = 12;
    if is_table {
        buf.extend_from_slice(&[0u8; 32]);
    }
    for (t, s) in layout.fields {
        buf.push(*t);
        buf.push(*s);
    }
    buf.extend_from_slice(&0i32.to_le_bytes());
    if is_table {
        for _ in layout.fields {
            buf.extend_from_slice(&0i32.to_le_bytes());
        }
    }
    let mut name = [0u8; 261];
    name[..6].copy_from_slice(b"ORDERS");
    buf.extend_from_slice(&name);
    for n in layout.names {
        buf.extend_from_slice(n.as_bytes());
        buf.push(0);
    }
    assert!(buf.len() <= HEADER_SIZE);
    buf.resize(HEADER_SIZE, 0);
    buf
}

fn block(number: u16, records: &[Vec<u8>], record_size: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(BLOCK_SIZE);
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&number.to_le_bytes());
    let add = (records.len() as i16 - 1) * record_size as i16;
    buf.extend_from_slice(&add.to_le_bytes());
    for r in records {
        assert_eq!(r.len(), record_size as usize);
        buf.extend_from_slice(r);
    }
    assert!(buf.len() <= BLOCK_SIZE);
    buf.resize(BLOCK_SIZE, 0);
    buf
}

/// .MB contents plus the 10-byte reference of each blob by key
fn blob_file() -> (Vec<u8>, Vec<(i32, [u8; 10])>) {
    let mut data = vec![0u8; 256];
    let mut refs = Vec::new();
    for key in all_keys() {
        let content = match photo_of(key) {
            Some(c) => c,
            None if key == MISMATCHED_BLOB_KEY => b"stale".to_vec(),
            None => continue,
        };
        let offset = data.len() as u32;
        let stored_size = if key == MISMATCHED_BLOB_KEY {
            content.len() as i32 + 3
        } else {
            content.len() as i32
        };
        data.extend_from_slice(&[2, 0, 0]);
        data.extend_from_slice(&stored_size.to_le_bytes());
        data.extend_from_slice(&[1, 0]);
        data.extend_from_slice(&content);
        data.resize(data.len().div_ceil(256) * 256, 0);

        let mut r = [0u8; 10];
        r[0..4].copy_from_slice(&(offset | 0xFF).to_le_bytes());
        r[4..8].copy_from_slice(&(content.len() as i32).to_le_bytes());
        r[8..10].copy_from_slice(&1i16.to_le_bytes());
        refs.push((key, r));
    }
    (data, refs)
}

fn table_record(key: i32, refs: &[(i32, [u8; 10])]) -> Vec<u8> {
    let mut rec = Vec::with_capacity(RECORD_SIZE as usize);
    rec.extend_from_slice(&encode_long(key));
    let mut name = [0u8; 10];
    let n = name_of(key);
    name[..n.len()].copy_from_slice(n.as_bytes());
    rec.extend_from_slice(&name);
    let price = price_of(key);
    if price == 0.0 {
        rec.extend_from_slice(&[0u8; 8]);
    } else {
        rec.extend_from_slice(&encode_currency(price));
    }
    rec.extend_from_slice(&[0u8; 4]);
    match refs.iter().find(|(k, _)| *k == key) {
        Some((_, r)) => rec.extend_from_slice(r),
        None => rec.extend_from_slice(&[0u8; 10]),
    }
    rec
}

fn index_entry(key: i32, child: usize, count: usize) -> Vec<u8> {
    let mut rec = Vec::with_capacity(INDEX_RECORD_SIZE as usize);
    rec.extend_from_slice(&encode_long(key));
    rec.extend_from_slice(&encode_short(child as i16 + 1));
    rec.extend_from_slice(&encode_short(count as i16));
    rec.extend_from_slice(&[0u8; 2]);
    rec
}

pub fn table_bytes() -> Vec<u8> {
    let (_, refs) = blob_file();
    let chunks = chunks();
    let mut blocks = vec![Vec::new(); chunks.len()];
    for (chunk, physical) in chunks.iter().zip(CHUNK_PLACEMENT) {
        let records: Vec<_> = chunk.iter().map(|k| table_record(*k, &refs)).collect();
        blocks[physical] = block(physical as u16 + 1, &records, RECORD_SIZE);
    }

    let mut data = header(&HeaderLayout {
        file_type: 0,
        record_size: RECORD_SIZE,
        record_count: all_keys().len() as i32,
        file_blocks: blocks.len() as u16,
        root_block: 0,
        level_count: 0,
        fields: &TABLE_FIELDS,
        names: &TABLE_NAMES,
    });
    for b in blocks {
        data.extend(b);
    }
    data
}

pub fn index_bytes() -> Vec<u8> {
    let chunks = chunks();
    let groups: Vec<Vec<usize>> = (0..chunks.len())
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|g| g.to_vec())
        .collect();

    let mut blocks = Vec::new();
    for group in &groups {
        let entries: Vec<_> = group
            .iter()
            .map(|&c| index_entry(chunks[c][0], CHUNK_PLACEMENT[c], chunks[c].len()))
            .collect();
        blocks.push(block(blocks.len() as u16 + 1, &entries, INDEX_RECORD_SIZE));
    }
    let root: Vec<_> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let rows = g.iter().map(|&c| chunks[c].len()).sum();
            index_entry(chunks[g[0]][0], i, rows)
        })
        .collect();
    blocks.push(block(blocks.len() as u16 + 1, &root, INDEX_RECORD_SIZE));

    let mut data = header(&HeaderLayout {
        file_type: 1,
        record_size: INDEX_RECORD_SIZE,
        record_count: all_keys().len() as i32,
        file_blocks: blocks.len() as u16,
        root_block: blocks.len() as u16,
        level_count: 2,
        fields: &TABLE_FIELDS[..1],
        names: &[],
    });
    for b in blocks {
        data.extend(b);
    }
    data
}

pub fn blob_bytes() -> Vec<u8> {
    blob_file().0
}

/// Directory holding ORDERS.DB, orders.px and Orders.MB, plus PLAIN.DB which
/// has no companions
pub fn orders_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "ORDERS.DB", &table_bytes());
    write(dir.path(), "orders.px", &index_bytes());
    write(dir.path(), "Orders.MB", &blob_bytes());
    write(dir.path(), "PLAIN.DB", &table_bytes());
    dir
}

fn write(dir: &Path, name: &str, data: &[u8]) {
    fs::write(dir.join(name), data).unwrap();
}
