//! Index file format I/O.
//!
//! Layout, all little-endian and tightly packed:
//!
//! ```text
//! magic "Awoo" | max_id: u32 | tag_count: u32
//! post_count[tag_count]: u32
//! postings: for each tag in id order, post_count[tag] ascending u32 item ids
//! ```
//!
//! Absent tags have `post_count = 0` and contribute no posting bytes.
//! [`load`] chooses each tag's in-memory representation from its count alone
//! (see [`DENSE_THRESHOLD`]), streaming postings through a transient 4 KiB
//! scratch buffer. [`save`] writes the identical byte layout back, so a
//! load/save round trip reproduces the input file exactly.

use crate::bitmap::Bitmap;
use crate::error::{IndexError, Result};
use crate::index::{words_for_max_id, Index, TagEntry, DENSE_THRESHOLD};
use crate::posting::PostingList;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// File magic.
pub const MAGIC: [u8; 4] = *b"Awoo";

/// Scratch buffer capacity in ids (4 KiB of bytes).
const SCRATCH_IDS: usize = 4096 / std::mem::size_of::<u32>();

/// Load an index file from disk.
pub fn load(path: impl AsRef<Path>) -> Result<Index> {
    let path = path.as_ref();
    let start = Instant::now();

    let mut file = File::open(path)?;
    let index = read_index(&mut file)?;

    debug!(
        path = %path.display(),
        elapsed = ?start.elapsed(),
        "loaded index file"
    );
    Ok(index)
}

/// Serialize an index to disk in the file format.
pub fn save(index: &Index, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path)?;
    write_index(index, &mut file)?;
    file.flush()?;
    Ok(())
}

/// Read an index from any byte stream.
///
/// Fails on bad magic, truncation, postings that are out of range or not
/// strictly increasing, and trailing bytes past the declared postings
/// region. No partially built index is ever returned.
pub fn read_index<R: Read>(mut reader: R) -> Result<Index> {
    let mut magic = [0u8; 4];
    read_exact_or(&mut reader, &mut magic, "magic")?;
    if magic != MAGIC {
        return Err(IndexError::BadMagic { found: magic });
    }

    let max_id = read_u32(&mut reader, "header")?;
    let tag_count = read_u32(&mut reader, "header")?;

    let mut scratch = vec![0u8; SCRATCH_IDS * 4];

    let mut counts = vec![0u32; tag_count as usize];
    read_u32s(&mut reader, &mut scratch, &mut counts, "tag counts")?;

    let word_count = words_for_max_id(max_id);
    let mut entries = Vec::with_capacity(counts.len());
    let mut total_items = 0u64;
    let mut dense_tags = 0usize;

    for (tag, &count) in counts.iter().enumerate() {
        let tag = tag as u32;
        total_items += count as u64;

        let entry = if count == 0 {
            TagEntry::Empty
        } else if count >= DENSE_THRESHOLD {
            dense_tags += 1;
            let mut bitmap = Bitmap::zeroed(word_count);
            for_each_posting(&mut reader, &mut scratch, tag, count, max_id, |id| {
                bitmap.insert(id)
            })?;
            TagEntry::Dense {
                bitmap,
                item_count: count,
            }
        } else {
            let mut ids = Vec::with_capacity(count as usize);
            for_each_posting(&mut reader, &mut scratch, tag, count, max_id, |id| {
                ids.push(id)
            })?;
            TagEntry::Ids(PostingList::from_sorted(ids))
        };

        entries.push(entry);
    }

    // The stream must end exactly where the counts said it would.
    let mut probe = [0u8; 1];
    match reader.read_exact(&mut probe) {
        Ok(()) => return Err(IndexError::TrailingData),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
        Err(e) => return Err(IndexError::Io(e)),
    }

    let index = Index::from_parts(max_id, entries);
    debug!(
        tags = index.tag_count(),
        dense_tags,
        total_items,
        max_id,
        heap_bytes = index.heap_bytes(),
        "read index"
    );
    Ok(index)
}

/// Write an index to any byte sink in the file format.
pub fn write_index<W: Write>(index: &Index, mut writer: W) -> Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&index.max_id().to_le_bytes())?;
    writer.write_all(&(index.tag_count() as u32).to_le_bytes())?;

    for tag in 0..index.tag_count() as u32 {
        let count = index.entry(tag)?.item_count();
        writer.write_all(&count.to_le_bytes())?;
    }

    // Postings, concatenated in tag id order. Dense entries iterate their
    // set bits, which reproduces the ascending ids they were built from.
    let mut scratch = Vec::with_capacity(SCRATCH_IDS * 4);
    for tag in 0..index.tag_count() as u32 {
        match index.entry(tag)? {
            TagEntry::Empty => {}
            TagEntry::Ids(posting) => {
                write_ids(&mut writer, &mut scratch, posting.iter())?;
            }
            TagEntry::Dense { bitmap, .. } => {
                write_ids(&mut writer, &mut scratch, bitmap.iter())?;
            }
        }
    }
    if !scratch.is_empty() {
        writer.write_all(&scratch)?;
    }

    Ok(())
}

/// Stream one tag's postings through the scratch buffer, validating range
/// and strict ascending order.
fn for_each_posting<R: Read>(
    reader: &mut R,
    scratch: &mut [u8],
    tag: u32,
    count: u32,
    max_id: u32,
    mut emit: impl FnMut(u32),
) -> Result<()> {
    let mut prev: Option<u32> = None;
    let mut remaining = count as usize;

    while remaining > 0 {
        let take = remaining.min(scratch.len() / 4);
        let bytes = &mut scratch[..take * 4];
        read_exact_or(reader, bytes, "postings")?;

        for chunk in bytes.chunks_exact(4) {
            let id = u32::from_le_bytes(chunk.try_into().unwrap());
            if id > max_id {
                return Err(IndexError::PostingOutOfRange {
                    tag,
                    value: id,
                    max_id,
                });
            }
            if let Some(prev) = prev {
                if id <= prev {
                    return Err(IndexError::PostingOrder { tag, value: id });
                }
            }
            prev = Some(id);
            emit(id);
        }

        remaining -= take;
    }

    Ok(())
}

/// Fill `out` with little-endian u32 values read through the scratch buffer.
fn read_u32s<R: Read>(
    reader: &mut R,
    scratch: &mut [u8],
    out: &mut [u32],
    section: &'static str,
) -> Result<()> {
    let mut done = 0usize;
    while done < out.len() {
        let take = (out.len() - done).min(scratch.len() / 4);
        let bytes = &mut scratch[..take * 4];
        read_exact_or(reader, bytes, section)?;

        for (slot, chunk) in out[done..done + take].iter_mut().zip(bytes.chunks_exact(4)) {
            *slot = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        done += take;
    }
    Ok(())
}

fn read_u32<R: Read>(reader: &mut R, section: &'static str) -> Result<u32> {
    let mut bytes = [0u8; 4];
    read_exact_or(reader, &mut bytes, section)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_exact_or<R: Read>(reader: &mut R, buf: &mut [u8], section: &'static str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => IndexError::Truncated { section },
        _ => IndexError::Io(e),
    })
}

fn write_ids<W: Write>(
    writer: &mut W,
    scratch: &mut Vec<u8>,
    ids: impl Iterator<Item = u32>,
) -> Result<()> {
    for id in ids {
        scratch.extend_from_slice(&id.to_le_bytes());
        if scratch.len() >= SCRATCH_IDS * 4 {
            writer.write_all(scratch)?;
            scratch.clear();
        }
    }
    Ok(())
}
