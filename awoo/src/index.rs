//! The inverted index: tag entries, the index table, and its builder.

use crate::bitmap::Bitmap;
use crate::buffer::WORD_BITS;
use crate::error::{IndexError, Result};
use crate::posting::PostingList;
use static_assertions::assert_impl_all;
use tracing::debug;

// The index is immutable after construction and holds only plain owned
// data, so concurrent readers need no locking.
assert_impl_all!(Index: Send, Sync);

/// Identifier of an indexed item (a post).
pub type ItemId = u32;

/// Identifier of a tag slot in the index.
pub type TagId = u32;

/// Minimum item count before a tag is stored as a bitmap instead of a
/// posting list.
///
/// Fixed per index: the loader and any builder of the same file must agree
/// on the representation choice.
pub const DENSE_THRESHOLD: u32 = 50_000;

/// Words needed to cover the id space `[0, max_id]`.
pub(crate) fn words_for_max_id(max_id: u32) -> usize {
    (max_id as usize + 1).div_ceil(WORD_BITS)
}

/// One tag's item set, in the representation chosen at build time.
#[derive(Clone, Debug)]
pub enum TagEntry {
    /// The tag has no items.
    Empty,
    /// Selective tag: sorted posting list.
    Ids(PostingList),
    /// Frequent tag: bitmap over the item id space.
    ///
    /// `item_count` caches the exact popcount so the planner can estimate
    /// sizes without scanning the bitmap.
    Dense { bitmap: Bitmap, item_count: u32 },
}

impl TagEntry {
    /// Exact number of items bearing the tag.
    pub fn item_count(&self) -> u32 {
        match self {
            TagEntry::Empty => 0,
            TagEntry::Ids(posting) => posting.len() as u32,
            TagEntry::Dense { item_count, .. } => *item_count,
        }
    }

    /// Planner size estimate: 0 / posting length / cached popcount.
    pub fn estimated_len(&self) -> usize {
        self.item_count() as usize
    }

    /// True for a tag with no items.
    pub fn is_empty(&self) -> bool {
        matches!(self, TagEntry::Empty)
    }

    /// Heap bytes held by the entry's storage.
    pub fn heap_bytes(&self) -> usize {
        match self {
            TagEntry::Empty => 0,
            TagEntry::Ids(posting) => posting.heap_bytes(),
            TagEntry::Dense { bitmap, .. } => bitmap.heap_bytes(),
        }
    }
}

/// The loaded inverted index.
///
/// Immutable once constructed; shared references may be queried from any
/// number of threads concurrently.
#[derive(Clone, Debug)]
pub struct Index {
    max_id: ItemId,
    entries: Vec<TagEntry>,
}

impl Index {
    pub(crate) fn from_parts(max_id: ItemId, entries: Vec<TagEntry>) -> Self {
        Self { max_id, entries }
    }

    /// The entry for `tag`, or [`IndexError::BadTagId`] for ids outside the
    /// tag table.
    pub fn entry(&self, tag: TagId) -> Result<&TagEntry> {
        self.entries
            .get(tag as usize)
            .ok_or_else(|| IndexError::BadTagId {
                tag,
                tag_count: self.entries.len() as u32,
            })
    }

    /// Number of tag slots (every id below this is addressable).
    pub fn tag_count(&self) -> usize {
        self.entries.len()
    }

    /// Highest item id present in the index.
    pub fn max_id(&self) -> ItemId {
        self.max_id
    }

    /// Words needed for a bitmap spanning `[0, max_id]`.
    pub fn bitmap_word_count(&self) -> usize {
        words_for_max_id(self.max_id)
    }

    /// Planner size estimate for `tag`.
    ///
    /// Panics if `tag` is out of range; callers validate ids up front.
    pub fn estimated_len(&self, tag: TagId) -> usize {
        self.entries[tag as usize].estimated_len()
    }

    /// Total heap bytes held by all tag entries.
    pub fn heap_bytes(&self) -> usize {
        self.entries.iter().map(TagEntry::heap_bytes).sum()
    }
}

/// Constructs an [`Index`] in memory.
///
/// Used by tests and synthetic corpora; the file loader builds entries
/// directly while streaming. The dense threshold can be overridden to force
/// a representation, which must produce identical query results either way.
pub struct IndexBuilder {
    max_id: ItemId,
    dense_threshold: u32,
    entries: Vec<TagEntry>,
}

impl IndexBuilder {
    /// A builder for `tag_count` tag slots over the id space `[0, max_id]`.
    /// All slots start empty.
    pub fn new(max_id: ItemId, tag_count: u32) -> Self {
        let mut entries = Vec::new();
        entries.resize_with(tag_count as usize, || TagEntry::Empty);
        Self {
            max_id,
            dense_threshold: DENSE_THRESHOLD,
            entries,
        }
    }

    /// Override the dense representation threshold.
    ///
    /// `0` forces every nonempty tag dense; `u32::MAX` forces posting lists.
    pub fn with_dense_threshold(mut self, threshold: u32) -> Self {
        self.dense_threshold = threshold;
        self
    }

    /// Set the item set of `tag` from ascending ids.
    ///
    /// Validates range and strict ordering the same way the file loader
    /// does, and applies the threshold to pick the representation.
    pub fn set_tag(&mut self, tag: TagId, ids: &[u32]) -> Result<()> {
        if tag as usize >= self.entries.len() {
            return Err(IndexError::BadTagId {
                tag,
                tag_count: self.entries.len() as u32,
            });
        }

        let mut prev = None;
        for &id in ids {
            if id > self.max_id {
                return Err(IndexError::PostingOutOfRange {
                    tag,
                    value: id,
                    max_id: self.max_id,
                });
            }
            if let Some(prev) = prev {
                if id <= prev {
                    return Err(IndexError::PostingOrder { tag, value: id });
                }
            }
            prev = Some(id);
        }

        self.entries[tag as usize] = if ids.is_empty() {
            TagEntry::Empty
        } else if ids.len() as u32 >= self.dense_threshold {
            TagEntry::Dense {
                bitmap: Bitmap::from_sorted_ids(ids, words_for_max_id(self.max_id)),
                item_count: ids.len() as u32,
            }
        } else {
            TagEntry::Ids(PostingList::from_sorted(ids.to_vec()))
        };

        Ok(())
    }

    /// Finish building and freeze the index.
    pub fn finish(self) -> Index {
        let dense = self
            .entries
            .iter()
            .filter(|e| matches!(e, TagEntry::Dense { .. }))
            .count();
        debug!(
            tags = self.entries.len(),
            dense,
            max_id = self.max_id,
            "built index"
        );

        Index::from_parts(self.max_id, self.entries)
    }
}
