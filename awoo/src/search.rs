//! The conjunctive search core.
//!
//! A query is planned most-selective-first, then intersected. Sparse-only
//! queries intersect their posting lists directly; anything touching a
//! dense tag runs the bitmap algorithm: seed a working bitmap from the
//! smallest tag (fusing the second when representations allow), AND the
//! remaining tags into it, and enumerate the surviving bits in ascending
//! order. Folds stop as soon as the working bitmap drains.

use crate::bitmap::Bitmap;
use crate::buffer::WORD_BITS;
use crate::error::{IndexError, Result};
use crate::index::{Index, ItemId, TagEntry, TagId};
use crate::plan::plan_entries;
use crate::posting::PostingList;
use crate::simd;
use tracing::debug;

/// Find the items bearing every tag in `query`, ascending.
///
/// Convenience wrapper allocating a fresh working bitmap; reuse a
/// [`Searcher`] to amortize that allocation across queries.
pub fn search(index: &Index, query: &[TagId]) -> Result<Vec<ItemId>> {
    Searcher::new().search(index, query)
}

/// Reusable query state: the per-query working bitmap.
///
/// The index is only ever borrowed; a `Searcher` is cheap to create and
/// per-thread, so concurrent queries each use their own. The working
/// bitmap is zeroed before every query.
#[derive(Default)]
pub struct Searcher {
    working: Bitmap,
}

impl Searcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the items bearing every tag in `query`, ascending.
    pub fn search(&mut self, index: &Index, query: &[TagId]) -> Result<Vec<ItemId>> {
        let mut out = Vec::new();
        self.search_into(index, query, &mut out)?;
        Ok(out)
    }

    /// Like [`Searcher::search`], reusing the caller's result vector.
    pub fn search_into(
        &mut self,
        index: &Index,
        query: &[TagId],
        out: &mut Vec<ItemId>,
    ) -> Result<()> {
        out.clear();

        if query.is_empty() {
            return Err(IndexError::EmptyQuery);
        }

        let planned = plan_entries(index, query)?;

        // An empty tag annihilates the conjunction; the planner sorts it first.
        if planned[0].1.is_empty() {
            debug!(tag = planned[0].0, "empty tag short-circuits query");
            return Ok(());
        }

        // A single tag materializes directly.
        if planned.len() == 1 {
            materialize_entry(planned[0].1, out);
            return Ok(());
        }

        // Sparse-only queries skip the working bitmap entirely.
        let mut postings: Vec<&PostingList> = Vec::with_capacity(planned.len());
        for &(_, entry) in &planned {
            match entry {
                TagEntry::Ids(posting) => postings.push(posting),
                _ => {
                    postings.clear();
                    break;
                }
            }
        }
        if postings.len() == planned.len() {
            intersect_postings(&postings, out);
            return Ok(());
        }

        self.working.reset(index.bitmap_word_count());
        if self.seed_and_fold(&planned) {
            out.extend(self.working.iter());
        }
        Ok(())
    }

    /// Seed the working bitmap from the most selective tags and fold in the
    /// rest. Returns `false` once the intersection is provably empty.
    fn seed_and_fold(&mut self, planned: &[(TagId, &TagEntry)]) -> bool {
        let working = &mut self.working;

        let rest = match (planned[0].1, planned[1].1) {
            // Empty entries were short-circuited before seeding.
            (TagEntry::Empty, _) | (_, TagEntry::Empty) => return false,
            // Fused seed: working = t0 & t1 in one lanewise pass.
            (TagEntry::Dense { bitmap: a, .. }, TagEntry::Dense { bitmap: b, .. }) => {
                if !simd::and_into(working.lanes_mut(), a.lanes(), b.lanes()) {
                    return false;
                }
                2
            }
            // Fused seed: set only the ids present in the dense side.
            (TagEntry::Ids(posting), TagEntry::Dense { bitmap, .. })
            | (TagEntry::Dense { bitmap, .. }, TagEntry::Ids(posting)) => {
                let mut any = false;
                for id in posting.iter() {
                    if bitmap.contains(id) {
                        working.insert(id);
                        any = true;
                    }
                }
                if !any {
                    return false;
                }
                2
            }
            // Two posting lists up front: seed from the smallest, fold the other.
            (TagEntry::Ids(posting), _) => {
                for id in posting.iter() {
                    working.insert(id);
                }
                1
            }
        };

        for &(tag, entry) in &planned[rest..] {
            let alive = match entry {
                TagEntry::Dense { bitmap, .. } => {
                    simd::and_assign(working.lanes_mut(), bitmap.lanes())
                }
                TagEntry::Ids(posting) => fold_postings(working, posting),
                TagEntry::Empty => false,
            };
            if !alive {
                debug!(tag, "working bitmap drained, stopping early");
                return false;
            }
        }

        true
    }
}

/// Fold a posting list into the working bitmap.
///
/// Semantics: `working &= bitmap(posting)`. One forward merge over the
/// words: each word is masked by the ids that fall in it, and words with no
/// ids are cleared, including every word past the last posting. Handles
/// any number of ids per word.
fn fold_postings(working: &mut Bitmap, posting: &PostingList) -> bool {
    let words = working.words_mut();
    let ids = posting.ids();

    let mut survivors = 0u64;
    let mut cursor = 0usize;

    for word_index in 0..words.len() {
        if cursor == ids.len() {
            words[word_index..].fill(0);
            break;
        }

        let mut mask = 0u64;
        while cursor < ids.len() && ids[cursor] as usize / WORD_BITS == word_index {
            mask |= 1u64 << (ids[cursor] as usize % WORD_BITS);
            cursor += 1;
        }

        let masked = words[word_index] & mask;
        words[word_index] = masked;
        survivors |= masked;
    }

    survivors != 0
}

/// Intersect sorted posting lists directly: scan the smallest and probe the
/// rest by binary search. Output is ascending because the scanned list is.
fn intersect_postings(lists: &[&PostingList], out: &mut Vec<ItemId>) {
    let Some((first, rest)) = lists.split_first() else {
        return;
    };

    'candidates: for id in first.iter() {
        for list in rest {
            if !list.contains(id) {
                continue 'candidates;
            }
        }
        out.push(id);
    }
}

/// Emit a single entry's items in ascending order.
fn materialize_entry(entry: &TagEntry, out: &mut Vec<ItemId>) {
    match entry {
        TagEntry::Empty => {}
        TagEntry::Ids(posting) => out.extend(posting.iter()),
        TagEntry::Dense { bitmap, .. } => out.extend(bitmap.iter()),
    }
}
