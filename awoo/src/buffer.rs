//! Aligned word storage backing the bitmaps.
//!
//! Storage is grouped into 256-bit lanes so the intersection kernels can use
//! aligned SIMD loads. Capacity always rounds up to a whole number of lanes;
//! the padding words past the requested length are zero and every operation
//! in this crate keeps them zero.

use static_assertions::const_assert_eq;

/// Bits per storage word.
pub const WORD_BITS: usize = 64;

/// Words per SIMD lane group.
pub const LANE_WORDS: usize = 4;

/// One aligned group of words, sized and aligned for a 256-bit vector load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct Lane(pub [u64; LANE_WORDS]);

const_assert_eq!(std::mem::size_of::<Lane>(), 32);
const_assert_eq!(std::mem::align_of::<Lane>(), 32);

impl Lane {
    /// True if every word in the lane is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; LANE_WORDS]
    }
}

/// Fixed-capacity aligned buffer of words.
///
/// `len_words()` is the requested logical length; `words()` exposes the full
/// lane-padded storage so word loops and lane kernels can run over the tail
/// without bounds juggling.
#[derive(Clone, Debug)]
pub struct BitmapBuffer {
    lanes: Box<[Lane]>,
    word_count: usize,
}

impl BitmapBuffer {
    /// Allocate a zeroed buffer holding at least `word_count` words.
    pub fn zeroed(word_count: usize) -> Self {
        let lane_count = word_count.div_ceil(LANE_WORDS);
        Self {
            lanes: vec![Lane::default(); lane_count].into_boxed_slice(),
            word_count,
        }
    }

    /// The requested word count.
    pub fn len_words(&self) -> usize {
        self.word_count
    }

    /// The allocated word count, including lane padding.
    pub fn padded_words(&self) -> usize {
        self.lanes.len() * LANE_WORDS
    }

    /// The number of SIMD lane groups.
    pub fn len_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// The `i`-th word. Panics if `i` is out of the padded capacity.
    #[inline]
    pub fn word(&self, i: usize) -> u64 {
        self.words()[i]
    }

    /// Mutable access to the `i`-th word.
    #[inline]
    pub fn word_mut(&mut self, i: usize) -> &mut u64 {
        &mut self.words_mut()[i]
    }

    /// The `i`-th lane group.
    #[inline]
    pub fn lane(&self, i: usize) -> &Lane {
        &self.lanes[i]
    }

    /// Mutable access to the `i`-th lane group.
    #[inline]
    pub fn lane_mut(&mut self, i: usize) -> &mut Lane {
        &mut self.lanes[i]
    }

    /// All words, including the zero padding up to a whole lane.
    #[inline]
    pub fn words(&self) -> &[u64] {
        // Lane is repr(C) over [u64; LANE_WORDS], so a lane slice is
        // layout-compatible with a word slice of LANE_WORDS times the length.
        unsafe {
            std::slice::from_raw_parts(self.lanes.as_ptr().cast(), self.lanes.len() * LANE_WORDS)
        }
    }

    /// Mutable view of all words, including the padding.
    #[inline]
    pub fn words_mut(&mut self) -> &mut [u64] {
        unsafe {
            std::slice::from_raw_parts_mut(
                self.lanes.as_mut_ptr().cast(),
                self.lanes.len() * LANE_WORDS,
            )
        }
    }

    /// All lane groups.
    #[inline]
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Mutable view of all lane groups.
    #[inline]
    pub fn lanes_mut(&mut self) -> &mut [Lane] {
        &mut self.lanes
    }

    /// Re-zero the buffer in place.
    pub fn clear(&mut self) {
        self.lanes.fill(Lane::default());
    }
}
