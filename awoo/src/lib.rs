//! In-memory inverted index for conjunctive tag searches.
//!
//! An index maps every tag id to the set of item ids bearing that tag,
//! stored either as a sorted posting list (selective tags) or as an aligned
//! bitmap (frequent tags). Conjunctive queries plan the tags by
//! selectivity, seed a working bitmap from the smallest, and AND the rest
//! in with word-parallel (optionally AVX2) kernels.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> awoo::Result<()> {
//! let index = awoo::file::load("posts.awoo")?;
//!
//! let mut searcher = awoo::Searcher::new();
//! let items = searcher.search(&index, &[470_575, 212_816, 13_197])?;
//! println!("{} items match", items.len());
//! # Ok(())
//! # }
//! ```

// Core error types used throughout the crate
pub mod error;

// Aligned word storage and the SIMD AND kernels
mod buffer;
mod simd;

// Tag set representations
mod bitmap;
mod posting;

// The index table and its builder
mod index;

// Index file format I/O
pub mod file;

// Query planning and the conjunctive search core
mod plan;
mod search;

#[cfg(test)]
mod tests_search;

pub use bitmap::{Bitmap, SetBits};
pub use buffer::{BitmapBuffer, Lane, LANE_WORDS, WORD_BITS};
pub use error::{IndexError, Result};
pub use index::{Index, IndexBuilder, ItemId, TagEntry, TagId, DENSE_THRESHOLD};
pub use plan::plan;
pub use posting::PostingList;
pub use search::{search, Searcher};
