use thiserror::Error;

/// Errors that can occur when loading an index file or running a query.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The file does not start with the expected magic bytes.
    #[error("bad magic bytes {found:?}, expected \"Awoo\"")]
    BadMagic { found: [u8; 4] },

    /// The file ended before the declared header or postings were read.
    #[error("unexpected end of file while reading {section}")]
    Truncated { section: &'static str },

    /// The file contains bytes past the end of the declared postings region.
    #[error("trailing data after the postings region")]
    TrailingData,

    /// A posting references an item beyond the index's highest item id.
    #[error("tag {tag}: posting {value} exceeds max item id {max_id}")]
    PostingOutOfRange { tag: u32, value: u32, max_id: u32 },

    /// A posting list is not strictly increasing.
    #[error("tag {tag}: postings not strictly increasing at {value}")]
    PostingOrder { tag: u32, value: u32 },

    /// A query referenced a tag id outside the index's tag table.
    #[error("tag id {tag} out of range: index has {tag_count} tags")]
    BadTagId { tag: u32, tag_count: u32 },

    /// A query must name at least one tag.
    #[error("query contains no tags")]
    EmptyQuery,

    /// I/O error while reading or writing an index file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
