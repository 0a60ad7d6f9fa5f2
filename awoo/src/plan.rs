//! Query planning: selectivity ordering.

use crate::error::Result;
use crate::index::{Index, TagEntry, TagId};

/// Reorder `query` ascending by estimated tag size.
///
/// Empty tags sort first (size 0), so a doomed conjunction is detected on
/// the first planned entry. The intersection's work is bounded by its
/// smallest operand; seeding from the most selective tag keeps the working
/// bitmap sparse and makes later folds mostly no-ops. Ties keep no
/// particular order; duplicate tags are allowed and cost one redundant fold.
///
/// Fails with [`crate::IndexError::BadTagId`] if any tag is outside the
/// index's tag table.
pub fn plan(index: &Index, query: &[TagId]) -> Result<Vec<TagId>> {
    for &tag in query {
        index.entry(tag)?;
    }

    let mut ordered = query.to_vec();
    ordered.sort_unstable_by_key(|&tag| index.estimated_len(tag));
    Ok(ordered)
}

/// Like [`plan`], but pairing each tag with its resolved entry for the
/// intersection loop.
pub(crate) fn plan_entries<'a>(
    index: &'a Index,
    query: &[TagId],
) -> Result<Vec<(TagId, &'a TagEntry)>> {
    let mut ordered = Vec::with_capacity(query.len());
    for &tag in query {
        ordered.push((tag, index.entry(tag)?));
    }
    ordered.sort_by_key(|(_, entry)| entry.estimated_len());
    Ok(ordered)
}
