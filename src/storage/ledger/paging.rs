//! Query execution over a key-ordered snapshot of world state. Both
//! back-ends load their candidates and hand them to these helpers so that
//! query and pagination semantics cannot drift apart.

use super::{bookmark, LedgerResult, PageMetadata, StateEntry};
use crate::storage::query::RichQuery;
use serde_json::Value;
use std::cmp::Ordering;

pub fn run_query<I>(query: &str, entries: I) -> LedgerResult<Vec<StateEntry>>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let query = RichQuery::parse(query)?;
    let hits = query.window(query.select(entries));
    Ok(hits.into_iter().map(StateEntry::from).collect())
}

/// Returns the page that starts right after the bookmarked entry.
///
/// The bookmark records where its entry sat in the query's order, so a page
/// resumes correctly even when that entry has since changed or vanished. A
/// non-positive `page_size` puts no cap on the page. An empty page echoes
/// the input bookmark.
pub fn run_paged_query<I>(
    query: &str,
    entries: I,
    page_size: i32,
    bookmark: &str,
) -> LedgerResult<(Vec<StateEntry>, PageMetadata)>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let limit = usize::try_from(page_size)
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(usize::MAX);
    let query = RichQuery::parse(query)?;
    let resume_after = bookmark::decode(bookmark)?;

    let matched = query.select_documents(entries);
    let start = match &resume_after {
        None => 0,
        Some(cursor) => matched
            .iter()
            .position(|(key, doc, _)| query.cmp_to_cursor(key, doc, cursor) == Ordering::Greater)
            .unwrap_or(matched.len()),
    };

    let page: Vec<(String, Value, Vec<u8>)> =
        matched.into_iter().skip(start).take(limit).collect();
    let next_bookmark = match page.last() {
        Some((key, doc, _)) => bookmark::encode(&query.cursor(key, doc))?,
        None => bookmark.to_string(),
    };

    let metadata = PageMetadata {
        fetched_records_count: i32::try_from(page.len()).unwrap_or(i32::MAX),
        bookmark: next_bookmark,
    };
    let page = page
        .into_iter()
        .map(|(key, _, value)| StateEntry { key, value })
        .collect();
    Ok((page, metadata))
}
