//! Pagination bookmarks: the [`Cursor`] of the last entry of a page as
//! JSON, URL-safe base64 encoded so callers treat it as opaque.

use super::{LedgerError, LedgerResult};
use crate::storage::query::Cursor;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

pub fn encode(last: &Cursor) -> LedgerResult<String> {
    let json = serde_json::to_vec(last).map_err(|e| LedgerError::InvalidBookmark(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decodes a bookmark; an empty bookmark means "start from the beginning".
pub fn decode(bookmark: &str) -> LedgerResult<Option<Cursor>> {
    if bookmark.is_empty() {
        return Ok(None);
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(bookmark)
        .map_err(|e| LedgerError::InvalidBookmark(e.to_string()))?;
    let cursor =
        serde_json::from_slice(&bytes).map_err(|e| LedgerError::InvalidBookmark(e.to_string()))?;
    Ok(Some(cursor))
}
