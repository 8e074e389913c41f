//! Listing pagination: cursor tracking and page merge semantics.

use crate::response::{Cursor, PageEnvelope};
use serde_json::Value;

/// Tracks one query's cursor and accumulated listing. The listing merges
/// across pages of the same query and resets wholesale when the query
/// (the computed base path) changes.
#[derive(Debug, Default)]
pub struct PaginationState {
    listing: Option<Vec<Value>>,
    cursor: Option<Cursor>,
    last_path: Option<String>,
}

impl PaginationState {
    /// True when the query is unchanged and no cursor is pending: the end
    /// of data was already reached and refetching would duplicate work.
    pub fn is_exhausted(&self, base_path: &str) -> bool {
        self.last_path.as_deref() == Some(base_path) && self.cursor.is_none()
    }

    /// The URL to fetch: the pagination token is appended only when
    /// continuing the previously fetched query.
    pub fn paged_path(&self, base_path: &str, has_query: bool) -> String {
        match &self.cursor {
            Some(cursor) if self.last_path.as_deref() == Some(base_path) => {
                format!(
                    "{}{}p={}",
                    base_path,
                    if has_query { '&' } else { '?' },
                    cursor.next
                )
            }
            _ => base_path.to_string(),
        }
    }

    /// Apply one fetched page: append when the base path matches the
    /// previous fetch, replace otherwise. The new cursor always wins.
    pub fn advance(&mut self, base_path: &str, envelope: PageEnvelope<Value>) {
        if self.last_path.as_deref() == Some(base_path) {
            match &mut self.listing {
                Some(listing) => listing.extend(envelope.page),
                None => self.listing = Some(envelope.page),
            }
        } else {
            self.listing = Some(envelope.page);
        }
        self.last_path = Some(base_path.to_string());
        self.cursor = envelope.cursor;
    }

    pub fn reset(&mut self) {
        *self = PaginationState::default();
    }

    pub fn listing(&self) -> Option<&[Value]> {
        self.listing.as_deref()
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn has_listing(&self) -> bool {
        self.listing.as_ref().map(|l| !l.is_empty()).unwrap_or(false)
    }
}
