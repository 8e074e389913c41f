//! Search criteria state and the debounced edit queue.

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// Filter modes a search field can apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Equivalent,
    Like,
    ILike,
}

impl FilterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Equivalent => "eq",
            FilterKind::Like => "like",
            FilterKind::ILike => "i-like",
        }
    }
}

/// Which filter and sort modes are legal for a field. A mode outside the
/// capability set never reaches the query string, whatever the holders
/// say.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchCaps {
    pub order_asc: bool,
    pub order_desc: bool,
    pub enable_like: bool,
    pub enable_i_like: bool,
    pub enable_equivalent: bool,
}

impl SearchCaps {
    pub fn all() -> SearchCaps {
        SearchCaps {
            order_asc: true,
            order_desc: true,
            enable_like: true,
            enable_i_like: true,
            enable_equivalent: true,
        }
    }

    pub fn any(self) -> bool {
        self.order_asc || self.order_desc || self.enable_like || self.enable_i_like || self.enable_equivalent
    }
}

/// One field's current search/sort criterion; also the unit that travels
/// through the debounced edit queue.
#[derive(Clone, Debug)]
pub struct SearchCriterion {
    pub field: String,
    pub value: String,
    /// `Some(true)` ascending, `Some(false)` descending, `None` unset.
    pub order: Option<bool>,
    pub filter: Option<FilterKind>,
    pub caps: SearchCaps,
}

impl SearchCriterion {
    pub fn new(field: impl Into<String>, caps: SearchCaps) -> SearchCriterion {
        SearchCriterion {
            field: field.into(),
            value: String::new(),
            order: None,
            filter: None,
            caps,
        }
    }
}

/// Tracked criteria per field, ordered by field name so query strings
/// come out deterministic.
#[derive(Debug, Default)]
pub struct SearchState {
    criteria: BTreeMap<String, SearchCriterion>,
}

impl SearchState {
    /// Track the update. A field whose value is empty and whose order is
    /// unset drops out of the map; clearing only the filter mode keeps
    /// the entry tracked.
    pub fn apply(&mut self, update: SearchCriterion) {
        if update.value.is_empty() && update.order.is_none() {
            self.criteria.remove(&update.field);
        } else {
            self.criteria.insert(update.field.clone(), update);
        }
    }

    pub fn criteria(&self) -> impl Iterator<Item = &SearchCriterion> {
        self.criteria.values()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn clear(&mut self) {
        self.criteria.clear();
    }
}

/// Trailing debounce window for search edits.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Coalesces bursts of search edits. A single consumer task holds the
/// latest event and re-arms while more arrive within the window, then
/// emits exactly one refresh trigger carrying the last edit.
pub struct SearchDebouncer {
    edits: mpsc::UnboundedSender<SearchCriterion>,
}

impl SearchDebouncer {
    /// Must be called inside a tokio runtime (the consumer task is
    /// spawned here). Returns the debouncer plus the refresh stream.
    pub fn new(window: Duration) -> (SearchDebouncer, mpsc::UnboundedReceiver<SearchCriterion>) {
        let (edit_tx, mut edit_rx) = mpsc::unbounded_channel::<SearchCriterion>();
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(mut latest) = edit_rx.recv().await {
                loop {
                    match time::timeout(window, edit_rx.recv()).await {
                        Ok(Some(next)) => latest = next,
                        Ok(None) => {
                            let _ = refresh_tx.send(latest);
                            return;
                        }
                        Err(_) => {
                            let _ = refresh_tx.send(latest);
                            break;
                        }
                    }
                }
            }
        });
        (SearchDebouncer { edits: edit_tx }, refresh_rx)
    }

    /// Queue one edit for coalescing.
    pub fn push(&self, update: SearchCriterion) {
        let _ = self.edits.send(update);
    }
}
