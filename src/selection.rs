//! Selection list with an optional maximum-selection count.
//!
//! The selection is a host-owned `Rc<RefCell<Vec<Album>>>`: the picker
//! mutates it in place and the host reads it back at any time. Insertion
//! order is meaningful; when the limit is exceeded the oldest selections
//! are evicted first.
//!
//! The limit is enforced reactively: once at construction and after each
//! insertion via [`SelectionModel::toggle`]. A host that mutates the
//! shared list directly is not policed.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::models::Album;

/// Outcome of a toggle, telling the caller whether an adjustment pass is
/// now required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The album was appended to the selection.
    Selected,
    /// The album was removed; no adjustment needed.
    Deselected,
}

pub struct SelectionModel {
    selected: Rc<RefCell<Vec<Album>>>,
    /// 0 means unbounded; > 0 caps the selection size.
    limit: usize,
}

impl SelectionModel {
    /// Binds to a host-owned selection list.
    ///
    /// When the injected list already holds `limit` or more entries, one
    /// adjustment pass runs immediately.
    pub fn new(selected: Rc<RefCell<Vec<Album>>>, limit: usize) -> Self {
        let model = Self { selected, limit };
        if limit > 0 && model.selected.borrow().len() >= limit {
            model.adjust();
        }
        model
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_selected(&self, album: &Album) -> bool {
        self.selected.borrow().iter().any(|a| a == album)
    }

    /// Flips membership of `album`.
    ///
    /// Removal takes effect immediately. Insertion appends to the end and
    /// returns [`ToggleOutcome::Selected`] so the caller can schedule the
    /// deferred [`adjust`](Self::adjust) pass.
    pub fn toggle(&self, album: &Album) -> ToggleOutcome {
        let mut selected = self.selected.borrow_mut();
        if let Some(index) = selected.iter().position(|a| a == album) {
            selected.remove(index);
            debug!(album = %album.id, "Album deselected");
            ToggleOutcome::Deselected
        } else {
            selected.push(album.clone());
            debug!(album = %album.id, count = selected.len(), "Album selected");
            ToggleOutcome::Selected
        }
    }

    /// Truncates the selection to its last `limit` entries, keeping the
    /// most recently selected albums in their original relative order.
    /// No-op when the limit is 0.
    pub fn adjust(&self) {
        if self.limit == 0 {
            return;
        }
        let mut selected = self.selected.borrow_mut();
        if selected.len() > self.limit {
            let drop_count = selected.len() - self.limit;
            selected.drain(..drop_count);
            debug!(dropped = drop_count, "Evicted oldest selections");
        }
    }

    pub fn snapshot(&self) -> Vec<Album> {
        self.selected.borrow().clone()
    }
}
