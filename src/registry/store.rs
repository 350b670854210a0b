use crate::graph::value::rc_identity;
use crate::host::StoreRef;

use super::PageDescriptor;

/// Sequential store identifier, assigned in first-seen order.
pub type StoreId = u32;

/// Bookkeeping for one distinct live store.
pub struct StoreRecord {
    store_id: StoreId,
    subscribed: bool,
    subscribed_pages: Vec<PageDescriptor>,
    store: StoreRef,
}

impl StoreRecord {
    pub(crate) fn new(store_id: StoreId, store: StoreRef) -> Self {
        Self {
            store_id,
            subscribed: false,
            subscribed_pages: Vec::new(),
            store,
        }
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Every page that referenced this store, in mount order. Duplicates are kept.
    pub fn subscribed_pages(&self) -> &[PageDescriptor] {
        &self.subscribed_pages
    }

    pub fn store(&self) -> &StoreRef {
        &self.store
    }

    pub(crate) fn is_for(&self, store: &StoreRef) -> bool {
        rc_identity(&self.store) == rc_identity(store)
    }

    /// Append `page` to the pages using this store.
    pub fn record_page(&mut self, page: PageDescriptor) {
        self.subscribed_pages.push(page);
    }

    /// Claim the change subscription for this store.
    ///
    /// Returns `true` only on the first call; the caller then owns attaching
    /// the change listener. Every later call returns `false`.
    pub fn mark_subscribed(&mut self) -> bool {
        if self.subscribed {
            return false;
        }
        self.subscribed = true;
        true
    }
}

impl std::fmt::Debug for StoreRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRecord")
            .field("store_id", &self.store_id)
            .field("subscribed", &self.subscribed)
            .field("subscribed_pages", &self.subscribed_pages)
            .finish()
    }
}
