//! Registry of observed pages and stores.
//!
//! Owned by [`crate::bridge::ObservationHooks`] and mutated only from the
//! host's UI thread, so it carries no locks.

mod page;
mod store;

use std::collections::VecDeque;

use crate::host::{ComponentRef, StoreRef};

pub use page::{PageDescriptor, PageEntry};
pub use store::{StoreId, StoreRecord};

/// Mounted pages (newest first) and every store seen so far.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    pages: VecDeque<PageEntry>,
    /// Indexed by store id.
    stores: Vec<StoreRecord>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the front of the page list. Registering the same mount twice
    /// stores it twice.
    pub fn register_page(&mut self, entry: PageEntry) {
        tracing::debug!(
            page_id = %entry.descriptor.id,
            route = %entry.descriptor.route,
            "Registered page"
        );
        self.pages.push_front(entry);
    }

    /// Remove the first entry for `component`. No-op if it is not registered.
    pub fn unregister_page(&mut self, component: &ComponentRef) -> Option<PageEntry> {
        let idx = self.pages.iter().position(|p| p.is(component))?;
        let entry = self.pages.remove(idx)?;
        tracing::debug!(
            page_id = %entry.descriptor.id,
            route = %entry.descriptor.route,
            "Unregistered page"
        );
        Some(entry)
    }

    /// Mounted pages, most recently mounted first.
    pub fn pages(&self) -> impl Iterator<Item = &PageEntry> {
        self.pages.iter()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn find_page(&self, component: &ComponentRef) -> Option<&PageEntry> {
        self.pages.iter().find(|p| p.is(component))
    }

    pub fn is_registered(&self, component: &ComponentRef) -> bool {
        self.find_page(component).is_some()
    }

    /// Record for `store`, created with the next sequential id on first sight.
    pub fn resolve_store(&mut self, store: &StoreRef) -> &mut StoreRecord {
        let idx = match self.stores.iter().position(|r| r.is_for(store)) {
            Some(idx) => idx,
            None => {
                let idx = self.stores.len();
                self.stores
                    .push(StoreRecord::new(idx as StoreId, store.clone()));
                tracing::debug!(store_id = idx, "Tracking new store");
                idx
            }
        };
        &mut self.stores[idx]
    }

    /// Existing record for `store`, without creating one.
    pub fn lookup_store(&self, store: &StoreRef) -> Option<&StoreRecord> {
        self.stores.iter().find(|r| r.is_for(store))
    }

    pub fn store(&self, store_id: StoreId) -> Option<&StoreRecord> {
        self.stores.get(store_id as usize)
    }

    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Distinct stores referenced by mounted pages, in page order.
    pub fn mounted_stores(&self) -> Vec<&StoreRecord> {
        let mut out: Vec<&StoreRecord> = Vec::new();
        for page in &self.pages {
            let Some(store) = page.component.store() else {
                continue;
            };
            let Some(record) = self.lookup_store(&store) else {
                continue;
            };
            if !out.iter().any(|r| r.store_id() == record.store_id()) {
                out.push(record);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MockComponent, MockStore};

    fn page(route: &str, id: &str) -> (ComponentRef, PageEntry) {
        let component = MockComponent::page(route, id, 0).into_ref();
        let entry = PageEntry::new(PageDescriptor::new(id, route, 0), component.clone());
        (component, entry)
    }

    fn routes(registry: &EntityRegistry) -> Vec<String> {
        registry
            .pages()
            .map(|p| p.descriptor.route.clone())
            .collect()
    }

    #[test]
    fn pages_are_newest_first() {
        let mut registry = EntityRegistry::new();
        for (route, id) in [("p1", "1"), ("p2", "2"), ("p3", "3")] {
            registry.register_page(page(route, id).1);
        }
        assert_eq!(routes(&registry), vec!["p3", "p2", "p1"]);
    }

    #[test]
    fn unregister_removes_by_identity() {
        let mut registry = EntityRegistry::new();
        let (p1, e1) = page("p1", "1");
        let (_p2, e2) = page("p2", "2");
        registry.register_page(e1);
        registry.register_page(e2);

        let removed = registry.unregister_page(&p1).unwrap();
        assert_eq!(removed.descriptor.route, "p1");
        assert_eq!(routes(&registry), vec!["p2"]);
        assert!(!registry.is_registered(&p1));
    }

    #[test]
    fn unregister_unknown_is_noop() {
        let mut registry = EntityRegistry::new();
        let (_p1, e1) = page("p1", "1");
        registry.register_page(e1);

        // Same descriptor, different instance.
        let (stranger, _) = page("p1", "1");
        assert!(registry.unregister_page(&stranger).is_none());
        assert_eq!(registry.page_count(), 1);
    }

    #[test]
    fn duplicate_registration_is_kept_and_removed_one_at_a_time() {
        let mut registry = EntityRegistry::new();
        let (p1, e1) = page("p1", "1");
        registry.register_page(e1.clone());
        registry.register_page(e1);
        assert_eq!(registry.page_count(), 2);

        registry.unregister_page(&p1);
        assert_eq!(registry.page_count(), 1);
    }

    #[test]
    fn resolve_store_is_stable_and_sequential() {
        let mut registry = EntityRegistry::new();
        let a: StoreRef = MockStore::new().into_ref();
        let b: StoreRef = MockStore::new().into_ref();

        assert_eq!(registry.resolve_store(&a).store_id(), 0);
        assert_eq!(registry.resolve_store(&a).store_id(), 0);
        assert_eq!(registry.resolve_store(&b).store_id(), 1);
        assert_eq!(registry.resolve_store(&a).store_id(), 0);
        assert_eq!(registry.store_count(), 2);
    }

    #[test]
    fn mark_subscribed_claims_once() {
        let mut registry = EntityRegistry::new();
        let a: StoreRef = MockStore::new().into_ref();

        assert!(registry.resolve_store(&a).mark_subscribed());
        assert!(!registry.resolve_store(&a).mark_subscribed());
        assert!(!registry.resolve_store(&a).mark_subscribed());
        assert!(registry.store(0).unwrap().is_subscribed());
    }

    #[test]
    fn store_shared_by_two_pages_keeps_usage_order() {
        let mut registry = EntityRegistry::new();
        let store: StoreRef = MockStore::new().into_ref();
        let a = PageDescriptor::new("1", "pages/a", 0);
        let b = PageDescriptor::new("2", "pages/b", 1);

        let mut claims = 0;
        for desc in [&a, &b] {
            let record = registry.resolve_store(&store);
            record.record_page(desc.clone());
            if record.mark_subscribed() {
                claims += 1;
            }
        }

        let record = registry.store(0).unwrap();
        assert_eq!(claims, 1);
        assert_eq!(registry.store_count(), 1);
        assert_eq!(record.subscribed_pages(), &[a, b]);
        assert!(record.is_subscribed());
    }

    #[test]
    fn mounted_stores_are_deduplicated() {
        let mut registry = EntityRegistry::new();
        let shared: StoreRef = MockStore::new().into_ref();
        let other: StoreRef = MockStore::new().into_ref();

        for (route, store) in [("a", &shared), ("b", &other), ("c", &shared)] {
            let component = MockComponent::page(route, route, 0)
                .with_store(store.clone())
                .into_ref();
            registry.resolve_store(store);
            registry.register_page(PageEntry::new(
                PageDescriptor::new(route, route, 0),
                component,
            ));
        }

        let ids: Vec<_> = registry
            .mounted_stores()
            .iter()
            .map(|r| r.store_id())
            .collect();
        // Page order is c, b, a.
        assert_eq!(ids, vec![0, 1]);
    }
}
