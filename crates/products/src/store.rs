//! The product store: single writer of the product list.

use std::sync::Arc;

use pocketshop_core::{DomainError, DomainResult, IdGenerator, ProductId, SequentialIds};
use pocketshop_events::{Event, EventBus, InMemoryEventBus, Subscription, execute};

use crate::clock::{Clock, SystemClock};
use crate::product::{Product, ProductCandidate};
use crate::state::{
    AddProduct, DEFAULT_MAX_PRODUCTS, ProductCommand, ProductEvent, ProductsState, RemoveProduct,
    UpdateProduct,
};

/// Result of [`ProductStore::add`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Product),
    /// The store already holds `max_products` items; nothing changed.
    LimitReached { max_products: usize },
    /// The candidate broke an invariant the store checks itself (e.g. an
    /// id generator handed out a duplicate). Nothing changed.
    Rejected(DomainError),
}

impl AddOutcome {
    pub fn product(&self) -> Option<&Product> {
        match self {
            AddOutcome::Added(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_limit_reached(&self) -> bool {
        matches!(self, AddOutcome::LimitReached { .. })
    }
}

/// Result of [`ProductStore::remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    Removed(Product),
    NotFound,
}

/// Result of [`ProductStore::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Product),
    NotFound,
    Rejected(DomainError),
}

/// In-memory product store.
///
/// Owns the authoritative [`ProductsState`]; every change goes through
/// [`add`](Self::add), [`remove`](Self::remove) or [`update`](Self::update),
/// and every applied change is published to subscribers.
pub struct ProductStore {
    state: ProductsState,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    bus: InMemoryEventBus<ProductEvent>,
}

impl core::fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProductStore")
            .field("state", &self.state)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl ProductStore {
    pub fn new(max_products: usize) -> Self {
        Self {
            state: ProductsState::new(max_products),
            clock: Arc::new(SystemClock),
            ids: Arc::new(SequentialIds::new()),
            bus: InMemoryEventBus::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_PRODUCTS)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Append a new product unless the store is full.
    #[tracing::instrument(level = "debug", skip_all, fields(name = candidate.name()))]
    pub fn add(&mut self, candidate: ProductCandidate) -> AddOutcome {
        if self.state.is_full() {
            tracing::info!(
                max_products = self.state.max_products(),
                "product limit reached; add ignored"
            );
            return AddOutcome::LimitReached {
                max_products: self.state.max_products(),
            };
        }

        let cmd = ProductCommand::AddProduct(AddProduct {
            product_id: self.ids.next_id(),
            candidate,
            occurred_at: self.clock.now(),
        });

        match self.dispatch(&cmd) {
            Ok(events) => match events.into_iter().next() {
                Some(ProductEvent::ProductAdded(e)) => AddOutcome::Added(e.product),
                _ => AddOutcome::Rejected(DomainError::invariant("add emitted no product")),
            },
            Err(DomainError::LimitReached { max_products }) => {
                AddOutcome::LimitReached { max_products }
            }
            Err(err) => AddOutcome::Rejected(err),
        }
    }

    /// Remove the product with `id`; absent ids are a no-op.
    #[tracing::instrument(level = "debug", skip_all, fields(product_id = %id))]
    pub fn remove(&mut self, id: ProductId) -> RemoveOutcome {
        let cmd = ProductCommand::RemoveProduct(RemoveProduct {
            product_id: id,
            occurred_at: self.clock.now(),
        });

        match self.dispatch(&cmd) {
            Ok(events) => match events.into_iter().next() {
                Some(ProductEvent::ProductRemoved(e)) => RemoveOutcome::Removed(e.product),
                _ => RemoveOutcome::NotFound,
            },
            // Removal never decides an error.
            Err(_) => RemoveOutcome::NotFound,
        }
    }

    /// Replace name, price and photo of the product with the same id.
    ///
    /// The supplied `id` selects the entry; its `created_at` is ignored and the
    /// stored one is kept. Absent ids are a no-op.
    #[tracing::instrument(level = "debug", skip_all, fields(product_id = %product.id()))]
    pub fn update(&mut self, product: Product) -> UpdateOutcome {
        let cmd = ProductCommand::UpdateProduct(UpdateProduct {
            product_id: product.id(),
            candidate: product.details(),
            occurred_at: self.clock.now(),
        });

        match self.dispatch(&cmd) {
            Ok(events) => match events.into_iter().next() {
                Some(ProductEvent::ProductUpdated(e)) => UpdateOutcome::Updated(e.product),
                _ => UpdateOutcome::NotFound,
            },
            Err(err) => UpdateOutcome::Rejected(err),
        }
    }

    /// Subscribe to every change applied from now on.
    pub fn subscribe(&self) -> Subscription<ProductEvent> {
        self.bus.subscribe()
    }

    pub fn items(&self) -> &[Product] {
        self.state.items()
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.state.get(id)
    }

    /// Like [`get`](Self::get) but as a domain result.
    pub fn require(&self, id: ProductId) -> DomainResult<&Product> {
        self.state.get(id).ok_or_else(DomainError::not_found)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn max_products(&self) -> usize {
        self.state.max_products()
    }

    pub fn is_full(&self) -> bool {
        self.state.is_full()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.state.max_products().saturating_sub(self.state.len())
    }

    /// Sum of all prices, capped at `f64::MAX`.
    pub fn total_value(&self) -> f64 {
        let total: f64 = self.state.items().iter().map(|p| p.price().amount()).sum();
        total.min(f64::MAX)
    }

    /// Owned copy of the current state, for rendering or export.
    pub fn snapshot(&self) -> ProductsState {
        self.state.clone()
    }

    fn dispatch(&mut self, cmd: &ProductCommand) -> DomainResult<Vec<ProductEvent>> {
        let events = execute(&mut self.state, cmd)?;

        for event in &events {
            tracing::info!(
                event_type = event.event_type(),
                product_id = %event.product().id(),
                items = self.state.len(),
                max_products = self.state.max_products(),
                "product change applied"
            );
            if let Err(err) = self.bus.publish(event.clone()) {
                tracing::warn!(?err, "failed to publish product change");
            }
        }

        Ok(events)
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use pocketshop_core::Entity;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    fn candidate(name: &str, price: &str, photo: &str) -> ProductCandidate {
        ProductCandidate::parse(name, price, photo).unwrap()
    }

    fn test_store() -> (ProductStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(test_time()));
        let store = ProductStore::with_defaults().with_clock(clock.clone());
        (store, clock)
    }

    fn added(outcome: AddOutcome) -> Product {
        match outcome {
            AddOutcome::Added(p) => p,
            other => panic!("Expected Added outcome, got {other:?}"),
        }
    }

    #[test]
    fn add_then_remove_leaves_store_empty() {
        let (mut store, _) = test_store();
        let widget = added(store.add(candidate("Widget", "9.99", "img://1")));
        assert_eq!(store.len(), 1);

        let outcome = store.remove(widget.id());
        assert_eq!(outcome, RemoveOutcome::Removed(widget.clone()));
        assert!(store.is_empty());
        assert!(store.get(widget.id()).is_none());
    }

    #[test]
    fn sixth_add_reports_limit_and_keeps_five() {
        let (mut store, _) = test_store();
        for i in 0..5 {
            added(store.add(candidate(&format!("p{i}"), "1", &format!("img://{i}"))));
        }
        assert_eq!(store.len(), 5);
        assert!(store.is_full());

        let outcome = store.add(candidate("extra", "1", "img://x"));
        assert_eq!(outcome, AddOutcome::LimitReached { max_products: 5 });
        assert!(outcome.is_limit_reached());
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn add_stamps_creation_time_from_clock() {
        let (mut store, clock) = test_store();
        clock.advance(Duration::minutes(3));
        let p = added(store.add(candidate("Widget", "1", "img://1")));
        assert_eq!(p.created_at(), test_time() + Duration::minutes(3));
    }

    #[test]
    fn ids_differ_even_when_clock_stands_still() {
        let (mut store, _) = test_store();
        let a = added(store.add(candidate("a", "1", "img://a")));
        let b = added(store.add(candidate("b", "1", "img://b")));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.created_at(), b.created_at());
    }

    #[test]
    fn remove_absent_id_is_idempotent_no_op() {
        let (mut store, _) = test_store();
        added(store.add(candidate("a", "1", "img://a")));
        let before = store.snapshot();

        assert_eq!(store.remove(ProductId::from_raw(999)), RemoveOutcome::NotFound);
        assert_eq!(store.remove(ProductId::from_raw(999)), RemoveOutcome::NotFound);
        assert_eq!(store.items(), before.items());
    }

    #[test]
    fn update_absent_id_leaves_items_unchanged() {
        let (mut store, _) = test_store();
        let a = added(store.add(candidate("a", "1", "img://a")));
        let before = store.snapshot();

        let ghost = Product::new(ProductId::from_raw(999), a.details(), test_time());
        assert_eq!(store.update(ghost), UpdateOutcome::NotFound);
        assert_eq!(store.items(), before.items());
    }

    #[test]
    fn update_changes_only_editable_fields() {
        let (mut store, clock) = test_store();
        let original = added(store.add(candidate("Widget", "9.99", "img://1")));

        clock.advance(Duration::days(1));
        // A caller-supplied creation time is ignored.
        let edited = Product::new(
            original.id(),
            candidate("Gadget", "12.00", "img://2"),
            test_time() + Duration::days(30),
        );
        let updated = match store.update(edited) {
            UpdateOutcome::Updated(p) => p,
            other => panic!("Expected Updated outcome, got {other:?}"),
        };

        assert_eq!(updated.id(), original.id());
        assert_eq!(updated.created_at(), original.created_at());
        assert_eq!(updated.name(), "Gadget");
        assert_eq!(updated.price().as_str(), "12.00");
        assert_eq!(updated.photo().as_str(), "img://2");
        assert_eq!(store.get(original.id()), Some(&updated));
    }

    #[test]
    fn duplicate_ids_from_generator_are_rejected() {
        #[derive(Debug)]
        struct Stuck;
        impl IdGenerator for Stuck {
            fn next_id(&self) -> ProductId {
                ProductId::from_raw(1)
            }
        }

        let mut store = ProductStore::with_defaults().with_ids(Arc::new(Stuck));
        added(store.add(candidate("a", "1", "img://a")));
        match store.add(candidate("b", "1", "img://b")) {
            AddOutcome::Rejected(DomainError::Conflict(_)) => {}
            other => panic!("Expected Rejected(Conflict), got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn subscribers_see_changes_in_order() {
        let (mut store, _) = test_store();
        let changes = store.subscribe();

        let p = added(store.add(candidate("a", "1", "img://a")));
        store.update(p.with_details(candidate("a2", "2", "img://a")));
        store.remove(p.id());
        store.remove(p.id());

        let kinds: Vec<&str> = changes.drain().iter().map(|e| e.event_type()).collect();
        assert_eq!(
            kinds,
            vec![
                "products.product.added",
                "products.product.updated",
                "products.product.removed",
            ]
        );
    }

    #[test]
    fn rejected_add_publishes_nothing() {
        let mut store = ProductStore::new(1);
        added(store.add(candidate("a", "1", "img://a")));
        let changes = store.subscribe();

        assert!(store.add(candidate("b", "1", "img://b")).is_limit_reached());
        assert!(changes.drain().is_empty());
    }

    #[test]
    fn total_value_sums_prices() {
        let (mut store, _) = test_store();
        store.add(candidate("a", "9.99", "img://a"));
        store.add(candidate("b", "0.01", "img://b"));
        assert!((store.total_value() - 10.0).abs() < 1e-9);
        assert_eq!(store.remaining_capacity(), 3);
    }

    #[test]
    fn total_value_stays_finite_for_huge_prices() {
        let (mut store, _) = test_store();
        store.add(candidate("a", "1e308", "img://a"));
        store.add(candidate("b", "1e308", "img://b"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_value(), f64::MAX);
    }

    #[test]
    fn require_reports_not_found() {
        let (store, _) = test_store();
        assert_eq!(store.require(ProductId::from_raw(1)), Err(DomainError::NotFound));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Remove(usize),
        Update(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Add),
            1 => (0usize..8).prop_map(Op::Remove),
            1 => (0usize..8).prop_map(Op::Update),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of operations the store never exceeds its
        /// bound, ids stay unique, and updates never move or re-stamp entries.
        #[test]
        fn invariants_hold_for_any_operation_sequence(
            max in 1usize..7,
            ops in prop::collection::vec(op(), 0..40),
        ) {
            let mut store = ProductStore::new(max)
                .with_clock(Arc::new(ManualClock::new(test_time())));
            let mut ever_issued = std::collections::HashSet::new();

            for (n, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Add => {
                        let was_full = store.is_full();
                        let before = store.len();
                        let outcome = store.add(candidate(&format!("p{n}"), "1.5", "img://p"));
                        if was_full {
                            prop_assert!(outcome.is_limit_reached());
                            prop_assert_eq!(store.len(), before);
                        } else {
                            let p = outcome.product().cloned().unwrap();
                            prop_assert!(ever_issued.insert(p.id()));
                            prop_assert_eq!(store.len(), before + 1);
                        }
                    }
                    Op::Remove(i) => {
                        if let Some(id) = store.items().get(i).map(|p| p.id()) {
                            store.remove(id);
                            prop_assert!(store.get(id).is_none());
                        }
                    }
                    Op::Update(i) => {
                        if let Some(p) = store.items().get(i).cloned() {
                            store.update(p.with_details(candidate(&format!("u{n}"), "3", "img://u")));
                            prop_assert_eq!(store.items()[i].id(), p.id());
                            prop_assert_eq!(store.items()[i].created_at(), p.created_at());
                        }
                    }
                }

                prop_assert!(store.len() <= max);
                let ids: std::collections::HashSet<_> =
                    store.items().iter().map(Entity::id).collect();
                prop_assert_eq!(ids.len(), store.len());
            }
        }
    }
}
