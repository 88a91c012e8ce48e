use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pocketshop_core::{Aggregate, DomainError, ProductId, entity::position_of};
use pocketshop_events::Event;

use crate::product::{Product, ProductCandidate};

/// Capacity used when nothing else is configured.
pub const DEFAULT_MAX_PRODUCTS: usize = 5;

/// The product list and its capacity.
///
/// Items keep insertion order; updates never move an entry. Serializable for
/// export only: a deserialized list would bypass the capacity and id checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductsState {
    items: Vec<Product>,
    max_products: usize,
    #[serde(skip)]
    version: u64,
}

impl ProductsState {
    pub fn new(max_products: usize) -> Self {
        Self {
            items: Vec::new(),
            max_products,
            version: 0,
        }
    }

    pub fn items(&self) -> &[Product] {
        &self.items
    }

    pub fn max_products(&self) -> usize {
        self.max_products
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_products
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.items.iter().find(|p| p.id() == id)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }
}

impl Default for ProductsState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PRODUCTS)
    }
}

/// Command: AddProduct.
///
/// Id and timestamp are chosen by the caller so that `handle` stays pure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddProduct {
    pub product_id: ProductId,
    pub candidate: ProductCandidate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveProduct {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateProduct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub product_id: ProductId,
    pub candidate: ProductCandidate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductCommand {
    AddProduct(AddProduct),
    RemoveProduct(RemoveProduct),
    UpdateProduct(UpdateProduct),
}

/// Event: ProductAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAdded {
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductRemoved. Carries the product as it was just before removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRemoved {
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductUpdated. Carries the product as it is after the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdated {
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductAdded(ProductAdded),
    ProductRemoved(ProductRemoved),
    ProductUpdated(ProductUpdated),
}

impl ProductEvent {
    pub fn product(&self) -> &Product {
        match self {
            ProductEvent::ProductAdded(e) => &e.product,
            ProductEvent::ProductRemoved(e) => &e.product,
            ProductEvent::ProductUpdated(e) => &e.product,
        }
    }
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductAdded(_) => "products.product.added",
            ProductEvent::ProductRemoved(_) => "products.product.removed",
            ProductEvent::ProductUpdated(_) => "products.product.updated",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductAdded(e) => e.occurred_at,
            ProductEvent::ProductRemoved(e) => e.occurred_at,
            ProductEvent::ProductUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ProductsState {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductAdded(e) => {
                self.items.push(e.product.clone());
            }
            ProductEvent::ProductRemoved(e) => {
                self.items.retain(|p| p.id() != e.product.id());
            }
            ProductEvent::ProductUpdated(e) => {
                if let Some(idx) = position_of(&self.items, e.product.id()) {
                    self.items[idx].replace_details(e.product.details());
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::AddProduct(cmd) => self.handle_add(cmd),
            ProductCommand::RemoveProduct(cmd) => Ok(self.handle_remove(cmd)),
            ProductCommand::UpdateProduct(cmd) => self.handle_update(cmd),
        }
    }
}

impl ProductsState {
    fn ensure_name(candidate: &ProductCandidate) -> Result<(), DomainError> {
        // Candidates built through the constructors can't be blank, but a
        // deserialized one can.
        if candidate.name().trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(())
    }

    fn handle_add(&self, cmd: &AddProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.is_full() {
            return Err(DomainError::limit_reached(self.max_products));
        }
        if self.contains(cmd.product_id) {
            return Err(DomainError::conflict(format!(
                "product id {} already in use",
                cmd.product_id
            )));
        }
        Self::ensure_name(&cmd.candidate)?;

        Ok(vec![ProductEvent::ProductAdded(ProductAdded {
            product: Product::new(cmd.product_id, cmd.candidate.clone(), cmd.occurred_at),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveProduct) -> Vec<ProductEvent> {
        match self.get(cmd.product_id) {
            Some(product) => vec![ProductEvent::ProductRemoved(ProductRemoved {
                product: product.clone(),
                occurred_at: cmd.occurred_at,
            })],
            None => vec![],
        }
    }

    fn handle_update(&self, cmd: &UpdateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        let Some(existing) = self.get(cmd.product_id) else {
            return Ok(vec![]);
        };
        Self::ensure_name(&cmd.candidate)?;

        Ok(vec![ProductEvent::ProductUpdated(ProductUpdated {
            product: existing.with_details(cmd.candidate.clone()),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pocketshop_events::execute;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn candidate(name: &str, price: &str) -> ProductCandidate {
        ProductCandidate::parse(name, price, format!("img://{name}")).unwrap()
    }

    fn add_cmd(id: u64, name: &str) -> ProductCommand {
        ProductCommand::AddProduct(AddProduct {
            product_id: ProductId::from_raw(id),
            candidate: candidate(name, "1.00"),
            occurred_at: test_time(),
        })
    }

    #[test]
    fn add_product_emits_product_added_event() {
        let state = ProductsState::default();
        let events = state.handle(&add_cmd(1, "Widget")).unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            ProductEvent::ProductAdded(e) => {
                assert_eq!(e.product.id(), ProductId::from_raw(1));
                assert_eq!(e.product.name(), "Widget");
                assert_eq!(e.product.created_at(), test_time());
            }
            _ => panic!("Expected ProductAdded event"),
        }
    }

    #[test]
    fn add_product_rejects_when_full() {
        let mut state = ProductsState::new(2);
        execute(&mut state, &add_cmd(1, "a")).unwrap();
        execute(&mut state, &add_cmd(2, "b")).unwrap();

        let err = state.handle(&add_cmd(3, "c")).unwrap_err();
        match err {
            DomainError::LimitReached { max_products } => assert_eq!(max_products, 2),
            _ => panic!("Expected LimitReached error"),
        }
    }

    #[test]
    fn add_product_rejects_duplicate_id() {
        let mut state = ProductsState::default();
        execute(&mut state, &add_cmd(1, "a")).unwrap();

        let err = state.handle(&add_cmd(1, "b")).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict error for duplicate id"),
        }
    }

    #[test]
    fn add_product_rejects_blank_deserialized_name() {
        let state = ProductsState::default();
        let blank: ProductCandidate = serde_json::from_value(serde_json::json!({
            "name": "  ",
            "price": "1",
            "photo": "img://1",
        }))
        .unwrap();

        let err = state
            .handle(&ProductCommand::AddProduct(AddProduct {
                product_id: ProductId::from_raw(1),
                candidate: blank,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for blank name"),
        }
    }

    #[test]
    fn remove_unknown_product_decides_nothing() {
        let state = ProductsState::default();
        let events = state
            .handle(&ProductCommand::RemoveProduct(RemoveProduct {
                product_id: ProductId::from_raw(99),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn update_unknown_product_decides_nothing() {
        let state = ProductsState::default();
        let events = state
            .handle(&ProductCommand::UpdateProduct(UpdateProduct {
                product_id: ProductId::from_raw(99),
                candidate: candidate("x", "2"),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn update_keeps_position_id_and_creation_time() {
        let mut state = ProductsState::default();
        execute(&mut state, &add_cmd(1, "a")).unwrap();
        execute(&mut state, &add_cmd(2, "b")).unwrap();
        execute(&mut state, &add_cmd(3, "c")).unwrap();

        let later = test_time() + chrono::Duration::hours(1);
        execute(
            &mut state,
            &ProductCommand::UpdateProduct(UpdateProduct {
                product_id: ProductId::from_raw(2),
                candidate: candidate("b2", "5.25"),
                occurred_at: later,
            }),
        )
        .unwrap();

        let names: Vec<&str> = state.items().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b2", "c"]);

        let updated = state.get(ProductId::from_raw(2)).unwrap();
        assert_eq!(updated.created_at(), test_time());
        assert_eq!(updated.price().as_str(), "5.25");
    }

    #[test]
    fn version_increments_on_apply() {
        let mut state = ProductsState::default();
        assert_eq!(state.version(), 0);

        execute(&mut state, &add_cmd(1, "a")).unwrap();
        assert_eq!(state.version(), 1);

        execute(
            &mut state,
            &ProductCommand::RemoveProduct(RemoveProduct {
                product_id: ProductId::from_raw(1),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(state.version(), 2);
        assert!(state.is_empty());
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let state = ProductsState::default();
        let cmd = add_cmd(1, "a");

        let events1 = state.handle(&cmd).unwrap();
        let events2 = state.handle(&cmd).unwrap();

        assert!(state.is_empty());
        assert_eq!(state.version(), 0);
        assert_eq!(events1, events2);
    }

    #[test]
    fn event_types_are_stable() {
        let mut state = ProductsState::default();
        let added = execute(&mut state, &add_cmd(1, "a")).unwrap();
        assert_eq!(added[0].event_type(), "products.product.added");
        assert_eq!(added[0].occurred_at(), test_time());
    }
}
