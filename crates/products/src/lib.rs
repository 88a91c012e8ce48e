//! Products domain: the bounded product list and its form rules.
//!
//! Pure in-memory logic (no IO, no UI). The presentation layer owns a
//! [`ProductStore`], validates input with [`validate`] and renders from the
//! store's snapshot.

pub mod clock;
pub mod product;
pub mod state;
pub mod store;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use product::{Product, ProductCandidate};
pub use state::{
    AddProduct, DEFAULT_MAX_PRODUCTS, ProductAdded, ProductCommand, ProductEvent, ProductRemoved,
    ProductUpdated, ProductsState, RemoveProduct, UpdateProduct,
};
pub use store::{AddOutcome, ProductStore, RemoveOutcome, UpdateOutcome};
pub use validator::{FormErrors, FormField, ProductForm, validate};
