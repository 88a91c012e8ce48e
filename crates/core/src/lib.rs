//! `pocketshop-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no clocks, no UI).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::Aggregate;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{IdGenerator, ProductId, SequentialIds};
pub use value_object::{PhotoRef, Price, ValueObject};
