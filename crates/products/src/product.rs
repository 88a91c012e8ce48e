use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pocketshop_core::{DomainError, DomainResult, Entity, PhotoRef, Price, ProductId};

/// The user-editable part of a product: everything except id and creation time.
///
/// Holding a `ProductCandidate` means the name is non-blank, the price is
/// positive and the photo is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCandidate {
    name: String,
    price: Price,
    photo: PhotoRef,
}

impl ProductCandidate {
    pub fn new(name: impl Into<String>, price: Price, photo: PhotoRef) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self { name, price, photo })
    }

    /// Convenience constructor from raw strings.
    pub fn parse(
        name: impl Into<String>,
        price: impl Into<String>,
        photo: impl Into<String>,
    ) -> DomainResult<Self> {
        Self::new(name, Price::parse(price)?, PhotoRef::new(photo)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> &Price {
        &self.price
    }

    pub fn photo(&self) -> &PhotoRef {
        &self.photo
    }
}

/// A saved product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Price,
    photo: PhotoRef,
    created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(id: ProductId, candidate: ProductCandidate, created_at: DateTime<Utc>) -> Self {
        let ProductCandidate { name, price, photo } = candidate;
        Self {
            id,
            name,
            price,
            photo,
            created_at,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> &Price {
        &self.price
    }

    pub fn photo(&self) -> &PhotoRef {
        &self.photo
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Same identity and creation time, new editable fields.
    pub fn with_details(&self, candidate: ProductCandidate) -> Self {
        Self::new(self.id, candidate, self.created_at)
    }

    /// The editable fields of this product.
    pub fn details(&self) -> ProductCandidate {
        ProductCandidate {
            name: self.name.clone(),
            price: self.price.clone(),
            photo: self.photo.clone(),
        }
    }

    pub(crate) fn replace_details(&mut self, candidate: ProductCandidate) {
        self.name = candidate.name;
        self.price = candidate.price;
        self.photo = candidate.photo;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}
