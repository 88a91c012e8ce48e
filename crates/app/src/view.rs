//! Render snapshots: everything a screen needs, already formatted.

use chrono::{DateTime, Utc};

use pocketshop_core::ProductId;
use pocketshop_products::{FormErrors, FormField, Product, ProductForm};

pub const TITLE: &str = "Product Manager";
pub const EMPTY_TITLE: &str = "No products yet";
pub const EMPTY_TEXT: &str = "Start by adding your first product";
pub const EMPTY_ACTION: &str = "Add Your First Product";
pub const LIMIT_TITLE: &str = "Product Limit Reached!";

#[derive(Debug, Clone, PartialEq)]
pub struct ManagerView {
    pub title: &'static str,
    /// e.g. `"2/5 products"`.
    pub subtitle: String,
    pub add_enabled: bool,
    pub stats: Option<StatsView>,
    pub empty_state: Option<EmptyStateView>,
    pub cards: Vec<CardView>,
    pub form: Option<FormView>,
    pub notification: Option<NotificationView>,
    pub confirmation: Option<ConfirmationView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub count: usize,
    pub total_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyStateView {
    pub title: &'static str,
    pub text: &'static str,
    pub action: &'static str,
}

impl Default for EmptyStateView {
    fn default() -> Self {
        Self {
            title: EMPTY_TITLE,
            text: EMPTY_TEXT,
            action: EMPTY_ACTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub added: String,
    pub photo: String,
}

impl CardView {
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id(),
            name: product.name().to_string(),
            price: format_money(product.price().amount()),
            added: format!("Added {}", format_date(product.created_at())),
            photo: product.photo().as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub title: &'static str,
    pub submit_label: &'static str,
    pub values: ProductForm,
    pub errors: FormErrors,
}

impl FormView {
    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub title: &'static str,
    pub text: String,
}

impl NotificationView {
    pub fn limit_reached(max_products: usize) -> Self {
        Self {
            title: LIMIT_TITLE,
            text: format!(
                "You can only add up to {max_products} products. Remove some to add more."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationView {
    pub product_id: ProductId,
    pub title: &'static str,
    pub prompt: String,
}

impl ConfirmationView {
    pub fn delete(product: &Product) -> Self {
        Self {
            product_id: product.id(),
            title: "Delete Product",
            prompt: format!("Are you sure you want to delete \"{}\"?", product.name()),
        }
    }
}

/// `$` followed by the amount with two decimals.
pub fn format_money(amount: f64) -> String {
    format!("${amount:.2}")
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}
