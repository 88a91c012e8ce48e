//! Create/edit form validation.
//!
//! Validation is pure and reports every failing field at once so a form can
//! highlight all of them in a single pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pocketshop_core::{PhotoRef, Price};

use crate::product::{Product, ProductCandidate};

pub const NAME_REQUIRED: &str = "Product name is required";
pub const PRICE_INVALID: &str = "Valid price is required";
pub const PHOTO_REQUIRED: &str = "Product photo is required";

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Name,
    Price,
    Photo,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Price => "price",
            FormField::Photo => "photo",
        }
    }
}

impl core::fmt::Display for FormField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level error messages; only failing fields are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<FormField, String>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: FormField, message: &str) {
        self.0.insert(field, message.to_string());
    }
}

/// Raw form input as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub photo: Option<String>,
}

impl ProductForm {
    pub fn new(name: impl Into<String>, price: impl Into<String>, photo: Option<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            photo,
        }
    }

    /// Pre-filled form for editing an existing product.
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name().to_string(),
            price: product.price().as_str().to_string(),
            photo: Some(product.photo().as_str().to_string()),
        }
    }

    pub fn validate(&self) -> FormErrors {
        validate(self)
    }

    /// Turn valid input into a typed candidate, or report every failing field.
    pub fn into_candidate(self) -> Result<ProductCandidate, FormErrors> {
        let mut errors = FormErrors::default();

        if self.name.trim().is_empty() {
            errors.insert(FormField::Name, NAME_REQUIRED);
        }

        let price = Price::parse(self.price).ok();
        if price.is_none() {
            errors.insert(FormField::Price, PRICE_INVALID);
        }

        let photo = self.photo.and_then(|uri| PhotoRef::new(uri).ok());
        if photo.is_none() {
            errors.insert(FormField::Photo, PHOTO_REQUIRED);
        }

        match (price, photo) {
            (Some(price), Some(photo)) if errors.is_empty() => {
                ProductCandidate::new(self.name, price, photo).map_err(|_| {
                    let mut errors = FormErrors::default();
                    errors.insert(FormField::Name, NAME_REQUIRED);
                    errors
                })
            }
            _ => Err(errors),
        }
    }
}

/// Check a form without consuming it.
pub fn validate(form: &ProductForm) -> FormErrors {
    match form.clone().into_candidate() {
        Ok(_) => FormErrors::default(),
        Err(errors) => errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn form(name: &str, price: &str, photo: Option<&str>) -> ProductForm {
        ProductForm::new(name, price, photo.map(str::to_string))
    }

    #[test]
    fn valid_form_has_no_errors() {
        let errors = form("Widget", "9.99", Some("img://1")).validate();
        assert!(errors.is_empty());
    }

    #[test]
    fn every_failing_field_is_reported_together() {
        let errors = form("   ", "abc", None).validate();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get(FormField::Name), Some(NAME_REQUIRED));
        assert_eq!(errors.get(FormField::Price), Some(PRICE_INVALID));
        assert_eq!(errors.get(FormField::Photo), Some(PHOTO_REQUIRED));
    }

    #[test]
    fn only_failing_fields_are_present() {
        let errors = form("Widget", "0", Some("img://1")).validate();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains(FormField::Price));
        assert!(!errors.contains(FormField::Name));
    }

    #[test]
    fn empty_price_is_invalid() {
        assert!(form("Widget", "", Some("img://1")).validate().contains(FormField::Price));
    }

    #[test]
    fn blank_photo_counts_as_missing() {
        assert!(form("Widget", "1", Some("")).validate().contains(FormField::Photo));
    }

    #[test]
    fn into_candidate_carries_typed_fields() {
        let candidate = form("Widget", "9.99", Some("img://1")).into_candidate().unwrap();
        assert_eq!(candidate.name(), "Widget");
        assert_eq!(candidate.price().as_str(), "9.99");
        assert_eq!(candidate.photo().as_str(), "img://1");
    }

    #[test]
    fn errors_serialize_keyed_by_field_name() {
        let errors = form("", "1", Some("img://1")).validate();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "name": NAME_REQUIRED }));
    }

    proptest! {
        #[test]
        fn whitespace_names_always_fail(name in "[ \t]{0,8}") {
            let errors = form(&name, "-1", None).validate();
            prop_assert!(errors.contains(FormField::Name));
            prop_assert!(errors.contains(FormField::Price));
            prop_assert!(errors.contains(FormField::Photo));
        }

        #[test]
        fn non_positive_prices_always_fail(value in -10_000i64..=0i64) {
            let errors = form("Widget", &value.to_string(), Some("img://1")).validate();
            prop_assert_eq!(errors.get(FormField::Price), Some(PRICE_INVALID));
            prop_assert_eq!(errors.len(), 1);
        }

        #[test]
        fn non_numeric_prices_always_fail(price in "[a-zA-Z]{1,6}") {
            let errors = form("Widget", &price, Some("img://1")).validate();
            prop_assert!(errors.contains(FormField::Price));
        }

        #[test]
        fn well_formed_input_always_passes(
            name in "[A-Za-z][A-Za-z0-9 ]{0,20}",
            cents in 1u32..1_000_000u32,
            photo in "img://[a-z0-9]{1,10}",
        ) {
            let price = format!("{}.{:02}", cents / 100, cents % 100);
            let errors = form(&name, &price, Some(photo.as_str())).validate();
            prop_assert!(errors.is_empty());
        }
    }
}
