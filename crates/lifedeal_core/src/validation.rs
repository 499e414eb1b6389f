//! crates/lifedeal_core/src/validation.rs
//!
//! Turns raw form input into validated payloads.
//!
//! Validation collects every violation in one pass and returns them together,
//! so a form can highlight all problems at once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Category, Deal, NewCategory, NewDeal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldErrorKind {
    RequiredField,
    InvalidValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

/// Field-keyed violations. Keys are the camelCase form field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct ValidationErrors(BTreeMap<String, FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.0.get(field)
    }

    /// A single `RequiredField` violation.
    pub fn required_field(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.required(field, message);
        errors
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn required(&mut self, field: &str, message: &str) {
        self.insert(field, FieldErrorKind::RequiredField, message);
    }

    fn invalid(&mut self, field: &str, message: &str) {
        self.insert(field, FieldErrorKind::InvalidValue, message);
    }

    fn insert(&mut self, field: &str, kind: FieldErrorKind, message: &str) {
        // First violation per field wins.
        self.0.entry(field.to_string()).or_insert_with(|| FieldError {
            kind,
            message: message.to_string(),
        });
    }

    fn into_result<T>(self, value: Option<T>) -> Result<T, Self> {
        match value {
            Some(value) if self.is_empty() => Ok(value),
            _ => Err(self),
        }
    }
}

//=========================================================================================
// Deal Form
//=========================================================================================

/// Raw deal form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealForm {
    pub name: String,
    pub price: String,
    pub category: String,
    pub purchase_date: String,
    pub description: String,
    pub url: String,
    pub notes: String,
}

impl DealForm {
    /// Prefills the form for editing an existing deal.
    pub fn from_deal(deal: &Deal) -> Self {
        Self {
            name: deal.name.clone(),
            price: deal.price.to_string(),
            category: deal.category.clone(),
            purchase_date: deal.purchase_date.format("%Y-%m-%d").to_string(),
            description: deal.description.clone(),
            url: deal.url.clone().unwrap_or_default(),
            notes: deal.notes.clone(),
        }
    }

    /// Validates the field rules alone.
    pub fn validate(&self) -> Result<NewDeal, ValidationErrors> {
        self.check(None)
    }

    /// Validates the field rules and that `category` names an existing category.
    pub fn validate_against(&self, categories: &[Category]) -> Result<NewDeal, ValidationErrors> {
        self.check(Some(categories))
    }

    fn check(&self, categories: Option<&[Category]>) -> Result<NewDeal, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.required("name", "Deal name is required");
        }

        let price = parse_price(&self.price);
        if price.is_none() {
            errors.invalid("price", "Price must be greater than 0");
        }

        let category = self.category.trim();
        if category.is_empty() {
            errors.required("category", "Category is required");
        } else if let Some(categories) = categories {
            if !categories.iter().any(|c| c.name == category) {
                errors.invalid("category", "Category does not exist");
            }
        }

        let purchase_date = self.purchase_date.trim();
        let parsed_date = if purchase_date.is_empty() {
            errors.required("purchaseDate", "Purchase date is required");
            None
        } else {
            let parsed = NaiveDate::parse_from_str(purchase_date, "%Y-%m-%d").ok();
            if parsed.is_none() {
                errors.invalid("purchaseDate", "Purchase date must be a valid date");
            }
            parsed
        };

        let payload = match (price, parsed_date) {
            (Some(price), Some(purchase_date)) => Some(NewDeal {
                name: name.to_string(),
                price,
                purchase_date,
                category: category.to_string(),
                description: self.description.clone(),
                url: Some(self.url.trim())
                    .filter(|u| !u.is_empty())
                    .map(str::to_string),
                notes: self.notes.clone(),
            }),
            _ => None,
        };
        errors.into_result(payload)
    }
}

/// A strictly positive, finite decimal.
fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

//=========================================================================================
// Category Form
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
}

impl CategoryForm {
    /// Category names must be non-empty and unique within `existing`.
    pub fn validate(&self, existing: &[Category]) -> Result<NewCategory, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let name = self.name.trim();

        if name.is_empty() {
            errors.required("name", "Category name is required");
        } else if existing.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            errors.invalid("name", "Category already exists");
        }

        errors.into_result(Some(NewCategory {
            name: name.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordId;

    fn form(name: &str, price: &str, category: &str, purchase_date: &str) -> DealForm {
        DealForm {
            name: name.to_string(),
            price: price.to_string(),
            category: category.to_string(),
            purchase_date: purchase_date.to_string(),
            ..DealForm::default()
        }
    }

    #[test]
    fn empty_name_is_the_only_error() {
        let errors = form("", "10", "X", "2024-01-01").validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("name").unwrap().kind, FieldErrorKind::RequiredField);
    }

    #[test]
    fn whitespace_name_is_required() {
        let errors = form("   ", "10", "X", "2024-01-01").validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn zero_price_is_the_only_error() {
        let errors = form("A", "0", "X", "2024-01-01").validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("price").unwrap().kind, FieldErrorKind::InvalidValue);
    }

    #[test]
    fn non_numeric_and_negative_prices_are_invalid() {
        for price in ["", "abc", "-5", "NaN", "inf"] {
            let errors = form("A", price, "X", "2024-01-01").validate().unwrap_err();
            assert!(errors.get("price").is_some(), "price {price:?} accepted");
        }
    }

    #[test]
    fn every_violation_is_reported_together() {
        let errors = DealForm::default().validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["category", "name", "price", "purchaseDate"]
        );
        assert_eq!(
            errors.get("purchaseDate").unwrap().kind,
            FieldErrorKind::RequiredField
        );
    }

    #[test]
    fn valid_form_yields_a_typed_payload() {
        let mut raw = form("Tool", "49.99", "Design", "2024-03-01");
        raw.url = "  ".to_string();

        let deal = raw.validate().unwrap();

        assert!((deal.price - 49.99).abs() < f64::EPSILON);
        assert_eq!(deal.purchase_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(deal.url, None);
        assert_eq!(
            serde_json::to_value(&deal).unwrap()["purchaseDate"],
            serde_json::json!("2024-03-01")
        );
    }

    #[test]
    fn malformed_date_is_invalid() {
        let errors = form("A", "1", "X", "03/01/2024").validate().unwrap_err();
        assert_eq!(
            errors.get("purchaseDate").unwrap().kind,
            FieldErrorKind::InvalidValue
        );
    }

    #[test]
    fn category_must_exist_when_checked_against_the_set() {
        let categories = vec![Category {
            id: RecordId::new(1),
            name: "Design".to_string(),
            deal_count: 0,
        }];

        assert!(form("A", "1", "Design", "2024-01-01")
            .validate_against(&categories)
            .is_ok());
        let errors = form("A", "1", "Nope", "2024-01-01")
            .validate_against(&categories)
            .unwrap_err();
        assert_eq!(errors.get("category").unwrap().kind, FieldErrorKind::InvalidValue);
    }

    #[test]
    fn category_names_are_required_and_unique() {
        let existing = vec![Category {
            id: RecordId::new(1),
            name: "Design".to_string(),
            deal_count: 0,
        }];

        assert!(CategoryForm::default().validate(&existing).is_err());
        assert!(CategoryForm {
            name: "design".to_string()
        }
        .validate(&existing)
        .is_err());
        assert_eq!(
            CategoryForm {
                name: " Travel ".to_string()
            }
            .validate(&existing)
            .unwrap()
            .name,
            "Travel"
        );
    }
}
