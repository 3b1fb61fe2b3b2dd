//! Product entity model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::error::FieldErrors;
use storefront_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Plain text; tags are stripped on write.
    pub short_description: Option<String>,
    pub sku: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub min_stock_level: i32,
    pub weight: Option<Decimal>,
    pub dimensions: Option<serde_json::Value>,
    pub brand: Option<String>,
    pub tags: Option<serde_json::Value>,
    pub is_featured: bool,
    pub is_active: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub category_id: Option<DbId>,
    pub agent_id: Option<DbId>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    /// Sale price when set, otherwise the list price.
    pub fn effective_price(&self) -> Decimal {
        self.sale_price.unwrap_or(self.price)
    }

    pub fn is_on_sale(&self) -> bool {
        matches!(self.sale_price, Some(sale) if sale < self.price)
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }
}

/// DTO for creating a product. The slug is derived from `name` and the agent
/// is the authenticated caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub short_description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
    pub weight: Option<Decimal>,
    pub dimensions: Option<serde_json::Value>,
    #[validate(length(max = 255))]
    pub brand: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
    pub category_id: Option<DbId>,
}

impl CreateProduct {
    /// Monetary checks the derive cannot express: amounts are non-negative
    /// and a sale price is below the list price.
    pub fn amount_errors(&self) -> FieldErrors {
        amount_errors(Some(self.price), self.sale_price, self.weight)
    }
}

/// DTO for updating a product. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub short_description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_quantity: Option<i32>,
    #[validate(range(min = 0))]
    pub min_stock_level: Option<i32>,
    pub weight: Option<Decimal>,
    pub dimensions: Option<serde_json::Value>,
    #[validate(length(max = 255))]
    pub brand: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    #[validate(length(max = 255))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
    pub category_id: Option<DbId>,
}

impl UpdateProduct {
    /// Same checks as [`CreateProduct::amount_errors`]; a sale price is
    /// compared against the new price when one is given, else `current_price`.
    pub fn amount_errors(&self, current_price: Decimal) -> FieldErrors {
        amount_errors(
            Some(self.price.unwrap_or(current_price)),
            self.sale_price,
            self.weight,
        )
    }
}

fn amount_errors(
    price: Option<Decimal>,
    sale_price: Option<Decimal>,
    weight: Option<Decimal>,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let mut push = |field: &str, message: String| {
        errors.entry(field.to_string()).or_default().push(message);
    };

    for (field, value) in [("price", price), ("sale_price", sale_price), ("weight", weight)] {
        if matches!(value, Some(v) if v.is_sign_negative() && !v.is_zero()) {
            push(field, format!("The {field} must be at least 0."));
        }
    }
    if let (Some(price), Some(sale)) = (price, sale_price) {
        if sale >= price {
            push(
                "sale_price",
                "The sale_price must be less than price.".to_string(),
            );
        }
    }
    errors
}
