use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, percentage};

pub type ProductId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductCategory {
    Food,
    #[serde(rename = "Non-Food")]
    NonFood,
    Beverages,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    Household,
    Snacks,
    Other,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 7] = [
        ProductCategory::Food,
        ProductCategory::NonFood,
        ProductCategory::Beverages,
        ProductCategory::PersonalCare,
        ProductCategory::Household,
        ProductCategory::Snacks,
        ProductCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Food => "Food",
            ProductCategory::NonFood => "Non-Food",
            ProductCategory::Beverages => "Beverages",
            ProductCategory::PersonalCare => "Personal Care",
            ProductCategory::Household => "Household",
            ProductCategory::Snacks => "Snacks",
            ProductCategory::Other => "Other",
        }
    }

    /// Lenient lookup: case-insensitive, with spaces, dashes and underscores
    /// treated alike ("personal_care" and "Personal Care" both match).
    pub fn from_str(s: &str) -> Option<Self> {
        let key = normalize(s);
        Self::ALL.into_iter().find(|c| normalize(c.as_str()) == key)
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub(crate) fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '_' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// A stocked item. Price and cost are per unit and never negative;
/// validation happens in the service before a product is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub category: ProductCategory,
    /// Selling price per unit
    pub price: Cents,
    /// Acquisition cost per unit
    pub cost: Cents,
    pub stock: u32,
    /// Stock level at or below which the product needs restocking
    pub reorder_point: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        sku: impl Into<String>,
        category: ProductCategory,
        price: Cents,
        cost: Cents,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sku: sku.into(),
            barcode: None,
            category,
            price,
            cost,
            stock: 0,
            reorder_point: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_reorder_point(mut self, reorder_point: u32) -> Self {
        self.reorder_point = reorder_point;
        self
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.reorder_point
    }

    /// Markup over cost as a share of the selling price.
    pub fn margin_percentage(&self) -> f64 {
        percentage(self.price - self.cost, self.price)
    }

    /// Value of the units on hand at current unit cost.
    pub fn stock_value(&self) -> Cents {
        self.cost * Cents::from(self.stock)
    }

    /// Case-insensitive match against name, SKU or barcode.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.sku.to_lowercase().contains(&query)
            || self
                .barcode
                .as_deref()
                .is_some_and(|b| b.to_lowercase().contains(&query))
    }
}
