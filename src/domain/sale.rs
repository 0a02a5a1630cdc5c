use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Product, ProductId};

pub type SaleId = Uuid;

/// One line of a sale. Price and cost are copied from the product when the
/// sale is made so later product edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub price: Cents,
    pub cost: Cents,
}

impl SaleItem {
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            price: product.price,
            cost: product.cost,
        }
    }

    pub fn line_total(&self) -> Cents {
        self.price * Cents::from(self.quantity)
    }

    pub fn line_cost(&self) -> Cents {
        self.cost * Cents::from(self.quantity)
    }

    pub fn line_profit(&self) -> Cents {
        (self.price - self.cost) * Cents::from(self.quantity)
    }
}

/// A completed sale. Append-only: once recorded it is never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub items: Vec<SaleItem>,
    /// Σ price × quantity
    pub total: Cents,
    /// Σ (price − cost) × quantity
    pub gross_profit: Cents,
    pub timestamp: DateTime<Utc>,
    pub sold_by: String,
}

impl Sale {
    pub fn new(items: Vec<SaleItem>, sold_by: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let total = items.iter().map(SaleItem::line_total).sum();
        let gross_profit = items.iter().map(SaleItem::line_profit).sum();
        Self {
            id: Uuid::new_v4(),
            items,
            total,
            gross_profit,
            timestamp,
            sold_by: sold_by.into(),
        }
    }

    /// Σ cost × quantity over the items.
    pub fn cost_of_goods(&self) -> Cents {
        self.items.iter().map(SaleItem::line_cost).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Product names joined for journal and report descriptions.
    pub fn item_names(&self) -> String {
        self.items
            .iter()
            .map(|i| i.product_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// True when the stored totals agree with the items.
    pub fn is_consistent(&self) -> bool {
        self.total == self.items.iter().map(SaleItem::line_total).sum::<Cents>()
            && self.gross_profit == self.items.iter().map(SaleItem::line_profit).sum::<Cents>()
    }

    /// Invoice reference shown on receipts, journals and BIR exports.
    pub fn invoice_ref(&self) -> String {
        format!("INV-{}", self.id)
    }
}
