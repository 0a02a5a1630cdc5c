use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;
use super::product::normalize;

pub type ExpenseId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpenseCategory {
    #[serde(rename = "Supplier Purchase")]
    SupplierPurchase,
    Utilities,
    Rent,
    Salaries,
    Transportation,
    Maintenance,
    Marketing,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 8] = [
        ExpenseCategory::SupplierPurchase,
        ExpenseCategory::Utilities,
        ExpenseCategory::Rent,
        ExpenseCategory::Salaries,
        ExpenseCategory::Transportation,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Marketing,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::SupplierPurchase => "Supplier Purchase",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Rent => "Rent",
            ExpenseCategory::Salaries => "Salaries",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::Marketing => "Marketing",
            ExpenseCategory::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let key = normalize(s);
        Self::ALL.into_iter().find(|c| normalize(c.as_str()) == key)
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub category: ExpenseCategory,
    /// Amount paid, never negative
    pub amount: Cents,
    /// When the expense was incurred
    pub timestamp: DateTime<Utc>,
    pub recorded_by: String,
}

impl Expense {
    pub fn new(
        description: impl Into<String>,
        category: ExpenseCategory,
        amount: Cents,
        timestamp: DateTime<Utc>,
        recorded_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            category,
            amount,
            timestamp,
            recorded_by: recorded_by.into(),
        }
    }

    pub fn reference(&self) -> String {
        format!("EXP-{}", self.id)
    }
}
