use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountCode, Cents, Expense, ExpenseId, Sale, SaleId, expense_account_for};

/// One side of a journal entry: an account and the amount posted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account: AccountCode,
    pub amount: Cents,
}

impl JournalLine {
    pub fn new(account: AccountCode, amount: Cents) -> Self {
        Self { account, amount }
    }
}

/// The record a journal entry was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntrySource {
    Sale(SaleId),
    Expense(ExpenseId),
}

/// A double-entry record of one business event. Journal entries are derived
/// from sales and expenses on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    pub debits: Vec<JournalLine>,
    pub credits: Vec<JournalLine>,
    pub reference: String,
    pub source: EntrySource,
}

impl JournalEntry {
    #[allow(clippy::too_many_arguments)]
    fn simple(
        id: String,
        date: DateTime<Utc>,
        description: String,
        debit: AccountCode,
        credit: AccountCode,
        amount: Cents,
        reference: String,
        source: EntrySource,
    ) -> Self {
        Self {
            id,
            date,
            description,
            debits: vec![JournalLine::new(debit, amount)],
            credits: vec![JournalLine::new(credit, amount)],
            reference,
            source,
        }
    }

    pub fn total_debits(&self) -> Cents {
        self.debits.iter().map(|l| l.amount).sum()
    }

    pub fn total_credits(&self) -> Cents {
        self.credits.iter().map(|l| l.amount).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }
}

/// Derive the journal for a set of sales and expenses.
///
/// Every sale yields a revenue entry (Cash / Sales Revenue for the sale total)
/// followed by a cost entry (COGS / Inventory for Σ cost × quantity). Every
/// expense then yields one entry debiting its mapped expense account and
/// crediting Cash. Input order is kept; sorting is left to the caller.
pub fn derive_journal_entries(sales: &[Sale], expenses: &[Expense]) -> Vec<JournalEntry> {
    let mut entries = Vec::with_capacity(sales.len() * 2 + expenses.len());

    for sale in sales {
        let names = sale.item_names();
        let reference = sale.invoice_ref();
        let source = EntrySource::Sale(sale.id);

        entries.push(JournalEntry::simple(
            format!("SALE-{}", sale.id),
            sale.timestamp,
            format!("Sale - {}", names),
            AccountCode::CASH,
            AccountCode::SALES_REVENUE,
            sale.total,
            reference.clone(),
            source,
        ));

        entries.push(JournalEntry::simple(
            format!("COGS-{}", sale.id),
            sale.timestamp,
            format!("Cost of Goods Sold - {}", names),
            AccountCode::COST_OF_GOODS_SOLD,
            AccountCode::INVENTORY,
            sale.cost_of_goods(),
            reference,
            source,
        ));
    }

    for expense in expenses {
        let reference = expense.reference();
        entries.push(JournalEntry::simple(
            reference.clone(),
            expense.timestamp,
            expense.description.clone(),
            expense_account_for(expense.category),
            AccountCode::CASH,
            expense.amount,
            reference,
            EntrySource::Expense(expense.id),
        ));
    }

    entries
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::{ExpenseCategory, SaleItem};

    fn rice_sale() -> Sale {
        Sale::new(
            vec![SaleItem {
                product_id: Uuid::new_v4(),
                product_name: "Rice".into(),
                quantity: 2,
                price: 5000,
                cost: 3000,
            }],
            "Ana",
            Utc::now(),
        )
    }

    #[test]
    fn test_sale_produces_revenue_then_cogs_entry() {
        let sale = rice_sale();
        let entries = derive_journal_entries(std::slice::from_ref(&sale), &[]);

        assert_eq!(entries.len(), 2);

        let revenue = &entries[0];
        assert_eq!(revenue.id, format!("SALE-{}", sale.id));
        assert_eq!(revenue.description, "Sale - Rice");
        assert_eq!(revenue.debits, vec![JournalLine::new(AccountCode::CASH, 10_000)]);
        assert_eq!(revenue.credits, vec![JournalLine::new(AccountCode::SALES_REVENUE, 10_000)]);
        assert_eq!(revenue.reference, format!("INV-{}", sale.id));
        assert_eq!(revenue.source, EntrySource::Sale(sale.id));

        let cogs = &entries[1];
        assert_eq!(cogs.id, format!("COGS-{}", sale.id));
        assert_eq!(cogs.description, "Cost of Goods Sold - Rice");
        assert_eq!(cogs.debits, vec![JournalLine::new(AccountCode::COST_OF_GOODS_SOLD, 6_000)]);
        assert_eq!(cogs.credits, vec![JournalLine::new(AccountCode::INVENTORY, 6_000)]);
        assert_eq!(cogs.reference, revenue.reference);
    }

    #[test]
    fn test_rent_expense_entry() {
        let expense = Expense::new("October rent", ExpenseCategory::Rent, 50_000, Utc::now(), "Ana");
        let entries = derive_journal_entries(&[], std::slice::from_ref(&expense));

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.id, format!("EXP-{}", expense.id));
        assert_eq!(entry.description, "October rent");
        assert_eq!(entry.debits, vec![JournalLine::new(AccountCode::RENT_EXPENSE, 50_000)]);
        assert_eq!(entry.credits, vec![JournalLine::new(AccountCode::CASH, 50_000)]);
        assert_eq!(entry.source, EntrySource::Expense(expense.id));
    }

    #[test]
    fn test_unmapped_category_posts_to_operating_expenses() {
        let expense = Expense::new("Flyers", ExpenseCategory::Marketing, 1_500, Utc::now(), "Ana");
        let entries = derive_journal_entries(&[], &[expense]);
        assert_eq!(entries[0].debits[0].account, AccountCode::OPERATING_EXPENSES);
    }

    #[test]
    fn test_sales_precede_expenses_and_keep_input_order() {
        let first = rice_sale();
        let second = rice_sale();
        let expense = Expense::new("Load", ExpenseCategory::Other, 100, Utc::now(), "Ana");

        let entries = derive_journal_entries(&[first.clone(), second.clone()], &[expense.clone()]);
        let sources: Vec<_> = entries.iter().map(|e| e.source).collect();

        assert_eq!(
            sources,
            vec![
                EntrySource::Sale(first.id),
                EntrySource::Sale(first.id),
                EntrySource::Sale(second.id),
                EntrySource::Sale(second.id),
                EntrySource::Expense(expense.id),
            ]
        );
    }

    #[test]
    fn test_every_entry_balances() {
        let sales = vec![rice_sale(), rice_sale()];
        let expenses = vec![
            Expense::new("Meralco", ExpenseCategory::Utilities, 120_000, Utc::now(), "Ana"),
            Expense::new("Helper", ExpenseCategory::Salaries, 300_000, Utc::now(), "Ana"),
        ];
        for entry in derive_journal_entries(&sales, &expenses) {
            assert!(entry.is_balanced(), "{} is unbalanced", entry.id);
        }
    }

    #[test]
    fn test_empty_inputs_produce_no_entries() {
        assert!(derive_journal_entries(&[], &[]).is_empty());
    }
}
