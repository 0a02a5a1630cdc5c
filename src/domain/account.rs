use serde::{Deserialize, Serialize};

use super::ExpenseCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Cash, inventory, receivables - what the store owns
    Asset,
    /// Payables and loans - what the store owes
    Liability,
    /// Owner's capital and retained earnings
    Equity,
    /// Sales income
    Revenue,
    /// Cost of goods sold and operating costs
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(AccountType::Asset),
            "liability" => Some(AccountType::Liability),
            "equity" => Some(AccountType::Equity),
            "revenue" => Some(AccountType::Revenue),
            "expense" => Some(AccountType::Expense),
            _ => None,
        }
    }

    /// Asset and expense accounts carry debit balances in normal operation.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Four-digit chart-of-accounts code. The leading digit groups the type:
/// 1 assets, 2 liabilities, 3 equity, 4 revenue, 5 expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountCode(pub u16);

impl AccountCode {
    pub const CASH: AccountCode = AccountCode(1010);
    pub const INVENTORY: AccountCode = AccountCode(1020);
    pub const ACCOUNTS_RECEIVABLE: AccountCode = AccountCode(1030);
    pub const ACCOUNTS_PAYABLE: AccountCode = AccountCode(2010);
    pub const NOTES_PAYABLE: AccountCode = AccountCode(2020);
    pub const OWNERS_CAPITAL: AccountCode = AccountCode(3010);
    pub const RETAINED_EARNINGS: AccountCode = AccountCode(3020);
    pub const SALES_REVENUE: AccountCode = AccountCode(4010);
    pub const COST_OF_GOODS_SOLD: AccountCode = AccountCode(5010);
    pub const OPERATING_EXPENSES: AccountCode = AccountCode(5020);
    pub const UTILITIES_EXPENSE: AccountCode = AccountCode(5030);
    pub const RENT_EXPENSE: AccountCode = AccountCode(5040);
    pub const SALARIES_EXPENSE: AccountCode = AccountCode(5050);

    /// Look the code up in the static chart.
    pub fn account(self) -> Option<&'static Account> {
        find_account(self)
    }
}

impl std::fmt::Display for AccountCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Account {
    pub code: AccountCode,
    pub name: &'static str,
    pub account_type: AccountType,
}

impl Account {
    const fn new(code: u16, name: &'static str, account_type: AccountType) -> Self {
        Self {
            code: AccountCode(code),
            name,
            account_type,
        }
    }

    /// "1010 - Cash"
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// The store's fixed chart of accounts. Not user data.
pub static CHART_OF_ACCOUNTS: &[Account] = &[
    Account::new(1010, "Cash", AccountType::Asset),
    Account::new(1020, "Inventory", AccountType::Asset),
    Account::new(1030, "Accounts Receivable", AccountType::Asset),
    Account::new(2010, "Accounts Payable", AccountType::Liability),
    Account::new(2020, "Notes Payable", AccountType::Liability),
    Account::new(3010, "Owner's Capital", AccountType::Equity),
    Account::new(3020, "Retained Earnings", AccountType::Equity),
    Account::new(4010, "Sales Revenue", AccountType::Revenue),
    Account::new(5010, "Cost of Goods Sold", AccountType::Expense),
    Account::new(5020, "Operating Expenses", AccountType::Expense),
    Account::new(5030, "Utilities Expense", AccountType::Expense),
    Account::new(5040, "Rent Expense", AccountType::Expense),
    Account::new(5050, "Salaries Expense", AccountType::Expense),
];

pub fn find_account(code: AccountCode) -> Option<&'static Account> {
    CHART_OF_ACCOUNTS.iter().find(|a| a.code == code)
}

pub fn accounts_of_type(
    chart: &[Account],
    account_type: AccountType,
) -> impl Iterator<Item = &Account> {
    chart.iter().filter(move |a| a.account_type == account_type)
}

/// Expense account debited for an expense of the given category.
/// Utilities, rent and salaries have dedicated accounts; everything else
/// posts to Operating Expenses.
pub fn expense_account_for(category: ExpenseCategory) -> AccountCode {
    match category {
        ExpenseCategory::Utilities => AccountCode::UTILITIES_EXPENSE,
        ExpenseCategory::Rent => AccountCode::RENT_EXPENSE,
        ExpenseCategory::Salaries => AccountCode::SALARIES_EXPENSE,
        ExpenseCategory::SupplierPurchase
        | ExpenseCategory::Transportation
        | ExpenseCategory::Maintenance
        | ExpenseCategory::Marketing
        | ExpenseCategory::Other => AccountCode::OPERATING_EXPENSES,
    }
}
