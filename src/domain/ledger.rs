use std::collections::BTreeMap;

use serde::Serialize;

use super::{Account, AccountCode, AccountType, Cents, JournalEntry};

/// Signed balance per account: debits add, credits subtract.
/// Accounts never posted to are absent (balance = 0).
pub type AccountBalances = BTreeMap<AccountCode, Cents>;

/// Fold journal entries into per-account balances.
/// Debit-normal accounts (assets, expenses) come out positive; revenue,
/// liability and equity accounts come out negative. The result does not
/// depend on entry order.
pub fn compute_account_balances(entries: &[JournalEntry]) -> AccountBalances {
    let mut balances = AccountBalances::new();

    for entry in entries {
        for line in &entry.debits {
            *balances.entry(line.account).or_insert(0) += line.amount;
        }
        for line in &entry.credits {
            *balances.entry(line.account).or_insert(0) -= line.amount;
        }
    }

    balances
}

/// Balance of a single account, 0 when it was never posted to.
pub fn balance_of(balances: &AccountBalances, code: AccountCode) -> Cents {
    balances.get(&code).copied().unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    pub code: AccountCode,
    pub name: &'static str,
    pub account_type: AccountType,
    pub debit: Cents,
    pub credit: Cents,
}

impl TrialBalanceRow {
    pub fn is_zero(&self) -> bool {
        self.debit == 0 && self.credit == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    /// One row per chart account, in chart order
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: Cents,
    pub total_credits: Cents,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.total_debits == self.total_credits
    }

    /// Rows with a non-zero balance, as shown on a printed trial balance.
    pub fn nonzero_rows(&self) -> impl Iterator<Item = &TrialBalanceRow> {
        self.rows.iter().filter(|r| !r.is_zero())
    }
}

/// Split each chart account's signed balance into a debit or credit column.
pub fn compute_trial_balance(chart: &[Account], balances: &AccountBalances) -> TrialBalance {
    let rows: Vec<TrialBalanceRow> = chart
        .iter()
        .map(|account| {
            let balance = balance_of(balances, account.code);
            TrialBalanceRow {
                code: account.code,
                name: account.name,
                account_type: account.account_type,
                debit: balance.max(0),
                credit: (-balance).max(0),
            }
        })
        .collect();

    let total_debits = rows.iter().map(|r| r.debit).sum();
    let total_credits = rows.iter().map(|r| r.credit).sum();

    TrialBalance {
        rows,
        total_debits,
        total_credits,
    }
}
