use serde::Serialize;

use super::{
    Account, AccountBalances, AccountCode, AccountType, Cents, Expense, Product, ProductCategory,
    Sale, accounts_of_type, balance_of, percentage,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeStatement {
    pub revenue: Cents,
    pub cost_of_goods_sold: Cents,
    /// revenue − cost of goods sold
    pub gross_profit: Cents,
    /// Σ sale.gross_profit, kept alongside as an independent cross-check
    pub recorded_gross_profit: Cents,
    pub total_expenses: Cents,
    pub net_income: Cents,
    /// Percentages; 0.0 when there is no revenue
    pub gross_margin: f64,
    pub net_margin: f64,
}

impl IncomeStatement {
    pub fn gross_profit_reconciles(&self) -> bool {
        self.gross_profit == self.recorded_gross_profit
    }
}

pub fn compute_income_statement(sales: &[Sale], expenses: &[Expense]) -> IncomeStatement {
    let revenue: Cents = sales.iter().map(|s| s.total).sum();
    let cost_of_goods_sold: Cents = sales.iter().map(Sale::cost_of_goods).sum();
    let recorded_gross_profit: Cents = sales.iter().map(|s| s.gross_profit).sum();
    let total_expenses: Cents = expenses.iter().map(|e| e.amount).sum();

    let gross_profit = revenue - cost_of_goods_sold;
    let net_income = gross_profit - total_expenses;

    IncomeStatement {
        revenue,
        cost_of_goods_sold,
        gross_profit,
        recorded_gross_profit,
        total_expenses,
        net_income,
        gross_margin: percentage(gross_profit, revenue),
        net_margin: percentage(net_income, revenue),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheetLine {
    pub code: AccountCode,
    pub name: &'static str,
    pub amount: Cents,
}

/// Point-in-time view of the chart's asset and liability accounts.
///
/// Equity is the period's net income; no retained earnings are carried
/// forward, so assets need not equal liabilities plus equity.
/// `difference` reports the gap instead of hiding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheet {
    pub assets: Vec<BalanceSheetLine>,
    pub liabilities: Vec<BalanceSheetLine>,
    pub equity: Cents,
    pub total_assets: Cents,
    pub total_liabilities: Cents,
    pub total_equity: Cents,
}

impl BalanceSheet {
    /// total_assets − (total_liabilities + total_equity)
    pub fn difference(&self) -> Cents {
        self.total_assets - (self.total_liabilities + self.total_equity)
    }

    pub fn is_balanced(&self) -> bool {
        self.difference() == 0
    }
}

fn sheet_lines(
    chart: &[Account],
    balances: &AccountBalances,
    account_type: AccountType,
) -> Vec<BalanceSheetLine> {
    accounts_of_type(chart, account_type)
        .map(|account| BalanceSheetLine {
            code: account.code,
            name: account.name,
            amount: balance_of(balances, account.code).abs(),
        })
        .collect()
}

pub fn compute_balance_sheet(
    chart: &[Account],
    balances: &AccountBalances,
    net_income: Cents,
) -> BalanceSheet {
    let assets = sheet_lines(chart, balances, AccountType::Asset);
    let liabilities = sheet_lines(chart, balances, AccountType::Liability);
    let total_assets = assets.iter().map(|l| l.amount).sum();
    let total_liabilities = liabilities.iter().map(|l| l.amount).sum();

    BalanceSheet {
        assets,
        liabilities,
        equity: net_income,
        total_assets,
        total_liabilities,
        total_equity: net_income,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRow {
    pub name: String,
    pub sku: String,
    pub category: ProductCategory,
    pub stock: u32,
    pub unit_cost: Cents,
    pub value: Cents,
}

/// On-hand stock valued at each product's current unit cost.
/// There is no cost-layer tracking: older units are revalued at today's cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryValuation {
    pub rows: Vec<InventoryRow>,
    pub total_units: u64,
    pub total_value: Cents,
}

pub fn compute_inventory_valuation(products: &[Product]) -> InventoryValuation {
    let rows: Vec<InventoryRow> = products
        .iter()
        .map(|p| InventoryRow {
            name: p.name.clone(),
            sku: p.sku.clone(),
            category: p.category,
            stock: p.stock,
            unit_cost: p.cost,
            value: p.stock_value(),
        })
        .collect();

    InventoryValuation {
        total_units: rows.iter().map(|r| u64::from(r.stock)).sum(),
        total_value: rows.iter().map(|r| r.value).sum(),
        rows,
    }
}
