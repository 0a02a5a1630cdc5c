use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::info;

use crate::application::{PosService, ProductFilter, ReportPeriod};
use crate::domain::{
    CHART_OF_ACCOUNTS, Cents, Expense, Feature, Product, Sale, StoreInfo, User,
    compute_account_balances, compute_income_statement, compute_trial_balance,
    derive_journal_entries, format_cents, scale,
};
use crate::storage::{EXPENSES_KEY, PRODUCTS_KEY, SALES_KEY, STORE_INFO_KEY, Store, USERS_KEY};

/// Format written into `BackupSnapshot::version`.
pub const BACKUP_VERSION: &str = "1";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Full backup of the stored collections. Absent collections are left
/// untouched on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub products: Option<Vec<Product>>,
    #[serde(default)]
    pub sales: Option<Vec<Sale>>,
    #[serde(default)]
    pub expenses: Option<Vec<Expense>>,
    #[serde(default)]
    pub users: Option<Vec<User>>,
    #[serde(default)]
    pub store_info: Option<StoreInfo>,
}

/// CSV layouts the exporter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Sales,
    Expenses,
    Inventory,
    TrialBalance,
    ProfitLoss,
    BirSales,
    BirIncome,
    BirExpenses,
    BirInventory,
}

impl ExportKind {
    pub const ALL: [ExportKind; 9] = [
        ExportKind::Sales,
        ExportKind::Expenses,
        ExportKind::Inventory,
        ExportKind::TrialBalance,
        ExportKind::ProfitLoss,
        ExportKind::BirSales,
        ExportKind::BirIncome,
        ExportKind::BirExpenses,
        ExportKind::BirInventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Sales => "sales",
            ExportKind::Expenses => "expenses",
            ExportKind::Inventory => "inventory",
            ExportKind::TrialBalance => "trial-balance",
            ExportKind::ProfitLoss => "profit-loss",
            ExportKind::BirSales => "bir-sales",
            ExportKind::BirIncome => "bir-income",
            ExportKind::BirExpenses => "bir-expenses",
            ExportKind::BirInventory => "bir-inventory",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Plan feature needed to write this layout.
    pub fn feature(&self) -> Feature {
        match self {
            ExportKind::BirSales
            | ExportKind::BirIncome
            | ExportKind::BirExpenses
            | ExportKind::BirInventory => Feature::BirForms,
            _ => Feature::Export,
        }
    }
}

/// Value-added tax included in a VAT-inclusive amount, at 12%.
pub fn vat_of(amount: Cents) -> Cents {
    scale(amount, 12, 100)
}

/// Amount net of 12% VAT.
pub fn net_of_vat(amount: Cents) -> Cents {
    scale(amount, 100, 112)
}

/// Exporter for converting store data to CSV and JSON
pub struct Exporter<'a, S: Store> {
    service: &'a PosService<S>,
    period: Option<(ReportPeriod, DateTime<Utc>)>,
}

impl<'a, S: Store> Exporter<'a, S> {
    pub fn new(service: &'a PosService<S>) -> Self {
        Self {
            service,
            period: None,
        }
    }

    /// Restrict sales and expenses to `period` as of `now`. Without a
    /// period every record is exported.
    pub fn for_period(mut self, period: ReportPeriod, now: DateTime<Utc>) -> Self {
        self.period = Some((period, now));
        self
    }

    fn period_label(&self) -> &'static str {
        match self.period {
            Some((ReportPeriod::Daily, _)) => "Daily",
            Some((ReportPeriod::Monthly, _)) => "Monthly",
            Some((ReportPeriod::Yearly, _)) => "Yearly",
            None => "All Time",
        }
    }

    async fn sales(&self) -> Result<Vec<Sale>> {
        Ok(match self.period {
            Some((period, now)) => {
                let (from, to) = period.range(now);
                self.service.sales_between(from, to).await?
            }
            None => self.service.list_sales().await?,
        })
    }

    async fn expenses(&self) -> Result<Vec<Expense>> {
        let expenses = self.service.list_expenses().await?;
        Ok(match self.period {
            Some((period, now)) => {
                let (from, to) = period.range(now);
                expenses
                    .into_iter()
                    .filter(|e| e.timestamp >= from && e.timestamp <= to)
                    .collect()
            }
            None => expenses,
        })
    }

    async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.service.list_products(&ProductFilter::default()).await?)
    }

    /// Write one CSV layout, after checking the plan allows it.
    pub async fn export_csv<W: Write>(&self, kind: ExportKind, writer: W) -> Result<usize> {
        self.service.ensure_feature(kind.feature()).await?;

        let count = match kind {
            ExportKind::Sales => self.export_sales_csv(writer).await?,
            ExportKind::Expenses => self.export_expenses_csv(writer).await?,
            ExportKind::Inventory => self.export_inventory_csv(writer).await?,
            ExportKind::TrialBalance => self.export_trial_balance_csv(writer).await?,
            ExportKind::ProfitLoss => self.export_profit_loss_csv(writer).await?,
            ExportKind::BirSales => self.export_bir_sales_csv(writer).await?,
            ExportKind::BirIncome => self.export_bir_income_csv(writer).await?,
            ExportKind::BirExpenses => self.export_bir_expenses_csv(writer).await?,
            ExportKind::BirInventory => self.export_bir_inventory_csv(writer).await?,
        };

        info!(kind = kind.as_str(), rows = count, "export written");
        Ok(count)
    }

    /// Export sales transactions to CSV format
    pub async fn export_sales_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let sales = self.sales().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["date", "invoice", "items", "total", "profit", "sold_by"])?;

        let mut count = 0;
        for sale in &sales {
            let items = sale
                .items
                .iter()
                .map(|i| format!("{} ({})", i.product_name, i.quantity))
                .collect::<Vec<_>>()
                .join("; ");

            csv_writer.write_record([
                sale.timestamp.format(DATE_FORMAT).to_string(),
                sale.invoice_ref(),
                items,
                format_cents(sale.total),
                format_cents(sale.gross_profit),
                sale.sold_by.clone(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export expenses to CSV format
    pub async fn export_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let expenses = self.expenses().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "date",
            "reference",
            "description",
            "category",
            "amount",
            "recorded_by",
        ])?;

        let mut count = 0;
        for expense in &expenses {
            csv_writer.write_record([
                expense.timestamp.format(DATE_FORMAT).to_string(),
                expense.reference(),
                expense.description.clone(),
                expense.category.as_str().to_string(),
                format_cents(expense.amount),
                expense.recorded_by.clone(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the product list with stock and valuation
    pub async fn export_inventory_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let products = self.products().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "sku",
            "name",
            "barcode",
            "category",
            "price",
            "cost",
            "stock",
            "reorder_point",
            "stock_value",
        ])?;

        let mut count = 0;
        for product in &products {
            csv_writer.write_record([
                product.sku.clone(),
                product.name.clone(),
                product.barcode.clone().unwrap_or_default(),
                product.category.as_str().to_string(),
                format_cents(product.price),
                format_cents(product.cost),
                product.stock.to_string(),
                product.reorder_point.to_string(),
                format_cents(product.stock_value()),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the trial balance, one row per account in chart order, over
    /// the sales and expenses in the export period.
    pub async fn export_trial_balance_csv<W: Write>(&self, writer: W) -> Result<usize> {
        self.service.ensure_feature(Feature::Accounting).await?;
        let entries = derive_journal_entries(&self.sales().await?, &self.expenses().await?);
        let trial_balance =
            compute_trial_balance(CHART_OF_ACCOUNTS, &compute_account_balances(&entries));
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["code", "account", "type", "debit", "credit"])?;

        let mut count = 0;
        for row in &trial_balance.rows {
            csv_writer.write_record([
                row.code.to_string(),
                row.name.to_string(),
                row.account_type.as_str().to_string(),
                format_cents(row.debit),
                format_cents(row.credit),
            ])?;
            count += 1;
        }
        csv_writer.write_record([
            String::new(),
            "Total".to_string(),
            String::new(),
            format_cents(trial_balance.total_debits),
            format_cents(trial_balance.total_credits),
        ])?;

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export a one-row profit and loss statement for the period.
    pub async fn export_profit_loss_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let statement = compute_income_statement(&self.sales().await?, &self.expenses().await?);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "Period",
            "Total Revenue",
            "Cost of Goods Sold",
            "Gross Profit",
            "Operating Expenses",
            "Net Income",
        ])?;
        csv_writer.write_record([
            self.period_label().to_string(),
            format_cents(statement.revenue),
            format_cents(statement.cost_of_goods_sold),
            format_cents(statement.gross_profit),
            format_cents(statement.total_expenses),
            format_cents(statement.net_income),
        ])?;

        csv_writer.flush()?;
        Ok(1)
    }

    /// BIR sales summary: one row per invoice with the VAT split out.
    pub async fn export_bir_sales_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let sales = self.sales().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["Date", "Invoice", "Amount", "VAT", "NetSales"])?;

        let mut count = 0;
        for sale in &sales {
            csv_writer.write_record([
                sale.timestamp.format(DATE_FORMAT).to_string(),
                sale.invoice_ref(),
                format_cents(sale.total),
                format_cents(vat_of(sale.total)),
                format_cents(net_of_vat(sale.total)),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// BIR income statement: a single summary row for the period.
    pub async fn export_bir_income_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let statement = compute_income_statement(&self.sales().await?, &self.expenses().await?);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "Period",
            "GrossSales",
            "VAT",
            "NetSales",
            "Expenses",
            "NetIncome",
        ])?;
        csv_writer.write_record([
            self.period_label().to_string(),
            format_cents(statement.revenue),
            format_cents(vat_of(statement.revenue)),
            format_cents(net_of_vat(statement.revenue)),
            format_cents(statement.total_expenses),
            format_cents(statement.net_income),
        ])?;

        csv_writer.flush()?;
        Ok(1)
    }

    /// BIR expense report of deductible expenses.
    pub async fn export_bir_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let expenses = self.expenses().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["Date", "Description", "Category", "Amount"])?;

        let mut count = 0;
        for expense in &expenses {
            csv_writer.write_record([
                expense.timestamp.format(DATE_FORMAT).to_string(),
                expense.description.clone(),
                expense.category.as_str().to_string(),
                format_cents(expense.amount),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// BIR year-end inventory report at unit cost.
    pub async fn export_bir_inventory_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let products = self.products().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["Product", "SKU", "Stock", "UnitCost", "TotalValue"])?;

        let mut count = 0;
        for product in &products {
            csv_writer.write_record([
                product.name.clone(),
                product.sku.clone(),
                product.stock.to_string(),
                format_cents(product.cost),
                format_cents(product.stock_value()),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export every stored collection as a JSON backup. Available on
    /// every plan and without a session.
    pub async fn export_backup_json<W: Write>(&self, mut writer: W) -> Result<BackupSnapshot> {
        let store = self.service.store();

        let snapshot = BackupSnapshot {
            version: BACKUP_VERSION.to_string(),
            exported_at: Utc::now(),
            products: Some(store.load(PRODUCTS_KEY).await?.unwrap_or_default()),
            sales: Some(store.load(SALES_KEY).await?.unwrap_or_default()),
            expenses: Some(store.load(EXPENSES_KEY).await?.unwrap_or_default()),
            users: Some(store.load(USERS_KEY).await?.unwrap_or_default()),
            store_info: store.load(STORE_INFO_KEY).await?,
        };

        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize backup")?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        info!("backup written");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vat_split() {
        assert_eq!(vat_of(11_200), 1_344);
        assert_eq!(net_of_vat(11_200), 10_000);
        assert_eq!(vat_of(0), 0);
        // 100.00 / 1.12 = 89.2857...
        assert_eq!(net_of_vat(10_000), 8_929);
    }

    #[test]
    fn test_export_kind_names() {
        for kind in ExportKind::ALL {
            assert_eq!(ExportKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ExportKind::from_str("BIR_SALES"), Some(ExportKind::BirSales));
        assert_eq!(ExportKind::from_str("ledger"), None);
        assert_eq!(ExportKind::BirIncome.feature(), Feature::BirForms);
        assert_eq!(ExportKind::Sales.feature(), Feature::Export);
    }
}
