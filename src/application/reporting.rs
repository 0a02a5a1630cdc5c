use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Cents, Expense, ExpenseCategory, Product, ProductCategory, Sale};

/// Number of products listed in a report's best-seller table.
pub const TOP_PRODUCTS_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Daily,
    Monthly,
    Yearly,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "daily",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Yearly => "yearly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "daily" | "today" => Some(ReportPeriod::Daily),
            "monthly" | "month" => Some(ReportPeriod::Monthly),
            "yearly" | "year" => Some(ReportPeriod::Yearly),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Daily => "Today",
            ReportPeriod::Monthly => "This Month",
            ReportPeriod::Yearly => "This Year",
        }
    }

    /// From the start of the current day, month or year up to `now`, inclusive.
    pub fn range(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive();
        let start_date = match self {
            ReportPeriod::Daily => today,
            ReportPeriod::Monthly => today.with_day(1).unwrap_or(today),
            ReportPeriod::Yearly => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };
        (start_of_day(start_date), now)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSales {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u64,
    pub revenue: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRevenue {
    pub category: ProductCategory,
    pub revenue: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseCategoryTotal {
    pub category: ExpenseCategory,
    pub amount: Cents,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    pub period: ReportPeriod,
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub revenue: Cents,
    pub cost_of_goods_sold: Cents,
    pub gross_profit: Cents,
    pub expenses: Cents,
    pub net_income: Cents,
    pub sale_count: usize,
    pub expense_count: usize,
    pub top_products: Vec<ProductSales>,
    pub sales_by_category: Vec<CategoryRevenue>,
    pub expenses_by_category: Vec<ExpenseCategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTrend {
    pub date: NaiveDate,
    pub revenue: Cents,
    /// Gross profit minus that day's expenses
    pub profit: Cents,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub product_count: usize,
    pub low_stock_count: usize,
    pub low_stock: Vec<String>,
    pub revenue: Cents,
    pub gross_profit: Cents,
    pub expenses: Cents,
    pub net_income: Cents,
    pub sale_count: usize,
    pub trend: Vec<DailyTrend>,
}

pub fn sales_in_range<'a>(
    sales: &'a [Sale],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> impl Iterator<Item = &'a Sale> {
    sales
        .iter()
        .filter(move |s| s.timestamp >= from && s.timestamp <= to)
}

pub fn expenses_in_range<'a>(
    expenses: &'a [Expense],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> impl Iterator<Item = &'a Expense> {
    expenses
        .iter()
        .filter(move |e| e.timestamp >= from && e.timestamp <= to)
}

/// Best sellers by revenue, highest first. Ties keep first-sold order.
pub fn top_products<'a>(sales: impl IntoIterator<Item = &'a Sale>, limit: usize) -> Vec<ProductSales> {
    let mut totals: Vec<ProductSales> = Vec::new();

    for sale in sales {
        for item in &sale.items {
            match totals.iter_mut().find(|p| p.product_id == item.product_id) {
                Some(existing) => {
                    existing.quantity += u64::from(item.quantity);
                    existing.revenue += item.line_total();
                }
                None => totals.push(ProductSales {
                    product_id: item.product_id,
                    name: item.product_name.clone(),
                    quantity: u64::from(item.quantity),
                    revenue: item.line_total(),
                }),
            }
        }
    }

    totals.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    totals.truncate(limit);
    totals
}

/// Revenue per product category. Items whose product has since been
/// deleted have no category and are left out.
pub fn sales_by_category<'a>(
    sales: impl IntoIterator<Item = &'a Sale>,
    products: &[Product],
) -> Vec<CategoryRevenue> {
    let mut totals: BTreeMap<ProductCategory, Cents> = BTreeMap::new();

    for sale in sales {
        for item in &sale.items {
            if let Some(product) = products.iter().find(|p| p.id == item.product_id) {
                *totals.entry(product.category).or_insert(0) += item.line_total();
            }
        }
    }

    totals
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue { category, revenue })
        .collect()
}

pub fn expenses_by_category<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Vec<ExpenseCategoryTotal> {
    let mut totals: BTreeMap<ExpenseCategory, Cents> = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.category).or_insert(0) += expense.amount;
    }

    totals
        .into_iter()
        .map(|(category, amount)| ExpenseCategoryTotal { category, amount })
        .collect()
}

pub fn build_period_report(
    period: ReportPeriod,
    now: DateTime<Utc>,
    sales: &[Sale],
    expenses: &[Expense],
    products: &[Product],
) -> PeriodReport {
    let (from_date, to_date) = period.range(now);
    let period_sales: Vec<&Sale> = sales_in_range(sales, from_date, to_date).collect();
    let period_expenses: Vec<&Expense> = expenses_in_range(expenses, from_date, to_date).collect();

    let revenue: Cents = period_sales.iter().map(|s| s.total).sum();
    let cost_of_goods_sold: Cents = period_sales.iter().map(|s| s.cost_of_goods()).sum();
    let gross_profit: Cents = period_sales.iter().map(|s| s.gross_profit).sum();
    let expense_total: Cents = period_expenses.iter().map(|e| e.amount).sum();

    PeriodReport {
        period,
        from_date,
        to_date,
        revenue,
        cost_of_goods_sold,
        gross_profit,
        expenses: expense_total,
        net_income: gross_profit - expense_total,
        sale_count: period_sales.len(),
        expense_count: period_expenses.len(),
        top_products: top_products(period_sales.iter().copied(), TOP_PRODUCTS_LIMIT),
        sales_by_category: sales_by_category(period_sales.iter().copied(), products),
        expenses_by_category: expenses_by_category(period_expenses.iter().copied()),
    }
}

pub fn build_dashboard(
    now: DateTime<Utc>,
    products: &[Product],
    sales: &[Sale],
    expenses: &[Expense],
) -> DashboardSummary {
    let today = now.date_naive();

    let day_totals = |date: NaiveDate| {
        let day_sales: Vec<&Sale> = sales
            .iter()
            .filter(|s| s.timestamp.date_naive() == date)
            .collect();
        let revenue: Cents = day_sales.iter().map(|s| s.total).sum();
        let gross_profit: Cents = day_sales.iter().map(|s| s.gross_profit).sum();
        let spent: Cents = expenses
            .iter()
            .filter(|e| e.timestamp.date_naive() == date)
            .map(|e| e.amount)
            .sum();
        (day_sales.len(), revenue, gross_profit, spent)
    };

    let (sale_count, revenue, gross_profit, spent) = day_totals(today);

    let trend = (0..7)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            let (_, revenue, gross_profit, spent) = day_totals(date);
            DailyTrend {
                date,
                revenue,
                profit: gross_profit - spent,
            }
        })
        .collect();

    let low_stock: Vec<String> = products
        .iter()
        .filter(|p| p.is_low_stock())
        .map(|p| p.name.clone())
        .collect();

    DashboardSummary {
        date: today,
        product_count: products.len(),
        low_stock_count: low_stock.len(),
        low_stock,
        revenue,
        gross_profit,
        expenses: spent,
        net_income: gross_profit - spent,
        sale_count,
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SaleItem;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn sale_of(product: &Product, quantity: u32, when: DateTime<Utc>) -> Sale {
        Sale::new(vec![SaleItem::from_product(product, quantity)], "Ana", when)
    }

    #[test]
    fn test_period_ranges() {
        let now = at("2024-03-15T10:30:00Z");
        assert_eq!(ReportPeriod::Daily.range(now).0, at("2024-03-15T00:00:00Z"));
        assert_eq!(ReportPeriod::Monthly.range(now).0, at("2024-03-01T00:00:00Z"));
        assert_eq!(ReportPeriod::Yearly.range(now).0, at("2024-01-01T00:00:00Z"));
        assert_eq!(ReportPeriod::Yearly.range(now).1, now);
    }

    #[test]
    fn test_top_products_merge_and_rank() {
        let rice = Product::new("Rice", "R", ProductCategory::Food, 5000, 4000);
        let cola = Product::new("Cola", "C", ProductCategory::Beverages, 2000, 1500);
        let now = Utc::now();
        let sales = vec![
            sale_of(&cola, 1, now),
            sale_of(&rice, 1, now),
            sale_of(&cola, 4, now),
        ];

        let top = top_products(&sales, 10);
        assert_eq!(top.len(), 2);
        assert_eq!((top[0].name.as_str(), top[0].quantity, top[0].revenue), ("Cola", 5, 10_000));
        assert_eq!((top[1].name.as_str(), top[1].quantity, top[1].revenue), ("Rice", 1, 5_000));

        assert_eq!(top_products(&sales, 1).len(), 1);
    }

    #[test]
    fn test_sales_by_category_skips_deleted_products() {
        let rice = Product::new("Rice", "R", ProductCategory::Food, 5000, 4000);
        let gone = Product::new("Discontinued", "D", ProductCategory::Snacks, 1000, 800);
        let now = Utc::now();
        let sales = vec![sale_of(&rice, 2, now), sale_of(&gone, 3, now)];

        let by_category = sales_by_category(&sales, std::slice::from_ref(&rice));
        assert_eq!(
            by_category,
            vec![CategoryRevenue {
                category: ProductCategory::Food,
                revenue: 10_000
            }]
        );
    }

    #[test]
    fn test_period_report_filters_by_date() {
        let rice = Product::new("Rice", "R", ProductCategory::Food, 5000, 4000);
        let now = at("2024-03-15T12:00:00Z");
        let sales = vec![
            sale_of(&rice, 1, at("2024-03-15T08:00:00Z")),
            sale_of(&rice, 2, at("2024-03-02T08:00:00Z")),
            sale_of(&rice, 4, at("2023-12-31T23:59:00Z")),
        ];
        let expenses = vec![
            Expense::new("Rent", ExpenseCategory::Rent, 3_000, at("2024-03-01T00:00:00Z"), "Ana"),
            Expense::new("Load", ExpenseCategory::Other, 100, at("2024-03-15T09:00:00Z"), "Ana"),
        ];
        let products = vec![rice];

        let daily = build_period_report(ReportPeriod::Daily, now, &sales, &expenses, &products);
        assert_eq!(daily.sale_count, 1);
        assert_eq!(daily.revenue, 5_000);
        assert_eq!(daily.expenses, 100);
        assert_eq!(daily.net_income, 1_000 - 100);

        let monthly = build_period_report(ReportPeriod::Monthly, now, &sales, &expenses, &products);
        assert_eq!(monthly.sale_count, 2);
        assert_eq!(monthly.revenue, 15_000);
        assert_eq!(monthly.cost_of_goods_sold, 12_000);
        assert_eq!(monthly.gross_profit, 3_000);
        assert_eq!(monthly.expenses, 3_100);
        assert_eq!(monthly.net_income, -100);
        assert_eq!(monthly.expenses_by_category.len(), 2);

        let yearly = build_period_report(ReportPeriod::Yearly, now, &sales, &expenses, &products);
        assert_eq!(yearly.sale_count, 2);
    }

    #[test]
    fn test_dashboard_today_and_trend() {
        let rice = Product::new("Rice", "R", ProductCategory::Food, 5000, 4000)
            .with_stock(2)
            .with_reorder_point(5);
        let cola = Product::new("Cola", "C", ProductCategory::Beverages, 2000, 1500).with_stock(50);
        let now = at("2024-03-15T12:00:00Z");
        let sales = vec![
            sale_of(&rice, 1, at("2024-03-15T08:00:00Z")),
            sale_of(&cola, 2, at("2024-03-13T08:00:00Z")),
            sale_of(&cola, 2, at("2024-03-01T08:00:00Z")),
        ];
        let expenses = vec![Expense::new(
            "Ice",
            ExpenseCategory::Other,
            300,
            at("2024-03-15T07:00:00Z"),
            "Ana",
        )];

        let dashboard = build_dashboard(now, &[rice, cola], &sales, &expenses);

        assert_eq!(dashboard.product_count, 2);
        assert_eq!(dashboard.low_stock, vec!["Rice".to_string()]);
        assert_eq!(dashboard.sale_count, 1);
        assert_eq!(dashboard.revenue, 5_000);
        assert_eq!(dashboard.net_income, 1_000 - 300);

        assert_eq!(dashboard.trend.len(), 7);
        assert_eq!(dashboard.trend[0].date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(dashboard.trend[6].date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(dashboard.trend[4].revenue, 4_000);
        assert_eq!(dashboard.trend[4].profit, 1_000);
        assert_eq!(dashboard.trend[6].profit, 700);
    }
}
