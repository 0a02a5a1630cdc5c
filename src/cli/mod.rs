use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write, stdin, stdout};
use uuid::Uuid;

use crate::application::{
    ExpenseUpdate, NewProduct, PosService, ProductFilter, ProductUpdate, ReportPeriod, SaleLine,
    UserUpdate,
};
use crate::domain::{
    AccountCode, Cents, ExpenseCategory, Feature, JournalEntry, Product, ProductCategory, StoreInfo,
    SubscriptionPlan, UserRole, find_account, format_cents, format_peso, has_capability,
    parse_cents,
};
use crate::io::{ExportKind, Exporter, ImportOptions, Importer};

/// TindaHero - Point of sale and books for a sari-sari store
#[derive(Parser)]
#[command(name = "tindahero")]
#[command(about = "A local-first point-of-sale ledger for sari-sari stores")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TINDAHERO_DB", default_value = "tindahero.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Start a session as the given user
    Login {
        /// Email address
        email: String,

        /// Display name (defaults to the part of the email before '@')
        #[arg(long)]
        name: Option<String>,

        /// Plan for a new account: free, pro, business
        #[arg(long)]
        plan: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Subscription plan commands
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Product and inventory management commands
    #[command(subcommand)]
    Product(ProductCommands),

    /// Ring up a sale
    Sell {
        /// Items as SKU or SKU:QTY (e.g., "RICE-1:2 COKE-15")
        #[arg(required = true)]
        items: Vec<String>,

        /// Date of the sale (ISO 8601 format: YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List recorded sales
    Sales {
        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to_date: Option<String>,

        /// Maximum number of sales to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Expense management commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Accounting views derived from sales and expenses (Business plan)
    #[command(subcommand)]
    Ledger(LedgerCommands),

    /// Generate reports and analytics (Pro plan and up)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Today's figures and the last seven days
    Dashboard {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Store settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Export data to CSV or a JSON backup
    Export {
        /// What to export: backup, sales, expenses, inventory, trial-balance,
        /// profit-loss, bir-sales, bir-income, bir-expenses, bir-inventory
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Limit sales and expenses to a period: daily, monthly, yearly
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Import products from CSV or restore a JSON backup
    Import {
        /// What to import: products, backup
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Preview without importing
        #[arg(long)]
        dry_run: bool,

        /// Skip products whose SKU already exists
        #[arg(long)]
        skip_duplicates: bool,
    },

    /// Delete all products, sales, expenses, users and settings
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show the current plan and what it includes
    Show,

    /// Upgrade to a higher plan
    Upgrade {
        /// Target plan: pro, business
        plan: String,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Add a new product
    Add {
        /// Product name
        name: String,

        /// Stock keeping unit (must be unique)
        #[arg(long)]
        sku: String,

        /// Selling price (e.g., "50.00" or "50")
        #[arg(short, long)]
        price: String,

        /// Unit cost
        #[arg(long)]
        cost: String,

        /// Category: food, non-food, beverages, personal-care, household, snacks, other
        #[arg(short, long, default_value = "other")]
        category: String,

        /// Units on hand
        #[arg(short, long, default_value = "0")]
        stock: u32,

        /// Stock level at or below which the product counts as low
        #[arg(long, default_value = "5")]
        reorder_point: u32,

        /// Barcode
        #[arg(long)]
        barcode: Option<String>,
    },

    /// List products
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Search name, SKU or barcode
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Update a product
    Update {
        /// SKU of the product to update
        sku: String,

        #[arg(long)]
        name: Option<String>,

        /// New SKU
        #[arg(long)]
        new_sku: Option<String>,

        #[arg(long)]
        price: Option<String>,

        #[arg(long)]
        cost: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        stock: Option<u32>,

        #[arg(long)]
        reorder_point: Option<u32>,

        #[arg(long)]
        barcode: Option<String>,
    },

    /// Delete a product
    Delete {
        /// Product SKU
        sku: String,
    },

    /// List products at or below their reorder point
    LowStock,
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// What the money was spent on
        description: String,

        /// Amount (e.g., "500.00" or "500")
        #[arg(short, long)]
        amount: String,

        /// Category: supplier-purchase, utilities, rent, salaries, transportation,
        /// maintenance, marketing, other
        #[arg(short, long, default_value = "other")]
        category: String,

        /// Date of the expense (ISO 8601 format: YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List expenses
    List {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Update an expense
    Update {
        /// Expense ID (or a unique prefix)
        id: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(short, long)]
        amount: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete an expense
    Delete {
        /// Expense ID (or a unique prefix)
        id: String,
    },
}

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// Journal entries for every sale and expense
    Journal {
        /// Maximum number of entries to show, newest first
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Net balance per account
    Accounts {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Trial balance with debit and credit totals
    TrialBalance {
        /// Include accounts with no activity
        #[arg(long)]
        all: bool,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Income statement
    Income {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Balance sheet
    BalanceSheet {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Sales, expenses and best sellers for a period
    Summary {
        /// Period: daily, monthly, yearly
        #[arg(short, long, default_value = "monthly")]
        period: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Inventory valuation at unit cost
    Inventory {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a user to the store
    Add {
        /// Display name
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role: owner, admin, staff
        #[arg(short, long, default_value = "staff")]
        role: String,
    },

    /// List users
    List,

    /// Update a user
    Update {
        /// User ID (or a unique prefix)
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        role: Option<String>,
    },

    /// Remove a user
    Delete {
        /// User ID (or a unique prefix)
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show store details
    Show,

    /// Update store details
    Set {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        owner: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if matches!(self.command, Commands::Init) {
            PosService::init(&self.database).await?;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = PosService::connect(&self.database)
            .await
            .with_context(|| {
                format!(
                    "Cannot open '{}'. Run `tindahero init` first",
                    self.database
                )
            })?;

        match self.command {
            // handled above
            Commands::Init => {}

            Commands::Login { email, name, plan } => {
                let plan = plan.as_deref().map(parse_plan).transpose()?;
                let user = service.login(&email, name, plan).await?;
                println!(
                    "Logged in as {} <{}> ({} plan)",
                    user.name, user.email, user.plan
                );
            }

            Commands::Logout => {
                service.logout().await?;
                println!("Logged out.");
            }

            Commands::Whoami => {
                let user = service.current_user().await?;
                println!("{} <{}>", user.name, user.email);
                println!("  Role: {}", user.role);
                println!("  Plan: {}", user.plan);
            }

            Commands::Plan(plan_cmd) => run_plan_command(&service, plan_cmd).await?,

            Commands::Product(product_cmd) => run_product_command(&service, product_cmd).await?,

            Commands::Sell { items, date } => {
                let lines = items
                    .iter()
                    .map(String::as_str)
                    .map(parse_sale_line)
                    .collect::<Result<Vec<_>>>()?;
                let timestamp = optional_date(date.as_deref())?.unwrap_or_else(Utc::now);

                let sale = service.record_sale(&lines, timestamp).await?;

                println!("Recorded sale {}", sale.invoice_ref());
                for item in &sale.items {
                    println!(
                        "  {:<28} {:>4} x {:>10} = {:>12}",
                        truncate(&item.product_name, 28),
                        item.quantity,
                        format_cents(item.price),
                        format_cents(item.line_total())
                    );
                }
                println!("  {}", "-".repeat(61));
                println!("  {:<47} {:>12}", "TOTAL", format_peso(sale.total));
                println!("  {:<47} {:>12}", "Gross profit", format_peso(sale.gross_profit));
            }

            Commands::Sales {
                from_date,
                to_date,
                limit,
            } => run_sales_command(&service, from_date, to_date, limit).await?,

            Commands::Expense(expense_cmd) => run_expense_command(&service, expense_cmd).await?,

            Commands::Ledger(ledger_cmd) => run_ledger_command(&service, ledger_cmd).await?,

            Commands::Report(report_cmd) => run_report_command(&service, report_cmd).await?,

            Commands::Dashboard { format } => run_dashboard_command(&service, &format).await?,

            Commands::User(user_cmd) => run_user_command(&service, user_cmd).await?,

            Commands::Settings(settings_cmd) => {
                run_settings_command(&service, settings_cmd).await?
            }

            Commands::Export {
                export_type,
                output,
                period,
            } => {
                run_export_command(&service, &export_type, output.as_deref(), period.as_deref())
                    .await?
            }

            Commands::Import {
                import_type,
                input,
                dry_run,
                skip_duplicates,
            } => {
                run_import_command(
                    &service,
                    &import_type,
                    input.as_deref(),
                    ImportOptions {
                        dry_run,
                        skip_duplicates,
                    },
                )
                .await?
            }

            Commands::Clear { yes } => {
                if !yes {
                    bail!("This deletes every product, sale, expense and user. Re-run with --yes to confirm");
                }
                service.clear_all_data().await?;
                println!("All data cleared.");
            }
        }

        Ok(())
    }
}

async fn run_plan_command(service: &PosService, cmd: PlanCommands) -> Result<()> {
    match cmd {
        PlanCommands::Show => {
            let user = service.current_user().await?;
            let plan = user.plan;
            println!("Plan: {} ({}/month)", plan, format_peso(plan.monthly_price()));
            println!(
                "  Products:   {}",
                plan.max_products()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unlimited".to_string())
            );
            println!(
                "  Users:      {}",
                plan.max_users()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unlimited".to_string())
            );
            for feature in [
                Feature::Reports,
                Feature::Export,
                Feature::BirForms,
                Feature::Accounting,
            ] {
                let available = has_capability(plan, feature);
                println!(
                    "  {:<11} {}",
                    format!("{}:", feature),
                    if available { "yes" } else { "no" }
                );
            }
        }

        PlanCommands::Upgrade { plan } => {
            let target = parse_plan(&plan)?;
            let user = service.upgrade_plan(target).await?;
            println!(
                "Upgraded to {} ({}/month)",
                user.plan,
                format_peso(user.plan.monthly_price())
            );
        }
    }

    Ok(())
}

async fn run_product_command(service: &PosService, cmd: ProductCommands) -> Result<()> {
    match cmd {
        ProductCommands::Add {
            name,
            sku,
            price,
            cost,
            category,
            stock,
            reorder_point,
            barcode,
        } => {
            let product = service
                .add_product(NewProduct {
                    name,
                    sku,
                    barcode,
                    category: parse_product_category(&category)?,
                    price: parse_money(&price)?,
                    cost: parse_money(&cost)?,
                    stock,
                    reorder_point,
                })
                .await?;
            println!(
                "Added product: {} [{}] at {} ({} in stock)",
                product.name,
                product.sku,
                format_peso(product.price),
                product.stock
            );
        }

        ProductCommands::List { category, search } => {
            let filter = ProductFilter {
                category: category
                    .as_deref()
                    .map(parse_product_category)
                    .transpose()?,
                search,
            };
            let products = service.list_products(&filter).await?;
            print_products(&products);
        }

        ProductCommands::Update {
            sku,
            name,
            new_sku,
            price,
            cost,
            category,
            stock,
            reorder_point,
            barcode,
        } => {
            let update = ProductUpdate {
                name,
                sku: new_sku,
                barcode,
                category: category
                    .as_deref()
                    .map(parse_product_category)
                    .transpose()?,
                price: price.as_deref().map(parse_money).transpose()?,
                cost: cost.as_deref().map(parse_money).transpose()?,
                stock,
                reorder_point,
            };
            let product = service.update_product(&sku, update).await?;
            println!("Updated product: {} [{}]", product.name, product.sku);
        }

        ProductCommands::Delete { sku } => {
            let product = service.delete_product(&sku).await?;
            println!("Deleted product: {} [{}]", product.name, product.sku);
        }

        ProductCommands::LowStock => {
            let products = service.low_stock_products().await?;
            if products.is_empty() {
                println!("All products are above their reorder point.");
            } else {
                print_products(&products);
            }
        }
    }

    Ok(())
}

fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }

    println!(
        "{:<12} {:<28} {:<14} {:>10} {:>10} {:>7} {:>7}",
        "SKU", "NAME", "CATEGORY", "PRICE", "COST", "STOCK", "MARGIN"
    );
    println!("{}", "-".repeat(94));
    for p in products {
        println!(
            "{:<12} {:<28} {:<14} {:>10} {:>10} {:>7} {:>6.1}%{}",
            truncate(&p.sku, 12),
            truncate(&p.name, 28),
            p.category.as_str(),
            format_cents(p.price),
            format_cents(p.cost),
            p.stock,
            p.margin_percentage(),
            if p.is_low_stock() { " LOW" } else { "" }
        );
    }
}

async fn run_sales_command(
    service: &PosService,
    from_date: Option<String>,
    to_date: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let from = optional_date(from_date.as_deref())?;
    let to = optional_date(to_date.as_deref())?.map(end_of_day);

    let mut sales = match (from, to) {
        (None, None) => service.list_sales().await?,
        (from, to) => {
            service
                .sales_between(
                    from.unwrap_or(DateTime::<Utc>::MIN_UTC),
                    to.unwrap_or(DateTime::<Utc>::MAX_UTC),
                )
                .await?
        }
    };

    sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    if let Some(limit) = limit {
        sales.truncate(limit);
    }

    if sales.is_empty() {
        println!("No sales found.");
        return Ok(());
    }

    println!(
        "{:<17} {:<14} {:<36} {:>10} {:>10} {:<12}",
        "DATE", "INVOICE", "ITEMS", "TOTAL", "PROFIT", "SOLD BY"
    );
    println!("{}", "-".repeat(104));
    for sale in &sales {
        let items = sale
            .items
            .iter()
            .map(|i| format!("{} ({})", i.product_name, i.quantity))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<17} {:<14} {:<36} {:>10} {:>10} {:<12}",
            sale.timestamp.format("%Y-%m-%d %H:%M"),
            truncate(&sale.invoice_ref(), 14),
            truncate(&items, 36),
            format_cents(sale.total),
            format_cents(sale.gross_profit),
            truncate(&sale.sold_by, 12)
        );
    }

    let total: Cents = sales.iter().map(|s| s.total).sum();
    println!("{}", "-".repeat(104));
    println!("{} sale(s), {} total", sales.len(), format_peso(total));
    Ok(())
}

async fn run_expense_command(service: &PosService, cmd: ExpenseCommands) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            description,
            amount,
            category,
            date,
        } => {
            let timestamp = optional_date(date.as_deref())?.unwrap_or_else(Utc::now);
            let expense = service
                .record_expense(
                    &description,
                    parse_expense_category(&category)?,
                    parse_money(&amount)?,
                    timestamp,
                )
                .await?;
            println!(
                "Recorded expense: {} {} ({}) [{}]",
                format_peso(expense.amount),
                expense.description,
                expense.category,
                short_id(expense.id)
            );
        }

        ExpenseCommands::List { category } => {
            let category = category
                .as_deref()
                .map(parse_expense_category)
                .transpose()?;
            let expenses: Vec<_> = service
                .list_expenses()
                .await?
                .into_iter()
                .filter(|e| category.is_none_or(|c| e.category == c))
                .collect();

            if expenses.is_empty() {
                println!("No expenses found.");
            } else {
                println!(
                    "{:<10} {:<12} {:<30} {:<18} {:>12}",
                    "ID", "DATE", "DESCRIPTION", "CATEGORY", "AMOUNT"
                );
                println!("{}", "-".repeat(86));
                for e in &expenses {
                    println!(
                        "{:<10} {:<12} {:<30} {:<18} {:>12}",
                        short_id(e.id),
                        e.timestamp.format("%Y-%m-%d"),
                        truncate(&e.description, 30),
                        e.category.as_str(),
                        format_cents(e.amount)
                    );
                }
                let total: Cents = expenses.iter().map(|e| e.amount).sum();
                println!("{}", "-".repeat(86));
                println!("{:<73} {:>12}", "TOTAL", format_cents(total));
            }
        }

        ExpenseCommands::Update {
            id,
            description,
            amount,
            category,
            date,
        } => {
            let update = ExpenseUpdate {
                description,
                category: category
                    .as_deref()
                    .map(parse_expense_category)
                    .transpose()?,
                amount: amount.as_deref().map(parse_money).transpose()?,
                timestamp: optional_date(date.as_deref())?,
            };
            let expense = service.update_expense(&id, update).await?;
            println!(
                "Updated expense: {} {} [{}]",
                format_peso(expense.amount),
                expense.description,
                short_id(expense.id)
            );
        }

        ExpenseCommands::Delete { id } => {
            let expense = service.delete_expense(&id).await?;
            println!(
                "Deleted expense: {} {}",
                format_peso(expense.amount),
                expense.description
            );
        }
    }

    Ok(())
}

async fn run_ledger_command(service: &PosService, cmd: LedgerCommands) -> Result<()> {
    match cmd {
        LedgerCommands::Journal { limit, format } => {
            let entries = newest_first(service.journal().await?, limit);

            if is_json(&format)? {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No journal entries.");
                return Ok(());
            }

            for entry in &entries {
                println!(
                    "{}  {}  {}",
                    entry.date.format("%Y-%m-%d"),
                    entry.reference,
                    entry.description
                );
                for line in &entry.debits {
                    println!(
                        "    Dr {:<32} {:>12}",
                        account_label(line.account),
                        format_cents(line.amount)
                    );
                }
                for line in &entry.credits {
                    println!(
                        "        Cr {:<28} {:>25}",
                        account_label(line.account),
                        format_cents(line.amount)
                    );
                }
                println!();
            }
        }

        LedgerCommands::Accounts { format } => {
            let balances = service.account_balances().await?;
            if is_json(&format)? {
                let rows: Vec<_> = balances
                    .iter()
                    .map(|(code, balance)| AccountBalanceRow {
                        code: code.0,
                        name: find_account(*code).map(|a| a.name).unwrap_or("Unknown"),
                        balance: *balance,
                    })
                    .collect();
                return print_json(&rows);
            }

            if balances.is_empty() {
                println!("No account activity.");
                return Ok(());
            }
            println!("{:<6} {:<28} {:>14}", "CODE", "ACCOUNT", "BALANCE");
            println!("{}", "-".repeat(50));
            for (code, balance) in &balances {
                println!(
                    "{:<6} {:<28} {:>14}",
                    code.0,
                    find_account(*code).map(|a| a.name).unwrap_or("Unknown"),
                    format_cents(*balance)
                );
            }
        }

        LedgerCommands::TrialBalance { all, format } => {
            let trial_balance = service.trial_balance().await?;
            if is_json(&format)? {
                return print_json(&trial_balance);
            }

            println!(
                "{:<6} {:<28} {:<10} {:>12} {:>12}",
                "CODE", "ACCOUNT", "TYPE", "DEBIT", "CREDIT"
            );
            println!("{}", "-".repeat(72));
            for row in trial_balance.rows.iter().filter(|r| all || !r.is_zero()) {
                println!(
                    "{:<6} {:<28} {:<10} {:>12} {:>12}",
                    row.code.0,
                    row.name,
                    row.account_type.as_str(),
                    blank_if_zero(row.debit),
                    blank_if_zero(row.credit)
                );
            }
            println!("{}", "-".repeat(72));
            println!(
                "{:<46} {:>12} {:>12}",
                "TOTAL",
                format_cents(trial_balance.total_debits),
                format_cents(trial_balance.total_credits)
            );
            if !trial_balance.is_balanced() {
                println!("\nWARNING: debits and credits do not match.");
            }
        }

        LedgerCommands::Income { format } => {
            let statement = service.income_statement().await?;
            if is_json(&format)? {
                return print_json(&statement);
            }

            println!("Income Statement");
            println!("{}", "-".repeat(44));
            println!("{:<28} {:>15}", "Revenue", format_peso(statement.revenue));
            println!(
                "{:<28} {:>15}",
                "Cost of Goods Sold",
                format_peso(statement.cost_of_goods_sold)
            );
            println!("{:<28} {:>15}", "Gross Profit", format_peso(statement.gross_profit));
            println!(
                "{:<28} {:>15}",
                "Operating Expenses",
                format_peso(statement.total_expenses)
            );
            println!("{}", "-".repeat(44));
            println!("{:<28} {:>15}", "Net Income", format_peso(statement.net_income));
            println!();
            println!("Gross margin: {:.1}%", statement.gross_margin);
            println!("Net margin:   {:.1}%", statement.net_margin);
        }

        LedgerCommands::BalanceSheet { format } => {
            let sheet = service.balance_sheet().await?;
            if is_json(&format)? {
                return print_json(&sheet);
            }

            println!("Balance Sheet");
            for (title, lines, total) in [
                ("Assets", &sheet.assets, sheet.total_assets),
                ("Liabilities", &sheet.liabilities, sheet.total_liabilities),
            ] {
                println!("\n{}", title);
                println!("{}", "-".repeat(46));
                for line in lines {
                    println!(
                        "  {:<28} {:>15}",
                        format!("{} {}", line.code, line.name),
                        format_cents(line.amount)
                    );
                }
                println!("  {:<28} {:>15}", format!("Total {}", title), format_peso(total));
            }
            println!("\nEquity");
            println!("{}", "-".repeat(46));
            println!("  {:<28} {:>15}", "Net income", format_cents(sheet.equity));
            println!("  {:<28} {:>15}", "Total Equity", format_peso(sheet.total_equity));

            println!();
            if sheet.is_balanced() {
                println!("Assets equal liabilities plus equity.");
            } else {
                println!(
                    "Assets differ from liabilities plus equity by {}.",
                    format_peso(sheet.difference())
                );
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct AccountBalanceRow {
    code: u16,
    name: &'static str,
    balance: Cents,
}

async fn run_report_command(service: &PosService, cmd: ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Summary { period, format } => {
            let period = parse_period(&period)?;
            let report = service.period_report(period, Utc::now()).await?;
            if is_json(&format)? {
                return print_json(&report);
            }

            println!(
                "{} ({} to {})",
                period.label(),
                report.from_date.format("%Y-%m-%d"),
                report.to_date.format("%Y-%m-%d")
            );
            println!("{}", "-".repeat(44));
            println!(
                "{:<22} {:>15}  {} transaction(s)",
                "Revenue",
                format_peso(report.revenue),
                report.sale_count
            );
            println!("{:<22} {:>15}", "Gross profit", format_peso(report.gross_profit));
            println!(
                "{:<22} {:>15}  {} expense(s)",
                "Expenses",
                format_peso(report.expenses),
                report.expense_count
            );
            println!("{:<22} {:>15}", "Net income", format_peso(report.net_income));

            if !report.top_products.is_empty() {
                println!("\nTop products");
                println!("{:<28} {:>6} {:>14}", "PRODUCT", "QTY", "REVENUE");
                for p in &report.top_products {
                    println!(
                        "{:<28} {:>6} {:>14}",
                        truncate(&p.name, 28),
                        p.quantity,
                        format_cents(p.revenue)
                    );
                }
            }

            if !report.sales_by_category.is_empty() {
                println!("\nSales by category");
                for c in &report.sales_by_category {
                    println!("  {:<20} {:>14}", c.category.as_str(), format_cents(c.revenue));
                }
            }

            if !report.expenses_by_category.is_empty() {
                println!("\nExpenses by category");
                for c in &report.expenses_by_category {
                    println!("  {:<20} {:>14}", c.category.as_str(), format_cents(c.amount));
                }
            }
        }

        ReportCommands::Inventory { format } => {
            let valuation = service.inventory_valuation().await?;
            if is_json(&format)? {
                return print_json(&valuation);
            }

            if valuation.rows.is_empty() {
                println!("No products found.");
                return Ok(());
            }
            println!(
                "{:<12} {:<28} {:>7} {:>10} {:>12}",
                "SKU", "PRODUCT", "STOCK", "UNIT COST", "VALUE"
            );
            println!("{}", "-".repeat(73));
            for row in &valuation.rows {
                println!(
                    "{:<12} {:<28} {:>7} {:>10} {:>12}",
                    truncate(&row.sku, 12),
                    truncate(&row.name, 28),
                    row.stock,
                    format_cents(row.unit_cost),
                    format_cents(row.value)
                );
            }
            println!("{}", "-".repeat(73));
            println!(
                "{:<41} {:>7} {:>23}",
                "TOTAL",
                valuation.total_units,
                format_peso(valuation.total_value)
            );
        }
    }

    Ok(())
}

async fn run_dashboard_command(service: &PosService, format: &str) -> Result<()> {
    let summary = service.dashboard(Utc::now()).await?;
    if is_json(format)? {
        return print_json(&summary);
    }

    let store = service.store_info().await?;
    if !store.name.is_empty() {
        println!("{}", store.name);
    }
    println!("Dashboard for {}", summary.date);
    println!("{}", "-".repeat(44));
    println!(
        "{:<22} {:>15}  {} sale(s)",
        "Sales today",
        format_peso(summary.revenue),
        summary.sale_count
    );
    println!("{:<22} {:>15}", "Gross profit", format_peso(summary.gross_profit));
    println!("{:<22} {:>15}", "Expenses", format_peso(summary.expenses));
    println!("{:<22} {:>15}", "Net income", format_peso(summary.net_income));
    println!(
        "{:<22} {:>15}",
        "Products",
        format!("{} ({} low)", summary.product_count, summary.low_stock_count)
    );

    println!("\nLast 7 days");
    println!("{:<12} {:>14} {:>14}", "DATE", "REVENUE", "PROFIT");
    for day in &summary.trend {
        println!(
            "{:<12} {:>14} {:>14}",
            day.date.format("%a %m-%d"),
            format_cents(day.revenue),
            format_cents(day.profit)
        );
    }

    if !summary.low_stock.is_empty() {
        println!("\nLow stock: {}", summary.low_stock.join(", "));
    }

    Ok(())
}

async fn run_user_command(service: &PosService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Add { name, email, role } => {
            let user = service.add_user(&name, &email, parse_role(&role)?).await?;
            println!(
                "Added user: {} <{}> as {} [{}]",
                user.name,
                user.email,
                user.role,
                short_id(user.id)
            );
        }

        UserCommands::List => {
            let users = service.list_users().await?;
            let current = service.current_user().await?;
            println!("{:<10} {:<20} {:<28} {:<8}", "ID", "NAME", "EMAIL", "ROLE");
            println!("{}", "-".repeat(68));
            for user in &users {
                println!(
                    "{:<10} {:<20} {:<28} {:<8}{}",
                    short_id(user.id),
                    truncate(&user.name, 20),
                    truncate(&user.email, 28),
                    user.role.as_str(),
                    if user.id == current.id { " (you)" } else { "" }
                );
            }
            let limit = current
                .plan
                .max_users()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unlimited".to_string());
            println!("\n{} of {} user(s) on the {} plan", users.len(), limit, current.plan);
        }

        UserCommands::Update {
            id,
            name,
            email,
            role,
        } => {
            let update = UserUpdate {
                name,
                email,
                role: role.as_deref().map(parse_role).transpose()?,
            };
            let user = service.update_user(&id, update).await?;
            println!("Updated user: {} <{}> ({})", user.name, user.email, user.role);
        }

        UserCommands::Delete { id } => {
            let user = service.delete_user(&id).await?;
            println!("Removed user: {} <{}>", user.name, user.email);
        }
    }

    Ok(())
}

async fn run_settings_command(service: &PosService, cmd: SettingsCommands) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            let info = service.store_info().await?;
            println!("Store:   {}", info.name);
            println!("Address: {}", info.address);
            println!("Phone:   {}", info.phone);
            println!("Owner:   {}", info.owner);
        }

        SettingsCommands::Set {
            name,
            address,
            phone,
            owner,
        } => {
            let current = service.store_info().await?;
            let info = StoreInfo {
                name: name.unwrap_or(current.name),
                address: address.unwrap_or(current.address),
                phone: phone.unwrap_or(current.phone),
                owner: owner.unwrap_or(current.owner),
            };
            service.save_store_info(&info).await?;
            println!("Store settings saved.");
        }
    }

    Ok(())
}

async fn run_export_command(
    service: &PosService,
    export_type: &str,
    output: Option<&str>,
    period: Option<&str>,
) -> Result<()> {
    let mut exporter = Exporter::new(service);
    if let Some(period) = period {
        exporter = exporter.for_period(parse_period(period)?, Utc::now());
    }

    let kind = match export_type {
        "backup" | "full" => None,
        other => Some(ExportKind::from_str(other).ok_or_else(|| {
            anyhow!(
                "Unknown export type '{}'. Valid types: backup, {}",
                other,
                ExportKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })?),
    };

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match kind {
        None => {
            let snapshot = exporter.export_backup_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported backup: {} products, {} sales, {} expenses, {} users",
                    snapshot.products.as_ref().map_or(0, Vec::len),
                    snapshot.sales.as_ref().map_or(0, Vec::len),
                    snapshot.expenses.as_ref().map_or(0, Vec::len),
                    snapshot.users.as_ref().map_or(0, Vec::len)
                );
            }
        }
        Some(kind) => {
            let count = exporter.export_csv(kind, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} {} row(s)", count, kind.as_str());
            }
        }
    }

    Ok(())
}

async fn run_import_command(
    service: &PosService,
    import_type: &str,
    input: Option<&str>,
    options: ImportOptions,
) -> Result<()> {
    let importer = Importer::new(service);

    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    match import_type {
        "products" => {
            let result = importer.import_products_csv(reader, options.clone()).await?;

            if options.dry_run {
                println!("Dry run: {} product(s) would be imported", result.imported);
            } else {
                println!("Imported {} product(s)", result.imported);
            }
            if result.skipped > 0 {
                println!("Skipped {} duplicate(s)", result.skipped);
            }
            if !result.errors.is_empty() {
                println!("\n{} error(s):", result.errors.len());
                for error in &result.errors {
                    match &error.field {
                        Some(field) => {
                            println!("  Line {}: {} ({})", error.line, error.error, field)
                        }
                        None => println!("  Line {}: {}", error.line, error.error),
                    }
                }
            }
        }
        "backup" | "full" => {
            if options.dry_run {
                bail!("--dry-run is only supported for product imports");
            }
            let summary = importer.restore_backup_json(reader).await?;
            println!("Backup restored:");
            for (label, count) in [
                ("products", summary.products),
                ("sales", summary.sales),
                ("expenses", summary.expenses),
                ("users", summary.users),
            ] {
                match count {
                    Some(n) => println!("  {:<10} {}", label, n),
                    None => println!("  {:<10} (kept)", label),
                }
            }
            if summary.store_info {
                println!("  store settings restored");
            }
        }
        other => bail!("Unknown import type '{}'. Valid types: products, backup", other),
    }

    Ok(())
}

// ========================
// Parsing and formatting helpers
// ========================

fn parse_money(s: &str) -> Result<Cents> {
    parse_cents(s).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", s))
}

fn parse_plan(s: &str) -> Result<SubscriptionPlan> {
    SubscriptionPlan::from_str(s)
        .ok_or_else(|| anyhow!("Invalid plan '{}'. Valid plans: free, pro, business", s))
}

fn parse_role(s: &str) -> Result<UserRole> {
    UserRole::from_str(s)
        .ok_or_else(|| anyhow!("Invalid role '{}'. Valid roles: owner, admin, staff", s))
}

fn parse_period(s: &str) -> Result<ReportPeriod> {
    ReportPeriod::from_str(s)
        .ok_or_else(|| anyhow!("Invalid period '{}'. Valid periods: daily, monthly, yearly", s))
}

fn parse_product_category(s: &str) -> Result<ProductCategory> {
    ProductCategory::from_str(s).ok_or_else(|| {
        anyhow!(
            "Invalid category '{}'. Valid categories: {}",
            s,
            ProductCategory::ALL
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn parse_expense_category(s: &str) -> Result<ExpenseCategory> {
    ExpenseCategory::from_str(s).ok_or_else(|| {
        anyhow!(
            "Invalid category '{}'. Valid categories: {}",
            s,
            ExpenseCategory::ALL
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

/// Parses `SKU` or `SKU:QTY`.
fn parse_sale_line(item: &str) -> Result<SaleLine> {
    match item.rsplit_once(':') {
        Some((sku, qty)) => {
            let quantity = qty
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid quantity in '{}'", item))?;
            Ok(SaleLine::new(sku.trim(), quantity))
        }
        None => Ok(SaleLine::new(item.trim(), 1)),
    }
}

fn is_json(format: &str) -> Result<bool> {
    match format {
        "table" => Ok(false),
        "json" => Ok(true),
        _ => bail!("Invalid format '{}'. Use: table, json", format),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Journal entries ordered newest first, keeping the first `limit`.
/// Entries on the same date keep their derived order.
fn newest_first(mut entries: Vec<JournalEntry>, limit: Option<usize>) -> Vec<JournalEntry> {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

fn account_label(code: AccountCode) -> String {
    match find_account(code) {
        Some(account) => account.label(),
        None => code.to_string(),
    }
}

fn blank_if_zero(cents: Cents) -> String {
    if cents == 0 {
        String::new()
    } else {
        format_cents(cents)
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn optional_date(date: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    date.map(|d| {
        parse_date(d).with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", d))
    })
    .transpose()
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    // Parse YYYY-MM-DD format
    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .context("Date must be in YYYY-MM-DD format")?;

    // Convert to UTC datetime at midnight
    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid date"))?;

    Ok(DateTime::from_naive_utc_and_offset(naive_datetime, Utc))
}

/// Last instant of the day starting at `start`.
fn end_of_day(start: DateTime<Utc>) -> DateTime<Utc> {
    start + chrono::Duration::days(1) - chrono::Duration::nanoseconds(1)
}
