use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::domain::{
    AccountBalances, BalanceSheet, CHART_OF_ACCOUNTS, Cents, Expense, ExpenseCategory,
    Feature, IncomeStatement, InventoryValuation, JournalEntry, Product, ProductCategory, Sale,
    SaleItem, StoreInfo, SubscriptionPlan, TrialBalance, User, UserRole,
    compute_account_balances, compute_balance_sheet, compute_income_statement,
    compute_inventory_valuation, compute_trial_balance, derive_journal_entries, has_capability,
    within_limit,
};
use crate::storage::{
    ALL_KEYS, CURRENT_USER_KEY, EXPENSES_KEY, PRODUCTS_KEY, Repository, SALES_KEY,
    STORE_INFO_KEY, Store, USERS_KEY,
};

use super::AppError;
use super::reporting::{self, DashboardSummary, PeriodReport, ReportPeriod};

/// Application service for the point-of-sale ledger.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
///
/// Collections are loaded whole, changed in memory and saved back; the
/// ledger views are derived from the stored sales and expenses on every call.
pub struct PosService<S = Repository> {
    store: S,
}

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub category: ProductCategory,
    pub price: Cents,
    pub cost: Cents,
    pub stock: u32,
    pub reorder_point: u32,
}

/// Partial product edit; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<Cents>,
    pub cost: Option<Cents>,
    pub stock: Option<u32>,
    pub reorder_point: Option<u32>,
}

/// Filter for listing products
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub search: Option<String>,
}

/// One line of a sale being rung up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub sku: String,
    pub quantity: u32,
}

impl SaleLine {
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<Cents>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

/// Finds the single item whose id starts with `prefix`.
fn resolve_by_prefix<T>(
    items: &[T],
    prefix: &str,
    id_of: impl Fn(&T) -> String,
) -> Option<usize> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return None;
    }

    let mut matches = items
        .iter()
        .enumerate()
        .filter(|(_, item)| id_of(item).starts_with(&prefix))
        .map(|(index, _)| index);

    match (matches.next(), matches.next()) {
        (Some(index), None) => Some(index),
        _ => None,
    }
}

fn validate_money(label: &str, amount: Cents) -> Result<(), AppError> {
    if amount < 0 {
        return Err(AppError::InvalidAmount(format!(
            "{} cannot be negative",
            label
        )));
    }
    Ok(())
}

impl PosService<Repository> {
    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        debug!(database = database_path, "database initialized");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }
}

impl<S: Store> PosService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, AppError> {
        Ok(self.store.load(key).await?.unwrap_or_default())
    }

    async fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), AppError> {
        self.store.save(key, items).await?;
        Ok(())
    }

    // ========================
    // Session
    // ========================

    /// Start a session. An existing user with the same email is reused;
    /// otherwise a new owner is created. The first user to log in seeds
    /// the user list.
    pub async fn login(
        &self,
        email: &str,
        name: Option<String>,
        plan: Option<SubscriptionPlan>,
    ) -> Result<User, AppError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::InvalidInput("an email is required to log in".to_string()));
        }

        let mut users: Vec<User> = self.load_list(USERS_KEY).await?;
        let user = match users
            .iter_mut()
            .find(|u| u.email.eq_ignore_ascii_case(email))
        {
            Some(existing) => {
                if let Some(plan) = plan {
                    existing.plan = plan;
                }
                existing.clone()
            }
            None => {
                let name = name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| User::name_from_email(email));
                let user = User::new(
                    name,
                    email,
                    UserRole::Owner,
                    plan.unwrap_or(SubscriptionPlan::Free),
                );
                if users.is_empty() {
                    users.push(user.clone());
                }
                user
            }
        };

        if !users.is_empty() {
            self.save_list(USERS_KEY, &users).await?;
        }
        self.store.save(CURRENT_USER_KEY, &user).await?;

        info!(user = %user.name, plan = %user.plan, "logged in");
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.store.remove(CURRENT_USER_KEY).await?;
        info!("logged out");
        Ok(())
    }

    /// The logged-in user.
    pub async fn current_user(&self) -> Result<User, AppError> {
        self.store
            .load(CURRENT_USER_KEY)
            .await?
            .ok_or(AppError::NotLoggedIn)
    }

    /// Move the session's plan to a higher tier.
    pub async fn upgrade_plan(&self, target: SubscriptionPlan) -> Result<User, AppError> {
        let mut user = self.current_user().await?;
        if !user.plan.can_upgrade_to(target) {
            return Err(AppError::InvalidPlanChange {
                from: user.plan,
                to: target,
            });
        }

        let from = user.plan;
        user.plan = target;

        let mut users: Vec<User> = self.load_list(USERS_KEY).await?;
        if let Some(stored) = users.iter_mut().find(|u| u.id == user.id) {
            stored.plan = target;
            self.save_list(USERS_KEY, &users).await?;
        }
        self.store.save(CURRENT_USER_KEY, &user).await?;

        info!(from = %from, to = %target, "plan upgraded");
        Ok(user)
    }

    /// The session user, provided their plan includes `feature`.
    async fn require(&self, feature: Feature) -> Result<User, AppError> {
        let user = self.current_user().await?;
        if !has_capability(user.plan, feature) {
            warn!(feature = %feature, plan = %user.plan, "feature locked");
            return Err(AppError::FeatureLocked {
                feature,
                plan: user.plan,
            });
        }
        Ok(user)
    }

    /// Check that the session plan includes `feature`.
    pub async fn ensure_feature(&self, feature: Feature) -> Result<(), AppError> {
        self.require(feature).await.map(|_| ())
    }

    // ========================
    // Products
    // ========================

    pub async fn add_product(&self, new: NewProduct) -> Result<Product, AppError> {
        let user = self.current_user().await?;
        let mut products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;

        let limit = user.plan.max_products();
        if !within_limit(limit, products.len()) {
            return Err(AppError::PlanLimitReached {
                plan: user.plan,
                resource: "products",
                limit: limit.unwrap_or_default(),
            });
        }

        let name = new.name.trim();
        let sku = new.sku.trim();
        if name.is_empty() || sku.is_empty() {
            return Err(AppError::InvalidInput(
                "Product name and SKU are required".to_string(),
            ));
        }
        validate_money("Price", new.price)?;
        validate_money("Cost", new.cost)?;

        if products.iter().any(|p| p.sku.eq_ignore_ascii_case(sku)) {
            return Err(AppError::SkuAlreadyExists(sku.to_string()));
        }

        let mut product = Product::new(name, sku, new.category, new.price, new.cost)
            .with_stock(new.stock)
            .with_reorder_point(new.reorder_point);
        if let Some(barcode) = new.barcode.filter(|b| !b.trim().is_empty()) {
            product = product.with_barcode(barcode);
        }

        products.push(product.clone());
        self.save_list(PRODUCTS_KEY, &products).await?;

        info!(sku = %product.sku, name = %product.name, "product added");
        Ok(product)
    }

    pub async fn update_product(&self, sku: &str, update: ProductUpdate) -> Result<Product, AppError> {
        let mut products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        let index = products
            .iter()
            .position(|p| p.sku.eq_ignore_ascii_case(sku))
            .ok_or_else(|| AppError::ProductNotFound(sku.to_string()))?;

        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::InvalidInput(
                "Product name cannot be empty".to_string(),
            ));
        }
        if let Some(new_sku) = update.sku.as_deref().map(str::trim) {
            if new_sku.is_empty() {
                return Err(AppError::InvalidInput("SKU cannot be empty".to_string()));
            }
            let taken = products
                .iter()
                .enumerate()
                .any(|(i, p)| i != index && p.sku.eq_ignore_ascii_case(new_sku));
            if taken {
                return Err(AppError::SkuAlreadyExists(new_sku.to_string()));
            }
        }
        if let Some(price) = update.price {
            validate_money("Price", price)?;
        }
        if let Some(cost) = update.cost {
            validate_money("Cost", cost)?;
        }

        let product = &mut products[index];
        if let Some(name) = update.name {
            product.name = name.trim().to_string();
        }
        if let Some(new_sku) = update.sku {
            product.sku = new_sku.trim().to_string();
        }
        if let Some(barcode) = update.barcode {
            product.barcode = Some(barcode).filter(|b| !b.trim().is_empty());
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(cost) = update.cost {
            product.cost = cost;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        if let Some(reorder_point) = update.reorder_point {
            product.reorder_point = reorder_point;
        }

        let updated = product.clone();
        self.save_list(PRODUCTS_KEY, &products).await?;

        info!(sku = %updated.sku, "product updated");
        Ok(updated)
    }

    /// Remove a product. Past sales keep their own copy of its name and prices.
    pub async fn delete_product(&self, sku: &str) -> Result<Product, AppError> {
        let mut products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        let index = products
            .iter()
            .position(|p| p.sku.eq_ignore_ascii_case(sku))
            .ok_or_else(|| AppError::ProductNotFound(sku.to_string()))?;

        let removed = products.remove(index);
        self.save_list(PRODUCTS_KEY, &products).await?;

        info!(sku = %removed.sku, "product deleted");
        Ok(removed)
    }

    pub async fn find_product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        let products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        Ok(products
            .into_iter()
            .find(|p| p.sku.eq_ignore_ascii_case(sku.trim())))
    }

    pub async fn get_product(&self, sku: &str) -> Result<Product, AppError> {
        self.find_product_by_sku(sku)
            .await?
            .ok_or_else(|| AppError::ProductNotFound(sku.to_string()))
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        Ok(products
            .into_iter()
            .filter(|p| filter.category.is_none_or(|c| p.category == c))
            .filter(|p| filter.search.as_deref().is_none_or(|q| p.matches(q)))
            .collect())
    }

    /// Products at or below their reorder point.
    pub async fn low_stock_products(&self) -> Result<Vec<Product>, AppError> {
        let products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        Ok(products.into_iter().filter(|p| p.is_low_stock()).collect())
    }

    // ========================
    // Sales
    // ========================

    /// Ring up a sale. Lines with the same SKU are merged, every line is
    /// checked against stock before anything is written, and stock is
    /// decremented for each item sold.
    pub async fn record_sale(
        &self,
        lines: &[SaleLine],
        timestamp: DateTime<Utc>,
    ) -> Result<Sale, AppError> {
        let user = self.current_user().await?;
        if lines.is_empty() {
            return Err(AppError::EmptySale);
        }

        let mut merged: Vec<SaleLine> = Vec::with_capacity(lines.len());
        for line in lines {
            let sku = line.sku.trim();
            match merged.iter_mut().find(|m| m.sku.eq_ignore_ascii_case(sku)) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity)
                }
                None => merged.push(SaleLine::new(sku, line.quantity)),
            }
        }

        let mut products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        let mut items = Vec::with_capacity(merged.len());

        for line in &merged {
            let product = products
                .iter_mut()
                .find(|p| p.sku.eq_ignore_ascii_case(&line.sku))
                .ok_or_else(|| AppError::ProductNotFound(line.sku.clone()))?;

            if line.quantity == 0 {
                return Err(AppError::InvalidQuantity {
                    product: product.name.clone(),
                });
            }
            if line.quantity > product.stock {
                return Err(AppError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: line.quantity,
                });
            }

            items.push(SaleItem::from_product(product, line.quantity));
            product.stock -= line.quantity;
        }

        let sale = Sale::new(items, user.name, timestamp);

        let mut sales: Vec<Sale> = self.load_list(SALES_KEY).await?;
        sales.push(sale.clone());
        // Sale first, so stock is never decremented without a stored sale.
        self.save_list(SALES_KEY, &sales).await?;
        self.save_list(PRODUCTS_KEY, &products).await?;

        info!(
            invoice = %sale.invoice_ref(),
            total = sale.total,
            items = sale.item_count(),
            "sale recorded"
        );
        for product in products.iter().filter(|p| p.is_low_stock()) {
            if sale.items.iter().any(|i| i.product_id == product.id) {
                warn!(sku = %product.sku, stock = product.stock, "stock at or below reorder point");
            }
        }

        Ok(sale)
    }

    pub async fn list_sales(&self) -> Result<Vec<Sale>, AppError> {
        self.load_list(SALES_KEY).await
    }

    /// Sales with `from <= timestamp <= to`.
    pub async fn sales_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Sale>, AppError> {
        let sales = self.list_sales().await?;
        Ok(reporting::sales_in_range(&sales, from, to).cloned().collect())
    }

    // ========================
    // Expenses
    // ========================

    pub async fn record_expense(
        &self,
        description: &str,
        category: ExpenseCategory,
        amount: Cents,
        timestamp: DateTime<Utc>,
    ) -> Result<Expense, AppError> {
        let user = self.current_user().await?;

        if description.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "An expense needs a description".to_string(),
            ));
        }
        if amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        let expense = Expense::new(description.trim(), category, amount, timestamp, user.name);

        let mut expenses: Vec<Expense> = self.load_list(EXPENSES_KEY).await?;
        expenses.push(expense.clone());
        self.save_list(EXPENSES_KEY, &expenses).await?;

        info!(reference = %expense.reference(), amount, category = %category, "expense recorded");
        Ok(expense)
    }

    /// Edit an expense found by id or unique id prefix.
    pub async fn update_expense(
        &self,
        id: &str,
        update: ExpenseUpdate,
    ) -> Result<Expense, AppError> {
        let mut expenses: Vec<Expense> = self.load_list(EXPENSES_KEY).await?;
        let index = resolve_by_prefix(&expenses, id, |e| e.id.to_string())
            .ok_or_else(|| AppError::ExpenseNotFound(id.to_string()))?;

        if update
            .description
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err(AppError::InvalidInput(
                "An expense needs a description".to_string(),
            ));
        }
        if update.amount.is_some_and(|amount| amount <= 0) {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        let expense = &mut expenses[index];
        if let Some(description) = update.description {
            expense.description = description.trim().to_string();
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(amount) = update.amount {
            expense.amount = amount;
        }
        if let Some(timestamp) = update.timestamp {
            expense.timestamp = timestamp;
        }

        let updated = expense.clone();
        self.save_list(EXPENSES_KEY, &expenses).await?;

        info!(reference = %updated.reference(), "expense updated");
        Ok(updated)
    }

    pub async fn delete_expense(&self, id: &str) -> Result<Expense, AppError> {
        let mut expenses: Vec<Expense> = self.load_list(EXPENSES_KEY).await?;
        let index = resolve_by_prefix(&expenses, id, |e| e.id.to_string())
            .ok_or_else(|| AppError::ExpenseNotFound(id.to_string()))?;

        let removed = expenses.remove(index);
        self.save_list(EXPENSES_KEY, &expenses).await?;

        info!(reference = %removed.reference(), "expense deleted");
        Ok(removed)
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>, AppError> {
        self.load_list(EXPENSES_KEY).await
    }

    // ========================
    // Ledger
    // ========================

    /// Journal entries derived from every stored sale and expense.
    pub async fn journal(&self) -> Result<Vec<JournalEntry>, AppError> {
        self.require(Feature::Accounting).await?;
        let sales = self.list_sales().await?;
        let expenses = self.list_expenses().await?;

        let entries = derive_journal_entries(&sales, &expenses);
        debug!(entries = entries.len(), "journal derived");
        Ok(entries)
    }

    pub async fn account_balances(&self) -> Result<AccountBalances, AppError> {
        let entries = self.journal().await?;
        Ok(compute_account_balances(&entries))
    }

    pub async fn trial_balance(&self) -> Result<TrialBalance, AppError> {
        let balances = self.account_balances().await?;
        let trial_balance = compute_trial_balance(CHART_OF_ACCOUNTS, &balances);
        if !trial_balance.is_balanced() {
            warn!(
                debits = trial_balance.total_debits,
                credits = trial_balance.total_credits,
                "trial balance does not balance"
            );
        }
        Ok(trial_balance)
    }

    pub async fn income_statement(&self) -> Result<IncomeStatement, AppError> {
        self.require(Feature::Accounting).await?;
        let sales = self.list_sales().await?;
        let expenses = self.list_expenses().await?;
        Ok(compute_income_statement(&sales, &expenses))
    }

    /// Balance sheet with net income as the whole of equity. Any gap
    /// between the two sides is reported through `difference()`.
    pub async fn balance_sheet(&self) -> Result<BalanceSheet, AppError> {
        let balances = self.account_balances().await?;
        let income = self.income_statement().await?;
        let sheet = compute_balance_sheet(CHART_OF_ACCOUNTS, &balances, income.net_income);
        if !sheet.is_balanced() {
            debug!(difference = sheet.difference(), "balance sheet out of balance");
        }
        Ok(sheet)
    }

    pub async fn inventory_valuation(&self) -> Result<InventoryValuation, AppError> {
        self.require(Feature::Reports).await?;
        let products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        Ok(compute_inventory_valuation(&products))
    }

    // ========================
    // Reports
    // ========================

    pub async fn period_report(
        &self,
        period: ReportPeriod,
        now: DateTime<Utc>,
    ) -> Result<PeriodReport, AppError> {
        self.require(Feature::Reports).await?;
        let products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        let sales = self.list_sales().await?;
        let expenses = self.list_expenses().await?;
        Ok(reporting::build_period_report(
            period, now, &sales, &expenses, &products,
        ))
    }

    /// Today's figures and the last seven days. Available on every plan.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardSummary, AppError> {
        self.current_user().await?;
        let products: Vec<Product> = self.load_list(PRODUCTS_KEY).await?;
        let sales = self.list_sales().await?;
        let expenses = self.list_expenses().await?;
        Ok(reporting::build_dashboard(now, &products, &sales, &expenses))
    }

    // ========================
    // Users
    // ========================

    /// All users. An empty list is seeded with the session user.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.load_list(USERS_KEY).await?;
        if users.is_empty() {
            let current = self.current_user().await?;
            users.push(current);
            self.save_list(USERS_KEY, &users).await?;
        }
        Ok(users)
    }

    pub async fn add_user(
        &self,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let current = self.current_user().await?;
        if !current.role.can_manage_users() {
            return Err(AppError::PermissionDenied(format!(
                "a {} cannot add users",
                current.role
            )));
        }

        let mut users = self.list_users().await?;
        let limit = current.plan.max_users();
        if !within_limit(limit, users.len()) {
            return Err(AppError::PlanLimitReached {
                plan: current.plan,
                resource: "users",
                limit: limit.unwrap_or_default(),
            });
        }
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email.trim())) {
            return Err(AppError::UserAlreadyExists(email.trim().to_string()));
        }

        let user = User::new(name.trim(), email.trim(), role, current.plan);
        users.push(user.clone());
        self.save_list(USERS_KEY, &users).await?;

        info!(user = %user.name, role = %user.role, "user added");
        Ok(user)
    }

    /// Edit a user found by id or unique id prefix.
    pub async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, AppError> {
        let current = self.current_user().await?;
        if !current.role.can_manage_users() {
            return Err(AppError::PermissionDenied(format!(
                "a {} cannot edit users",
                current.role
            )));
        }

        let mut users = self.list_users().await?;
        let index = resolve_by_prefix(&users, id, |u| u.id.to_string())
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;

        let user = &mut users[index];
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(role) = update.role {
            user.role = role;
        }

        let updated = user.clone();
        self.save_list(USERS_KEY, &users).await?;
        if updated.id == current.id {
            self.store.save(CURRENT_USER_KEY, &updated).await?;
        }

        info!(user = %updated.name, "user updated");
        Ok(updated)
    }

    pub async fn delete_user(&self, id: &str) -> Result<User, AppError> {
        let current = self.current_user().await?;
        if !current.role.can_manage_users() {
            return Err(AppError::PermissionDenied(format!(
                "a {} cannot remove users",
                current.role
            )));
        }

        let mut users = self.list_users().await?;
        let index = resolve_by_prefix(&users, id, |u| u.id.to_string())
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;
        if users[index].id == current.id {
            return Err(AppError::CannotDeleteSelf);
        }

        let removed = users.remove(index);
        self.save_list(USERS_KEY, &users).await?;

        info!(user = %removed.name, "user deleted");
        Ok(removed)
    }

    // ========================
    // Settings
    // ========================

    pub async fn store_info(&self) -> Result<StoreInfo, AppError> {
        Ok(self.store.load(STORE_INFO_KEY).await?.unwrap_or_default())
    }

    pub async fn save_store_info(&self, info: &StoreInfo) -> Result<(), AppError> {
        self.store.save(STORE_INFO_KEY, info).await?;
        info!(store = %info.name, "store info saved");
        Ok(())
    }

    /// Remove every stored collection. The session survives.
    pub async fn clear_all_data(&self) -> Result<(), AppError> {
        for key in ALL_KEYS.into_iter().filter(|k| *k != CURRENT_USER_KEY) {
            self.store.remove(key).await?;
        }
        warn!("all data cleared");
        Ok(())
    }
}
