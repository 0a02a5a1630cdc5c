use thiserror::Error;

use crate::domain::{Feature, SubscriptionPlan};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("A product with SKU '{0}' already exists")]
    SkuAlreadyExists(String),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("A user with email '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid quantity for {product}: quantity must be greater than 0")]
    InvalidQuantity { product: String },

    #[error("Insufficient stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: u32,
        requested: u32,
    },

    #[error("Cannot record a sale with no items")]
    EmptySale,

    #[error("Your {plan} plan is limited to {limit} {resource}. Upgrade to add more")]
    PlanLimitReached {
        plan: SubscriptionPlan,
        resource: &'static str,
        limit: usize,
    },

    #[error("The {feature} feature is not available on the {plan} plan")]
    FeatureLocked {
        feature: Feature,
        plan: SubscriptionPlan,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not logged in. Run `tindahero login` first")]
    NotLoggedIn,

    #[error("Cannot change plan from {from} to {to}")]
    InvalidPlanChange {
        from: SubscriptionPlan,
        to: SubscriptionPlan,
    },

    #[error("Cannot delete your own account")]
    CannotDeleteSelf,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
