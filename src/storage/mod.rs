mod memory;
mod repository;

pub use memory::*;
pub use repository::*;

use anyhow::Result;
use serde::{Serialize, de::DeserializeOwned};

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

pub const PRODUCTS_KEY: &str = "products";
pub const SALES_KEY: &str = "sales";
pub const EXPENSES_KEY: &str = "expenses";
pub const USERS_KEY: &str = "users";
pub const CURRENT_USER_KEY: &str = "current_user";
pub const STORE_INFO_KEY: &str = "store_info";

/// Every key the application writes.
pub const ALL_KEYS: [&str; 6] = [
    PRODUCTS_KEY,
    SALES_KEY,
    EXPENSES_KEY,
    USERS_KEY,
    CURRENT_USER_KEY,
    STORE_INFO_KEY,
];

/// Key-value persistence for whole collections.
///
/// Values are replaced as a unit on `save`; there are no partial updates.
#[allow(async_fn_in_trait)]
pub trait Store {
    /// Load the value stored under `key`, `None` when absent.
    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
