use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Context, Result, anyhow};
use serde::{Serialize, de::DeserializeOwned};

use super::Store;

/// In-process store holding JSON documents, for tests and dry runs.
/// Values go through serde exactly as they would for the SQLite store.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let values = self.values.read().map_err(|_| anyhow!("memory store poisoned"))?;
        values
            .get(key)
            .map(|json| serde_json::from_str(json))
            .transpose()
            .with_context(|| format!("Corrupt data stored under '{}'", key))
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.values
            .write()
            .map_err(|_| anyhow!("memory store poisoned"))?
            .insert(key.to_string(), json);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values
            .write()
            .map_err(|_| anyhow!("memory store poisoned"))?
            .remove(key);
        Ok(())
    }
}
