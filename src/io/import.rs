use anyhow::{Context, Result, bail};
use std::io::Read;
use tracing::{info, warn};

use crate::application::{AppError, NewProduct, PosService, ProductFilter};
use crate::domain::{ProductCategory, parse_cents};
use crate::io::export::{BACKUP_VERSION, BackupSnapshot};
use crate::storage::{
    CURRENT_USER_KEY, EXPENSES_KEY, MemoryStore, PRODUCTS_KEY, SALES_KEY, STORE_INFO_KEY, Store,
    USERS_KEY,
};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

/// Error that occurred during import
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub dry_run: bool,
    pub skip_duplicates: bool,
}

/// Collections written by a backup restore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    pub products: Option<usize>,
    pub sales: Option<usize>,
    pub expenses: Option<usize>,
    pub users: Option<usize>,
    pub store_info: bool,
}

/// Importer for loading data into the store
pub struct Importer<'a, S: Store> {
    service: &'a PosService<S>,
}

impl<'a, S: Store> Importer<'a, S> {
    pub fn new(service: &'a PosService<S>) -> Self {
        Self { service }
    }

    /// Import products from CSV with the inventory export's columns:
    /// sku, name, barcode, category, price, cost, stock, reorder_point.
    /// Extra columns are ignored.
    ///
    /// A dry run adds the rows to an in-memory copy of the current products,
    /// so it reports the same rejections a real import would.
    pub async fn import_products_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let result = if options.dry_run {
            let scratch = self.scratch_copy().await?;
            add_product_rows(&scratch, reader, &options).await?
        } else {
            add_product_rows(self.service, reader, &options).await?
        };

        info!(
            imported = result.imported,
            skipped = result.skipped,
            errors = result.errors.len(),
            dry_run = options.dry_run,
            "product import finished"
        );
        Ok(result)
    }

    async fn scratch_copy(&self) -> Result<PosService<MemoryStore>> {
        let user = self.service.current_user().await?;
        let products = self
            .service
            .list_products(&ProductFilter::default())
            .await?;

        let store = MemoryStore::new();
        store.save(CURRENT_USER_KEY, &user).await?;
        store.save(PRODUCTS_KEY, &products).await?;
        Ok(PosService::new(store))
    }

    /// Restore a JSON backup. Each collection present in the snapshot
    /// replaces the stored one; absent collections are kept.
    pub async fn restore_backup_json<R: Read>(&self, reader: R) -> Result<RestoreSummary> {
        let snapshot: BackupSnapshot =
            serde_json::from_reader(reader).context("Invalid backup file")?;
        if snapshot.version != BACKUP_VERSION {
            bail!(
                "Unsupported backup version '{}' (expected '{}')",
                snapshot.version,
                BACKUP_VERSION
            );
        }

        let store = self.service.store();
        let mut summary = RestoreSummary::default();

        if let Some(products) = &snapshot.products {
            store.save(PRODUCTS_KEY, products).await?;
            summary.products = Some(products.len());
        }
        if let Some(sales) = &snapshot.sales {
            store.save(SALES_KEY, sales).await?;
            summary.sales = Some(sales.len());
        }
        if let Some(expenses) = &snapshot.expenses {
            store.save(EXPENSES_KEY, expenses).await?;
            summary.expenses = Some(expenses.len());
        }
        if let Some(users) = &snapshot.users {
            store.save(USERS_KEY, users).await?;
            summary.users = Some(users.len());
        }
        if let Some(store_info) = &snapshot.store_info {
            store.save(STORE_INFO_KEY, store_info).await?;
            summary.store_info = true;
        }

        info!(exported_at = %snapshot.exported_at, "backup restored");
        Ok(summary)
    }
}

async fn add_product_rows<S: Store, R: Read>(
    service: &PosService<S>,
    reader: R,
    options: &ImportOptions,
) -> Result<ImportResult> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut result = ImportResult::default();

    for (line_num, record) in csv_reader.records().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing

        let record = match record {
            Ok(r) => r,
            Err(e) => {
                result.errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };

        let product = match parse_product_record(&record) {
            Ok(p) => p,
            Err((field, error)) => {
                result.errors.push(ImportError {
                    line,
                    field: Some(field.to_string()),
                    error,
                });
                continue;
            }
        };

        match service.add_product(product).await {
            Ok(_) => result.imported += 1,
            Err(AppError::SkuAlreadyExists(_)) if options.skip_duplicates => {
                result.skipped += 1;
            }
            Err(e @ AppError::PlanLimitReached { .. }) => {
                result.errors.push(ImportError {
                    line,
                    field: None,
                    error: e.to_string(),
                });
                warn!(line, "product import stopped at plan limit");
                break;
            }
            Err(e) => result.errors.push(ImportError {
                line,
                field: None,
                error: format!("Product creation failed: {}", e),
            }),
        }
    }

    Ok(result)
}

fn parse_product_record(record: &csv::StringRecord) -> Result<NewProduct, (&'static str, String)> {
    let field = |index: usize| record.get(index).unwrap_or("").trim();

    let sku = field(0);
    if sku.is_empty() {
        return Err(("sku", "SKU is required".to_string()));
    }
    let name = field(1);
    if name.is_empty() {
        return Err(("name", "Name is required".to_string()));
    }

    let category = match field(3) {
        "" => ProductCategory::Other,
        s => ProductCategory::from_str(s)
            .ok_or_else(|| ("category", format!("Unknown category: {}", s)))?,
    };
    let price = parse_cents(field(4)).map_err(|e| ("price", format!("Invalid price: {}", e)))?;
    let cost = parse_cents(field(5)).map_err(|e| ("cost", format!("Invalid cost: {}", e)))?;
    let stock = parse_count(field(6)).map_err(|e| ("stock", e))?;
    let reorder_point = parse_count(field(7)).map_err(|e| ("reorder_point", e))?;

    Ok(NewProduct {
        name: name.to_string(),
        sku: sku.to_string(),
        barcode: Some(field(2).to_string()).filter(|b| !b.is_empty()),
        category,
        price,
        cost,
        stock,
        reorder_point,
    })
}

fn parse_count(s: &str) -> Result<u32, String> {
    if s.is_empty() {
        return Ok(0);
    }
    s.parse::<u32>()
        .map_err(|_| format!("Expected a whole number, got '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_parse_product_record() {
        let product = parse_product_record(&record(&[
            "CK-1", "Coke 1.5L", "4800", "beverages", "75.00", "60", "12", "3",
        ]))
        .unwrap();

        assert_eq!(product.sku, "CK-1");
        assert_eq!(product.barcode.as_deref(), Some("4800"));
        assert_eq!(product.category, ProductCategory::Beverages);
        assert_eq!(product.price, 7500);
        assert_eq!(product.cost, 6000);
        assert_eq!(product.stock, 12);
        assert_eq!(product.reorder_point, 3);
    }

    #[test]
    fn test_parse_product_record_defaults() {
        let product = parse_product_record(&record(&["X", "Thing", "", "", "1", "1"])).unwrap();
        assert_eq!(product.barcode, None);
        assert_eq!(product.category, ProductCategory::Other);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_parse_product_record_errors() {
        let err = parse_product_record(&record(&["", "Thing", "", "", "1", "1"])).unwrap_err();
        assert_eq!(err.0, "sku");

        let err = parse_product_record(&record(&["X", "Thing", "", "", "abc", "1"])).unwrap_err();
        assert_eq!(err.0, "price");

        let err = parse_product_record(&record(&["X", "Thing", "", "toys", "1", "1"])).unwrap_err();
        assert_eq!(err.0, "category");

        let err =
            parse_product_record(&record(&["X", "Thing", "", "", "1", "1", "-2"])).unwrap_err();
        assert_eq!(err.0, "stock");
    }
}
