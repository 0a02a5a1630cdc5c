// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;
use tindahero::application::{NewProduct, PosService};
use tindahero::domain::{ProductCategory, SubscriptionPlan};

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(PosService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = PosService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test service with a logged-in owner on the given plan
pub async fn logged_in_service(plan: SubscriptionPlan) -> Result<(PosService, TempDir)> {
    let (service, temp) = test_service().await?;
    service
        .login("aling.nena@tindahan.ph", Some("Aling Nena".into()), Some(plan))
        .await?;
    Ok((service, temp))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

pub fn product(name: &str, sku: &str, price: i64, cost: i64, stock: u32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        sku: sku.to_string(),
        barcode: None,
        category: ProductCategory::Food,
        price,
        cost,
        stock,
        reorder_point: 5,
    }
}

/// Test fixture: Standard sari-sari store shelf
pub struct StandardProducts;

impl StandardProducts {
    /// Rice at ₱50.00/₱30.00, Coke at ₱25.00/₱18.00, Pancit Canton at ₱15.00/₱11.00
    pub async fn create_basic(service: &PosService) -> Result<()> {
        service
            .add_product(product("Rice", "RICE", 5000, 3000, 20))
            .await?;
        service
            .add_product(NewProduct {
                category: ProductCategory::Beverages,
                ..product("Coke", "COKE", 2500, 1800, 24)
            })
            .await?;
        service
            .add_product(NewProduct {
                category: ProductCategory::Snacks,
                ..product("Pancit Canton", "PANCIT", 1500, 1100, 6)
            })
            .await?;
        Ok(())
    }
}
