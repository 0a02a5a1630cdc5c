mod common;

use anyhow::Result;
use chrono::Utc;
use common::{StandardProducts, logged_in_service, parse_date, test_service};
use tindahero::application::{AppError, ProductFilter, ReportPeriod, SaleLine};
use tindahero::domain::{ExpenseCategory, StoreInfo, SubscriptionPlan};
use tindahero::io::{ExportKind, Exporter, ImportOptions, Importer};

fn read_rows(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.map(|r| r.iter().map(String::from).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()?;
    Ok((headers, rows))
}

#[tokio::test]
async fn test_bir_sales_summary() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Pro).await?;
    StandardProducts::create_basic(&service).await?;

    let sale = service
        .record_sale(&[SaleLine::new("RICE", 2)], parse_date("2024-03-01"))
        .await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_csv(ExportKind::BirSales, &mut buffer)
        .await?;
    assert_eq!(count, 1);

    let (headers, rows) = read_rows(&buffer)?;
    assert_eq!(headers, ["Date", "Invoice", "Amount", "VAT", "NetSales"]);
    assert_eq!(
        rows[0],
        [
            "2024-03-01".to_string(),
            format!("INV-{}", sale.id),
            "100.00".to_string(),
            "12.00".to_string(),
            "89.29".to_string(),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_bir_income_statement_for_period() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Pro).await?;
    StandardProducts::create_basic(&service).await?;

    let now = Utc::now();
    service.record_sale(&[SaleLine::new("RICE", 2)], now).await?;
    service
        .record_sale(&[SaleLine::new("RICE", 5)], parse_date("2001-01-01"))
        .await?;
    service
        .record_expense("Load", ExpenseCategory::Other, 1_000, now)
        .await?;

    let mut buffer = Vec::new();
    Exporter::new(&service)
        .for_period(ReportPeriod::Daily, now)
        .export_csv(ExportKind::BirIncome, &mut buffer)
        .await?;

    let (headers, rows) = read_rows(&buffer)?;
    assert_eq!(
        headers,
        ["Period", "GrossSales", "VAT", "NetSales", "Expenses", "NetIncome"]
    );
    assert_eq!(rows, [["Daily", "100.00", "12.00", "89.29", "10.00", "30.00"]]);

    Ok(())
}

#[tokio::test]
async fn test_csv_fields_are_quoted() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Pro).await?;

    service
        .record_expense(
            "Ice, water and \"yelo\"",
            ExpenseCategory::SupplierPurchase,
            4_550,
            parse_date("2024-03-01"),
        )
        .await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_csv(ExportKind::BirExpenses, &mut buffer)
        .await?;
    assert_eq!(count, 1);

    let (_, rows) = read_rows(&buffer)?;
    assert_eq!(
        rows[0],
        ["2024-03-01", "Ice, water and \"yelo\"", "Supplier Purchase", "45.50"]
    );

    Ok(())
}

#[tokio::test]
async fn test_exports_follow_plan() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;

    let err = Exporter::new(&service)
        .export_csv(ExportKind::Sales, std::io::sink())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::FeatureLocked { .. })
    ));

    service.upgrade_plan(SubscriptionPlan::Pro).await?;
    Exporter::new(&service)
        .export_csv(ExportKind::Sales, std::io::sink())
        .await?;

    // Trial balance also needs accounting
    let err = Exporter::new(&service)
        .export_csv(ExportKind::TrialBalance, std::io::sink())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::FeatureLocked { .. })
    ));

    service.upgrade_plan(SubscriptionPlan::Business).await?;
    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_csv(ExportKind::TrialBalance, &mut buffer)
        .await?;
    assert_eq!(count, 13);

    Ok(())
}

#[tokio::test]
async fn test_backup_round_trip() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Pro).await?;
    StandardProducts::create_basic(&service).await?;
    service
        .record_sale(&[SaleLine::new("COKE", 3)], parse_date("2024-03-01"))
        .await?;
    service
        .record_expense("Rent", ExpenseCategory::Rent, 50_000, parse_date("2024-03-01"))
        .await?;
    service
        .save_store_info(&StoreInfo {
            name: "Nena's Store".into(),
            address: "Brgy. San Roque".into(),
            phone: "0917".into(),
            owner: "Aling Nena".into(),
        })
        .await?;

    let mut backup = Vec::new();
    let snapshot = Exporter::new(&service).export_backup_json(&mut backup).await?;
    assert_eq!(snapshot.products.as_ref().map(Vec::len), Some(3));

    let (restored, _temp2) = test_service().await?;
    let summary = Importer::new(&restored)
        .restore_backup_json(backup.as_slice())
        .await?;
    assert_eq!(summary.products, Some(3));
    assert_eq!(summary.sales, Some(1));
    assert_eq!(summary.expenses, Some(1));
    assert_eq!(summary.users, Some(1));
    assert!(summary.store_info);

    assert_eq!(
        restored.list_products(&ProductFilter::default()).await?,
        service.list_products(&ProductFilter::default()).await?
    );
    assert_eq!(restored.list_sales().await?, service.list_sales().await?);
    assert_eq!(restored.list_expenses().await?, service.list_expenses().await?);
    assert_eq!(restored.store_info().await?.name, "Nena's Store");
    assert_eq!(restored.get_product("COKE").await?.stock, 21);

    Ok(())
}

#[tokio::test]
async fn test_restore_keeps_absent_collections() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Pro).await?;
    StandardProducts::create_basic(&service).await?;

    let partial = r#"{"version": "1", "exported_at": "2024-03-01T00:00:00Z", "sales": []}"#;
    let summary = Importer::new(&service)
        .restore_backup_json(partial.as_bytes())
        .await?;

    assert_eq!(summary.sales, Some(0));
    assert_eq!(summary.products, None);
    assert_eq!(service.list_products(&ProductFilter::default()).await?.len(), 3);

    let bad = r#"{"version": "99", "exported_at": "2024-03-01T00:00:00Z"}"#;
    assert!(
        Importer::new(&service)
            .restore_backup_json(bad.as_bytes())
            .await
            .is_err()
    );

    Ok(())
}

#[tokio::test]
async fn test_inventory_csv_imports_into_another_store() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Pro).await?;
    StandardProducts::create_basic(&service).await?;

    let mut inventory = Vec::new();
    let count = Exporter::new(&service)
        .export_csv(ExportKind::Inventory, &mut inventory)
        .await?;
    assert_eq!(count, 3);

    let (other, _temp2) = logged_in_service(SubscriptionPlan::Free).await?;
    let importer = Importer::new(&other);

    let dry = importer
        .import_products_csv(
            inventory.as_slice(),
            ImportOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(dry.imported, 3);
    assert!(other.list_products(&ProductFilter::default()).await?.is_empty());

    let result = importer
        .import_products_csv(inventory.as_slice(), ImportOptions::default())
        .await?;
    assert_eq!(result.imported, 3);
    assert!(result.errors.is_empty());

    let rice = other.get_product("RICE").await?;
    assert_eq!(rice.price, 5000);
    assert_eq!(rice.cost, 3000);
    assert_eq!(rice.stock, 20);

    let again = importer
        .import_products_csv(
            inventory.as_slice(),
            ImportOptions {
                skip_duplicates: true,
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(again.imported, 0);
    assert_eq!(again.skipped, 3);

    Ok(())
}

#[tokio::test]
async fn test_dry_run_reports_what_import_would_reject() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Pro).await?;
    StandardProducts::create_basic(&service).await?;

    let csv = "\
sku,name,barcode,category,price,cost,stock,reorder_point
SOAP,Safeguard,,,35.00,28.00,12,3
RICE,Rice again,,,50.00,30.00,5,5
VINEGAR,Datu Puti,,,-3.00,10.00,4,2
SOAP,Safeguard twice,,,35.00,28.00,1,1
";
    let importer = Importer::new(&service);

    let dry = importer
        .import_products_csv(
            csv.as_bytes(),
            ImportOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(dry.imported, 1);
    let failed_lines: Vec<usize> = dry.errors.iter().map(|e| e.line).collect();
    assert_eq!(failed_lines, [3, 4, 5]);
    assert_eq!(service.list_products(&ProductFilter::default()).await?.len(), 3);

    let real = importer
        .import_products_csv(csv.as_bytes(), ImportOptions::default())
        .await?;
    assert_eq!(real.imported, dry.imported);
    assert_eq!(real.errors.len(), dry.errors.len());
    assert_eq!(service.list_products(&ProductFilter::default()).await?.len(), 4);

    Ok(())
}

#[tokio::test]
async fn test_trial_balance_export_for_period() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Business).await?;
    StandardProducts::create_basic(&service).await?;

    let now = Utc::now();
    service.record_sale(&[SaleLine::new("RICE", 2)], now).await?;
    service
        .record_sale(&[SaleLine::new("RICE", 5)], parse_date("2001-01-01"))
        .await?;

    let mut today = Vec::new();
    Exporter::new(&service)
        .for_period(ReportPeriod::Daily, now)
        .export_csv(ExportKind::TrialBalance, &mut today)
        .await?;
    let (_, rows) = read_rows(&today)?;
    let total = rows.last().unwrap();
    assert_eq!(total[1], "Total");
    assert_eq!(total[3], "160.00");
    assert_eq!(total[4], "160.00");

    let mut all_time = Vec::new();
    Exporter::new(&service)
        .export_csv(ExportKind::TrialBalance, &mut all_time)
        .await?;
    let (_, rows) = read_rows(&all_time)?;
    assert_eq!(rows.last().unwrap()[3], "560.00");

    Ok(())
}
