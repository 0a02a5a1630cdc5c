mod common;

use anyhow::Result;
use chrono::Utc;
use common::{StandardProducts, logged_in_service, parse_date, product};
use tindahero::application::{AppError, ProductFilter, ProductUpdate, SaleLine};
use tindahero::domain::{ProductCategory, SubscriptionPlan};

#[tokio::test]
async fn test_sale_decrements_stock() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;
    StandardProducts::create_basic(&service).await?;

    let sale = service
        .record_sale(
            &[SaleLine::new("RICE", 2), SaleLine::new("COKE", 5)],
            parse_date("2024-03-01"),
        )
        .await?;

    assert_eq!(sale.total, 10_000 + 12_500);
    assert_eq!(sale.gross_profit, 4_000 + 3_500);
    assert_eq!(sale.sold_by, "Aling Nena");
    assert!(sale.is_consistent());

    assert_eq!(service.get_product("RICE").await?.stock, 18);
    assert_eq!(service.get_product("COKE").await?.stock, 19);
    assert_eq!(service.get_product("PANCIT").await?.stock, 6);

    let sales = service.list_sales().await?;
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0], sale);

    Ok(())
}

#[tokio::test]
async fn test_sale_keeps_prices_at_time_of_sale() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;
    StandardProducts::create_basic(&service).await?;

    service
        .record_sale(&[SaleLine::new("RICE", 1)], parse_date("2024-03-01"))
        .await?;
    service
        .update_product(
            "RICE",
            ProductUpdate {
                price: Some(5500),
                cost: Some(3200),
                ..Default::default()
            },
        )
        .await?;

    let sales = service.list_sales().await?;
    assert_eq!(sales[0].items[0].price, 5000);
    assert_eq!(sales[0].items[0].cost, 3000);

    Ok(())
}

#[tokio::test]
async fn test_insufficient_stock_rejected() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;
    StandardProducts::create_basic(&service).await?;

    // Each line fits on its own but not once merged
    let result = service
        .record_sale(
            &[
                SaleLine::new("RICE", 1),
                SaleLine::new("PANCIT", 4),
                SaleLine::new("PANCIT", 3),
            ],
            Utc::now(),
        )
        .await;

    match result {
        Err(AppError::InsufficientStock {
            product,
            available,
            requested,
        }) => {
            assert_eq!(product, "Pancit Canton");
            assert_eq!(available, 6);
            assert_eq!(requested, 7);
        }
        other => panic!("expected insufficient stock, got {:?}", other.map(|s| s.id)),
    }

    assert_eq!(service.get_product("RICE").await?.stock, 20);
    assert_eq!(service.get_product("PANCIT").await?.stock, 6);
    assert!(service.list_sales().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_invalid_sales() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;
    StandardProducts::create_basic(&service).await?;

    assert!(matches!(
        service.record_sale(&[], Utc::now()).await,
        Err(AppError::EmptySale)
    ));
    assert!(matches!(
        service
            .record_sale(&[SaleLine::new("MISSING", 1)], Utc::now())
            .await,
        Err(AppError::ProductNotFound(_))
    ));
    assert!(matches!(
        service
            .record_sale(&[SaleLine::new("COKE", 0)], Utc::now())
            .await,
        Err(AppError::InvalidQuantity { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_product_crud() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;
    StandardProducts::create_basic(&service).await?;

    let duplicate = service.add_product(product("Rice 2", "rice", 100, 50, 1)).await;
    assert!(matches!(duplicate, Err(AppError::SkuAlreadyExists(_))));

    let negative = service.add_product(product("Free", "FREE", -1, 0, 1)).await;
    assert!(matches!(negative, Err(AppError::InvalidAmount(_))));

    let renamed = service
        .update_product(
            "COKE",
            ProductUpdate {
                name: Some("Coke 1.5L".into()),
                sku: Some("COKE-15".into()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(renamed.name, "Coke 1.5L");
    assert!(service.find_product_by_sku("COKE").await?.is_none());
    assert!(service.find_product_by_sku("coke-15").await?.is_some());

    let clash = service
        .update_product(
            "COKE-15",
            ProductUpdate {
                sku: Some("RICE".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(AppError::SkuAlreadyExists(_))));

    let snacks = service
        .list_products(&ProductFilter {
            category: Some(ProductCategory::Snacks),
            search: None,
        })
        .await?;
    assert_eq!(snacks.len(), 1);
    assert_eq!(snacks[0].sku, "PANCIT");

    let search = service
        .list_products(&ProductFilter {
            category: None,
            search: Some("coke".into()),
        })
        .await?;
    assert_eq!(search.len(), 1);

    service.delete_product("PANCIT").await?;
    assert!(matches!(
        service.get_product("PANCIT").await,
        Err(AppError::ProductNotFound(_))
    ));
    assert_eq!(service.list_products(&ProductFilter::default()).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_low_stock_after_sale() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;
    StandardProducts::create_basic(&service).await?;

    assert!(service.low_stock_products().await?.is_empty());

    service
        .record_sale(&[SaleLine::new("PANCIT", 1)], Utc::now())
        .await?;

    let low = service.low_stock_products().await?;
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].sku, "PANCIT");
    assert_eq!(low[0].stock, 5);

    Ok(())
}

#[tokio::test]
async fn test_expense_crud() -> Result<()> {
    use tindahero::application::ExpenseUpdate;
    use tindahero::domain::ExpenseCategory;

    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;

    let expense = service
        .record_expense("Jeep fare", ExpenseCategory::Transportation, 2_600, Utc::now())
        .await?;
    assert_eq!(expense.recorded_by, "Aling Nena");

    assert!(matches!(
        service
            .record_expense("Nothing", ExpenseCategory::Other, 0, Utc::now())
            .await,
        Err(AppError::InvalidAmount(_))
    ));

    let prefix = &expense.id.to_string()[..8];
    let updated = service
        .update_expense(
            prefix,
            ExpenseUpdate {
                amount: Some(3_000),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.amount, 3_000);
    assert_eq!(updated.description, "Jeep fare");

    service.delete_expense(&expense.id.to_string()).await?;
    assert!(service.list_expenses().await?.is_empty());
    assert!(matches!(
        service.delete_expense(prefix).await,
        Err(AppError::ExpenseNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_sales_between_is_inclusive() -> Result<()> {
    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;
    StandardProducts::create_basic(&service).await?;

    for day in ["2024-03-01", "2024-03-02", "2024-03-03"] {
        service
            .record_sale(&[SaleLine::new("COKE", 1)], parse_date(day))
            .await?;
    }

    let sales = service
        .sales_between(parse_date("2024-03-01"), parse_date("2024-03-02"))
        .await?;
    assert_eq!(sales.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_updates_reject_blank_fields() -> Result<()> {
    use tindahero::application::ExpenseUpdate;
    use tindahero::domain::ExpenseCategory;

    let (service, _temp) = logged_in_service(SubscriptionPlan::Free).await?;
    StandardProducts::create_basic(&service).await?;

    let blank_sku = service
        .update_product(
            "COKE",
            ProductUpdate {
                sku: Some("   ".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(blank_sku, Err(AppError::InvalidInput(_))));

    let blank_name = service
        .update_product(
            "COKE",
            ProductUpdate {
                name: Some(String::new()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(blank_name, Err(AppError::InvalidInput(_))));

    let coke = service.get_product("COKE").await?;
    assert_eq!(coke.name, "Coke");

    let expense = service
        .record_expense("Jeep fare", ExpenseCategory::Transportation, 2_600, Utc::now())
        .await?;
    let blank_description = service
        .update_expense(
            &expense.id.to_string(),
            ExpenseUpdate {
                description: Some(" ".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(blank_description, Err(AppError::InvalidInput(_))));
    assert_eq!(service.list_expenses().await?[0].description, "Jeep fare");

    Ok(())
}
