#![allow(dead_code)]

use chrono::{NaiveDate, TimeDelta, Utc};
use sea_orm::Database;
use uuid::Uuid;

use engine::{Engine, NewBusinessCmd, NewCustomerCmd, NewProductCmd};
use migration::MigratorTrait;

pub const OWNER: &str = "owner";
pub const ADMIN: &str = "admin";
pub const SOFA_PRICE: i64 = 100_000;

pub async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.create_user(OWNER, "owner-pass", false).await.unwrap();
    engine.create_user(ADMIN, "admin-pass", true).await.unwrap();
    engine
}

/// A business with one shop, one product (5 sofas) and one customer.
pub struct Fixture {
    pub engine: Engine,
    pub slug: String,
    pub shop: String,
    pub product_id: Uuid,
    pub customer_id: Uuid,
}

pub async fn fixture() -> Fixture {
    let engine = engine_with_db().await;
    let business = engine
        .create_business(NewBusinessCmd::new("Acme Furniture"), OWNER)
        .await
        .unwrap();
    let shop = engine
        .create_shop(&business.slug, "Main", None, None, OWNER)
        .await
        .unwrap();
    let product = engine
        .create_product(
            &business.slug,
            &shop.slug,
            NewProductCmd::new("Sofa", SOFA_PRICE)
                .cost(60_000)
                .stock(5)
                .reorder_level(1)
                .sku("SOFA-01"),
            OWNER,
        )
        .await
        .unwrap();
    let customer = engine
        .create_customer(
            &business.slug,
            NewCustomerCmd::new("Ama Mensah", "024 000 1111"),
            OWNER,
        )
        .await
        .unwrap();
    Fixture {
        engine,
        slug: business.slug,
        shop: shop.slug,
        product_id: product.id,
        customer_id: customer.id,
    }
}

pub async fn add_user(engine: &Engine, username: &str) {
    engine.create_user(username, "secret-pass", false).await.unwrap();
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn days_ago(days: i64) -> NaiveDate {
    today() - TimeDelta::days(days)
}
