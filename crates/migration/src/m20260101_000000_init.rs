//! Initial schema: every table of the hire-purchase platform.
//!
//! - `users`: authentication and the platform admin flag
//! - `businesses`, `shops`, `business_memberships`, `subscriptions`: tenants
//! - `products`, `stock_movements`: inventory
//! - `customers`, `wallet_transactions`: customers and their wallets
//! - `purchases`, `purchase_items`, `purchase_installments`, `payments`: sales
//! - `debt_collectors`, `documents`: collection and printable documents
//! - `tickets`, `ticket_messages`: support

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    PasswordHash,
    SuperAdmin,
    CreatedAt,
}

#[derive(Iden)]
enum Businesses {
    Table,
    Id,
    Name,
    Slug,
    OwnerId,
    Currency,
    Phone,
    Email,
    Address,
    Active,
    DefaultAfterDays,
    CreatedAt,
}

#[derive(Iden)]
enum Shops {
    Table,
    Id,
    BusinessId,
    Name,
    Slug,
    Address,
    Phone,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum BusinessMemberships {
    Table,
    BusinessId,
    UserId,
    Role,
    ShopId,
}

#[derive(Iden)]
enum Subscriptions {
    Table,
    Id,
    BusinessId,
    Plan,
    Status,
    StartsAt,
    EndsAt,
    AmountMinor,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    BusinessId,
    ShopId,
    Name,
    Sku,
    Description,
    PriceMinor,
    CostMinor,
    StockQuantity,
    ReorderLevel,
    Archived,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum StockMovements {
    Table,
    Id,
    ProductId,
    Change,
    QuantityAfter,
    Reason,
    PurchaseId,
    Note,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Customers {
    Table,
    Id,
    BusinessId,
    ShopId,
    Name,
    Phone,
    Email,
    Address,
    NationalId,
    WalletBalanceMinor,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum DebtCollectors {
    Table,
    Id,
    BusinessId,
    UserId,
    Name,
    Phone,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum Purchases {
    Table,
    Id,
    BusinessId,
    ShopId,
    CustomerId,
    CollectorId,
    PurchaseType,
    Status,
    TotalPriceMinor,
    DownPaymentMinor,
    TotalPaidMinor,
    OutstandingMinor,
    InstallmentCount,
    Frequency,
    StartDate,
    Note,
    CreatedBy,
    CreatedAt,
    CompletedAt,
    CancelledAt,
    CancelReason,
}

#[derive(Iden)]
enum PurchaseItems {
    Table,
    Id,
    PurchaseId,
    ProductId,
    ProductName,
    Quantity,
    UnitPriceMinor,
    LineTotalMinor,
}

#[derive(Iden)]
enum PurchaseInstallments {
    Table,
    Id,
    PurchaseId,
    Number,
    DueDate,
    AmountMinor,
    PaidMinor,
    Status,
    PaidAt,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    BusinessId,
    ShopId,
    PurchaseId,
    CustomerId,
    AmountMinor,
    Method,
    Status,
    Reference,
    Note,
    RecordedBy,
    CollectorId,
    ConfirmedBy,
    ConfirmedAt,
    RejectionReason,
    CreatedAt,
}

#[derive(Iden)]
enum WalletTransactions {
    Table,
    Id,
    BusinessId,
    CustomerId,
    Kind,
    AmountMinor,
    Status,
    BalanceBeforeMinor,
    BalanceAfterMinor,
    Reference,
    Note,
    PurchaseId,
    RecordedBy,
    ConfirmedBy,
    ConfirmedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Documents {
    Table,
    Id,
    BusinessId,
    PurchaseId,
    PaymentId,
    Kind,
    Sequence,
    Number,
    AmountMinor,
    IssuedBy,
    IssuedAt,
}

#[derive(Iden)]
enum Tickets {
    Table,
    Id,
    BusinessId,
    Subject,
    Description,
    Priority,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
    ResolvedAt,
}

#[derive(Iden)]
enum TicketMessages {
    Table,
    Id,
    TicketId,
    Author,
    Body,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Username).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::SuperAdmin).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Businesses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Businesses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Businesses::Name).string().not_null())
                    .col(ColumnDef::new(Businesses::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(Businesses::OwnerId).string().not_null())
                    .col(ColumnDef::new(Businesses::Currency).string().not_null().default("GHS"))
                    .col(ColumnDef::new(Businesses::Phone).string())
                    .col(ColumnDef::new(Businesses::Email).string())
                    .col(ColumnDef::new(Businesses::Address).string())
                    .col(ColumnDef::new(Businesses::Active).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Businesses::DefaultAfterDays)
                            .big_integer()
                            .not_null()
                            .default(90)
                    )
                    .col(ColumnDef::new(Businesses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-businesses-owner_id")
                            .from(Businesses::Table, Businesses::OwnerId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-businesses-owner_id")
                    .table(Businesses::Table)
                    .col(Businesses::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Shops
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Shops::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shops::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Shops::BusinessId).string().not_null())
                    .col(ColumnDef::new(Shops::Name).string().not_null())
                    .col(ColumnDef::new(Shops::Slug).string().not_null())
                    .col(ColumnDef::new(Shops::Address).string())
                    .col(ColumnDef::new(Shops::Phone).string())
                    .col(ColumnDef::new(Shops::Active).boolean().not_null().default(true))
                    .col(ColumnDef::new(Shops::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shops-business_id")
                            .from(Shops::Table, Shops::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shops-business_id-slug-unique")
                    .table(Shops::Table)
                    .col(Shops::BusinessId)
                    .col(Shops::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Business memberships
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(BusinessMemberships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BusinessMemberships::BusinessId).string().not_null())
                    .col(ColumnDef::new(BusinessMemberships::UserId).string().not_null())
                    .col(ColumnDef::new(BusinessMemberships::Role).string().not_null())
                    .col(ColumnDef::new(BusinessMemberships::ShopId).string())
                    .primary_key(
                        Index::create()
                            .col(BusinessMemberships::BusinessId)
                            .col(BusinessMemberships::UserId)
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-business_memberships-business_id")
                            .from(BusinessMemberships::Table, BusinessMemberships::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-business_memberships-user_id")
                            .from(BusinessMemberships::Table, BusinessMemberships::UserId)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-business_memberships-user_id")
                    .table(BusinessMemberships::Table)
                    .col(BusinessMemberships::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Subscriptions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Subscriptions::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Subscriptions::BusinessId).string().not_null())
                    .col(ColumnDef::new(Subscriptions::Plan).string().not_null())
                    .col(ColumnDef::new(Subscriptions::Status).string().not_null())
                    .col(ColumnDef::new(Subscriptions::StartsAt).timestamp().not_null())
                    .col(ColumnDef::new(Subscriptions::EndsAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::AmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                    )
                    .col(ColumnDef::new(Subscriptions::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Subscriptions::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-subscriptions-business_id")
                            .from(Subscriptions::Table, Subscriptions::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-subscriptions-business_id-ends_at")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::BusinessId)
                    .col(Subscriptions::EndsAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Products
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Products::BusinessId).string().not_null())
                    .col(ColumnDef::new(Products::ShopId).string().not_null())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::Sku).string().not_null())
                    .col(ColumnDef::new(Products::Description).string())
                    .col(ColumnDef::new(Products::PriceMinor).big_integer().not_null())
                    .col(ColumnDef::new(Products::CostMinor).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Products::StockQuantity)
                            .big_integer()
                            .not_null()
                            .default(0)
                    )
                    .col(ColumnDef::new(Products::ReorderLevel).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Products::Archived).boolean().not_null().default(false))
                    .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Products::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-products-shop_id")
                            .from(Products::Table, Products::ShopId)
                            .to(Shops::Table, Shops::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-products-shop_id-sku-unique")
                    .table(Products::Table)
                    .col(Products::ShopId)
                    .col(Products::Sku)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-products-business_id")
                    .table(Products::Table)
                    .col(Products::BusinessId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Stock movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StockMovements::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(StockMovements::ProductId).string().not_null())
                    .col(ColumnDef::new(StockMovements::Change).big_integer().not_null())
                    .col(ColumnDef::new(StockMovements::QuantityAfter).big_integer().not_null())
                    .col(ColumnDef::new(StockMovements::Reason).string().not_null())
                    .col(ColumnDef::new(StockMovements::PurchaseId).string())
                    .col(ColumnDef::new(StockMovements::Note).string())
                    .col(ColumnDef::new(StockMovements::CreatedBy).string().not_null())
                    .col(ColumnDef::new(StockMovements::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stock_movements-product_id")
                            .from(StockMovements::Table, StockMovements::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-stock_movements-product_id-created_at")
                    .table(StockMovements::Table)
                    .col(StockMovements::ProductId)
                    .col(StockMovements::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Customers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Customers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Customers::BusinessId).string().not_null())
                    .col(ColumnDef::new(Customers::ShopId).string())
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Phone).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string())
                    .col(ColumnDef::new(Customers::Address).string())
                    .col(ColumnDef::new(Customers::NationalId).string())
                    .col(
                        ColumnDef::new(Customers::WalletBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                    )
                    .col(ColumnDef::new(Customers::Active).boolean().not_null().default(true))
                    .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-customers-business_id")
                            .from(Customers::Table, Customers::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-customers-business_id-phone-unique")
                    .table(Customers::Table)
                    .col(Customers::BusinessId)
                    .col(Customers::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Debt collectors
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(DebtCollectors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DebtCollectors::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(DebtCollectors::BusinessId).string().not_null())
                    .col(ColumnDef::new(DebtCollectors::UserId).string().not_null())
                    .col(ColumnDef::new(DebtCollectors::Name).string().not_null())
                    .col(ColumnDef::new(DebtCollectors::Phone).string())
                    .col(ColumnDef::new(DebtCollectors::Active).boolean().not_null().default(true))
                    .col(ColumnDef::new(DebtCollectors::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-debt_collectors-business_id")
                            .from(DebtCollectors::Table, DebtCollectors::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-debt_collectors-user_id")
                            .from(DebtCollectors::Table, DebtCollectors::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debt_collectors-business_id-user_id-unique")
                    .table(DebtCollectors::Table)
                    .col(DebtCollectors::BusinessId)
                    .col(DebtCollectors::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Purchases
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Purchases::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Purchases::BusinessId).string().not_null())
                    .col(ColumnDef::new(Purchases::ShopId).string().not_null())
                    .col(ColumnDef::new(Purchases::CustomerId).string().not_null())
                    .col(ColumnDef::new(Purchases::CollectorId).string())
                    .col(ColumnDef::new(Purchases::PurchaseType).string().not_null())
                    .col(ColumnDef::new(Purchases::Status).string().not_null())
                    .col(ColumnDef::new(Purchases::TotalPriceMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Purchases::DownPaymentMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                    )
                    .col(
                        ColumnDef::new(Purchases::TotalPaidMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                    )
                    .col(ColumnDef::new(Purchases::OutstandingMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Purchases::InstallmentCount)
                            .big_integer()
                            .not_null()
                            .default(0)
                    )
                    .col(ColumnDef::new(Purchases::Frequency).string().not_null())
                    .col(ColumnDef::new(Purchases::StartDate).date().not_null())
                    .col(ColumnDef::new(Purchases::Note).string())
                    .col(ColumnDef::new(Purchases::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Purchases::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Purchases::CompletedAt).timestamp())
                    .col(ColumnDef::new(Purchases::CancelledAt).timestamp())
                    .col(ColumnDef::new(Purchases::CancelReason).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-business_id")
                            .from(Purchases::Table, Purchases::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-shop_id")
                            .from(Purchases::Table, Purchases::ShopId)
                            .to(Shops::Table, Shops::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-customer_id")
                            .from(Purchases::Table, Purchases::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-collector_id")
                            .from(Purchases::Table, Purchases::CollectorId)
                            .to(DebtCollectors::Table, DebtCollectors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-business_id-created_at")
                    .table(Purchases::Table)
                    .col(Purchases::BusinessId)
                    .col(Purchases::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-business_id-status")
                    .table(Purchases::Table)
                    .col(Purchases::BusinessId)
                    .col(Purchases::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-customer_id")
                    .table(Purchases::Table)
                    .col(Purchases::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-collector_id")
                    .table(Purchases::Table)
                    .col(Purchases::CollectorId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 11. Purchase items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PurchaseItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PurchaseItems::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(PurchaseItems::PurchaseId).string().not_null())
                    .col(ColumnDef::new(PurchaseItems::ProductId).string().not_null())
                    .col(ColumnDef::new(PurchaseItems::ProductName).string().not_null())
                    .col(ColumnDef::new(PurchaseItems::Quantity).big_integer().not_null())
                    .col(ColumnDef::new(PurchaseItems::UnitPriceMinor).big_integer().not_null())
                    .col(ColumnDef::new(PurchaseItems::LineTotalMinor).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_items-purchase_id")
                            .from(PurchaseItems::Table, PurchaseItems::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_items-product_id")
                            .from(PurchaseItems::Table, PurchaseItems::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_items-purchase_id")
                    .table(PurchaseItems::Table)
                    .col(PurchaseItems::PurchaseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_items-product_id")
                    .table(PurchaseItems::Table)
                    .col(PurchaseItems::ProductId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 12. Installments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PurchaseInstallments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PurchaseInstallments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(PurchaseInstallments::PurchaseId).string().not_null())
                    .col(ColumnDef::new(PurchaseInstallments::Number).big_integer().not_null())
                    .col(ColumnDef::new(PurchaseInstallments::DueDate).date().not_null())
                    .col(ColumnDef::new(PurchaseInstallments::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(PurchaseInstallments::PaidMinor)
                            .big_integer()
                            .not_null()
                            .default(0)
                    )
                    .col(ColumnDef::new(PurchaseInstallments::Status).string().not_null())
                    .col(ColumnDef::new(PurchaseInstallments::PaidAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_installments-purchase_id")
                            .from(PurchaseInstallments::Table, PurchaseInstallments::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_installments-purchase_id-number-unique")
                    .table(PurchaseInstallments::Table)
                    .col(PurchaseInstallments::PurchaseId)
                    .col(PurchaseInstallments::Number)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_installments-due_date")
                    .table(PurchaseInstallments::Table)
                    .col(PurchaseInstallments::DueDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 13. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Payments::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Payments::BusinessId).string().not_null())
                    .col(ColumnDef::new(Payments::ShopId).string().not_null())
                    .col(ColumnDef::new(Payments::PurchaseId).string().not_null())
                    .col(ColumnDef::new(Payments::CustomerId).string().not_null())
                    .col(ColumnDef::new(Payments::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Method).string().not_null())
                    .col(ColumnDef::new(Payments::Status).string().not_null())
                    .col(ColumnDef::new(Payments::Reference).string())
                    .col(ColumnDef::new(Payments::Note).string())
                    .col(ColumnDef::new(Payments::RecordedBy).string().not_null())
                    .col(ColumnDef::new(Payments::CollectorId).string())
                    .col(ColumnDef::new(Payments::ConfirmedBy).string())
                    .col(ColumnDef::new(Payments::ConfirmedAt).timestamp())
                    .col(ColumnDef::new(Payments::RejectionReason).string())
                    .col(ColumnDef::new(Payments::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-purchase_id")
                            .from(Payments::Table, Payments::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-business_id-reference-unique")
                    .table(Payments::Table)
                    .col(Payments::BusinessId)
                    .col(Payments::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-purchase_id")
                    .table(Payments::Table)
                    .col(Payments::PurchaseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-business_id-status")
                    .table(Payments::Table)
                    .col(Payments::BusinessId)
                    .col(Payments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payments-collector_id")
                    .table(Payments::Table)
                    .col(Payments::CollectorId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 14. Wallet transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WalletTransactions::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(WalletTransactions::BusinessId).string().not_null())
                    .col(ColumnDef::new(WalletTransactions::CustomerId).string().not_null())
                    .col(ColumnDef::new(WalletTransactions::Kind).string().not_null())
                    .col(ColumnDef::new(WalletTransactions::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(WalletTransactions::Status).string().not_null())
                    .col(ColumnDef::new(WalletTransactions::BalanceBeforeMinor).big_integer())
                    .col(ColumnDef::new(WalletTransactions::BalanceAfterMinor).big_integer())
                    .col(ColumnDef::new(WalletTransactions::Reference).string())
                    .col(ColumnDef::new(WalletTransactions::Note).string())
                    .col(ColumnDef::new(WalletTransactions::PurchaseId).string())
                    .col(ColumnDef::new(WalletTransactions::RecordedBy).string().not_null())
                    .col(ColumnDef::new(WalletTransactions::ConfirmedBy).string())
                    .col(ColumnDef::new(WalletTransactions::ConfirmedAt).timestamp())
                    .col(ColumnDef::new(WalletTransactions::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_transactions-customer_id")
                            .from(WalletTransactions::Table, WalletTransactions::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-business_id-reference-unique")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::BusinessId)
                    .col(WalletTransactions::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-customer_id-created_at")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::CustomerId)
                    .col(WalletTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 15. Documents
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Documents::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Documents::BusinessId).string().not_null())
                    .col(ColumnDef::new(Documents::PurchaseId).string().not_null())
                    .col(ColumnDef::new(Documents::PaymentId).string())
                    .col(ColumnDef::new(Documents::Kind).string().not_null())
                    .col(ColumnDef::new(Documents::Sequence).big_integer().not_null())
                    .col(ColumnDef::new(Documents::Number).string().not_null())
                    .col(ColumnDef::new(Documents::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Documents::IssuedBy).string().not_null())
                    .col(ColumnDef::new(Documents::IssuedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-documents-purchase_id")
                            .from(Documents::Table, Documents::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-documents-business_id-kind-sequence-unique")
                    .table(Documents::Table)
                    .col(Documents::BusinessId)
                    .col(Documents::Kind)
                    .col(Documents::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-documents-purchase_id")
                    .table(Documents::Table)
                    .col(Documents::PurchaseId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 16. Tickets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tickets::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Tickets::BusinessId).string().not_null())
                    .col(ColumnDef::new(Tickets::Subject).string().not_null())
                    .col(ColumnDef::new(Tickets::Description).string().not_null())
                    .col(ColumnDef::new(Tickets::Priority).string().not_null())
                    .col(ColumnDef::new(Tickets::Status).string().not_null())
                    .col(ColumnDef::new(Tickets::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Tickets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tickets::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tickets::ResolvedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tickets-business_id")
                            .from(Tickets::Table, Tickets::BusinessId)
                            .to(Businesses::Table, Businesses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tickets-business_id-status")
                    .table(Tickets::Table)
                    .col(Tickets::BusinessId)
                    .col(Tickets::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 17. Ticket messages
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TicketMessages::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TicketMessages::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(TicketMessages::TicketId).string().not_null())
                    .col(ColumnDef::new(TicketMessages::Author).string().not_null())
                    .col(ColumnDef::new(TicketMessages::Body).string().not_null())
                    .col(ColumnDef::new(TicketMessages::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ticket_messages-ticket_id")
                            .from(TicketMessages::Table, TicketMessages::TicketId)
                            .to(Tickets::Table, Tickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ticket_messages-ticket_id")
                    .table(TicketMessages::Table)
                    .col(TicketMessages::TicketId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Children first.
        manager
            .drop_table(Table::drop().table(TicketMessages::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tickets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Documents::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletTransactions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseInstallments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseItems::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Purchases::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DebtCollectors::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockMovements::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BusinessMemberships::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shops::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Businesses::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
