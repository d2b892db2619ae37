//! Domain engine for a multi-tenant hire-purchase retail platform.
//!
//! Businesses own shops, products and customers. Customers buy on cash,
//! layaway or credit terms; installments are collected by staff or debt
//! collectors, and every confirmed payment issues a receipt.
//!
//! All operations live on [`Engine`] and run inside one database
//! transaction each.

pub use businesses::{Business, DEFAULT_AFTER_DAYS};
pub use commands::{
    BusinessPatch, Contact, CustomerPatch, NewBusinessCmd, NewCustomerCmd, NewProductCmd,
    NewPurchaseCmd, NewTicketCmd, PaymentCmd, ProductPatch, PurchaseLine, ShopPatch,
};
pub use currency::Currency;
pub use customers::Customer;
pub use debt_collectors::DebtCollector;
pub use documents::{Document, DocumentKind};
pub use error::EngineError;
pub use installments::{Installment, InstallmentStatus};
pub use memberships::MemberRole;
pub use money::Money;
pub use ops::{
    Access, AccessRole, BusinessDashboard, CollectorReport, CustomerStatement, DeleteOutcome,
    DocumentView, Engine, EngineBuilder, ImportReport, Member, PlatformAnalytics,
    PurchaseDetail, PurchaseListFilter, PurchaseSummary, ShopBreakdown, StatusRefresh,
    TicketDetail, WalletView, DEFAULT_TRIAL_DAYS,
};
pub use payments::{Payment, PaymentMethod, PaymentStatus};
pub use products::Product;
pub use purchase_items::PurchaseItem;
pub use purchases::{Frequency, MAX_INSTALLMENTS, Purchase, PurchaseStatus, PurchaseType};
pub use shops::Shop;
pub use stock_movements::{StockMovement, StockReason};
pub use subscriptions::{Plan, PlanLimits, Subscription, SubscriptionStatus};
pub use ticket_messages::TicketMessage;
pub use tickets::{Ticket, TicketPriority, TicketStatus};
pub use users::User;
pub use wallet_transactions::{WalletTransaction, WalletTxKind, WalletTxStatus};

mod businesses;
mod commands;
mod currency;
mod customers;
mod debt_collectors;
mod documents;
mod error;
mod installments;
mod memberships;
mod money;
mod ops;
mod payments;
mod products;
mod purchase_items;
mod purchases;
mod shops;
mod stock_movements;
mod subscriptions;
mod ticket_messages;
mod tickets;
mod users;
mod util;
mod wallet_transactions;

pub type ResultEngine<T> = Result<T, EngineError>;
