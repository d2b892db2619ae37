//! Request and response bodies of the HTTP API.
//!
//! Enums serialize with the same spelling the engine stores, so the server
//! converts them through [`as_str`](purchase::PurchaseType::as_str).

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares a wire enum with `as_str` returning the canonical engine string.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Returns the canonical string used by the engine/database.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }
    };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Ghs,
    Ngn,
    Kes,
    Zar,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Ghs => "GHS",
            Self::Ngn => "NGN",
            Self::Kes => "KES",
            Self::Zar => "ZAR",
        }
    }
}

/// Generic body for created resources.
#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Reason attached to rejections and cancellations.
#[derive(Debug, Serialize, Deserialize)]
pub struct Reason {
    pub reason: String,
}

/// Optional `[from, to)` window in query strings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Range {
    pub from: Option<DateTime<FixedOffset>>,
    pub to: Option<DateTime<FixedOffset>>,
}

pub mod business {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessNew {
        pub name: String,
        pub currency: Option<Currency>,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub address: Option<String>,
    }

    /// Absent fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BusinessUpdate {
        pub name: Option<String>,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub address: Option<String>,
        pub default_after_days: Option<i64>,
    }

    /// Suspend or reactivate a business (platform admin).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BusinessActive {
        pub active: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardQuery {
        pub shop: Option<String>,
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
    }

    /// `today` defaults to the server date.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StatusRefresh {
        pub today: Option<NaiveDate>,
    }
}

pub mod membership {
    use super::*;

    wire_enum! {
        /// Role of a member inside a business. Owners are set at creation.
        pub enum MemberRole {
            ShopAdmin => "shop_admin",
            Staff => "staff",
        }
    }

    /// Request body for adding/updating a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberUpsert {
        pub username: String,
        pub role: MemberRole,
        /// Pins the member to one shop.
        pub shop_id: Option<Uuid>,
    }
}

pub mod subscription {
    use super::*;

    wire_enum! {
        pub enum Plan {
            Trial => "trial",
            Basic => "basic",
            Standard => "standard",
            Premium => "premium",
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubscriptionSet {
        pub plan: Plan,
        pub months: u32,
        #[serde(default)]
        pub amount_minor: i64,
    }
}

pub mod shop {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShopNew {
        pub name: String,
        pub address: Option<String>,
        pub phone: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ShopUpdate {
        pub name: Option<String>,
        pub address: Option<String>,
        pub phone: Option<String>,
        pub active: Option<bool>,
    }
}

pub mod product {
    use super::*;

    wire_enum! {
        pub enum StockReason {
            Restock => "restock",
            Adjustment => "adjustment",
            Return => "return",
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductNew {
        pub name: String,
        pub price_minor: i64,
        #[serde(default)]
        pub cost_minor: i64,
        #[serde(default)]
        pub stock_quantity: i64,
        #[serde(default)]
        pub reorder_level: i64,
        pub sku: Option<String>,
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProductUpdate {
        pub name: Option<String>,
        pub sku: Option<String>,
        pub description: Option<String>,
        pub price_minor: Option<i64>,
        pub cost_minor: Option<i64>,
        pub reorder_level: Option<i64>,
        pub archived: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProductList {
        #[serde(default)]
        pub include_archived: bool,
        pub search: Option<String>,
    }

    /// Signed stock change.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct StockAdjust {
        pub change: i64,
        pub reason: StockReason,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StockHistory {
        pub limit: Option<u64>,
    }
}

pub mod customer {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CustomerNew {
        pub name: String,
        pub phone: String,
        pub shop_id: Option<Uuid>,
        pub email: Option<String>,
        pub address: Option<String>,
        pub national_id: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CustomerUpdate {
        pub name: Option<String>,
        pub phone: Option<String>,
        pub email: Option<String>,
        pub address: Option<String>,
        pub national_id: Option<String>,
        pub active: Option<bool>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CustomerList {
        pub search: Option<String>,
        #[serde(default)]
        pub include_inactive: bool,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositNew {
        pub amount_minor: i64,
        pub reference: Option<String>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalNew {
        pub amount_minor: i64,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WalletGet {
        pub limit: Option<u64>,
    }
}

pub mod purchase {
    use super::*;

    wire_enum! {
        pub enum PurchaseType {
            Cash => "cash",
            Layaway => "layaway",
            Credit => "credit",
        }
    }

    wire_enum! {
        pub enum PurchaseStatus {
            Active => "active",
            Completed => "completed",
            Overdue => "overdue",
            Defaulted => "defaulted",
            Cancelled => "cancelled",
        }
    }

    wire_enum! {
        pub enum Frequency {
            Weekly => "weekly",
            Biweekly => "biweekly",
            Monthly => "monthly",
        }
    }

    wire_enum! {
        pub enum PaymentMethod {
            Cash => "cash",
            MobileMoney => "mobile_money",
            BankTransfer => "bank_transfer",
            Card => "card",
            Wallet => "wallet",
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseLine {
        pub product_id: Uuid,
        pub quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        pub shop: String,
        pub customer_id: Uuid,
        pub purchase_type: PurchaseType,
        pub lines: Vec<PurchaseLine>,
        #[serde(default)]
        pub down_payment_minor: i64,
        #[serde(default)]
        pub installment_count: i64,
        pub frequency: Option<Frequency>,
        /// Defaults to the server date.
        pub start_date: Option<NaiveDate>,
        pub collector_id: Option<Uuid>,
        pub method: Option<PaymentMethod>,
        pub reference: Option<String>,
        pub note: Option<String>,
    }

    /// Query string of `GET /purchases` and `GET /purchases/export`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PurchaseList {
        pub shop: Option<String>,
        pub status: Option<PurchaseStatus>,
        pub purchase_type: Option<PurchaseType>,
        pub customer_id: Option<Uuid>,
        pub collector_id: Option<Uuid>,
        pub from: Option<DateTime<FixedOffset>>,
        pub to: Option<DateTime<FixedOffset>>,
        pub limit: Option<u64>,
        pub cursor: Option<String>,
    }

    /// `collector_id: null` unassigns.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CollectorAssign {
        pub collector_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        pub amount_minor: i64,
        pub method: PaymentMethod,
        pub reference: Option<String>,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PendingPayments {
        pub shop: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseListResponse<T> {
        pub purchases: Vec<T>,
        pub next_cursor: Option<String>,
    }
}

pub mod collector {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CollectorNew {
        pub username: String,
        pub name: String,
        pub phone: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CollectorUpdate {
        pub active: bool,
    }
}

pub mod ticket {
    use super::*;

    wire_enum! {
        pub enum TicketPriority {
            Low => "low",
            Medium => "medium",
            High => "high",
            Urgent => "urgent",
        }
    }

    wire_enum! {
        pub enum TicketStatus {
            Open => "open",
            InProgress => "in_progress",
            Resolved => "resolved",
            Closed => "closed",
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TicketNew {
        pub subject: String,
        pub description: String,
        pub priority: Option<TicketPriority>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TicketMessageNew {
        pub body: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TicketStatusUpdate {
        pub status: TicketStatus,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TicketList {
        pub status: Option<TicketStatus>,
    }
}
