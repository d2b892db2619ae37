use sea_orm::DatabaseConnection;

use crate::{DEFAULT_AFTER_DAYS, EngineError, ResultEngine};

mod access;
mod businesses;
mod collectors;
mod customers;
mod documents;
mod members;
mod payments;
mod products;
mod purchases;
mod reports;
mod shops;
mod spreadsheet;
mod statuses;
mod subscriptions;
mod tickets;
mod users;
mod wallets;

pub use access::{Access, AccessRole};
pub use collectors::CollectorReport;
pub use customers::CustomerStatement;
pub use documents::DocumentView;
pub use members::Member;
pub use products::DeleteOutcome;
pub use purchases::{PurchaseDetail, PurchaseListFilter, PurchaseSummary};
pub use reports::{BusinessDashboard, PlatformAnalytics, ShopBreakdown};
pub use spreadsheet::ImportReport;
pub use statuses::StatusRefresh;
pub use tickets::TicketDetail;
pub use wallets::WalletView;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Days of free trial granted to new businesses.
pub const DEFAULT_TRIAL_DAYS: i64 = 14;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    trial_days: i64,
    default_after_days: i64,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn require_positive(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(())
}

fn require_non_negative(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor < 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be >= 0")));
    }
    Ok(())
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    trial_days: i64,
    default_after_days: i64,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            trial_days: DEFAULT_TRIAL_DAYS,
            default_after_days: DEFAULT_AFTER_DAYS,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Length of the trial subscription created with each business.
    pub fn trial_days(mut self, days: i64) -> EngineBuilder {
        self.trial_days = days;
        self
    }

    /// Default-after threshold given to new businesses.
    pub fn default_after_days(mut self, days: i64) -> EngineBuilder {
        self.default_after_days = days;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.trial_days <= 0 {
            return Err(EngineError::InvalidInput(
                "trial_days must be > 0".to_string(),
            ));
        }
        if !(1..=3650).contains(&self.default_after_days) {
            return Err(EngineError::InvalidInput(
                "default_after_days must be between 1 and 3650".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            trial_days: self.trial_days,
            default_after_days: self.default_after_days,
        })
    }
}
