use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use api_types::ErrorBody;
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod admin;
mod businesses;
mod collectors;
mod customers;
mod payments;
mod products;
mod purchases;
mod server;
mod shops;
mod tickets;
mod wallets;

pub mod types {
    pub mod business {
        pub use api_types::business::{BusinessActive, BusinessNew, BusinessUpdate, DashboardQuery};
        pub use engine::{Business, BusinessDashboard, Member, Subscription};
    }

    pub mod purchase {
        pub use api_types::purchase::{
            PaymentNew, PurchaseList, PurchaseListResponse, PurchaseNew,
        };
        pub use engine::{Payment, PurchaseDetail, PurchaseSummary};
    }

    pub mod wallet {
        pub use api_types::wallet::{DepositNew, WithdrawalNew};
        pub use engine::{WalletTransaction, WalletView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::SubscriptionInactive(_) => StatusCode::PAYMENT_REQUIRED,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidInput(_)
        | EngineError::InvalidStatus(_)
        | EngineError::InvalidId(_)
        | EngineError::InvalidRole(_)
        | EngineError::InvalidCursor(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::InsufficientStock(_)
        | EngineError::PlanLimitReached(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Converts a wire enum (through its `as_str`) into the engine enum.
fn wire<T>(value: &'static str) -> Result<T, ServerError>
where
    T: TryFrom<&'static str, Error = EngineError>,
{
    T::try_from(value).map_err(ServerError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InsufficientStock("x".to_string()),
            EngineError::PlanLimitReached("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn inactive_subscription_maps_to_402() {
        let res =
            ServerError::from(EngineError::SubscriptionInactive("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn wire_enums_convert() {
        let method: engine::PaymentMethod =
            wire(api_types::purchase::PaymentMethod::MobileMoney.as_str()).unwrap_or(engine::PaymentMethod::Cash);
        assert_eq!(method, engine::PaymentMethod::MobileMoney);
    }
}
