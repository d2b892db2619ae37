use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{
    admin, businesses, collectors, customers, payments, products, purchases, shops, tickets,
    wallets,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Basic authentication against the engine. The authenticated
/// [`engine::User`] is stored in the request extensions.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user = state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/businesses",
            get(businesses::list).post(businesses::create),
        )
        .route(
            "/businesses/{slug}",
            get(businesses::get).patch(businesses::update),
        )
        .route(
            "/businesses/{slug}/members",
            get(businesses::list_members).post(businesses::upsert_member),
        )
        .route(
            "/businesses/{slug}/members/{username}",
            delete(businesses::remove_member),
        )
        .route(
            "/businesses/{slug}/subscription",
            get(businesses::subscription),
        )
        .route("/businesses/{slug}/dashboard", get(businesses::dashboard))
        .route(
            "/businesses/{slug}/statuses/refresh",
            post(businesses::refresh_statuses),
        )
        .route(
            "/businesses/{slug}/shops",
            get(shops::list).post(shops::create),
        )
        .route(
            "/businesses/{slug}/shops/{shop}",
            get(shops::get).patch(shops::update).delete(shops::remove),
        )
        .route(
            "/businesses/{slug}/shops/{shop}/products",
            get(products::list).post(products::create),
        )
        .route(
            "/businesses/{slug}/shops/{shop}/low-stock",
            get(products::low_stock),
        )
        .route(
            "/businesses/{slug}/shops/{shop}/purchases/import",
            post(purchases::import),
        )
        .route(
            "/businesses/{slug}/products/{id}",
            get(products::get)
                .patch(products::update)
                .delete(products::remove),
        )
        .route(
            "/businesses/{slug}/products/{id}/stock",
            get(products::stock_history).post(products::adjust_stock),
        )
        .route(
            "/businesses/{slug}/customers",
            get(customers::list).post(customers::create),
        )
        .route(
            "/businesses/{slug}/customers/{id}",
            get(customers::get)
                .patch(customers::update)
                .delete(customers::remove),
        )
        .route(
            "/businesses/{slug}/customers/{id}/statement",
            get(customers::statement),
        )
        .route(
            "/businesses/{slug}/customers/{id}/wallet",
            get(wallets::get),
        )
        .route(
            "/businesses/{slug}/customers/{id}/wallet/deposits",
            post(wallets::deposit),
        )
        .route(
            "/businesses/{slug}/customers/{id}/wallet/withdrawals",
            post(wallets::withdraw),
        )
        .route("/businesses/{slug}/wallet/pending", get(wallets::pending))
        .route(
            "/businesses/{slug}/wallet/{tx_id}/confirm",
            post(wallets::confirm),
        )
        .route(
            "/businesses/{slug}/wallet/{tx_id}/reject",
            post(wallets::reject),
        )
        .route(
            "/businesses/{slug}/purchases",
            get(purchases::list).post(purchases::create),
        )
        .route(
            "/businesses/{slug}/purchases/export",
            get(purchases::export),
        )
        .route("/businesses/{slug}/purchases/{id}", get(purchases::get))
        .route(
            "/businesses/{slug}/purchases/{id}/cancel",
            post(purchases::cancel),
        )
        .route(
            "/businesses/{slug}/purchases/{id}/collector",
            post(purchases::assign_collector),
        )
        .route(
            "/businesses/{slug}/purchases/{id}/payments",
            post(payments::record),
        )
        .route(
            "/businesses/{slug}/purchases/{id}/waybill",
            post(purchases::waybill),
        )
        .route(
            "/businesses/{slug}/purchases/{id}/documents",
            get(purchases::documents),
        )
        .route(
            "/businesses/{slug}/payments/pending",
            get(payments::pending),
        )
        .route(
            "/businesses/{slug}/payments/{id}/confirm",
            post(payments::confirm),
        )
        .route(
            "/businesses/{slug}/payments/{id}/reject",
            post(payments::reject),
        )
        .route(
            "/businesses/{slug}/documents/{id}",
            get(purchases::document),
        )
        .route(
            "/businesses/{slug}/collectors",
            get(collectors::list).post(collectors::create),
        )
        .route(
            "/businesses/{slug}/collectors/me/purchases",
            get(collectors::my_purchases),
        )
        .route(
            "/businesses/{slug}/collectors/{id}",
            patch(collectors::update),
        )
        .route(
            "/businesses/{slug}/collectors/{id}/report",
            get(collectors::report),
        )
        .route(
            "/businesses/{slug}/tickets",
            get(tickets::list).post(tickets::create),
        )
        .route("/businesses/{slug}/tickets/{id}", get(tickets::get))
        .route(
            "/businesses/{slug}/tickets/{id}/messages",
            post(tickets::add_message),
        )
        .route(
            "/businesses/{slug}/tickets/{id}/status",
            post(tickets::change_status),
        )
        .route("/admin/businesses", get(admin::businesses))
        .route(
            "/admin/businesses/{slug}/active",
            post(admin::set_business_active),
        )
        .route(
            "/admin/businesses/{slug}/subscription",
            post(admin::set_subscription).delete(admin::cancel_subscription),
        )
        .route("/admin/tickets", get(admin::tickets))
        .route("/admin/analytics", get(admin::analytics))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(Arc::new(engine), listener).await {
        tracing::error!("server failed: {err}");
    }
}

/// Serves the API on `listener`. The engine is shared so the caller can keep
/// running maintenance jobs against it.
pub async fn run_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState { engine };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Arc<Engine>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
