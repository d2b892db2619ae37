use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, InstallmentStatus, PaymentStatus, Product, PurchaseStatus, ResultEngine,
    SubscriptionStatus, TicketStatus, WalletTxKind, WalletTxStatus, businesses, customers,
    installments, payments, products, purchases, shops, subscriptions, tickets,
    util::parse_uuid, wallet_transactions,
};

use super::{Engine, access::Capability, with_tx};

/// Per-shop figures of a [`BusinessDashboard`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopBreakdown {
    pub shop_id: Uuid,
    pub shop_slug: String,
    pub shop_name: String,
    pub purchase_count: u64,
    pub total_sales_minor: i64,
    pub collected_minor: i64,
    pub outstanding_minor: i64,
}

/// Business figures. Sales and collections cover `[from, to)`; outstanding
/// and overdue amounts are current.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessDashboard {
    pub business_slug: String,
    pub currency: String,
    pub shop_slug: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub purchase_count: u64,
    pub purchases_by_status: BTreeMap<String, u64>,
    pub total_sales_minor: i64,
    pub collected_minor: i64,
    pub outstanding_minor: i64,
    pub overdue_minor: i64,
    /// `Σ total_paid / Σ total_price × 100` over non-cancelled purchases.
    pub collection_rate: f64,
    pub pending_payments_count: u64,
    pub pending_payments_minor: i64,
    pub pending_deposits_count: u64,
    pub pending_deposits_minor: i64,
    pub wallet_balances_minor: i64,
    pub low_stock_products: u64,
    pub customer_count: u64,
    pub shops: Vec<ShopBreakdown>,
}

/// Platform-wide figures for super-admins. Amounts are grouped by currency
/// code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAnalytics {
    pub businesses_total: u64,
    pub businesses_active: u64,
    pub subscriptions_by_plan: BTreeMap<String, u64>,
    pub purchase_count: u64,
    pub purchase_volume_minor: BTreeMap<String, i64>,
    pub collected_minor: BTreeMap<String, i64>,
    pub open_tickets: u64,
}

fn in_range(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.is_none_or(|from| at >= from) && to.is_none_or(|to| at < to)
}

fn collection_rate(total_paid_minor: i64, total_price_minor: i64) -> f64 {
    if total_price_minor <= 0 {
        return 0.0;
    }
    let rate = total_paid_minor as f64 / total_price_minor as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

impl Engine {
    /// Dashboard of a business, optionally narrowed to one shop.
    pub async fn business_dashboard(
        &self,
        slug: &str,
        shop_slug: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        user_id: &str,
    ) -> ResultEngine<BusinessDashboard> {
        if let (Some(from), Some(to)) = (from, to)
            && from >= to
        {
            return Err(EngineError::InvalidInput(
                "invalid range: from must be < to".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Reports)
                .await?;
            let today = Utc::now().date_naive();

            let mut shop_query = shops::Entity::find()
                .filter(shops::Column::BusinessId.eq(business.id.clone()))
                .order_by_asc(shops::Column::Name);
            let selected_shop = match shop_slug {
                Some(shop_slug) => Some(
                    self.require_shop(&db_tx, &business.id, shop_slug, &access)
                        .await?,
                ),
                None => None,
            };
            if let Some(shop) = &selected_shop {
                shop_query = shop_query.filter(shops::Column::Id.eq(shop.id.clone()));
            } else if let Some(pinned) = access.shop_id {
                shop_query = shop_query.filter(shops::Column::Id.eq(pinned.to_string()));
            }
            let shop_rows = shop_query.all(&db_tx).await?;
            let shop_ids: Vec<String> = shop_rows.iter().map(|s| s.id.clone()).collect();
            let mut breakdown: Vec<ShopBreakdown> = shop_rows
                .iter()
                .map(|shop| {
                    Ok::<_, EngineError>(ShopBreakdown {
                        shop_id: parse_uuid(&shop.id, "shop")?,
                        shop_slug: shop.slug.clone(),
                        shop_name: shop.name.clone(),
                        purchase_count: 0,
                        total_sales_minor: 0,
                        collected_minor: 0,
                        outstanding_minor: 0,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()?;
            let shop_index: HashMap<String, usize> = shop_rows
                .iter()
                .enumerate()
                .map(|(idx, shop)| (shop.id.clone(), idx))
                .collect();

            let mut dashboard = BusinessDashboard {
                business_slug: business.slug.clone(),
                currency: business.currency.clone(),
                shop_slug: selected_shop.as_ref().map(|s| s.slug.clone()),
                from,
                to,
                purchase_count: 0,
                purchases_by_status: PurchaseStatus::ALL
                    .iter()
                    .map(|s| (s.as_str().to_string(), 0))
                    .collect(),
                total_sales_minor: 0,
                collected_minor: 0,
                outstanding_minor: 0,
                overdue_minor: 0,
                collection_rate: 0.0,
                pending_payments_count: 0,
                pending_payments_minor: 0,
                pending_deposits_count: 0,
                pending_deposits_minor: 0,
                wallet_balances_minor: 0,
                low_stock_products: 0,
                customer_count: 0,
                shops: Vec::new(),
            };

            let purchase_rows = purchases::Entity::find()
                .filter(purchases::Column::BusinessId.eq(business.id.clone()))
                .filter(purchases::Column::ShopId.is_in(shop_ids.clone()))
                .all(&db_tx)
                .await?;
            let mut rate_paid = 0;
            let mut rate_price = 0;
            let mut open_ids = Vec::new();
            for purchase in &purchase_rows {
                let status = PurchaseStatus::try_from(purchase.status.as_str())?;
                let shop = shop_index.get(&purchase.shop_id).copied();
                if status.is_open() {
                    dashboard.outstanding_minor += purchase.outstanding_minor;
                    open_ids.push(purchase.id.clone());
                    if let Some(idx) = shop {
                        breakdown[idx].outstanding_minor += purchase.outstanding_minor;
                    }
                }
                if !in_range(purchase.created_at, from, to) {
                    continue;
                }
                dashboard.purchase_count += 1;
                *dashboard
                    .purchases_by_status
                    .entry(status.as_str().to_string())
                    .or_default() += 1;
                if let Some(idx) = shop {
                    breakdown[idx].purchase_count += 1;
                }
                if status != PurchaseStatus::Cancelled {
                    dashboard.total_sales_minor += purchase.total_price_minor;
                    rate_paid += purchase.total_paid_minor;
                    rate_price += purchase.total_price_minor;
                    if let Some(idx) = shop {
                        breakdown[idx].total_sales_minor += purchase.total_price_minor;
                    }
                }
            }
            dashboard.collection_rate = collection_rate(rate_paid, rate_price);

            let overdue = installments::Entity::find()
                .filter(installments::Column::PurchaseId.is_in(open_ids))
                .filter(installments::Column::Status.ne(InstallmentStatus::Paid.as_str()))
                .filter(installments::Column::DueDate.lt(today))
                .all(&db_tx)
                .await?;
            dashboard.overdue_minor = overdue
                .iter()
                .map(|i| (i.amount_minor - i.paid_minor).max(0))
                .sum();

            let payment_rows = payments::Entity::find()
                .filter(payments::Column::BusinessId.eq(business.id.clone()))
                .filter(payments::Column::ShopId.is_in(shop_ids.clone()))
                .filter(payments::Column::Status.ne(PaymentStatus::Rejected.as_str()))
                .all(&db_tx)
                .await?;
            for payment in payment_rows {
                match PaymentStatus::try_from(payment.status.as_str())? {
                    PaymentStatus::Pending => {
                        dashboard.pending_payments_count += 1;
                        dashboard.pending_payments_minor += payment.amount_minor;
                    }
                    PaymentStatus::Confirmed => {
                        let at = payment.confirmed_at.unwrap_or(payment.created_at);
                        if in_range(at, from, to) {
                            dashboard.collected_minor += payment.amount_minor;
                            if let Some(idx) = shop_index.get(&payment.shop_id) {
                                breakdown[*idx].collected_minor += payment.amount_minor;
                            }
                        }
                    }
                    PaymentStatus::Rejected => {}
                }
            }

            // Customers and wallets are business-wide unless a shop is selected.
            let mut customer_query = customers::Entity::find()
                .filter(customers::Column::BusinessId.eq(business.id.clone()));
            if selected_shop.is_some() || access.shop_id.is_some() {
                customer_query = customer_query.filter(customers::Column::ShopId.is_in(shop_ids.clone()));
            }
            let customer_rows = customer_query.all(&db_tx).await?;
            dashboard.customer_count = customer_rows.iter().filter(|c| c.active).count() as u64;
            dashboard.wallet_balances_minor =
                customer_rows.iter().map(|c| c.wallet_balance_minor).sum();
            let customer_ids: Vec<String> = customer_rows.into_iter().map(|c| c.id).collect();

            let deposits = wallet_transactions::Entity::find()
                .filter(wallet_transactions::Column::BusinessId.eq(business.id.clone()))
                .filter(wallet_transactions::Column::CustomerId.is_in(customer_ids))
                .filter(wallet_transactions::Column::Kind.eq(WalletTxKind::Deposit.as_str()))
                .filter(wallet_transactions::Column::Status.eq(WalletTxStatus::Pending.as_str()))
                .all(&db_tx)
                .await?;
            dashboard.pending_deposits_count = deposits.len() as u64;
            dashboard.pending_deposits_minor = deposits.iter().map(|d| d.amount_minor).sum();

            let product_rows = products::Entity::find()
                .filter(products::Column::BusinessId.eq(business.id.clone()))
                .filter(products::Column::ShopId.is_in(shop_ids))
                .filter(products::Column::Archived.eq(false))
                .all(&db_tx)
                .await?;
            for product in product_rows {
                if Product::try_from(product)?.is_low_stock() {
                    dashboard.low_stock_products += 1;
                }
            }

            dashboard.shops = breakdown;
            Ok(dashboard)
        })
    }

    /// Platform-wide analytics (platform admin).
    pub async fn platform_analytics(&self, user_id: &str) -> ResultEngine<PlatformAnalytics> {
        with_tx!(self, |db_tx| {
            self.require_platform_admin(&db_tx, user_id).await?;
            let now = Utc::now();

            let business_rows = businesses::Entity::find().all(&db_tx).await?;
            let currency_of: HashMap<String, String> = business_rows
                .iter()
                .map(|b| (b.id.clone(), b.currency.clone()))
                .collect();
            let mut analytics = PlatformAnalytics {
                businesses_total: business_rows.len() as u64,
                businesses_active: business_rows.iter().filter(|b| b.active).count() as u64,
                subscriptions_by_plan: BTreeMap::new(),
                purchase_count: 0,
                purchase_volume_minor: BTreeMap::new(),
                collected_minor: BTreeMap::new(),
                open_tickets: 0,
            };

            let current = subscriptions::Entity::find()
                .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active.as_str()))
                .filter(subscriptions::Column::StartsAt.lte(now))
                .filter(subscriptions::Column::EndsAt.gt(now))
                .all(&db_tx)
                .await?;
            for subscription in current {
                *analytics
                    .subscriptions_by_plan
                    .entry(subscription.plan)
                    .or_default() += 1;
            }

            let purchase_rows = purchases::Entity::find()
                .filter(purchases::Column::Status.ne(PurchaseStatus::Cancelled.as_str()))
                .all(&db_tx)
                .await?;
            for purchase in purchase_rows {
                analytics.purchase_count += 1;
                let currency = currency_of
                    .get(&purchase.business_id)
                    .cloned()
                    .unwrap_or_default();
                *analytics.purchase_volume_minor.entry(currency).or_default() +=
                    purchase.total_price_minor;
            }

            let confirmed = payments::Entity::find()
                .filter(payments::Column::Status.eq(PaymentStatus::Confirmed.as_str()))
                .all(&db_tx)
                .await?;
            for payment in confirmed {
                let currency = currency_of
                    .get(&payment.business_id)
                    .cloned()
                    .unwrap_or_default();
                *analytics.collected_minor.entry(currency).or_default() += payment.amount_minor;
            }

            analytics.open_tickets = tickets::Entity::find()
                .filter(
                    tickets::Column::Status
                        .is_in([TicketStatus::Open.as_str(), TicketStatus::InProgress.as_str()]),
                )
                .all(&db_tx)
                .await?
                .len() as u64;
            Ok(analytics)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn collection_rate_handles_empty_sales() {
        assert_eq!(collection_rate(0, 0), 0.0);
        assert_eq!(collection_rate(250, 1_000), 25.0);
        assert_eq!(collection_rate(1, 3), 33.33);
    }

    #[test]
    fn range_is_half_open() {
        let from = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert!(in_range(from, Some(from), Some(to)));
        assert!(!in_range(to, Some(from), Some(to)));
        assert!(in_range(to, Some(from), None));
    }
}
