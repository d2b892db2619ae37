//! CSV export and bulk import of purchases.

use chrono::{NaiveDate, Utc};
use csv::{ReaderBuilder, Trim, Writer};
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Frequency, Money, NewCustomerCmd, NewPurchaseCmd, PaymentMethod, PurchaseType,
    ResultEngine, customers::normalize_phone, products, util::parse_uuid,
};

use super::{Engine, PurchaseListFilter, access::Capability, with_tx};

const IMPORT_HEADERS: [&str; 10] = [
    "customer_phone",
    "customer_name",
    "sku",
    "quantity",
    "purchase_type",
    "down_payment",
    "installment_count",
    "frequency",
    "start_date",
    "payment_method",
];

/// Outcome of a purchase import. Bad rows do not stop the import.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Ids of the purchases created, in file order.
    pub created: Vec<Uuid>,
    /// `(line, message)` for every rejected row.
    pub errors: Vec<(u64, String)>,
}

#[derive(Serialize)]
struct ExportRow {
    purchase_id: String,
    created_at: String,
    shop: String,
    customer_name: String,
    customer_phone: String,
    purchase_type: String,
    status: String,
    total_price: String,
    total_paid: String,
    outstanding: String,
    installment_count: i64,
    next_due_date: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ImportRow {
    customer_phone: String,
    customer_name: String,
    sku: String,
    quantity: String,
    purchase_type: String,
    #[serde(default)]
    down_payment: String,
    #[serde(default)]
    installment_count: String,
    #[serde(default)]
    frequency: String,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    payment_method: String,
}

/// Row values after parsing, before touching the database.
#[derive(Debug, PartialEq, Eq)]
struct ParsedRow {
    phone: String,
    name: String,
    sku: String,
    quantity: i64,
    purchase_type: PurchaseType,
    down_payment_minor: i64,
    installment_count: i64,
    frequency: Frequency,
    start_date: NaiveDate,
    method: PaymentMethod,
}

fn parse_row(row: ImportRow, today: NaiveDate) -> ResultEngine<ParsedRow> {
    let quantity = row
        .quantity
        .trim()
        .parse::<i64>()
        .map_err(|_| EngineError::InvalidInput(format!("invalid quantity: {}", row.quantity)))?;
    let down_payment_minor = if row.down_payment.trim().is_empty() {
        0
    } else {
        row.down_payment.parse::<Money>()?.minor()
    };
    let installment_count = if row.installment_count.trim().is_empty() {
        0
    } else {
        row.installment_count.trim().parse::<i64>().map_err(|_| {
            EngineError::InvalidInput(format!(
                "invalid installment_count: {}",
                row.installment_count
            ))
        })?
    };
    let frequency = match row.frequency.trim() {
        "" => Frequency::Monthly,
        other => Frequency::try_from(other)?,
    };
    let start_date = match row.start_date.trim() {
        "" => today,
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| EngineError::InvalidInput(format!("invalid start_date: {other}")))?,
    };
    let method = match row.payment_method.trim() {
        "" => PaymentMethod::Cash,
        other => PaymentMethod::try_from(other)?,
    };
    if row.sku.trim().is_empty() {
        return Err(EngineError::InvalidInput("sku must not be empty".to_string()));
    }
    Ok(ParsedRow {
        phone: normalize_phone(&row.customer_phone),
        name: row.customer_name.trim().to_string(),
        sku: row.sku.trim().to_string(),
        quantity,
        purchase_type: PurchaseType::try_from(row.purchase_type.trim())?,
        down_payment_minor,
        installment_count,
        frequency,
        start_date,
        method,
    })
}

fn csv_error(err: csv::Error) -> EngineError {
    EngineError::InvalidInput(format!("invalid csv: {err}"))
}

impl Engine {
    /// Exports the purchases matching `filter`, one row per purchase.
    pub async fn export_purchases_csv(
        &self,
        slug: &str,
        filter: &PurchaseListFilter,
        user_id: &str,
    ) -> ResultEngine<String> {
        let summaries = with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Reports)
                .await?;
            let rows = self
                .purchase_query(&db_tx, &business.id, &access, filter)
                .await?
                .all(&db_tx)
                .await?;
            self.summarize(&db_tx, rows).await
        })?;

        let mut writer = Writer::from_writer(Vec::new());
        for summary in &summaries {
            let purchase = &summary.purchase;
            writer
                .serialize(ExportRow {
                    purchase_id: purchase.id.to_string(),
                    created_at: purchase.created_at.to_rfc3339(),
                    shop: summary.shop_slug.clone(),
                    customer_name: summary.customer_name.clone(),
                    customer_phone: summary.customer_phone.clone(),
                    purchase_type: purchase.purchase_type.to_string(),
                    status: purchase.status.to_string(),
                    total_price: Money::new(purchase.total_price_minor).to_string(),
                    total_paid: Money::new(purchase.total_paid_minor).to_string(),
                    outstanding: Money::new(purchase.outstanding_minor).to_string(),
                    installment_count: purchase.installment_count,
                    next_due_date: summary
                        .next_due_date
                        .map(|d| d.to_string())
                        .unwrap_or_default(),
                })
                .map_err(csv_error)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|err| EngineError::InvalidInput(format!("invalid csv: {err}")))?;
        String::from_utf8(bytes)
            .map_err(|_| EngineError::InvalidInput("invalid csv: not utf-8".to_string()))
    }

    async fn import_row(
        &self,
        db: &DatabaseTransaction,
        slug: &str,
        shop_slug: &str,
        row: ParsedRow,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let (business, access) = self
            .require_business(db, slug, user_id, Capability::Sell)
            .await?;
        let shop = self
            .require_shop(db, &business.id, shop_slug, &access)
            .await?;

        let customer = match self
            .find_customer_by_phone(db, &business.id, &row.phone)
            .await?
        {
            Some(customer) => customer,
            None => {
                let cmd = NewCustomerCmd::new(row.name.clone(), row.phone.clone())
                    .shop_id(parse_uuid(&shop.id, "shop")?);
                self.insert_customer(db, &business.id, &cmd).await?
            }
        };
        let product = products::Entity::find()
            .filter(products::Column::ShopId.eq(shop.id.clone()))
            .filter(products::Column::Sku.eq(row.sku.clone()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("sku {} not exists", row.sku)))?;

        let cmd = NewPurchaseCmd::new(
            shop.slug.clone(),
            parse_uuid(&customer.id, "customer")?,
            row.purchase_type,
            row.start_date,
        )
        .line(parse_uuid(&product.id, "product")?, row.quantity)
        .down_payment(row.down_payment_minor)
        .installments(row.installment_count, row.frequency)
        .method(row.method)
        .note("imported");
        let purchase = self
            .insert_purchase(db, &business, &access, &cmd, user_id)
            .await?;
        parse_uuid(&purchase.id, "purchase")
    }

    /// Creates one purchase per CSV row in `shop_slug`, each row in its own
    /// transaction. Customers are reused by phone or created.
    pub async fn import_purchases_csv(
        &self,
        slug: &str,
        shop_slug: &str,
        csv: &str,
        user_id: &str,
    ) -> ResultEngine<ImportReport> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Sell)
                .await?;
            self.require_shop(&db_tx, &business.id, shop_slug, &access)
                .await
                .map(|_| ())
        })?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(csv.as_bytes());
        let headers = reader.headers().map_err(csv_error)?.clone();
        // The trailing columns are optional.
        for required in IMPORT_HEADERS.iter().take(5) {
            if !headers.iter().any(|h| h == *required) {
                return Err(EngineError::InvalidInput(format!(
                    "missing column: {required}"
                )));
            }
        }

        let today = Utc::now().date_naive();
        let mut report = ImportReport::default();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let line = record.position().map_or(0, |p| p.line());
            let parsed = record
                .deserialize::<ImportRow>(Some(&headers))
                .map_err(csv_error)
                .and_then(|row| parse_row(row, today));
            let outcome = match parsed {
                Ok(row) => {
                    with_tx!(self, |db_tx| {
                        self.import_row(&db_tx, slug, shop_slug, row, user_id).await
                    })
                }
                Err(err) => Err(err),
            };
            match outcome {
                Ok(id) => report.created.push(id),
                Err(err) => {
                    tracing::warn!(business = %slug, line, "import row rejected: {err}");
                    report.errors.push((line, err.to_string()));
                }
            }
        }
        tracing::info!(
            business = %slug,
            created = report.created.len(),
            rejected = report.errors.len(),
            "purchases imported"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ImportRow {
        ImportRow {
            customer_phone: " +233 24 000 1111 ".to_string(),
            customer_name: "Ama Mensah".to_string(),
            sku: "TV-01".to_string(),
            quantity: "2".to_string(),
            purchase_type: "credit".to_string(),
            down_payment: "100.50".to_string(),
            installment_count: "6".to_string(),
            frequency: "weekly".to_string(),
            start_date: "2026-03-01".to_string(),
            payment_method: "mobile_money".to_string(),
        }
    }

    #[test]
    fn parses_a_complete_row() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let parsed = parse_row(row(), today).unwrap();
        assert_eq!(parsed.phone, "+233240001111");
        assert_eq!(parsed.down_payment_minor, 10_050);
        assert_eq!(parsed.installment_count, 6);
        assert_eq!(parsed.frequency, Frequency::Weekly);
        assert_eq!(parsed.method, PaymentMethod::MobileMoney);
        assert_eq!(parsed.start_date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn optional_columns_fall_back_to_defaults() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let parsed = parse_row(
            ImportRow {
                purchase_type: "cash".to_string(),
                down_payment: String::new(),
                installment_count: String::new(),
                frequency: String::new(),
                start_date: String::new(),
                payment_method: String::new(),
                ..row()
            },
            today,
        )
        .unwrap();
        assert_eq!(parsed.purchase_type, PurchaseType::Cash);
        assert_eq!(parsed.down_payment_minor, 0);
        assert_eq!(parsed.frequency, Frequency::Monthly);
        assert_eq!(parsed.start_date, today);
        assert_eq!(parsed.method, PaymentMethod::Cash);
    }

    #[test]
    fn rejects_bad_values() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        for bad in [
            ImportRow { quantity: "two".to_string(), ..row() },
            ImportRow { purchase_type: "lease".to_string(), ..row() },
            ImportRow { down_payment: "1.234".to_string(), ..row() },
            ImportRow { start_date: "01/03/2026".to_string(), ..row() },
            ImportRow { sku: " ".to_string(), ..row() },
        ] {
            assert!(parse_row(bad, today).is_err());
        }
    }
}
