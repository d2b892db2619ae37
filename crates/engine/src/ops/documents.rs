use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Business, Customer, Document, DocumentKind, EngineError, Installment, Payment, Purchase,
    PurchaseItem, PurchaseStatus, ResultEngine, Shop, customers, documents,
    installments, payments, purchase_items, shops,
    util::parse_uuid,
};

use super::{Engine, access::Capability, with_tx};

/// Everything a printable invoice, receipt or waybill needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentView {
    pub document: Document,
    pub business: Business,
    pub shop: Shop,
    pub customer: Customer,
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
    pub installments: Vec<Installment>,
    /// The payment a receipt acknowledges.
    pub payment: Option<Payment>,
}

impl Engine {
    /// Issues the next numbered document of `kind` for the business.
    pub(super) async fn issue_document(
        &self,
        db: &DatabaseTransaction,
        business_id: &str,
        purchase_id: &str,
        payment_id: Option<&str>,
        kind: DocumentKind,
        amount_minor: i64,
        user_id: &str,
    ) -> ResultEngine<documents::Model> {
        let last = documents::Entity::find()
            .filter(documents::Column::BusinessId.eq(business_id.to_string()))
            .filter(documents::Column::Kind.eq(kind.as_str()))
            .order_by_desc(documents::Column::Sequence)
            .one(db)
            .await?;
        let sequence = last.map_or(1, |d| d.sequence + 1);
        let document = Document {
            id: Uuid::new_v4(),
            business_id: parse_uuid(business_id, "business")?,
            purchase_id: parse_uuid(purchase_id, "purchase")?,
            payment_id: payment_id.map(|id| parse_uuid(id, "payment")).transpose()?,
            kind,
            sequence,
            number: kind.number(sequence),
            amount_minor,
            issued_by: user_id.to_string(),
            issued_at: Utc::now(),
        };
        Ok(documents::ActiveModel::from(&document).insert(db).await?)
    }

    pub(super) async fn documents_of_purchase(
        &self,
        db: &DatabaseTransaction,
        purchase_id: &str,
    ) -> ResultEngine<Vec<Document>> {
        documents::Entity::find()
            .filter(documents::Column::PurchaseId.eq(purchase_id.to_string()))
            .order_by_asc(documents::Column::IssuedAt)
            .order_by_asc(documents::Column::Sequence)
            .all(db)
            .await?
            .into_iter()
            .map(Document::try_from)
            .collect()
    }

    /// Issues the waybill of a completed purchase. Only one per purchase.
    pub async fn issue_waybill(
        &self,
        slug: &str,
        purchase_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Document> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::Sell)
                .await?;
            let purchase = self
                .require_visible_purchase(&db_tx, &business.id, purchase_id, &access)
                .await?;
            if PurchaseStatus::try_from(purchase.status.as_str())? != PurchaseStatus::Completed {
                return Err(EngineError::InvalidStatus(
                    "waybills are issued for completed purchases only".to_string(),
                ));
            }
            let existing = documents::Entity::find()
                .filter(documents::Column::PurchaseId.eq(purchase.id.clone()))
                .filter(documents::Column::Kind.eq(DocumentKind::Waybill.as_str()))
                .one(&db_tx)
                .await?;
            if let Some(existing) = existing {
                return Err(EngineError::ExistingKey(existing.number));
            }
            let model = self
                .issue_document(
                    &db_tx,
                    &business.id,
                    &purchase.id,
                    None,
                    DocumentKind::Waybill,
                    purchase.total_price_minor,
                    user_id,
                )
                .await?;
            tracing::info!(business = %business.slug, number = %model.number, "waybill issued");
            Document::try_from(model)
        })
    }

    /// A document with the data needed to print it.
    pub async fn document(
        &self,
        slug: &str,
        document_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<DocumentView> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let document = self.require_document(&db_tx, &business.id, document_id).await?;
            let purchase = self
                .require_visible_purchase(
                    &db_tx,
                    &business.id,
                    parse_uuid(&document.purchase_id, "purchase")?,
                    &access,
                )
                .await?;

            let shop = shops::Entity::find_by_id(purchase.shop_id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("shop not exists".to_string()))?;
            let customer = customers::Entity::find_by_id(purchase.customer_id.clone())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("customer not exists".to_string()))?;
            let items = purchase_items::Entity::find()
                .filter(purchase_items::Column::PurchaseId.eq(purchase.id.clone()))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(PurchaseItem::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let installments = installments::Entity::find()
                .filter(installments::Column::PurchaseId.eq(purchase.id.clone()))
                .order_by_asc(installments::Column::Number)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Installment::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let payment = match document.payment_id.clone() {
                Some(id) => payments::Entity::find_by_id(id)
                    .one(&db_tx)
                    .await?
                    .map(Payment::try_from)
                    .transpose()?,
                None => None,
            };
            Ok(DocumentView {
                document: Document::try_from(document)?,
                business: Business::try_from(business)?,
                shop: Shop::try_from(shop)?,
                customer: Customer::try_from(customer)?,
                purchase: Purchase::try_from(purchase)?,
                items,
                installments,
                payment,
            })
        })
    }

    /// Invoices, receipts and waybills of a purchase, oldest first.
    pub async fn purchase_documents(
        &self,
        slug: &str,
        purchase_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<Document>> {
        with_tx!(self, |db_tx| {
            let (business, access) = self
                .require_business(&db_tx, slug, user_id, Capability::View)
                .await?;
            let purchase = self
                .require_visible_purchase(&db_tx, &business.id, purchase_id, &access)
                .await?;
            self.documents_of_purchase(&db_tx, &purchase.id).await
        })
    }
}
