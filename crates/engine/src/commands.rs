//! Command structs for engine operations.
//!
//! These types group parameters for write operations (businesses, shops,
//! products, customers, purchases, payments), keeping call sites readable and
//! avoiding long argument lists. Patch structs leave `None` fields untouched.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Currency, Frequency, PaymentMethod, PurchaseType, TicketPriority};

/// Contact details shared by businesses, shops and customers.
#[derive(Clone, Debug, Default)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Register a new business.
#[derive(Clone, Debug)]
pub struct NewBusinessCmd {
    pub name: String,
    pub currency: Currency,
    pub contact: Contact,
}

impl NewBusinessCmd {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            currency: Currency::default(),
            contact: Contact::default(),
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.contact.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.contact.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.contact.address = Some(address.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct BusinessPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub default_after_days: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct ShopPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Create a product in a shop.
#[derive(Clone, Debug)]
pub struct NewProductCmd {
    pub name: String,
    pub price_minor: i64,
    pub cost_minor: i64,
    pub stock_quantity: i64,
    pub reorder_level: i64,
    pub sku: Option<String>,
    pub description: Option<String>,
}

impl NewProductCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, price_minor: i64) -> Self {
        Self {
            name: name.into(),
            price_minor,
            cost_minor: 0,
            stock_quantity: 0,
            reorder_level: 0,
            sku: None,
            description: None,
        }
    }

    #[must_use]
    pub fn cost(mut self, cost_minor: i64) -> Self {
        self.cost_minor = cost_minor;
        self
    }

    #[must_use]
    pub fn stock(mut self, quantity: i64) -> Self {
        self.stock_quantity = quantity;
        self
    }

    #[must_use]
    pub fn reorder_level(mut self, level: i64) -> Self {
        self.reorder_level = level;
        self
    }

    #[must_use]
    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Stock is not patchable: use `adjust_stock` so a movement is recorded.
#[derive(Clone, Debug, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price_minor: Option<i64>,
    pub cost_minor: Option<i64>,
    pub reorder_level: Option<i64>,
    pub archived: Option<bool>,
}

/// Register a customer.
#[derive(Clone, Debug)]
pub struct NewCustomerCmd {
    pub name: String,
    pub phone: String,
    pub shop_id: Option<Uuid>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
}

impl NewCustomerCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            shop_id: None,
            email: None,
            address: None,
            national_id: None,
        }
    }

    #[must_use]
    pub fn shop_id(mut self, shop_id: Uuid) -> Self {
        self.shop_id = Some(shop_id);
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn national_id(mut self, national_id: impl Into<String>) -> Self {
        self.national_id = Some(national_id.into());
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub national_id: Option<String>,
}

/// One line of a purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurchaseLine {
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Record a sale.
///
/// For cash purchases `down_payment_minor` and `installment_count` are
/// ignored: the full price is paid at once.
#[derive(Clone, Debug)]
pub struct NewPurchaseCmd {
    pub shop_slug: String,
    pub customer_id: Uuid,
    pub purchase_type: PurchaseType,
    pub lines: Vec<PurchaseLine>,
    pub down_payment_minor: i64,
    pub installment_count: i64,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub collector_id: Option<Uuid>,
    /// Method used for the down payment (or the full price of a cash sale).
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
}

impl NewPurchaseCmd {
    #[must_use]
    pub fn new(
        shop_slug: impl Into<String>,
        customer_id: Uuid,
        purchase_type: PurchaseType,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            shop_slug: shop_slug.into(),
            customer_id,
            purchase_type,
            lines: Vec::new(),
            down_payment_minor: 0,
            installment_count: 0,
            frequency: Frequency::Monthly,
            start_date,
            collector_id: None,
            method: PaymentMethod::Cash,
            reference: None,
            note: None,
        }
    }

    #[must_use]
    pub fn line(mut self, product_id: Uuid, quantity: i64) -> Self {
        self.lines.push(PurchaseLine {
            product_id,
            quantity,
        });
        self
    }

    #[must_use]
    pub fn down_payment(mut self, amount_minor: i64) -> Self {
        self.down_payment_minor = amount_minor;
        self
    }

    #[must_use]
    pub fn installments(mut self, count: i64, frequency: Frequency) -> Self {
        self.installment_count = count;
        self.frequency = frequency;
        self
    }

    #[must_use]
    pub fn collector(mut self, collector_id: Uuid) -> Self {
        self.collector_id = Some(collector_id);
        self
    }

    #[must_use]
    pub fn method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Record a payment against a purchase.
#[derive(Clone, Debug)]
pub struct PaymentCmd {
    pub purchase_id: Uuid,
    pub amount_minor: i64,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
}

impl PaymentCmd {
    #[must_use]
    pub fn new(purchase_id: Uuid, amount_minor: i64, method: PaymentMethod) -> Self {
        Self {
            purchase_id,
            amount_minor,
            method,
            reference: None,
            note: None,
        }
    }

    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Open a support ticket.
#[derive(Clone, Debug)]
pub struct NewTicketCmd {
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
}

impl NewTicketCmd {
    #[must_use]
    pub fn new(subject: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            priority: TicketPriority::Medium,
        }
    }

    #[must_use]
    pub fn priority(mut self, priority: TicketPriority) -> Self {
        self.priority = priority;
        self
    }
}
