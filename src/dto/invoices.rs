use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body for both `POST /api/invoices/` and `PUT /api/invoices/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    pub reference_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<InvoiceItemRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItemRequest {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}
