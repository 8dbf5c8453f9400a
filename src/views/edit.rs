use rust_decimal::Decimal;

use crate::{
    cache::InvoiceCache,
    dto::invoices::CreateInvoiceRequest,
    error::AppResult,
    models::Invoice,
    mutation::Mutation,
    notify::Notifier,
    views::{
        DeleteOutcome,
        form::{
            InvoiceFields, LineItems, apply_reference_prefix, build_request, reference_prefix,
            strip_reference_prefix, validation_summary,
        },
    },
};

/// Edit dialog for an existing invoice.
///
/// The reference field shows only the number part; the user's
/// `"{username}INV-"` prefix is put back on save.
#[derive(Debug)]
pub struct EditInvoiceForm {
    cache: InvoiceCache,
    notifier: Notifier,
    username: Option<String>,
    invoice_id: i64,
    loaded_reference: String,
    loaded_number: String,
    loaded_with_prefix: bool,
    pub fields: InvoiceFields,
    pub items: LineItems,
    open: bool,
    update: Mutation,
    remove: Mutation,
}

impl EditInvoiceForm {
    pub fn new(
        cache: InvoiceCache,
        notifier: Notifier,
        invoice: &Invoice,
        username: Option<String>,
    ) -> Self {
        let number = strip_reference_prefix(&invoice.reference_number, username.as_deref());
        let loaded_with_prefix = number.len() != invoice.reference_number.len();
        Self {
            invoice_id: invoice.id,
            loaded_reference: invoice.reference_number.clone(),
            loaded_number: number.to_string(),
            loaded_with_prefix,
            fields: InvoiceFields {
                reference_number: number.to_string(),
                customer_name: invoice.customer_name.clone(),
                customer_email: invoice.customer_email.clone(),
            },
            items: LineItems::from_invoice_items(&invoice.items),
            open: true,
            update: Mutation::new(),
            remove: Mutation::new(),
            cache,
            notifier,
            username,
        }
    }

    pub fn invoice_id(&self) -> i64 {
        self.invoice_id
    }

    /// Prefix shown in front of the reference field.
    pub fn prefix(&self) -> String {
        reference_prefix(self.username.as_deref())
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_busy(&self) -> bool {
        self.update.is_pending() || self.remove.is_pending()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.subtotal()
    }

    pub fn total(&self) -> Decimal {
        self.subtotal()
    }

    /// Reference number that will be sent. A reference loaded without this
    /// user's prefix and left untouched goes back exactly as it came.
    pub fn reference_number(&self) -> String {
        if !self.loaded_with_prefix && self.fields.reference_number == self.loaded_number {
            return self.loaded_reference.clone();
        }
        apply_reference_prefix(self.fields.reference_number.trim(), self.username.as_deref())
    }

    pub fn request(&self) -> AppResult<CreateInvoiceRequest> {
        build_request(&self.fields, self.reference_number(), &self.items)
    }

    pub async fn submit(&mut self) -> AppResult<Invoice> {
        let payload = match self.request() {
            Ok(payload) => payload,
            Err(err) => {
                self.notifier.validation(validation_summary(&err));
                return Err(err);
            }
        };

        let id = self.invoice_id;
        let updated = self
            .update
            .run(&self.notifier, self.cache.api().update_invoice(id, &payload))
            .await?;

        self.cache.patch_invoice(&updated).await;
        self.cache.invalidate().await;
        self.notifier
            .success("Invoice updated", "The invoice has been updated successfully.");
        self.open = false;
        Ok(updated)
    }

    pub async fn delete(&mut self, confirmed: bool) -> AppResult<DeleteOutcome> {
        if !confirmed {
            return Ok(DeleteOutcome::Cancelled);
        }
        let id = self.invoice_id;
        self.remove
            .run(&self.notifier, self.cache.api().delete_invoice(id))
            .await?;
        self.cache.invalidate().await;
        self.notifier
            .success("Invoice deleted", "The invoice has been deleted successfully.");
        self.open = false;
        Ok(DeleteOutcome::Deleted(id))
    }
}
