use rust_decimal::Decimal;

use crate::{
    cache::InvoiceCache,
    dto::invoices::CreateInvoiceRequest,
    error::AppResult,
    models::Invoice,
    mutation::Mutation,
    notify::Notifier,
    views::form::{
        InvoiceFields, LineItems, apply_reference_prefix, build_request, reference_prefix,
        validation_summary,
    },
};

#[derive(Debug)]
pub struct CreateInvoiceForm {
    cache: InvoiceCache,
    notifier: Notifier,
    username: Option<String>,
    pub fields: InvoiceFields,
    pub items: LineItems,
    open: bool,
    create: Mutation,
}

impl CreateInvoiceForm {
    pub fn new(cache: InvoiceCache, notifier: Notifier, username: Option<String>) -> Self {
        Self {
            cache,
            notifier,
            username,
            fields: InvoiceFields::default(),
            items: LineItems::new(),
            open: true,
            create: Mutation::new(),
        }
    }

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
        self.create.is_pending()
    }

    /// Client-side estimate; the backend computes the real total.
    pub fn subtotal(&self) -> Decimal {
        self.items.subtotal()
    }

    pub fn subtotal_display(&self) -> String {
        format!("{:.2}", self.subtotal())
    }

    pub fn request(&self) -> AppResult<CreateInvoiceRequest> {
        let reference =
            apply_reference_prefix(self.fields.reference_number.trim(), self.username.as_deref());
        build_request(&self.fields, reference, &self.items)
    }

    /// Creates the invoice, then invalidates the list so it reloads with the
    /// server's copy. The form is reset and closed on success.
    pub async fn submit(&mut self) -> AppResult<Invoice> {
        let payload = match self.request() {
            Ok(payload) => payload,
            Err(err) => {
                self.notifier.validation(validation_summary(&err));
                return Err(err);
            }
        };

        let created = self
            .create
            .run(&self.notifier, self.cache.api().create_invoice(&payload))
            .await?;

        self.cache.invalidate().await;
        self.notifier
            .success("Invoice created", "The invoice has been created successfully.");
        self.reset();
        self.open = false;
        Ok(created)
    }

    pub fn reset(&mut self) {
        self.fields = InvoiceFields::default();
        self.items = LineItems::new();
        self.create.reset();
    }
}
