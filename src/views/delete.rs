use crate::{
    cache::InvoiceCache, error::AppResult, models::Invoice, mutation::Mutation, notify::Notifier,
    views::DeleteOutcome,
};

/// Stand-alone delete confirmation dialog.
///
/// The caller is told which id went away so it can close any detail view
/// still showing it.
#[derive(Debug)]
pub struct DeleteInvoiceDialog {
    cache: InvoiceCache,
    notifier: Notifier,
    invoice: Option<Invoice>,
    open: bool,
    remove: Mutation,
}

impl DeleteInvoiceDialog {
    pub fn new(cache: InvoiceCache, notifier: Notifier, invoice: Option<Invoice>) -> Self {
        Self {
            cache,
            notifier,
            open: invoice.is_some(),
            invoice,
            remove: Mutation::new(),
        }
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        self.invoice.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_busy(&self) -> bool {
        self.remove.is_pending()
    }

    pub async fn delete(&mut self) -> AppResult<DeleteOutcome> {
        let Some(id) = self.invoice.as_ref().map(|inv| inv.id) else {
            return Ok(DeleteOutcome::Cancelled);
        };
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
