use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    cache::InvoiceCache,
    error::{AppError, AppResult},
    models::{Invoice, InvoiceStatus, TransactionType},
    mutation::Mutation,
    notify::Notifier,
    views::{DeleteOutcome, edit::EditInvoiceForm},
};

/// One row of the detail dialog's transaction history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub transaction_date: DateTime<Utc>,
    pub status: &'static str,
    pub description: &'static str,
}

/// History derived from the invoice itself: a pending sale at creation and,
/// once paid, a completed payment at the last update.
///
/// This is not the backend's transaction ledger (see `transactions list`);
/// a paid-then-reopened invoice shows no trace of the earlier payment here.
pub fn synthesize_history(invoice: &Invoice) -> Vec<HistoryEntry> {
    let mut history = vec![HistoryEntry {
        id: 1,
        transaction_type: TransactionType::Sale,
        amount: invoice.total_amount,
        transaction_date: invoice.created_at,
        status: "pending",
        description: "Sale created",
    }];
    if invoice.status == InvoiceStatus::Paid {
        history.push(HistoryEntry {
            id: 2,
            transaction_type: TransactionType::Payment,
            amount: invoice.total_amount,
            transaction_date: invoice.updated_at,
            status: "completed",
            description: "Payment received",
        });
    }
    history
}

/// Detail dialog for one invoice.
///
/// Holds its own copy of the invoice, re-assigned by the owner via
/// [`InvoiceDetail::set_invoice`] when the cached value changes and by every
/// successful mutation issued from here.
#[derive(Debug)]
pub struct InvoiceDetail {
    cache: InvoiceCache,
    notifier: Notifier,
    username: Option<String>,
    invoice: Invoice,
    open: bool,
    pay: Mutation,
    reopen: Mutation,
    remove: Mutation,
}

impl InvoiceDetail {
    pub fn new(
        cache: InvoiceCache,
        notifier: Notifier,
        invoice: Invoice,
        username: Option<String>,
    ) -> Self {
        Self {
            cache,
            notifier,
            username,
            invoice,
            open: true,
            pay: Mutation::new(),
            reopen: Mutation::new(),
            remove: Mutation::new(),
        }
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    pub fn set_invoice(&mut self, invoice: Invoice) {
        self.invoice = invoice;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// True while any mutation from this dialog is in flight.
    pub fn is_busy(&self) -> bool {
        self.pay.is_pending() || self.reopen.is_pending() || self.remove.is_pending()
    }

    pub fn can_mark_paid(&self) -> bool {
        self.invoice.status == InvoiceStatus::Pending
    }

    pub fn can_mark_pending(&self) -> bool {
        self.invoice.status == InvoiceStatus::Paid
    }

    pub fn transaction_history(&self) -> Vec<HistoryEntry> {
        synthesize_history(&self.invoice)
    }

    pub fn open_edit(&self) -> EditInvoiceForm {
        EditInvoiceForm::new(
            self.cache.clone(),
            self.notifier.clone(),
            &self.invoice,
            self.username.clone(),
        )
    }

    pub async fn mark_paid(&mut self) -> AppResult<Invoice> {
        if !self.can_mark_paid() {
            return Err(self.reject("Only pending invoices can be marked as paid"));
        }
        let id = self.invoice.id;
        let updated = self
            .pay
            .run(&self.notifier, self.cache.api().mark_paid(id))
            .await?;
        self.apply_update(&updated).await;
        self.notifier
            .success("Payment recorded", "The invoice has been marked as paid.");
        self.open = false;
        Ok(updated)
    }

    pub async fn mark_pending(&mut self) -> AppResult<Invoice> {
        if !self.can_mark_pending() {
            return Err(self.reject("Only paid invoices can be marked as pending"));
        }
        let id = self.invoice.id;
        let updated = self
            .reopen
            .run(&self.notifier, self.cache.api().mark_pending(id))
            .await?;
        self.apply_update(&updated).await;
        self.notifier
            .success("Status updated", "The invoice has been marked as pending.");
        self.open = false;
        Ok(updated)
    }

    /// Deletes after the user confirmed; an unconfirmed call does nothing.
    pub async fn delete(&mut self, confirmed: bool) -> AppResult<DeleteOutcome> {
        if !confirmed {
            return Ok(DeleteOutcome::Cancelled);
        }
        let id = self.invoice.id;
        self.remove
            .run(&self.notifier, self.cache.api().delete_invoice(id))
            .await?;
        self.cache.invalidate().await;
        self.notifier
            .success("Invoice deleted", "The invoice has been deleted successfully.");
        self.open = false;
        Ok(DeleteOutcome::Deleted(id))
    }

    async fn apply_update(&mut self, updated: &Invoice) {
        self.cache.patch_invoice(updated).await;
        self.cache.invalidate().await;
        self.invoice = updated.clone();
    }

    fn reject(&self, message: &str) -> AppError {
        self.notifier.error(message);
        AppError::validation("status", message)
    }
}
