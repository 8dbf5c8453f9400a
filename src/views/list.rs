use tokio::sync::watch;

use crate::{
    cache::InvoiceCache,
    error::AppResult,
    models::Invoice,
    notify::Notifier,
    views::{
        create::CreateInvoiceForm,
        detail::InvoiceDetail,
        format::{format_currency, format_date},
    },
};

/// One rendered row of the invoice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRow {
    pub id: i64,
    pub reference_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total: String,
    pub status: &'static str,
    pub created: String,
    pub item_count: usize,
}

impl From<&Invoice> for InvoiceRow {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id,
            reference_number: invoice.reference_number.clone(),
            customer_name: invoice.customer_name.clone(),
            customer_email: invoice.customer_email.clone(),
            total: format_currency(invoice.total_amount),
            status: invoice.status.label(),
            created: format_date(&invoice.created_at),
            item_count: invoice.items.len(),
        }
    }
}

/// Invoice list screen: owns the subscription to the cache and the dialogs
/// opened from it.
#[derive(Debug)]
pub struct InvoiceList {
    cache: InvoiceCache,
    notifier: Notifier,
    username: Option<String>,
    updates: watch::Receiver<u64>,
    invoices: Vec<Invoice>,
    loading: bool,
    detail: Option<InvoiceDetail>,
    create: Option<CreateInvoiceForm>,
}

impl InvoiceList {
    pub fn new(cache: InvoiceCache, notifier: Notifier, username: Option<String>) -> Self {
        let updates = cache.subscribe();
        Self {
            cache,
            notifier,
            username,
            updates,
            invoices: Vec::new(),
            loading: true,
            detail: None,
            create: None,
        }
    }

    pub fn cache(&self) -> &InvoiceCache {
        &self.cache
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn rows(&self) -> Vec<InvoiceRow> {
        self.invoices.iter().map(InvoiceRow::from).collect()
    }

    pub async fn load(&mut self) -> AppResult<()> {
        let result = self.cache.fetch().await;
        self.finish_load(result).await
    }

    pub async fn refetch(&mut self) -> AppResult<()> {
        let result = self.cache.refetch().await;
        self.finish_load(result).await
    }

    /// Whether the cache changed since the last [`InvoiceList::sync`].
    pub fn has_updates(&self) -> bool {
        self.updates.has_changed().unwrap_or(false)
    }

    /// Pulls the latest cached list and re-synchronizes the open detail
    /// dialog: it gets the cached copy, or is closed if its invoice is gone.
    pub async fn sync(&mut self) {
        let _ = self.updates.borrow_and_update();
        if let Some(list) = self.cache.snapshot().await {
            self.invoices = list;
        }

        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if !detail.is_open() {
            self.detail = None;
            return;
        }
        let id = detail.invoice().id;
        match self.invoices.iter().find(|inv| inv.id == id) {
            Some(fresh) => detail.set_invoice(fresh.clone()),
            None => {
                tracing::debug!(id, "open invoice no longer listed, closing detail");
                self.detail = None;
            }
        }
    }

    pub fn open_detail(&mut self, id: i64) -> Option<&mut InvoiceDetail> {
        let invoice = self.invoices.iter().find(|inv| inv.id == id)?.clone();
        self.detail = Some(InvoiceDetail::new(
            self.cache.clone(),
            self.notifier.clone(),
            invoice,
            self.username.clone(),
        ));
        self.detail.as_mut()
    }

    pub fn detail(&self) -> Option<&InvoiceDetail> {
        self.detail.as_ref()
    }

    pub fn detail_mut(&mut self) -> Option<&mut InvoiceDetail> {
        self.detail.as_mut()
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn open_create(&mut self) -> &mut CreateInvoiceForm {
        self.create.insert(CreateInvoiceForm::new(
            self.cache.clone(),
            self.notifier.clone(),
            self.username.clone(),
        ))
    }

    pub fn create_form(&mut self) -> Option<&mut CreateInvoiceForm> {
        self.create.as_mut()
    }

    pub fn close_create(&mut self) {
        self.create = None;
    }

    /// Called when a delete issued from any dialog succeeded.
    pub fn on_deleted(&mut self, id: i64) {
        if self.detail.as_ref().is_some_and(|d| d.invoice().id == id) {
            self.detail = None;
        }
    }

    async fn finish_load(&mut self, result: AppResult<Vec<Invoice>>) -> AppResult<()> {
        self.loading = false;
        match result {
            Ok(list) => {
                self.invoices = list;
                self.sync().await;
                Ok(())
            }
            Err(err) => {
                self.notifier.error(err.to_string());
                Err(err)
            }
        }
    }
}
