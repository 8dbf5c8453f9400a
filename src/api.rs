use crate::{
    dto::invoices::CreateInvoiceRequest,
    error::AppResult,
    models::{Invoice, Transaction},
    services::{invoice_service, transaction_service},
    session::AuthSession,
};

/// Session-aware entry point for the invoice and transaction endpoints.
///
/// Every call goes through [`AuthSession::with_token`], so a missing token
/// fails fast and an expired one is refreshed once.
#[derive(Debug, Clone)]
pub struct InvoiceApi {
    session: AuthSession,
}

impl InvoiceApi {
    pub fn new(session: AuthSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub async fn list_invoices(&self) -> AppResult<Vec<Invoice>> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move { invoice_service::list_invoices(client, &token).await })
            .await
    }

    pub async fn get_invoice(&self, id: i64) -> AppResult<Invoice> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move { invoice_service::get_invoice(client, &token, id).await })
            .await
    }

    pub async fn create_invoice(&self, payload: &CreateInvoiceRequest) -> AppResult<Invoice> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move {
                invoice_service::create_invoice(client, &token, payload).await
            })
            .await
    }

    pub async fn update_invoice(&self, id: i64, payload: &CreateInvoiceRequest) -> AppResult<Invoice> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move {
                invoice_service::update_invoice(client, &token, id, payload).await
            })
            .await
    }

    pub async fn delete_invoice(&self, id: i64) -> AppResult<()> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move { invoice_service::delete_invoice(client, &token, id).await })
            .await
    }

    pub async fn mark_paid(&self, id: i64) -> AppResult<Invoice> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move { invoice_service::mark_paid(client, &token, id).await })
            .await
    }

    pub async fn mark_pending(&self, id: i64) -> AppResult<Invoice> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move { invoice_service::mark_pending(client, &token, id).await })
            .await
    }

    pub async fn list_transactions(&self) -> AppResult<Vec<Transaction>> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move {
                transaction_service::list_transactions(client, &token).await
            })
            .await
    }

    pub async fn get_transaction(&self, id: i64) -> AppResult<Transaction> {
        let client = self.session.client();
        self.session
            .with_token(|token| async move {
                transaction_service::get_transaction(client, &token, id).await
            })
            .await
    }
}
