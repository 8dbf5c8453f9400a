use reqwest::Method;

use crate::{
    client::{ApiClient, Failure},
    dto::invoices::CreateInvoiceRequest,
    error::AppResult,
    models::Invoice,
};

pub async fn list_invoices(client: &ApiClient, token: &str) -> AppResult<Vec<Invoice>> {
    let req = client.authorized(Method::GET, "/api/invoices/", token);
    client
        .send_json(req, Failure::json("Failed to fetch invoices"))
        .await
}

pub async fn get_invoice(client: &ApiClient, token: &str, id: i64) -> AppResult<Invoice> {
    let req = client.authorized(Method::GET, &invoice_path(id, ""), token);
    client
        .send_json(req, Failure::json("Failed to fetch invoice"))
        .await
}

pub async fn create_invoice(
    client: &ApiClient,
    token: &str,
    payload: &CreateInvoiceRequest,
) -> AppResult<Invoice> {
    let req = client
        .authorized(Method::POST, "/api/invoices/", token)
        .json(payload);
    client
        .send_json(req, Failure::json("Failed to create invoice"))
        .await
}

pub async fn update_invoice(
    client: &ApiClient,
    token: &str,
    id: i64,
    payload: &CreateInvoiceRequest,
) -> AppResult<Invoice> {
    let req = client
        .authorized(Method::PUT, &invoice_path(id, ""), token)
        .json(payload);
    client
        .send_json(req, Failure::json("Failed to update invoice"))
        .await
}

pub async fn delete_invoice(client: &ApiClient, token: &str, id: i64) -> AppResult<()> {
    let req = client.authorized(Method::DELETE, &invoice_path(id, ""), token);
    client
        .send_empty(req, Failure::text("Failed to delete invoice"))
        .await
}

pub async fn mark_paid(client: &ApiClient, token: &str, id: i64) -> AppResult<Invoice> {
    let req = client.authorized(Method::PATCH, &invoice_path(id, "mark-paid/"), token);
    client
        .send_json(req, Failure::json("Failed to mark invoice as paid"))
        .await
}

pub async fn mark_pending(client: &ApiClient, token: &str, id: i64) -> AppResult<Invoice> {
    let req = client.authorized(Method::PATCH, &invoice_path(id, "mark-pending/"), token);
    client
        .send_json(req, Failure::json("Failed to mark invoice as pending"))
        .await
}

fn invoice_path(id: i64, action: &str) -> String {
    format!("/api/invoices/{id}/{action}")
}

#[cfg(test)]
mod tests {
    use super::invoice_path;

    #[test]
    fn paths_keep_trailing_slash() {
        assert_eq!(invoice_path(7, ""), "/api/invoices/7/");
        assert_eq!(invoice_path(7, "mark-paid/"), "/api/invoices/7/mark-paid/");
    }
}
