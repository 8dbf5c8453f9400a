use reqwest::Method;

use crate::{
    client::{ApiClient, Failure},
    error::AppResult,
    models::Transaction,
};

pub async fn list_transactions(client: &ApiClient, token: &str) -> AppResult<Vec<Transaction>> {
    let req = client.authorized(Method::GET, "/api/transactions/", token);
    client
        .send_json(req, Failure::json("Failed to fetch transactions"))
        .await
}

pub async fn get_transaction(client: &ApiClient, token: &str, id: i64) -> AppResult<Transaction> {
    let req = client.authorized(Method::GET, &format!("/api/transactions/{id}/"), token);
    client
        .send_json(req, Failure::json("Failed to fetch transaction"))
        .await
}
