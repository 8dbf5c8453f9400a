use reqwest::Method;

use crate::{
    client::{ApiClient, Failure},
    dto::auth::{
        LoginRequest, RefreshRequest, RefreshResponse, SignupRequest, SignupResponse,
        VerifyRequest,
    },
    error::AppResult,
    models::AuthTokens,
};

pub async fn signup(client: &ApiClient, payload: &SignupRequest) -> AppResult<SignupResponse> {
    let req = client
        .request(Method::POST, "/api/auth/signup/")
        .json(payload);
    client.send_json(req, Failure::json("Signup failed")).await
}

pub async fn login(client: &ApiClient, payload: &LoginRequest) -> AppResult<AuthTokens> {
    let req = client.request(Method::POST, "/api/auth/login/").json(payload);
    client.send_json(req, Failure::json("Login failed")).await
}

pub async fn refresh_token(client: &ApiClient, refresh: &str) -> AppResult<RefreshResponse> {
    let req = client
        .request(Method::POST, "/api/auth/refresh/")
        .json(&RefreshRequest {
            refresh: refresh.to_string(),
        });
    client.send_json(req, Failure::json("Token refresh failed")).await
}

/// `Ok(false)` for any non-2xx answer; only transport failures are errors.
pub async fn verify_token(client: &ApiClient, token: &str) -> AppResult<bool> {
    let req = client
        .request(Method::POST, "/api/auth/verify/")
        .json(&VerifyRequest {
            token: token.to_string(),
        });
    client.send_ok(req).await
}

pub async fn logout(client: &ApiClient, refresh: &str) -> AppResult<()> {
    let req = client
        .request(Method::POST, "/api/auth/logout/")
        .json(&RefreshRequest {
            refresh: refresh.to_string(),
        });
    client.send_empty(req, Failure::json("Logout failed")).await
}
