//! Thin HTTP layer shared by every backend call.
//!
//! Owns the reqwest client and base URL, stamps each request with an
//! `x-request-id`, and turns non-2xx responses into [`AppError`]s carrying the
//! server's message when it sent one.

use std::time::Instant;

use reqwest::{
    Method, RequestBuilder, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    response::error_message,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// How a failed response body is turned into a message.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Failure {
    pub fallback: &'static str,
    pub plain_text: bool,
}

impl Failure {
    pub const fn json(fallback: &'static str) -> Self {
        Self {
            fallback,
            plain_text: false,
        }
    }

    pub const fn text(fallback: &'static str) -> Self {
        Self {
            fallback,
            plain_text: true,
        }
    }
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let base_url = config.api_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Config("api url is empty".into()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request with the JSON content type every backend call carries.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }

    /// Same as [`ApiClient::request`] plus `Authorization: Bearer <token>`.
    pub(crate) fn authorized(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path)
            .header(AUTHORIZATION, format!("Bearer {token}"))
    }

    /// Sends the request and decodes a JSON body on success.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        failure: Failure,
    ) -> AppResult<T> {
        let resp = self.dispatch(builder).await?;
        let resp = check_status(resp, failure).await?;
        Ok(resp.json().await?)
    }

    /// Sends the request and discards the body on success.
    pub(crate) async fn send_empty(&self, builder: RequestBuilder, failure: Failure) -> AppResult<()> {
        let resp = self.dispatch(builder).await?;
        check_status(resp, failure).await?;
        Ok(())
    }

    /// Sends the request and reports only whether it succeeded. Transport
    /// failures are still errors.
    pub(crate) async fn send_ok(&self, builder: RequestBuilder) -> AppResult<bool> {
        let resp = self.dispatch(builder).await?;
        Ok(resp.status().is_success())
    }

    async fn dispatch(&self, builder: RequestBuilder) -> AppResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        let request = builder.header(REQUEST_ID_HEADER, &request_id).build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        tracing::debug!(request_id = %request_id, method = %method, url = %url, "request started");
        let started = Instant::now();
        let resp = match self.http.execute(request).await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(request_id = %request_id, method = %method, url = %url, error = %err, "request failed");
                return Err(err.into());
            }
        };
        tracing::debug!(
            request_id = %request_id,
            status = %resp.status(),
            ms = %started.elapsed().as_millis(),
            "request finished"
        );
        Ok(resp)
    }
}

async fn check_status(resp: Response, failure: Failure) -> AppResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let raw = resp.text().await.unwrap_or_default();
    let message = error_message(&raw, failure.plain_text)
        .unwrap_or_else(|| failure.fallback.to_string());

    if status == StatusCode::UNAUTHORIZED {
        return Err(AppError::Unauthorized { message });
    }
    Err(AppError::Api {
        status: status.as_u16(),
        message,
    })
}
