//! The HTTP seam underneath `ApiClient`.
//!
//! `ApiClient` never talks to reqwest directly; it hands fully-prepared
//! requests to an `HttpTransport`. Production code uses `ReqwestTransport`,
//! tests substitute a recording fake.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// The request went out (or tried to) but nothing came back.
    #[error("No response received: {0}")]
    NoResponse(String),

    #[error("Failed to build request: {0}")]
    Request(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport backed by a pooled reqwest client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::Request(e.to_string())
            } else {
                TransportError::NoResponse(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::NoResponse(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
