//! API client for communicating with the Fastays REST API.
//!
//! `ApiClient` wraps an `HttpTransport` with the request/response interceptor:
//! the stored bearer token is attached before every request, and a 401 from
//! the server removes it from storage before the error reaches the caller.

use std::sync::Arc;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::config::Config;

use super::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
use super::ApiError;

/// API client for Fastays.
/// Clone is cheap - the transport and the session store are shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// Create a client using the base URL and timeout from `config`
    pub fn new(config: &Config, session: SessionStore) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.request_timeout())
            .map_err(|e| ApiError::Unexpected(e.to_string()))?;
        Ok(Self::with_transport(
            config.api_base_url.clone(),
            Arc::new(transport),
            session,
        ))
    }

    pub fn with_transport(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        session: SessionStore,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // ===== HTTP verbs =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Some(Self::encode(body)?)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, Some(Self::encode(body)?)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PATCH, path, Some(Self::encode(body)?)).await
    }

    fn encode<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
        serde_json::to_value(body).map_err(|e| ApiError::Unexpected(e.to_string()))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let mut request = HttpRequest {
            method,
            url: self.url(path),
            headers: Self::default_headers(),
            body,
        };
        self.attach_credentials(&mut request).await;

        debug!(method = %request.method, url = %request.url, "Sending request");
        let method = request.method.clone();
        let url = request.url.clone();

        match self.transport.send(request).await {
            Ok(response) if response.status.is_success() => Self::parse_body(&url, response),
            Ok(response) => Err(self.handle_error_response(&method, &url, response).await),
            Err(TransportError::NoResponse(cause)) => {
                warn!(%method, %url, %cause, "No response from server");
                Err(ApiError::NoConnectivity)
            }
            Err(TransportError::Request(cause)) => {
                warn!(%method, %url, %cause, "Request could not be sent");
                Err(ApiError::Unexpected(cause))
            }
        }
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Request interceptor: attach the stored bearer token, if any.
    /// A missing or unreadable token leaves the request unauthenticated.
    async fn attach_credentials(&self, request: &mut HttpRequest) {
        let token = match self.session.token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read auth token, sending unauthenticated");
                None
            }
        };

        let Some(token) = token else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                request.headers.insert(header::AUTHORIZATION, value);
            }
            Err(e) => warn!(error = %e, "Stored auth token is not a valid header value"),
        }
    }

    /// Response interceptor for error statuses. A 401 invalidates the stored
    /// token; the error is always returned to the caller.
    async fn handle_error_response(
        &self,
        method: &Method,
        url: &str,
        response: HttpResponse,
    ) -> ApiError {
        let error = ApiError::from_status(response.status, &response.body);
        warn!(
            %method,
            url,
            status = response.status.as_u16(),
            body = %ApiError::truncate_body(&response.body),
            "Request failed"
        );

        if error.is_unauthorized() {
            if let Err(e) = self.session.invalidate_token().await {
                warn!(error = %e, "Failed to remove auth token after 401");
            }
        }
        error
    }

    fn parse_body<T: DeserializeOwned>(url: &str, response: HttpResponse) -> Result<T, ApiError> {
        serde_json::from_str(&response.body).map_err(|e| {
            warn!(url, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("{}: {}", e, ApiError::truncate_body(&response.body)))
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde::Deserialize;

    use super::*;
    use crate::api::error::DEFAULT_ERROR_MESSAGE;
    use crate::auth::{KeyValueStore, MemoryStore, AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use crate::testing::FakeTransport;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Profile {
        name: String,
    }

    fn client_with(transport: Arc<FakeTransport>) -> (ApiClient, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let session = SessionStore::new(store.clone());
        let client = ApiClient::with_transport("https://api.fastays.test/", transport, session);
        (client, store)
    }

    #[tokio::test]
    async fn test_request_without_token_has_no_authorization_header() {
        let transport = Arc::new(FakeTransport::default().respond(StatusCode::OK, r#"{"name":"Demo"}"#));
        let (client, _store) = client_with(transport.clone());

        let profile: Profile = client.get("/user/profile").await.expect("request should succeed");
        assert_eq!(profile.name, "Demo");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://api.fastays.test/user/profile");
        assert!(requests[0].headers.get(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_request_with_token_attaches_bearer() {
        let transport = Arc::new(FakeTransport::default());
        let (client, store) = client_with(transport.clone());
        store.set(AUTH_TOKEN_KEY, "abc123").await.unwrap();

        let _: serde_json::Value = client
            .post("/auth/logout", &serde_json::json!({}))
            .await
            .expect("request should succeed");

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(
            requests[0].headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer abc123"
        );
        assert_eq!(requests[0].body, Some(serde_json::json!({})));
    }

    #[tokio::test]
    async fn test_unauthorized_removes_token_and_propagates_message() {
        let transport = Arc::new(
            FakeTransport::default().respond(StatusCode::UNAUTHORIZED, r#"{"message":"Token expired"}"#),
        );
        let (client, store) = client_with(transport.clone());
        store.set(AUTH_TOKEN_KEY, "stale").await.unwrap();
        store.set(REFRESH_TOKEN_KEY, "refresh").await.unwrap();

        let err = client
            .get::<serde_json::Value>("/home/data")
            .await
            .expect_err("401 should propagate");

        assert_eq!(err, ApiError::Unauthorized("Token expired".to_string()));
        assert_eq!(err.to_string(), "Token expired");
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
        // Only the bearer token is invalidated
        assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap().as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_no_connectivity() {
        let transport = Arc::new(
            FakeTransport::default().fail(TransportError::NoResponse("connection refused".to_string())),
        );
        let (client, store) = client_with(transport);
        store.set(AUTH_TOKEN_KEY, "keep-me").await.unwrap();

        let err = client.get::<serde_json::Value>("/home/data").await.unwrap_err();
        assert_eq!(err, ApiError::NoConnectivity);
        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(), Some("keep-me"));
    }

    #[tokio::test]
    async fn test_server_error_passes_message_through() {
        let transport = Arc::new(
            FakeTransport::default()
                .respond(StatusCode::UNPROCESSABLE_ENTITY, r#"{"success":false,"message":"Phone number is blocked"}"#)
                .respond(StatusCode::INTERNAL_SERVER_ERROR, "not json"),
        );
        let (client, store) = client_with(transport);
        store.set(AUTH_TOKEN_KEY, "keep-me").await.unwrap();

        let err = client
            .put::<serde_json::Value, _>("/user/profile", &serde_json::json!({"name": "x"}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Server {
                status: 422,
                message: "Phone number is blocked".to_string()
            }
        );

        let err = client.delete::<serde_json::Value>("/user/profile").await.unwrap_err();
        assert_eq!(err.to_string(), DEFAULT_ERROR_MESSAGE);

        // Non-401 failures leave the session alone
        assert!(store.get(AUTH_TOKEN_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_invalid_response() {
        let transport = Arc::new(FakeTransport::default().respond(StatusCode::OK, "<html></html>"));
        let (client, _store) = client_with(transport);

        let err = client
            .patch::<Profile, _>("user/profile", &serde_json::json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
