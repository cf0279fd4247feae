//! Backend service interfaces.
//!
//! Controllers only ever talk to these traits, so the mock backend can be
//! swapped for the remote one (or a test double) without touching them.

pub mod mock;
pub mod remote;

use async_trait::async_trait;

use crate::api::ApiError;
use crate::models::{ApiResponse, HomeData, LoginResponse};

pub use mock::MockBackend;
pub use remote::RemoteBackend;

/// One-time code delivery and verification.
#[async_trait]
pub trait OtpService: Send + Sync {
    async fn send_code(&self, phone_number: &str) -> Result<ApiResponse<serde_json::Value>, ApiError>;

    async fn verify_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<ApiResponse<LoginResponse>, ApiError>;
}

/// Email/password sign-in.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<ApiResponse<LoginResponse>, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;
}

#[async_trait]
pub trait HomeService: Send + Sync {
    async fn home_data(&self) -> Result<ApiResponse<HomeData>, ApiError>;
}
