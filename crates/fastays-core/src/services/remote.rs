//! Services backed by the Fastays REST API.

use async_trait::async_trait;

use crate::api::{endpoints, ApiClient, ApiError};
use crate::models::{
    ApiResponse, HomeData, LoginRequest, LoginResponse, OtpRequest, VerifyOtpRequest,
};

use super::{AuthService, HomeService, OtpService};

#[derive(Debug, Clone)]
pub struct RemoteBackend {
    api: ApiClient,
}

impl RemoteBackend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[async_trait]
impl OtpService for RemoteBackend {
    async fn send_code(&self, phone_number: &str) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        let body = OtpRequest {
            phone_number: phone_number.to_string(),
        };
        self.api.post(endpoints::SEND_OTP, &body).await
    }

    async fn verify_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<ApiResponse<LoginResponse>, ApiError> {
        let body = VerifyOtpRequest {
            phone_number: phone_number.to_string(),
            otp: code.to_string(),
        };
        self.api.post(endpoints::VERIFY_OTP, &body).await
    }
}

#[async_trait]
impl AuthService for RemoteBackend {
    async fn login(&self, email: &str, password: &str) -> Result<ApiResponse<LoginResponse>, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.api.post(endpoints::LOGIN, &body).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .api
            .post(endpoints::LOGOUT, &serde_json::json!({}))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HomeService for RemoteBackend {
    async fn home_data(&self) -> Result<ApiResponse<HomeData>, ApiError> {
        self.api.get(endpoints::HOME_DATA).await
    }
}
