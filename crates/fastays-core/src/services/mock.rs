//! In-process stand-in for the Fastays backend.
//!
//! Simulates network latency and accepts a fixed set of demo credentials.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::api::ApiError;
use crate::login::validate_phone_number;
use crate::models::{ApiResponse, HomeData, HomeStats, LoginResponse, Stay, StayStatus, User};

use super::{AuthService, HomeService, OtpService};

/// The only code the mock backend accepts.
pub const VALID_OTP: &str = "1234";

pub const DEMO_EMAIL: &str = "demo@fastays.com";
pub const DEMO_PASSWORD: &str = "password123";

const DEMO_AVATAR: &str = "https://i.pravatar.cc/150?img=1";

/// Simulated round-trip times.
#[derive(Debug, Clone, Copy)]
pub struct MockLatency {
    pub send_code: Duration,
    pub verify_code: Duration,
    pub login: Duration,
    pub home_data: Duration,
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            send_code: Duration::from_millis(1000),
            verify_code: Duration::from_millis(1500),
            login: Duration::from_millis(1500),
            home_data: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    latency: MockLatency,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: MockLatency) -> Self {
        Self { latency }
    }

    fn session_for(user: User) -> LoginResponse {
        let stamp = Utc::now().timestamp_millis();
        LoginResponse {
            user,
            token: format!("dummy_auth_token_{}", stamp),
            refresh_token: format!("dummy_refresh_token_{}", stamp),
        }
    }
}

#[async_trait]
impl OtpService for MockBackend {
    async fn send_code(&self, phone_number: &str) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        tokio::time::sleep(self.latency.send_code).await;
        validate_phone_number(phone_number).map_err(|msg| ApiError::Rejected(msg.to_string()))?;
        debug!(phone_number, "Mock OTP sent");
        Ok(ApiResponse::ok(serde_json::Value::Null, "OTP sent successfully"))
    }

    async fn verify_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<ApiResponse<LoginResponse>, ApiError> {
        tokio::time::sleep(self.latency.verify_code).await;

        if code != VALID_OTP {
            debug!(phone_number, "Mock OTP rejected");
            return Err(ApiError::Rejected("Invalid OTP. Please try again.".to_string()));
        }

        let user = User {
            id: "1".to_string(),
            email: DEMO_EMAIL.to_string(),
            name: "Demo User".to_string(),
            avatar: Some(DEMO_AVATAR.to_string()),
            created_at: Utc::now().to_rfc3339(),
            phone_number: Some(phone_number.to_string()),
        };
        Ok(ApiResponse::ok(Self::session_for(user), "OTP verified successfully"))
    }
}

#[async_trait]
impl AuthService for MockBackend {
    async fn login(&self, email: &str, password: &str) -> Result<ApiResponse<LoginResponse>, ApiError> {
        tokio::time::sleep(self.latency.login).await;

        if email != DEMO_EMAIL || password != DEMO_PASSWORD {
            return Err(ApiError::Rejected(format!(
                "Invalid credentials. Use {} / {}",
                DEMO_EMAIL, DEMO_PASSWORD
            )));
        }

        let user = User {
            id: "1".to_string(),
            email: email.to_string(),
            name: "Demo User".to_string(),
            avatar: Some(DEMO_AVATAR.to_string()),
            created_at: Utc::now().to_rfc3339(),
            phone_number: None,
        };
        Ok(ApiResponse::ok(Self::session_for(user), "Login successful"))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

fn demo_stay(
    id: &str,
    title: &str,
    location: &str,
    dates: (&str, &str),
    price: f64,
    image: &str,
    status: StayStatus,
) -> Stay {
    Stay {
        id: id.to_string(),
        title: title.to_string(),
        location: location.to_string(),
        check_in: dates.0.to_string(),
        check_out: dates.1.to_string(),
        price,
        image: Some(image.to_string()),
        status,
    }
}

#[async_trait]
impl HomeService for MockBackend {
    async fn home_data(&self) -> Result<ApiResponse<HomeData>, ApiError> {
        tokio::time::sleep(self.latency.home_data).await;

        let data = HomeData {
            welcome_message: "Welcome back to Fastays!".to_string(),
            stats: HomeStats {
                total_bookings: 12,
                active_stays: 2,
                completed_stays: 10,
            },
            recent_stays: vec![
                demo_stay(
                    "1",
                    "Luxury Beach Villa",
                    "Malibu, California",
                    ("2024-12-01", "2024-12-05"),
                    450.0,
                    "https://images.unsplash.com/photo-1582268611958-ebfd161ef9cf?w=400",
                    StayStatus::Upcoming,
                ),
                demo_stay(
                    "2",
                    "Mountain Cabin Retreat",
                    "Aspen, Colorado",
                    ("2024-11-15", "2024-11-20"),
                    320.0,
                    "https://images.unsplash.com/photo-1542718610-a1d656d1884c?w=400",
                    StayStatus::Active,
                ),
                demo_stay(
                    "3",
                    "Downtown Loft",
                    "New York, NY",
                    ("2024-10-10", "2024-10-15"),
                    280.0,
                    "https://images.unsplash.com/photo-1522708323590-d24dbb6b0267?w=400",
                    StayStatus::Completed,
                ),
            ],
        };
        Ok(ApiResponse::ok(data, "Home data fetched successfully"))
    }
}
