//! REST API client module for Fastays services.
//!
//! This module provides the `ApiClient` for communicating with the
//! Fastays API. Every outbound request passes through the client's
//! interceptor, which attaches the stored bearer token and invalidates it
//! when the server answers with an authorization failure.

pub mod client;
pub mod error;
pub mod transport;

pub use client::ApiClient;
pub use error::ApiError;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

/// Endpoint paths, relative to the configured base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const REFRESH_TOKEN: &str = "/auth/refresh";
    pub const SEND_OTP: &str = "/auth/send-otp";
    pub const VERIFY_OTP: &str = "/auth/verify-otp";
    pub const HOME_DATA: &str = "/home/data";
    pub const USER_PROFILE: &str = "/user/profile";
}
