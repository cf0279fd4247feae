//! Data models for Fastays entities.
//!
//! This module contains the wire and domain types shared by the services
//! and controllers:
//!
//! - `ApiResponse<T>`: The `{success, data, message}` envelope every endpoint returns
//! - `User`, `LoginRequest`, `LoginResponse`: Authentication payloads
//! - `HomeData`, `Stay`: Home dashboard content

pub mod auth;
pub mod envelope;
pub mod home;

pub use auth::{LoginRequest, LoginResponse, OtpRequest, User, VerifyOtpRequest};
pub use envelope::ApiResponse;
pub use home::{HomeData, HomeStats, Stay, StayStatus};
