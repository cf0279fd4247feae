//! Fastays client core.
//!
//! Credential storage, the authenticated API client, and the controllers
//! behind the sign-in flow (phone number entry and OTP verification). UI
//! shells drive the controllers and render their state.

pub mod api;
pub mod auth;
pub mod config;
pub mod login;
pub mod models;
pub mod navigation;
pub mod notice;
pub mod otp;
pub mod query;
pub mod services;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError};
pub use auth::{KeyValueStore, SessionStore};
pub use config::Config;
pub use login::LoginController;
pub use navigation::{NavigationStack, Navigator, Screen};
pub use notice::{Notice, NoticeKind};
pub use otp::OtpController;
pub use query::{QueryClient, QueryConfig};
