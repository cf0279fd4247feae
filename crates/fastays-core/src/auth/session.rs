use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::{LoginResponse, User};

use super::{KeyValueStore, MemoryStore};

pub const AUTH_TOKEN_KEY: &str = "@fastays_auth_token";
pub const REFRESH_TOKEN_KEY: &str = "@fastays_refresh_token";
pub const USER_DATA_KEY: &str = "@fastays_user_data";
/// Phone number awaiting OTP verification
pub const PHONE_NUMBER_KEY: &str = "@fastays_phone_number";

/// Keys that make up the credential record; removed together on logout.
pub const CREDENTIAL_KEYS: [&str; 3] = [AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY];

/// The credential record, persisted in a `KeyValueStore`.
///
/// Written on successful login or OTP verification, read on every outbound
/// request, deleted on logout. An authorization failure deletes only the
/// bearer token.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Persist tokens and the user record from a successful sign-in
    pub async fn save(&self, login: &LoginResponse) -> Result<()> {
        let user = serde_json::to_string(&login.user).context("Failed to serialize user")?;
        self.store.set(AUTH_TOKEN_KEY, &login.token).await?;
        self.store.set(REFRESH_TOKEN_KEY, &login.refresh_token).await?;
        self.store.set(USER_DATA_KEY, &user).await?;
        debug!(user_id = %login.user.id, "Session saved");
        Ok(())
    }

    pub async fn token(&self) -> Result<Option<String>> {
        self.store.get(AUTH_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        self.store.get(REFRESH_TOKEN_KEY).await
    }

    /// Drop the bearer token after the server rejected it
    pub async fn invalidate_token(&self) -> Result<()> {
        self.store.remove(AUTH_TOKEN_KEY).await?;
        debug!("Auth token invalidated");
        Ok(())
    }

    /// Remove the whole credential record
    pub async fn clear(&self) -> Result<()> {
        self.store.remove_many(&CREDENTIAL_KEYS).await?;
        debug!("Session cleared");
        Ok(())
    }

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.token().await?.is_some())
    }

    pub async fn current_user(&self) -> Result<Option<User>> {
        match self.store.get(USER_DATA_KEY).await? {
            Some(json) => {
                let user = serde_json::from_str(&json).context("Failed to parse stored user")?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    // ===== Pending phone number =====

    pub async fn set_pending_phone(&self, phone_number: &str) -> Result<()> {
        self.store.set(PHONE_NUMBER_KEY, phone_number).await
    }

    pub async fn pending_phone(&self) -> Result<Option<String>> {
        self.store.get(PHONE_NUMBER_KEY).await
    }

    pub async fn clear_pending_phone(&self) -> Result<()> {
        self.store.remove(PHONE_NUMBER_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_response() -> LoginResponse {
        LoginResponse {
            user: User {
                id: "1".to_string(),
                email: "demo@fastays.com".to_string(),
                name: "Demo User".to_string(),
                avatar: None,
                created_at: "2024-11-01T10:00:00Z".to_string(),
                phone_number: Some("5551234567".to_string()),
            },
            token: "token".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let session = SessionStore::in_memory();
        assert!(!session.is_authenticated().await.unwrap());
        assert_eq!(session.current_user().await.unwrap(), None);

        session.save(&login_response()).await.unwrap();

        assert!(session.is_authenticated().await.unwrap());
        assert_eq!(session.token().await.unwrap().as_deref(), Some("token"));
        assert_eq!(session.refresh_token().await.unwrap().as_deref(), Some("refresh"));
        let user = session.current_user().await.unwrap().expect("user should be stored");
        assert_eq!(user.name, "Demo User");
    }

    #[tokio::test]
    async fn test_invalidate_keeps_refresh_token_and_user() {
        let session = SessionStore::in_memory();
        session.save(&login_response()).await.unwrap();

        session.invalidate_token().await.unwrap();

        assert!(!session.is_authenticated().await.unwrap());
        assert!(session.refresh_token().await.unwrap().is_some());
        assert!(session.current_user().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_removes_credentials_but_not_pending_phone() {
        let session = SessionStore::in_memory();
        session.save(&login_response()).await.unwrap();
        session.set_pending_phone("5551234567").await.unwrap();

        session.clear().await.unwrap();

        assert_eq!(session.token().await.unwrap(), None);
        assert_eq!(session.refresh_token().await.unwrap(), None);
        assert_eq!(session.current_user().await.unwrap(), None);
        assert_eq!(session.pending_phone().await.unwrap().as_deref(), Some("5551234567"));
    }
}
