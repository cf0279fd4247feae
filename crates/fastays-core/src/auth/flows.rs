//! Session lifecycle around the auth service.

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::models::User;
use crate::services::AuthService;

use super::SessionStore;

/// Sign in with email and password, persisting the credential record on success.
pub async fn sign_in(
    service: &dyn AuthService,
    session: &SessionStore,
    email: &str,
    password: &str,
) -> Result<User> {
    if email.is_empty() || password.is_empty() {
        return Err(anyhow!("Email and password required"));
    }

    let response = service.login(email, password).await?;
    if !response.success {
        return Err(anyhow!(response.message_or("Login failed")));
    }

    session.save(&response.data).await?;
    info!(user_id = %response.data.user.id, "Login successful");
    Ok(response.data.user)
}

/// Tell the backend we are leaving, then drop the local credential record.
/// A failed logout call never keeps the user signed in locally.
pub async fn sign_out(service: &dyn AuthService, session: &SessionStore) -> Result<()> {
    if let Err(e) = service.logout().await {
        warn!(error = %e, "Logout request failed, clearing local session anyway");
    }
    session.clear().await?;
    info!("Logged out");
    Ok(())
}

/// Whether a bearer token is stored. Storage failures count as signed out.
pub async fn check_auth(session: &SessionStore) -> bool {
    match session.is_authenticated().await {
        Ok(authenticated) => authenticated,
        Err(e) => {
            warn!(error = %e, "Auth check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::{MockBackend, DEMO_EMAIL, DEMO_PASSWORD};

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_persists_session() {
        let backend = MockBackend::new();
        let session = SessionStore::in_memory();

        let user = sign_in(&backend, &session, DEMO_EMAIL, DEMO_PASSWORD)
            .await
            .expect("demo credentials should sign in");

        assert_eq!(user.email, DEMO_EMAIL);
        assert!(check_auth(&session).await);
        assert_eq!(session.current_user().await.unwrap(), Some(user));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sign_in_stores_nothing() {
        let backend = MockBackend::new();
        let session = SessionStore::in_memory();

        assert!(sign_in(&backend, &session, DEMO_EMAIL, "nope").await.is_err());
        assert!(sign_in(&backend, &session, "", "").await.is_err());
        assert!(!check_auth(&session).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_clears_all_credential_keys() {
        let backend = MockBackend::new();
        let session = SessionStore::in_memory();
        sign_in(&backend, &session, DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();

        sign_out(&backend, &session).await.unwrap();

        assert!(!check_auth(&session).await);
        assert_eq!(session.refresh_token().await.unwrap(), None);
        assert_eq!(session.current_user().await.unwrap(), None);
    }
}
