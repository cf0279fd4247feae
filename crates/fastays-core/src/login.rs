//! Phone-number entry: validation, sending the code, moving on to verification.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{error, info, warn};

use crate::auth::SessionStore;
use crate::navigation::{Navigator, Screen};
use crate::notice::Notice;
use crate::services::OtpService;

/// Mobile numbers are exactly this many digits.
pub const PHONE_NUMBER_LENGTH: usize = 10;

/// Check a phone number, returning the message to show when it is unusable.
pub fn validate_phone_number(phone_number: &str) -> Result<(), &'static str> {
    if phone_number.chars().count() != PHONE_NUMBER_LENGTH {
        return Err("Please enter a valid 10-digit mobile number");
    }
    if !phone_number.chars().all(|c| c.is_ascii_digit()) {
        return Err("Mobile number should contain only digits");
    }
    Ok(())
}

pub struct LoginController<N: Navigator> {
    phone_number: String,
    notice: Option<Notice>,
    service: Arc<dyn OtpService>,
    session: SessionStore,
    navigator: N,
}

impl<N: Navigator> LoginController<N> {
    pub fn new(service: Arc<dyn OtpService>, session: SessionStore, navigator: N) -> Self {
        Self {
            phone_number: String::new(),
            notice: None,
            service,
            session,
            navigator,
        }
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// Replace the input text. Length is checked by `send_code`, not here.
    pub fn set_phone_number(&mut self, text: &str) {
        self.phone_number = text.trim().to_string();
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    /// Validate the number and ask the backend to send a code to it.
    /// On success the number is remembered and the OTP screen is pushed.
    pub async fn send_code(&mut self) -> Result<()> {
        let phone_number = self.phone_number.clone();
        if let Err(message) = validate_phone_number(&phone_number) {
            self.notice = Some(Notice::validation(message));
            return Err(anyhow!(message));
        }

        self.notice = None;
        let result = self.service.send_code(&phone_number).await;

        match result {
            Ok(response) if response.success => {
                if let Err(e) = self.session.set_pending_phone(&phone_number).await {
                    warn!(error = %e, "Failed to store phone number");
                }
                info!("OTP sent");
                self.notice = Some(Notice::success("OTP sent successfully!"));
                self.navigator.navigate(Screen::OtpVerification { phone_number });
                Ok(())
            }
            Ok(response) => {
                let message = response.message_or("Failed to send OTP");
                warn!(%message, "Send code refused");
                self.notice = Some(Notice::error(message.clone()));
                Err(anyhow!(message))
            }
            Err(e) => {
                error!(error = %e, "Send code failed");
                self.notice = Some(Notice::error(e.to_string()));
                Err(e.into())
            }
        }
    }
}
