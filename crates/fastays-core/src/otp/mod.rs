//! One-time code entry.
//!
//! `OtpController` drives the four-box code input: digit validation, focus
//! advancement, auto-submit on the last digit, and the countdown-gated
//! resend action.

pub mod controller;

pub use controller::{
    DigitOutcome, OtpController, OtpEvent, ResendDispatch, VerifyDispatch, OTP_LENGTH,
    RESEND_COUNTDOWN_SECS,
};

/// Focus control for one input box, owned by the host UI.
pub trait FocusHandle {
    fn focus(&self);
}

/// Handle for hosts that track focus through `OtpController::focused_slot` alone.
pub struct NoFocus;

impl FocusHandle for NoFocus {
    fn focus(&self) {}
}
