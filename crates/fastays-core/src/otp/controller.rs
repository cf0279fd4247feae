//! OTP entry state machine.
//!
//! The controller owns the four digit slots, the resend countdown and the two
//! in-flight flags. Verification, resend and the countdown timer run as
//! background tasks and report back through a channel; the owner applies
//! their results with `check_background_tasks` (non-blocking, once per frame)
//! or `next_event` (await one result).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

use crate::api::ApiError;
use crate::auth::SessionStore;
use crate::models::{ApiResponse, LoginResponse};
use crate::navigation::{Navigator, Screen};
use crate::notice::Notice;
use crate::services::OtpService;

use super::{FocusHandle, NoFocus};

// ============================================================================
// Constants
// ============================================================================

/// Number of digit slots.
pub const OTP_LENGTH: usize = 4;

/// Seconds before the resend action unlocks.
pub const RESEND_COUNTDOWN_SECS: u32 = 30;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

// ============================================================================
// Background Task Messages
// ============================================================================

enum OtpMessage {
    /// One countdown second elapsed, tagged with the timer generation
    Tick(u64),
    Verified(Result<ApiResponse<LoginResponse>, ApiError>),
    Resent(Result<ApiResponse<serde_json::Value>, ApiError>),
}

/// What applying a background result did to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpEvent {
    Tick { remaining: u32 },
    Verified,
    VerificationFailed,
    Resent,
    ResendFailed,
}

/// Result of feeding one keystroke into a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitOutcome {
    /// Non-numeric, multi-character or out-of-range input; nothing changed
    Rejected,
    Updated,
    /// Digit stored and focus moved to the next slot
    Advanced,
    /// Last slot filled and verification dispatched
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyDispatch {
    Started,
    /// Code was not 4 characters; a validation notice was raised
    Invalid,
    AlreadyPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendDispatch {
    Started,
    CountingDown,
    AlreadyPending,
}

async fn send_result(tx: &mpsc::Sender<OtpMessage>, message: OtpMessage) {
    if tx.send(message).await.is_err() {
        debug!("OTP controller gone, dropping background result");
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct OtpController<N: Navigator> {
    phone_number: String,
    digits: [Option<char>; OTP_LENGTH],
    countdown: u32,
    submitting: bool,
    resending: bool,
    focused_slot: usize,
    notice: Option<Notice>,

    service: Arc<dyn OtpService>,
    session: SessionStore,
    navigator: N,
    focus_handles: [Box<dyn FocusHandle>; OTP_LENGTH],

    tx: mpsc::Sender<OtpMessage>,
    rx: mpsc::Receiver<OtpMessage>,
    timer: Option<JoinHandle<()>>,
    timer_generation: u64,
    verify_task: Option<JoinHandle<()>>,
    resend_task: Option<JoinHandle<()>>,
}

impl<N: Navigator> OtpController<N> {
    /// Mount the controller for `phone_number` and start the resend countdown.
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        phone_number: impl Into<String>,
        service: Arc<dyn OtpService>,
        session: SessionStore,
        navigator: N,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let mut controller = Self {
            phone_number: phone_number.into(),
            digits: [None; OTP_LENGTH],
            countdown: RESEND_COUNTDOWN_SECS,
            submitting: false,
            resending: false,
            focused_slot: 0,
            notice: None,
            service,
            session,
            navigator,
            focus_handles: std::array::from_fn(|_| Box::new(NoFocus) as Box<dyn FocusHandle>),
            tx,
            rx,
            timer: None,
            timer_generation: 0,
            verify_task: None,
            resend_task: None,
        };
        controller.restart_timer();
        debug!(phone_number = %controller.phone_number, "OTP controller mounted");
        controller
    }

    /// Attach the per-slot focus handles of the host's input boxes
    pub fn with_focus_handles(mut self, handles: [Box<dyn FocusHandle>; OTP_LENGTH]) -> Self {
        self.focus_handles = handles;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn digits(&self) -> &[Option<char>; OTP_LENGTH] {
        &self.digits
    }

    /// Current slots joined, skipping empty ones
    pub fn code(&self) -> String {
        self.digits.iter().flatten().collect()
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_resending(&self) -> bool {
        self.resending
    }

    pub fn focused_slot(&self) -> usize {
        self.focused_slot
    }

    /// The verify button is enabled once every slot holds a digit
    pub fn can_verify(&self) -> bool {
        !self.submitting && self.digits.iter().all(Option::is_some)
    }

    pub fn can_resend(&self) -> bool {
        self.countdown == 0 && !self.resending
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

    // =========================================================================
    // Input
    // =========================================================================

    /// Handle the text of slot `slot` changing to `value` (empty or one digit).
    pub fn on_digit_change(&mut self, value: &str, slot: usize) -> DigitOutcome {
        if slot >= OTP_LENGTH {
            return DigitOutcome::Rejected;
        }

        let mut chars = value.chars();
        let digit = match (chars.next(), chars.next()) {
            (None, _) => None,
            (Some(c), None) if c.is_ascii_digit() => Some(c),
            _ => return DigitOutcome::Rejected,
        };

        self.digits[slot] = digit;
        if digit.is_none() {
            return DigitOutcome::Updated;
        }

        if slot < OTP_LENGTH - 1 {
            self.focus_slot(slot + 1);
            return DigitOutcome::Advanced;
        }

        // Compose from the slots just written rather than re-reading later,
        // so the submitted code is exactly what completed the fill.
        let composed: Option<String> = self.digits.iter().copied().collect();
        if let Some(code) = composed {
            if self.verify(Some(&code)) == VerifyDispatch::Started {
                return DigitOutcome::Submitted;
            }
        }
        DigitOutcome::Updated
    }

    /// Submit `explicit_code`, or the current slots when `None`.
    pub fn verify(&mut self, explicit_code: Option<&str>) -> VerifyDispatch {
        if self.submitting {
            debug!("Verification already in flight, ignoring");
            return VerifyDispatch::AlreadyPending;
        }

        let code = match explicit_code {
            Some(code) => code.to_string(),
            None => self.code(),
        };
        if code.chars().count() != OTP_LENGTH {
            self.notice = Some(Notice::validation("Please enter the complete 4-digit OTP"));
            return VerifyDispatch::Invalid;
        }

        self.submitting = true;
        let service = Arc::clone(&self.service);
        let phone_number = self.phone_number.clone();
        let tx = self.tx.clone();
        self.verify_task = Some(tokio::spawn(async move {
            let result = service.verify_code(&phone_number, &code).await;
            send_result(&tx, OtpMessage::Verified(result)).await;
        }));
        debug!("Verification dispatched");
        VerifyDispatch::Started
    }

    /// Ask for a new code. Only allowed once the countdown has run out.
    pub fn resend(&mut self) -> ResendDispatch {
        if self.countdown > 0 {
            return ResendDispatch::CountingDown;
        }
        if self.resending {
            return ResendDispatch::AlreadyPending;
        }

        self.resending = true;
        let service = Arc::clone(&self.service);
        let phone_number = self.phone_number.clone();
        let tx = self.tx.clone();
        self.resend_task = Some(tokio::spawn(async move {
            let result = service.send_code(&phone_number).await;
            send_result(&tx, OtpMessage::Resent(result)).await;
        }));
        debug!("Resend dispatched");
        ResendDispatch::Started
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Apply every result that has already arrived, without waiting
    pub async fn check_background_tasks(&mut self) -> Vec<OtpEvent> {
        let mut events = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            if let Some(event) = self.apply(message).await {
                events.push(event);
            }
        }
        events
    }

    /// Wait for the next background result and apply it
    pub async fn next_event(&mut self) -> OtpEvent {
        loop {
            // tx is held by self, so recv never yields None here
            if let Some(message) = self.rx.recv().await {
                if let Some(event) = self.apply(message).await {
                    return event;
                }
            }
        }
    }

    async fn apply(&mut self, message: OtpMessage) -> Option<OtpEvent> {
        match message {
            OtpMessage::Tick(generation) => {
                if generation != self.timer_generation || self.countdown == 0 {
                    return None;
                }
                self.countdown -= 1;
                if self.countdown == 0 {
                    self.stop_timer();
                }
                Some(OtpEvent::Tick {
                    remaining: self.countdown,
                })
            }
            OtpMessage::Verified(result) => {
                self.submitting = false;
                self.verify_task = None;
                Some(self.apply_verification(result).await)
            }
            OtpMessage::Resent(result) => {
                self.resending = false;
                self.resend_task = None;
                Some(self.apply_resend(result))
            }
        }
    }

    async fn apply_verification(
        &mut self,
        result: Result<ApiResponse<LoginResponse>, ApiError>,
    ) -> OtpEvent {
        let message = match result {
            Ok(response) if response.success => {
                if let Err(e) = self.session.save(&response.data).await {
                    warn!(error = %e, "Failed to save session");
                }
                if let Err(e) = self.session.clear_pending_phone().await {
                    warn!(error = %e, "Failed to clear stored phone number");
                }
                info!("OTP verified");
                self.notice = Some(Notice::success("Login successful!"));
                self.stop_timer();
                self.navigator.replace(Screen::Home);
                return OtpEvent::Verified;
            }
            Ok(response) => response.message_or("Verification failed"),
            Err(e) => e.to_string(),
        };

        error!(%message, "OTP verification failed");
        self.notice = Some(Notice::error(message));
        self.reset_slots();
        OtpEvent::VerificationFailed
    }

    fn apply_resend(&mut self, result: Result<ApiResponse<serde_json::Value>, ApiError>) -> OtpEvent {
        let message = match result {
            Ok(response) if response.success => {
                info!("OTP resent");
                self.notice = Some(Notice::success("OTP resent successfully!"));
                self.countdown = RESEND_COUNTDOWN_SECS;
                self.restart_timer();
                self.reset_slots();
                return OtpEvent::Resent;
            }
            Ok(response) => response.message_or("Failed to resend OTP"),
            Err(e) => e.to_string(),
        };

        error!(%message, "OTP resend failed");
        self.notice = Some(Notice::error(message));
        OtpEvent::ResendFailed
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn focus_slot(&mut self, slot: usize) {
        self.focused_slot = slot;
        self.focus_handles[slot].focus();
    }

    fn reset_slots(&mut self) {
        self.digits = [None; OTP_LENGTH];
        self.focus_slot(0);
    }

    fn restart_timer(&mut self) {
        self.stop_timer();
        self.timer_generation += 1;
        let generation = self.timer_generation;
        let tx = self.tx.clone();
        self.timer = Some(tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            loop {
                ticks.tick().await;
                if tx.send(OtpMessage::Tick(generation)).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl<N: Navigator> Drop for OtpController<N> {
    fn drop(&mut self) {
        self.stop_timer();
        for task in [self.verify_task.take(), self.resend_task.take()].into_iter().flatten() {
            task.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
