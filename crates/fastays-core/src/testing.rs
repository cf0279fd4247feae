//! Test doubles shared across module tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{ApiError, HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::models::{ApiResponse, LoginResponse};
use crate::otp::FocusHandle;
use crate::services::{MockBackend, OtpService};

// =============================================================================
// Fake Transport
// =============================================================================

/// Transport that records every request and replays scripted responses.
/// Unscripted requests get `200 {}`.
#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<Vec<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn respond(self, status: StatusCode, body: &str) -> Self {
        self.responses.lock().unwrap().push(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(HttpResponse {
                status: StatusCode::OK,
                body: "{}".to_string(),
            })
        } else {
            responses.remove(0)
        }
    }
}

// =============================================================================
// Recording OTP Service
// =============================================================================

/// Wraps the mock backend and records every call made through it.
#[derive(Default)]
pub struct RecordingOtpService {
    backend: MockBackend,
    send_error: Option<ApiError>,
    send_calls: Mutex<Vec<String>>,
    verify_calls: Mutex<Vec<String>>,
    verify_completions: AtomicUsize,
}

impl RecordingOtpService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `send_code` fail with `error`
    pub fn failing_sends(error: ApiError) -> Self {
        Self {
            send_error: Some(error),
            ..Self::default()
        }
    }

    pub fn send_calls(&self) -> Vec<String> {
        self.send_calls.lock().unwrap().clone()
    }

    /// Codes passed to `verify_code`, in call order
    pub fn verify_calls(&self) -> Vec<String> {
        self.verify_calls.lock().unwrap().clone()
    }

    /// How many `verify_code` calls ran to the end
    pub fn verify_completions(&self) -> usize {
        self.verify_completions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OtpService for RecordingOtpService {
    async fn send_code(&self, phone_number: &str) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        self.send_calls.lock().unwrap().push(phone_number.to_string());
        if let Some(ref error) = self.send_error {
            return Err(error.clone());
        }
        self.backend.send_code(phone_number).await
    }

    async fn verify_code(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<ApiResponse<LoginResponse>, ApiError> {
        self.verify_calls.lock().unwrap().push(code.to_string());
        let result = self.backend.verify_code(phone_number, code).await;
        self.verify_completions.fetch_add(1, Ordering::SeqCst);
        result
    }
}

// =============================================================================
// Recording Focus Handle
// =============================================================================

/// Focus handle that logs its slot index into a shared list when focused.
pub struct RecordingFocus {
    slot: usize,
    log: Rc<RefCell<Vec<usize>>>,
}

impl RecordingFocus {
    pub fn handles(log: &Rc<RefCell<Vec<usize>>>) -> [Box<dyn FocusHandle>; 4] {
        std::array::from_fn(|slot| {
            Box::new(RecordingFocus {
                slot,
                log: Rc::clone(log),
            }) as Box<dyn FocusHandle>
        })
    }
}

impl FocusHandle for RecordingFocus {
    fn focus(&self) {
        self.log.borrow_mut().push(self.slot);
    }
}
