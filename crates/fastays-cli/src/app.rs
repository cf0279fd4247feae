//! Screen loop for the CLI.
//!
//! Each screen is a method that drives the matching controller, prints its
//! notices, and returns the screen to show next.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use fastays_core::api::ApiError;
use fastays_core::auth::{self, SessionStore};
use fastays_core::models::HomeData;
use fastays_core::otp::{DigitOutcome, OtpEvent, ResendDispatch, VerifyDispatch, OTP_LENGTH};
use fastays_core::query::age_display;
use fastays_core::services::{AuthService, HomeService, OtpService};
use fastays_core::{
    Config, LoginController, NavigationStack, Navigator, Notice, NoticeKind, OtpController,
    QueryClient, Screen,
};

use crate::prompt;

/// How long the splash screen stays up before the auth check resolves.
const SPLASH_DELAY_MS: u64 = 2000;

/// Query key for the home dashboard.
const HOME_QUERY_KEY: &str = "homeData";

pub struct App {
    config: Config,
    session: SessionStore,
    otp: Arc<dyn OtpService>,
    auth: Arc<dyn AuthService>,
    home: Arc<dyn HomeService>,
    query: QueryClient,
    screen: Screen,
    email_login: bool,
}

impl App {
    pub fn new(
        config: Config,
        session: SessionStore,
        otp: Arc<dyn OtpService>,
        auth: Arc<dyn AuthService>,
        home: Arc<dyn HomeService>,
        query: QueryClient,
    ) -> Self {
        Self {
            config,
            session,
            otp,
            auth,
            home,
            query,
            screen: Screen::Splash,
            email_login: false,
        }
    }

    /// Sign in with email and password instead of a phone code
    pub fn with_email_login(mut self, enabled: bool) -> Self {
        self.email_login = enabled;
        self
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            debug!(screen = %self.screen, "Showing screen");
            let next = match self.screen.clone() {
                Screen::Splash => self.splash().await,
                Screen::Login if self.email_login => self.login_with_email().await?,
                Screen::Login => self.login().await?,
                Screen::OtpVerification { phone_number } => self.verify(phone_number).await?,
                Screen::Home => match self.home().await? {
                    Some(next) => next,
                    None => return Ok(()),
                },
            };
            self.screen = next;
        }
    }

    // =========================================================================
    // Screens
    // =========================================================================

    async fn splash(&self) -> Screen {
        println!("\n=== Fastays ===\n");
        tokio::time::sleep(Duration::from_millis(SPLASH_DELAY_MS)).await;

        if auth::check_auth(&self.session).await {
            Screen::Home
        } else {
            Screen::Login
        }
    }

    async fn login(&mut self) -> Result<Screen> {
        let mut controller = LoginController::new(
            Arc::clone(&self.otp),
            self.session.clone(),
            NavigationStack::new(Screen::Login),
        );

        // A number from a sign-in that never reached verification wins
        let pending = match self.session.pending_phone().await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "Failed to read stored phone number");
                None
            }
        };
        let default_number = pending.or_else(|| self.config.last_phone_number.clone());

        loop {
            let input = match default_number {
                Some(ref last) => {
                    let input = prompt::line(&format!("Mobile number [{}]: ", last)).await?;
                    if input.is_empty() {
                        last.clone()
                    } else {
                        input
                    }
                }
                None => prompt::line("Mobile number: ").await?,
            };
            controller.set_phone_number(&input);

            println!("Sending code...");
            let sent = controller.send_code().await.is_ok();
            if let Some(notice) = controller.take_notice() {
                print_notice(&notice);
            }
            if !sent {
                continue;
            }

            self.config.last_phone_number = Some(controller.phone_number().to_string());
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
            return Ok(controller.navigator().current().clone());
        }
    }

    async fn login_with_email(&mut self) -> Result<Screen> {
        loop {
            let email = prompt::line("Email: ").await?;
            let password = prompt::hidden("Password: ").await?;

            println!("Signing in...");
            match auth::sign_in(self.auth.as_ref(), &self.session, &email, &password).await {
                Ok(user) => {
                    print_notice(&Notice::success(format!("Welcome, {}!", user.display_name())));
                    return Ok(Screen::Home);
                }
                Err(e) => print_notice(&Notice::error(e.to_string())),
            }
        }
    }

    async fn verify(&mut self, phone_number: String) -> Result<Screen> {
        let mut nav = NavigationStack::new(Screen::Login);
        nav.navigate(Screen::OtpVerification {
            phone_number: phone_number.clone(),
        });
        let mut controller = OtpController::mount(
            phone_number.as_str(),
            Arc::clone(&self.otp),
            self.session.clone(),
            nav,
        );

        println!("Enter the 4-digit code sent to {}", phone_number);
        loop {
            controller.check_background_tasks().await;
            if controller.can_resend() {
                println!("Didn't get it? Type 'r' to resend, 'b' to change the number.");
            } else {
                println!(
                    "Resend available in {}s. Type 'b' to change the number.",
                    controller.countdown()
                );
            }

            let input = prompt::hidden("Code: ").await?;
            // Ticks that piled up while we were blocked on input
            controller.check_background_tasks().await;

            match input.as_str() {
                "b" => {
                    controller.navigator_mut().go_back();
                    return Ok(controller.navigator().current().clone());
                }
                "r" => {
                    match controller.resend() {
                        ResendDispatch::Started => {
                            println!("Resending...");
                            wait_for(&mut controller, |e| {
                                matches!(e, OtpEvent::Resent | OtpEvent::ResendFailed)
                            })
                            .await;
                        }
                        ResendDispatch::CountingDown => {
                            println!("Please wait {}s before resending.", controller.countdown());
                        }
                        ResendDispatch::AlreadyPending => {}
                    }
                }
                code => {
                    if enter_code(&mut controller, code) {
                        println!("Verifying...");
                        let event = wait_for(&mut controller, |e| {
                            matches!(e, OtpEvent::Verified | OtpEvent::VerificationFailed)
                        })
                        .await;
                        if event == OtpEvent::Verified {
                            if let Some(notice) = controller.take_notice() {
                                print_notice(&notice);
                            }
                            return Ok(controller.navigator().current().clone());
                        }
                    }
                }
            }

            if let Some(notice) = controller.take_notice() {
                print_notice(&notice);
            }
        }
    }

    /// Show the dashboard. Returns `None` when the user quits.
    async fn home(&mut self) -> Result<Option<Screen>> {
        loop {
            match self.session.current_user().await {
                Ok(Some(user)) => println!("\nHello, {}!", user.display_name()),
                Ok(None) => println!("\nHello!"),
                Err(e) => warn!(error = %e, "Failed to load stored user"),
            }

            let home = Arc::clone(&self.home);
            let result = self
                .query
                .fetch(HOME_QUERY_KEY, || {
                    let home = Arc::clone(&home);
                    async move { home.home_data().await.map(|resp| resp.data) }
                })
                .await;

            match result {
                Ok(data) => {
                    let updated = self.query.cached_at(HOME_QUERY_KEY).await.map(age_display);
                    print_home(&data, updated.as_deref());
                }
                Err(ApiError::Unauthorized(message)) => {
                    print_notice(&Notice::error(message));
                    self.query.clear().await;
                    return Ok(Some(Screen::Login));
                }
                Err(e) => print_notice(&Notice::error(e.to_string())),
            }

            let input = prompt::line("\n[r]efresh, [l]ogout, [q]uit: ").await?;
            match input.as_str() {
                "r" => self.query.invalidate(HOME_QUERY_KEY).await,
                "l" => {
                    auth::sign_out(self.auth.as_ref(), &self.session).await?;
                    self.query.clear().await;
                    return Ok(Some(Screen::Login));
                }
                "q" => return Ok(None),
                _ => {}
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Feed a typed code into the slots one character at a time, the way the
/// input boxes would. Returns true once a verification is in flight.
fn enter_code(controller: &mut OtpController<NavigationStack>, code: &str) -> bool {
    for slot in 0..OTP_LENGTH {
        controller.on_digit_change("", slot);
    }

    for (slot, c) in code.chars().take(OTP_LENGTH).enumerate() {
        match controller.on_digit_change(&c.to_string(), slot) {
            DigitOutcome::Submitted => return true,
            DigitOutcome::Rejected => {
                print_notice(&Notice::validation("The code can only contain digits"));
                return false;
            }
            DigitOutcome::Advanced | DigitOutcome::Updated => {}
        }
    }

    // Fewer than four digits: let the controller raise its validation notice
    controller.verify(None) == VerifyDispatch::Started
}

async fn wait_for<F>(controller: &mut OtpController<NavigationStack>, done: F) -> OtpEvent
where
    F: Fn(&OtpEvent) -> bool,
{
    loop {
        let event = controller.next_event().await;
        if done(&event) {
            return event;
        }
    }
}

fn print_notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Success => println!("✓ {}", notice.message),
        NoticeKind::Validation | NoticeKind::Error => {
            eprintln!("✗ {}: {}", notice.title, notice.message)
        }
    }
}

fn print_home(data: &HomeData, updated: Option<&str>) {
    println!("{}", data.welcome_message);
    if let Some(updated) = updated {
        println!("(updated {})", updated);
    }
    println!(
        "\nBookings: {}   Active: {}   Completed: {}",
        data.stats.total_bookings, data.stats.active_stays, data.stats.completed_stays
    );

    if data.recent_stays.is_empty() {
        println!("\nNo recent stays.");
        return;
    }

    println!("\nRecent stays:");
    for stay in &data.recent_stays {
        println!(
            "  {:<28} {:<22} {:<25} {:>12}  {}",
            stay.title,
            stay.location,
            stay.date_range(),
            stay.price_display(),
            stay.status.label()
        );
    }
}
