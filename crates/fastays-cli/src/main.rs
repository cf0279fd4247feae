//! Fastays CLI - a terminal driver for the Fastays sign-in flow.
//!
//! Walks splash → login → OTP verification → home against the mock
//! backend (or the real API with `--remote`), using the same controllers a
//! mobile shell would. `--email` signs in with email and password instead
//! of a phone code; `--logout` clears the stored session and exits.

mod app;
mod prompt;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fastays_core::auth::{self, SessionStore};
use fastays_core::services::{AuthService, HomeService, MockBackend, OtpService, RemoteBackend};
use fastays_core::{ApiClient, Config, QueryClient};

use app::App;

/// Log file name inside the cache directory
const LOG_FILE: &str = "fastays.log";

/// Initialize the tracing subscriber for logging.
/// Returns the guard that flushes the log file on drop.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config
        .cache_dir()
        .and_then(|dir| std::fs::create_dir_all(&dir).map(|_| dir).map_err(Into::into));

    let (file_layer, guard) = match log_dir {
        Ok(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let use_remote = args.iter().any(|a| a == "--remote");
    let logout_only = args.iter().any(|a| a == "--logout");
    let email_login = args.iter().any(|a| a == "--email");

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    });

    let _guard = init_tracing(&config);
    info!(storage = ?config.storage, remote = use_remote, "Fastays CLI starting");

    let session = SessionStore::new(auth::open_store(&config)?);
    let api = ApiClient::new(&config, session.clone())?;
    let remote = Arc::new(RemoteBackend::new(api));

    let mock = Arc::new(MockBackend::new());
    let otp: Arc<dyn OtpService> = if use_remote { remote.clone() } else { mock.clone() };
    let auth_service: Arc<dyn AuthService> = if use_remote { remote.clone() } else { mock.clone() };
    let home: Arc<dyn HomeService> = if use_remote { remote } else { mock };

    if logout_only {
        auth::sign_out(auth_service.as_ref(), &session).await?;
        println!("Signed out.");
        return Ok(());
    }

    let query = QueryClient::new(config.query);
    let mut app =
        App::new(config, session, otp, auth_service, home, query).with_email_login(email_login);
    let result = app.run().await;

    if let Err(ref e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Fastays CLI shutting down");
    result
}
