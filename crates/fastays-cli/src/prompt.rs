//! Blocking terminal prompts, run off the async runtime.

use std::io::{self, Write};

use anyhow::{Context, Result};

/// Print `label` and read one trimmed line from stdin
pub async fn line(label: &str) -> Result<String> {
    let label = label.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        print!("{}", label);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .context("Failed to read from stdin")?;
        Ok(input.trim().to_string())
    })
    .await?
}

/// Like `line`, but the typed text is not echoed
pub async fn hidden(label: &str) -> Result<String> {
    let label = label.to_string();
    tokio::task::spawn_blocking(move || -> Result<String> {
        let input = rpassword::prompt_password(label).context("Failed to read code")?;
        Ok(input.trim().to_string())
    })
    .await?
}
