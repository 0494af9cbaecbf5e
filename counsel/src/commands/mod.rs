use std::path::Path;

use anyhow::{Context, Result};
use console::{style, Term};
use counsel_core::{gateway::ConnectionStatus, Gateway, Outcome, ProviderId};
use tracing::info;

use crate::cli::SwitchArgs;

mod chat;
mod nda;
mod redline;

pub use chat::handle_chat;
pub use nda::handle_nda;
pub use redline::handle_redline;

const DEFAULT_WIDTH: usize = 100;

/// Terminal output helpers. Results go to stdout, progress and notices to stderr.
#[derive(Debug, Clone)]
pub struct Output {
    quiet: bool,
    width: usize,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        let width = Term::stdout()
            .size_checked()
            .map_or(DEFAULT_WIDTH, |(_, cols)| cols as usize)
            .clamp(40, 120);
        Self { quiet, width }
    }

    pub fn wrapped(&self, text: &str) {
        println!("{}", textwrap::fill(text, self.width));
    }

    pub fn indented(&self, text: &str) {
        let options = textwrap::Options::new(self.width)
            .initial_indent("    ")
            .subsequent_indent("    ");
        println!("{}", textwrap::fill(text, options));
    }

    pub fn progress(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", style(message).dim());
        }
    }

    /// Tells the user when an answer did not come from the selected provider.
    pub fn outcome(&self, provider: ProviderId, outcome: Outcome) {
        if self.quiet {
            return;
        }
        match outcome {
            Outcome::Primary => {}
            Outcome::Fallback => eprintln!(
                "{}",
                style(format!(
                    "Local provider unavailable; answered by the {} provider.",
                    provider
                ))
                .yellow()
            ),
            Outcome::Degraded => eprintln!(
                "{}",
                style("The hosted provider failed; no answer was generated.").red()
            ),
        }
    }
}

pub(crate) async fn read_document(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document {}", path.display()))
}

fn print_status(status: &ConnectionStatus, out: &Output) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(status)?);
    if !status.is_connected() {
        out.progress(match status.provider {
            ProviderId::Local => "Is the Ollama server running? Check OLLAMA_BASE_URL.",
            ProviderId::Hosted => "Check OPENAI_API_KEY and OPENAI_BASE_URL.",
        });
    }
    Ok(())
}

pub async fn handle_status(gateway: &Gateway, out: &Output) -> Result<()> {
    out.progress(&format!("Checking {} provider...", gateway.current_provider()));
    let status = gateway.test_connection().await;
    print_status(&status, out)
}

pub async fn handle_switch(args: SwitchArgs, gateway: &Gateway, out: &Output) -> Result<()> {
    let message = gateway.switch_provider(&args.provider)?;
    info!(provider = %gateway.current_provider(), "Provider switched from the command line");
    println!("{}", style(message).green());

    if gateway.current_provider() == ProviderId::Hosted && !gateway.has_hosted_credential() {
        out.progress("No hosted credential is configured; requests will fail until OPENAI_API_KEY is set.");
    }
    let status = gateway.test_connection().await;
    print_status(&status, out)
}
