use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Counsel: chat about legal documents, draft NDAs and review clauses with local or hosted
/// language models.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Provider to start with: `local` (Ollama) or `hosted` (OpenAI).
    #[arg(long, global = true, env = "COUNSEL_AI_PROVIDER", default_value = "local")]
    pub provider: String,

    #[command(flatten)]
    pub backends: BackendArgs,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Connection settings for both backends.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Base URL of the local Ollama server.
    #[arg(long, global = true, env = "OLLAMA_BASE_URL")]
    pub ollama_url: Option<String>,

    /// Model served by Ollama.
    #[arg(long, global = true, env = "OLLAMA_MODEL")]
    pub ollama_model: Option<String>,

    /// OpenAI API key. Without it there is no hosted provider and no fallback.
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    pub openai_url: Option<String>,

    /// Model used for hosted requests.
    #[arg(long, global = true, env = "OPENAI_MODEL")]
    pub openai_model: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check connectivity of the active provider.
    Status,
    /// Switch the active provider and check the new one.
    Switch(SwitchArgs),
    /// Ask questions about a document.
    Chat(ChatArgs),
    /// Draft a non-disclosure agreement.
    Nda(NdaArgs),
    /// Review a document clause by clause.
    Redline(RedlineArgs),
}

#[derive(Args, Debug)]
pub struct SwitchArgs {
    /// `local` or `hosted` (`mistral`, `ollama` and `openai` are accepted too).
    pub provider: String,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Plain-text document to discuss.
    #[arg(long, short)]
    pub document: PathBuf,

    /// Question to ask. Starts an interactive session when omitted.
    pub question: Option<String>,
}

#[derive(Args, Debug)]
pub struct NdaArgs {
    /// JSON file with NDA parameters. Flags override its values.
    #[arg(long)]
    pub params: Option<PathBuf>,

    #[arg(long)]
    pub party_a: Option<String>,

    #[arg(long)]
    pub party_b: Option<String>,

    /// Optional third party.
    #[arg(long)]
    pub party_c: Option<String>,

    /// Business purpose of the disclosure.
    #[arg(long)]
    pub purpose: Option<String>,

    /// e.g. `two-way` or `one-way`.
    #[arg(long)]
    pub nda_type: Option<String>,

    /// Confidentiality period, e.g. `3 years`.
    #[arg(long)]
    pub period: Option<String>,

    #[arg(long)]
    pub jurisdiction: Option<String>,

    /// Prompt template with `{party_a}`-style placeholders.
    #[arg(long, env = "COUNSEL_NDA_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Print the draft and its parameters as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RedlineArgs {
    /// Plain-text document to review.
    #[arg(long, short)]
    pub document: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nda_flags() {
        let cli = Cli::try_parse_from([
            "counsel", "--provider", "hosted", "nda", "--party-a", "Acme", "--party-b", "Globex",
            "--purpose", "Merger", "--period", "3 years",
        ])
        .unwrap();
        assert_eq!(cli.provider, "hosted");
        match cli.command {
            Commands::Nda(args) => {
                assert_eq!(args.party_a.as_deref(), Some("Acme"));
                assert_eq!(args.period.as_deref(), Some("3 years"));
                assert!(!args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
