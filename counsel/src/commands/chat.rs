use anyhow::{Context, Result};
use console::style;
use counsel_core::{
    legal::{ask_about_document, DocumentStats},
    Gateway,
};
use dialoguer::{theme::ColorfulTheme, Input};
use tracing::error;

use super::{read_document, Output};
use crate::cli::ChatArgs;

pub async fn handle_chat(args: ChatArgs, gateway: &Gateway, out: &Output) -> Result<()> {
    let document = read_document(&args.document).await?;
    let stats = DocumentStats::of(&document);
    out.progress(&format!(
        "Loaded {} ({} words, {} lines). Using the {} provider.",
        args.document.display(),
        stats.word_count,
        stats.line_count,
        gateway.current_provider()
    ));

    if let Some(question) = args.question {
        return answer(gateway, &document, &question, out).await;
    }

    loop {
        let input = prompt().await?;
        let question = input.trim();
        if question == "exit" {
            break;
        }
        if question.is_empty() {
            continue;
        }
        // A failed question should not end the session.
        if let Err(e) = answer(gateway, &document, question, out).await {
            error!(error = %e, "Question failed");
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
        }
    }

    Ok(())
}

async fn answer(gateway: &Gateway, document: &str, question: &str, out: &Output) -> Result<()> {
    let generation = ask_about_document(gateway, document, question).await?;
    out.outcome(generation.provider, generation.outcome);
    println!();
    out.wrapped(&generation.text);
    println!();
    Ok(())
}

async fn prompt() -> Result<String> {
    let result = tokio::task::spawn_blocking(|| {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Ask about the document ('exit' to quit)")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read question")
    })
    .await;

    result.context("Blocking task failed (panic)")?
}
