use anyhow::{Context, Result};
use console::style;
use counsel_core::{
    legal::{generate_nda, NdaParameters, NdaTemplate},
    Gateway,
};

use super::Output;
use crate::cli::NdaArgs;

pub async fn handle_nda(args: NdaArgs, gateway: &Gateway, out: &Output) -> Result<()> {
    let params = parameters(&args).await?;

    let template = match &args.template {
        Some(path) => NdaTemplate::from_file_or_default(path).await,
        None => NdaTemplate::default(),
    };

    out.progress(&format!(
        "Drafting {} NDA between {} and {}...",
        params.nda_type, params.party_a, params.party_b
    ));
    let draft = generate_nda(gateway, &template, params).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&draft)?);
        return Ok(());
    }

    out.outcome(draft.provider, draft.outcome);
    println!(
        "{}",
        style(format!(
            "{} NDA ({}, {})",
            draft.parameters.nda_type,
            draft.parameters.jurisdiction,
            draft.parameters.confidentiality_period
        ))
        .bold()
    );
    println!();
    out.wrapped(&draft.content);
    Ok(())
}

/// Flags override values read from `--params`.
async fn parameters(args: &NdaArgs) -> Result<NdaParameters> {
    let mut params = match &args.params {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read NDA parameters {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid NDA parameters in {}", path.display()))?
        }
        None => NdaParameters::default(),
    };

    if let Some(v) = &args.party_a {
        params.party_a = v.clone();
    }
    if let Some(v) = &args.party_b {
        params.party_b = v.clone();
    }
    if let Some(v) = &args.party_c {
        params.party_c = Some(v.clone());
    }
    if let Some(v) = &args.purpose {
        params.purpose = v.clone();
    }
    if let Some(v) = &args.nda_type {
        params.nda_type = v.clone();
    }
    if let Some(v) = &args.period {
        params.confidentiality_period = v.clone();
    }
    if let Some(v) = &args.jurisdiction {
        params.jurisdiction = v.clone();
    }
    Ok(params)
}
