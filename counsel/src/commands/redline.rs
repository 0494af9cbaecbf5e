use anyhow::Result;
use console::style;
use counsel_core::{
    legal::{analyze_document_with_progress, AnalyzedClause, RiskLevel},
    Gateway,
};

use super::{read_document, Output};
use crate::cli::RedlineArgs;

pub async fn handle_redline(args: RedlineArgs, gateway: &Gateway, out: &Output) -> Result<()> {
    let document = read_document(&args.document).await?;

    let report = analyze_document_with_progress(gateway, &document, |event| {
        out.progress(&format!("[{}] {}", event.status(), event.message()));
    })
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for clause in &report.clauses {
        print_clause(clause, out);
    }

    let summary = &report.summary;
    println!(
        "{} {} clauses: {} red, {} amber, {} green ({}% need attention)",
        style("Summary:").bold(),
        summary.total_clauses,
        style(summary.red).red(),
        style(summary.amber).yellow(),
        style(summary.green).green(),
        summary.risk_percentage
    );
    Ok(())
}

fn print_clause(clause: &AnalyzedClause, out: &Output) {
    let analysis = &clause.analysis;
    let badge = match analysis.risk_level {
        RiskLevel::Red => style(" RED ").white().on_red(),
        RiskLevel::Amber => style("AMBER").black().on_yellow(),
        RiskLevel::Green => style("GREEN").black().on_green(),
    };
    println!(
        "{} {} #{} {}",
        badge,
        style(clause.clause_type).bold(),
        clause.clause_id,
        style(format!("(confidence {}%)", analysis.confidence)).dim()
    );
    out.indented(&clause.clause_text);
    out.indented(&analysis.explanation);
    if analysis.risk_level != RiskLevel::Green && !analysis.suggestions.is_empty() {
        out.indented(&format!("Suggestion: {}", analysis.suggestions));
    }
    println!();
}
