//! Prompt analysis command handler.

use anyhow::Result;

use promptarena::pricing;
use promptarena::prompts::optimizer::{self, IssueType, Severity};

/// Run the heuristic prompt analyzer and print its verdict.
pub(crate) fn cmd_analyze(prompt: &str, model: &str, target_output_tokens: u32) -> Result<()> {
    if prompt.trim().is_empty() {
        anyhow::bail!("Prompt must not be empty");
    }

    let result = optimizer::analyze(prompt, model, target_output_tokens);

    println!("Prompt Analysis");
    println!("===============");
    println!();
    println!("Score:          {:.1} / 100", result.score);
    println!("Tokens:         {}", result.token_count);
    println!(
        "Estimated cost: {} ({} + {} output tokens on {})",
        pricing::format_cost(result.estimated_cost),
        result.token_count,
        target_output_tokens,
        model
    );
    println!();

    if result.issues.is_empty() {
        println!("No issues found.");
    } else {
        println!("Issues ({}):", result.issues.len());
        for issue in &result.issues {
            println!(
                "  [{}] {}: {}",
                severity_label(issue.severity),
                issue_label(issue.issue_type),
                issue.message
            );
            println!("         Suggestion: {}", issue.suggestion);
            if let Some(example) = issue.example {
                println!("         Example: {example}");
            }
        }
    }

    if let Some(rewrite) = &result.optimized_prompt {
        println!();
        println!("Suggested rewrite:");
        println!("{rewrite}");
    }

    Ok(())
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "low",
        Severity::Medium => "medium",
        Severity::High => "high",
    }
}

fn issue_label(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::Clarity => "clarity",
        IssueType::Specificity => "specificity",
        IssueType::Length => "length",
        IssueType::Structure => "structure",
        IssueType::Cost => "cost",
        IssueType::Tone => "tone",
    }
}
