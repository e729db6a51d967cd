//! Heuristic prompt analyzer.
//!
//! Scores a prompt out of 100 and reports issues across clarity,
//! specificity, length, structure, and cost, with an optional rewritten
//! prompt that applies the mechanical fixes. Word-list checks match
//! substrings, not whole words, so "awesome" trips the "some" check; the
//! scoring depends on that looseness staying put.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use crate::pricing;

/// Model assumed when the caller does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4";
/// Output length (tokens) assumed for cost estimates.
pub const DEFAULT_TARGET_OUTPUT_TOKENS: u32 = 500;

/// Category of a detected prompt issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Clarity,
    Specificity,
    Length,
    Structure,
    Cost,
    Tone,
}

/// How strongly an issue drags on prompt quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One detected problem with the prompt.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: &'static str,
    pub suggestion: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<&'static str>,
}

/// Full analyzer verdict for one prompt.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    /// 0-100 quality score after weighted deductions.
    pub score: f64,
    pub issues: Vec<OptimizationIssue>,
    pub token_count: u32,
    pub estimated_cost: f64,
    /// Rewritten prompt when any issue was found.
    pub optimized_prompt: Option<String>,
}

static VAGUE_WORDS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(["maybe", "perhaps", "kind of", "sort of", "probably", "might"])
        .unwrap()
});

static TASK_INDICATORS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(["you must", "your task is", "please", "generate", "write", "create"])
        .unwrap()
});

static GENERIC_WORDS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(["something", "anything", "whatever", "some"])
        .unwrap()
});

static LENGTH_SPEC_WORDS: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(["words", "sentences", "paragraphs", "lines", "characters", "tokens"])
        .unwrap()
});

static POLITE_PHRASES: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(["please", "kindly", "if you could", "would you mind"])
        .unwrap()
});

static PRONOUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(it|this|that|these|those|they)\b").unwrap());

static DEFINITE_REFERENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(the|a|an)\s+\w+\s+(is|are|was|were)").unwrap());

/// Analyze a prompt against the heuristic checks.
///
/// `model` drives the cost estimate only; unknown models price like
/// gpt-4. `target_output_tokens` is the expected response length.
pub fn analyze(prompt: &str, model: &str, target_output_tokens: u32) -> OptimizationResult {
    let mut issues = Vec::new();
    let mut score = 100.0;

    let length_issues = check_length(prompt);
    score -= length_issues.len() as f64 * 5.0;
    issues.extend(length_issues);

    let clarity_issues = check_clarity(prompt);
    score -= clarity_issues.len() as f64 * 10.0;
    issues.extend(clarity_issues);

    let structure_issues = check_structure(prompt);
    score -= structure_issues.len() as f64 * 8.0;
    issues.extend(structure_issues);

    let specificity_issues = check_specificity(prompt);
    score -= specificity_issues.len() as f64 * 7.0;
    issues.extend(specificity_issues);

    let token_count = prompt_tokens(prompt);
    let estimated_cost = estimate_cost(token_count, target_output_tokens, model);
    let cost_issues = check_cost(prompt, token_count);
    score -= cost_issues.len() as f64 * 3.0;
    issues.extend(cost_issues);

    let optimized_prompt = if issues.is_empty() {
        None
    } else {
        Some(generate_optimized_prompt(prompt, &issues))
    };

    OptimizationResult {
        score: score.max(0.0),
        issues,
        token_count,
        estimated_cost,
        optimized_prompt,
    }
}

fn issue(
    issue_type: IssueType,
    severity: Severity,
    message: &'static str,
    suggestion: &'static str,
    example: Option<&'static str>,
) -> OptimizationIssue {
    OptimizationIssue { issue_type, severity, message, suggestion, example }
}

fn check_length(prompt: &str) -> Vec<OptimizationIssue> {
    let tokens = prompt_tokens(prompt);
    let mut issues = Vec::new();
    if tokens < 20 {
        issues.push(issue(
            IssueType::Length,
            Severity::High,
            "Prompt is very short - may lack context",
            "Add more detail about desired output format, tone, and requirements",
            Some("Instead of: 'Summarize this'\nTry: 'Provide a 3-sentence summary focusing on key technical insights'"),
        ));
    } else if tokens > 2000 {
        issues.push(issue(
            IssueType::Length,
            Severity::Medium,
            "Prompt is very long - may increase costs unnecessarily",
            "Consider breaking into multiple prompts or removing redundant information",
            None,
        ));
    }
    issues
}

fn check_clarity(prompt: &str) -> Vec<OptimizationIssue> {
    let mut issues = Vec::new();

    if VAGUE_WORDS.is_match(prompt) {
        issues.push(issue(
            IssueType::Clarity,
            Severity::Medium,
            "Prompt contains vague language",
            "Use definitive instructions instead of uncertain language",
            Some("Instead of: 'Maybe explain this'\nTry: 'Explain this concept'"),
        ));
    }

    // Pronouns are fine when the prompt names a referent ("the report is...").
    if PRONOUN_RE.is_match(prompt) && !DEFINITE_REFERENT_RE.is_match(prompt) {
        issues.push(issue(
            IssueType::Clarity,
            Severity::Low,
            "Prompt may have ambiguous pronouns",
            "Be explicit about what each pronoun refers to",
            None,
        ));
    }

    issues
}

fn check_structure(prompt: &str) -> Vec<OptimizationIssue> {
    let mut issues = Vec::new();
    let lower = prompt.to_lowercase();
    let char_len = prompt.chars().count();

    if !TASK_INDICATORS.is_match(prompt) {
        issues.push(issue(
            IssueType::Structure,
            Severity::Medium,
            "No clear task instruction found",
            "Start with a clear imperative statement of what you want",
            Some("Start with: 'Generate a...', 'Write a...', or 'Your task is to...'"),
        ));
    }

    if char_len > 200 && !lower.contains("example") {
        issues.push(issue(
            IssueType::Structure,
            Severity::Low,
            "Long prompt without examples",
            "Consider adding examples for better results",
            Some("Add: 'For example: [show desired format]'"),
        ));
    }

    if !lower.contains("format") && !lower.contains("json") && char_len > 100 {
        issues.push(issue(
            IssueType::Structure,
            Severity::Low,
            "No output format specified",
            "Specify desired output format (JSON, markdown, bullet points, etc.)",
            None,
        ));
    }

    issues
}

fn check_specificity(prompt: &str) -> Vec<OptimizationIssue> {
    let mut issues = Vec::new();
    let char_len = prompt.chars().count();

    if GENERIC_WORDS.is_match(prompt) {
        issues.push(issue(
            IssueType::Specificity,
            Severity::Medium,
            "Prompt uses generic terms",
            "Replace generic terms with specific requirements",
            Some("Instead of: 'Write something about AI'\nTry: 'Write a 200-word explanation of transformer architectures'"),
        ));
    }

    if char_len > 100 && !LENGTH_SPEC_WORDS.is_match(prompt) {
        issues.push(issue(
            IssueType::Specificity,
            Severity::Low,
            "No length specification",
            "Specify desired output length to control costs and format",
            Some("Add: 'in 3-5 sentences' or 'approximately 200 words'"),
        ));
    }

    issues
}

fn check_cost(prompt: &str, token_count: u32) -> Vec<OptimizationIssue> {
    let mut issues = Vec::new();

    let sentences: Vec<&str> = prompt.split('.').collect();
    if sentences.len() > 5 {
        // Duplicate 20-char sentence openings suggest repeated content
        let starts: Vec<String> = sentences
            .iter()
            .map(|s| s.trim())
            .filter(|s| s.chars().count() > 20)
            .map(|s| s.chars().take(20).collect())
            .collect();
        let distinct: HashSet<&String> = starts.iter().collect();
        if distinct.len() != starts.len() {
            issues.push(issue(
                IssueType::Cost,
                Severity::Low,
                "Prompt may contain redundant information",
                "Remove repetitive content to reduce input tokens",
                None,
            ));
        }
    }

    if token_count > 500 {
        let present: HashSet<usize> = POLITE_PHRASES
            .find_iter(prompt)
            .map(|m| m.pattern().as_usize())
            .collect();
        if present.len() > 2 {
            issues.push(issue(
                IssueType::Cost,
                Severity::Low,
                "Excessive politeness adds tokens",
                "LLMs don't need politeness - use direct instructions",
                None,
            ));
        }
    }

    issues
}

/// Token estimate for scoring, floored at one so ratios stay defined.
fn prompt_tokens(text: &str) -> u32 {
    pricing::estimate_tokens(text).max(1)
}

fn estimate_cost(input_tokens: u32, output_tokens: u32, model: &str) -> f64 {
    let p = pricing::pricing_info(model).or_else(|| pricing::pricing_info(DEFAULT_MODEL));
    let (input_per_1k, output_per_1k) = match p {
        Some(p) => (p.input_per_1k, p.output_per_1k),
        None => (0.0, 0.0),
    };
    (f64::from(input_tokens) / 1000.0) * input_per_1k
        + (f64::from(output_tokens) / 1000.0) * output_per_1k
}

fn generate_optimized_prompt(original: &str, issues: &[OptimizationIssue]) -> String {
    let mut optimized = original.to_string();

    let severely_short = issues
        .iter()
        .any(|i| i.severity == Severity::High && i.issue_type == IssueType::Length);
    if severely_short {
        optimized = format!(
            "Task: {optimized}\n\nRequirements:\n- Provide detailed explanation\n- Use clear examples\n- Format as markdown"
        );
    }

    if issues.iter().any(|i| i.issue_type == IssueType::Structure) {
        let imperative = ["Generate", "Write", "Create", "Task:"]
            .iter()
            .any(|p| optimized.starts_with(p));
        if !imperative {
            optimized = format!("Generate: {optimized}");
        }
    }

    if issues.iter().any(|i| i.issue_type == IssueType::Specificity) {
        let lower = optimized.to_lowercase();
        if !lower.contains("word") && !lower.contains("sentence") {
            optimized.push_str("\n\nLength: Approximately 200 words");
        }
    }

    optimized
}
