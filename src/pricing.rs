//! Model pricing tables and cost math.
//!
//! Prices are per 1K tokens (snapshot as of Oct 2025). Token counts here
//! are heuristic estimates; when a provider reports real usage the
//! handlers prefer that, so this module only has to be consistent, not
//! tokenizer-exact.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Per-1K-token pricing and context window for one model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelPricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
    pub context_window: u32,
}

static PRICING: Lazy<HashMap<&'static str, ModelPricing>> = Lazy::new(|| {
    HashMap::from([
        // OpenAI
        (
            "gpt-4",
            ModelPricing { input_per_1k: 0.03, output_per_1k: 0.06, context_window: 8192 },
        ),
        (
            "gpt-4-32k",
            ModelPricing { input_per_1k: 0.06, output_per_1k: 0.12, context_window: 32768 },
        ),
        (
            "gpt-4-turbo-preview",
            ModelPricing { input_per_1k: 0.01, output_per_1k: 0.03, context_window: 128000 },
        ),
        (
            "gpt-3.5-turbo",
            ModelPricing { input_per_1k: 0.0005, output_per_1k: 0.0015, context_window: 16385 },
        ),
        (
            "gpt-3.5-turbo-16k",
            ModelPricing { input_per_1k: 0.003, output_per_1k: 0.004, context_window: 16385 },
        ),
        // Anthropic
        (
            "claude-3-opus",
            ModelPricing { input_per_1k: 0.015, output_per_1k: 0.075, context_window: 200000 },
        ),
        (
            "claude-3-5-sonnet-20241022",
            ModelPricing { input_per_1k: 0.003, output_per_1k: 0.015, context_window: 200000 },
        ),
        (
            "claude-3-sonnet",
            ModelPricing { input_per_1k: 0.003, output_per_1k: 0.015, context_window: 200000 },
        ),
        (
            "claude-3-haiku",
            ModelPricing { input_per_1k: 0.00025, output_per_1k: 0.00125, context_window: 200000 },
        ),
    ])
});

/// Pricing for a model, if it is in the table.
pub fn pricing_info(model: &str) -> Option<&'static ModelPricing> {
    PRICING.get(model)
}

/// All known model ids, sorted for stable output.
pub fn models() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PRICING.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Dollar cost of a call. Unknown models cost 0.0.
pub fn calculate_cost(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    match PRICING.get(model) {
        Some(p) => {
            (f64::from(input_tokens) / 1000.0) * p.input_per_1k
                + (f64::from(output_tokens) / 1000.0) * p.output_per_1k
        }
        None => 0.0,
    }
}

/// Rough token estimate: one token per four characters.
pub fn estimate_tokens(text: &str) -> u32 {
    (text.chars().count() / 4) as u32
}

/// Human-readable cost with precision scaled to magnitude.
pub fn format_cost(cost: f64) -> String {
    if cost == 0.0 {
        "$0.00".to_string()
    } else if cost < 0.001 {
        format!("${:.6}", cost)
    } else if cost < 0.01 {
        format!("${:.5}", cost)
    } else if cost < 0.1 {
        format!("${:.4}", cost)
    } else {
        format!("${:.3}", cost)
    }
}

/// Itemized cost report for one model and token pair.
#[derive(Debug, Clone, Serialize)]
pub struct CostBreakdown {
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub input_price_per_1k: f64,
    pub output_price_per_1k: f64,
    pub formatted_cost: String,
}

/// Itemized costs for a call. Unknown models price at zero.
pub fn cost_breakdown(model: &str, input_tokens: u32, output_tokens: u32) -> CostBreakdown {
    let (input_per_1k, output_per_1k) = match PRICING.get(model) {
        Some(p) => (p.input_per_1k, p.output_per_1k),
        None => (0.0, 0.0),
    };
    let input_cost = (f64::from(input_tokens) / 1000.0) * input_per_1k;
    let output_cost = (f64::from(output_tokens) / 1000.0) * output_per_1k;
    CostBreakdown {
        model: model.to_string(),
        input_tokens,
        output_tokens,
        total_tokens: input_tokens + output_tokens,
        input_cost,
        output_cost,
        total_cost: input_cost + output_cost,
        input_price_per_1k: input_per_1k,
        output_price_per_1k: output_per_1k,
        formatted_cost: format_cost(input_cost + output_cost),
    }
}

/// Estimate what one prompt/response pair would cost on each given model.
pub fn compare_costs(
    prompt: &str,
    response: &str,
    models: &[&str],
) -> HashMap<String, CostBreakdown> {
    let input_tokens = estimate_tokens(prompt);
    let output_tokens = estimate_tokens(response);
    models
        .iter()
        .map(|m| (m.to_string(), cost_breakdown(m, input_tokens, output_tokens)))
        .collect()
}

/// Cheapest model in a comparison. Price ties break on model name so the
/// answer is stable.
pub fn cheapest_model(costs: &HashMap<String, CostBreakdown>) -> Option<(String, f64)> {
    costs
        .iter()
        .min_by(|a, b| {
            a.1.total_cost
                .total_cmp(&b.1.total_cost)
                .then_with(|| a.0.cmp(b.0))
        })
        .map(|(name, b)| (name.clone(), b.total_cost))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_cost_gpt4() {
        // 1000 in at $0.03/1k + 500 out at $0.06/1k
        let cost = calculate_cost("gpt-4", 1000, 500);
        assert!((cost - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_cost_claude_haiku() {
        let cost = calculate_cost("claude-3-haiku", 1000, 1000);
        assert!((cost - 0.0015).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_cost_unknown_model_is_free() {
        assert_eq!(calculate_cost("made-up-model", 1000, 1000), 0.0);
    }

    #[test]
    fn test_calculate_cost_zero_tokens() {
        assert_eq!(calculate_cost("gpt-4", 0, 0), 0.0);
    }

    #[test]
    fn test_estimate_tokens_four_chars_per_token() {
        assert_eq!(estimate_tokens(&"a".repeat(40)), 10);
        assert_eq!(estimate_tokens("abc"), 0);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_estimate_tokens_counts_chars_not_bytes() {
        // four 3-byte chars are still one token
        assert_eq!(estimate_tokens("日本語だ"), 1);
    }

    #[test]
    fn test_format_cost_tiers() {
        assert_eq!(format_cost(0.0), "$0.00");
        assert_eq!(format_cost(0.0005), "$0.000500");
        assert_eq!(format_cost(0.005), "$0.00500");
        assert_eq!(format_cost(0.05), "$0.0500");
        assert_eq!(format_cost(0.5), "$0.500");
        assert_eq!(format_cost(1.25), "$1.250");
    }

    #[test]
    fn test_cost_breakdown_known_model() {
        let b = cost_breakdown("gpt-4", 2000, 1000);
        assert_eq!(b.model, "gpt-4");
        assert_eq!(b.total_tokens, 3000);
        assert!((b.input_cost - 0.06).abs() < 1e-12);
        assert!((b.output_cost - 0.06).abs() < 1e-12);
        assert!((b.total_cost - 0.12).abs() < 1e-12);
        assert_eq!(b.input_price_per_1k, 0.03);
        assert_eq!(b.formatted_cost, "$0.120");
    }

    #[test]
    fn test_cost_breakdown_unknown_model_zeroes() {
        let b = cost_breakdown("mystery", 2000, 1000);
        assert_eq!(b.total_cost, 0.0);
        assert_eq!(b.input_price_per_1k, 0.0);
        assert_eq!(b.output_price_per_1k, 0.0);
        assert_eq!(b.formatted_cost, "$0.00");
        assert_eq!(b.total_tokens, 3000, "token counts survive unknown pricing");
    }

    #[test]
    fn test_compare_costs_and_cheapest() {
        let prompt = "p".repeat(400); // 100 tokens
        let response = "r".repeat(400);
        let costs = compare_costs(&prompt, &response, &["gpt-4", "claude-3-haiku"]);
        assert_eq!(costs.len(), 2);
        let (winner, cost) = cheapest_model(&costs).unwrap();
        assert_eq!(winner, "claude-3-haiku");
        assert!(cost < costs["gpt-4"].total_cost);
    }

    #[test]
    fn test_cheapest_model_tie_breaks_by_name() {
        // Both sonnet entries carry identical pricing
        let costs = compare_costs("aaaa", "bbbb", &["claude-3-sonnet", "claude-3-5-sonnet-20241022"]);
        let (winner, _) = cheapest_model(&costs).unwrap();
        assert_eq!(winner, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_cheapest_model_empty_is_none() {
        assert!(cheapest_model(&HashMap::new()).is_none());
    }

    #[test]
    fn test_models_sorted_and_complete() {
        let names = models();
        assert_eq!(names.len(), 9);
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"gpt-4"));
        assert!(names.contains(&"claude-3-opus"));
    }

    #[test]
    fn test_pricing_info_lookup() {
        let p = pricing_info("gpt-4-32k").unwrap();
        assert_eq!(p.context_window, 32768);
        assert!(pricing_info("nope").is_none());
    }
}
