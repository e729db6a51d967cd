//! Pricing table command handler.

use anyhow::Result;

use promptarena::pricing;

/// Print per-model pricing, either the full table or a single model.
pub(crate) fn cmd_pricing(model: Option<&str>) -> Result<()> {
    match model {
        Some(name) => {
            let Some(info) = pricing::pricing_info(name) else {
                anyhow::bail!(
                    "Unknown model '{}'. Known models: {}",
                    name,
                    pricing::models().join(", ")
                );
            };
            println!("Model: {name}");
            println!("  Input:          ${:.4} / 1K tokens", info.input_per_1k);
            println!("  Output:         ${:.4} / 1K tokens", info.output_per_1k);
            println!("  Context window: {} tokens", info.context_window);
        }
        None => {
            println!(
                "{:<28} {:>12} {:>12} {:>10}",
                "Model", "In / 1K", "Out / 1K", "Context"
            );
            for name in pricing::models() {
                // models() only returns ids present in the table.
                if let Some(info) = pricing::pricing_info(name) {
                    println!(
                        "{:<28} {:>12} {:>12} {:>10}",
                        name,
                        format!("${:.4}", info.input_per_1k),
                        format!("${:.4}", info.output_per_1k),
                        info.context_window
                    );
                }
            }
        }
    }

    Ok(())
}
