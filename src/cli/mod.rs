//! Command-line interface for promptarena.

mod analyze;
mod pricing;
mod serve;
mod template;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use promptarena::prompts::optimizer;

#[derive(Parser, Debug)]
#[command(
    name = "promptarena",
    version,
    about = "Side-by-side LLM prompt comparison with cost estimation and response caching"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the comparison API server
    Serve {
        /// Bind host (overrides HOST)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Directory of static frontend assets to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Inspect and render the built-in prompt templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Show per-model pricing
    Pricing {
        /// Show a single model instead of the full table
        #[arg(long)]
        model: Option<String>,
    },
    /// Analyze a prompt for quality and cost issues
    Analyze {
        /// The prompt text to analyze
        prompt: String,
        /// Model used for the cost estimate
        #[arg(long, default_value = optimizer::DEFAULT_MODEL)]
        model: String,
        /// Expected response length in tokens
        #[arg(long, default_value_t = optimizer::DEFAULT_TARGET_OUTPUT_TOKENS)]
        target_output_tokens: u32,
    },
}

/// Template subcommands.
#[derive(Subcommand, Debug)]
pub enum TemplateAction {
    /// List all templates
    List,
    /// Show one template in full
    Show {
        /// Template id, e.g. code_generation
        id: String,
    },
    /// Render a template with variable values
    Render {
        /// Template id, e.g. code_generation
        id: String,
        /// Variable assignment, repeatable: --set language=Rust
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

/// Dispatch a parsed command line to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            host,
            port,
            static_dir,
        } => serve::cmd_serve(host, port, static_dir).await,
        Commands::Templates { action } => template::cmd_templates(action),
        Commands::Pricing { model } => pricing::cmd_pricing(model.as_deref()),
        Commands::Analyze {
            prompt,
            model,
            target_output_tokens,
        } => analyze::cmd_analyze(&prompt, &model, target_output_tokens),
    }
}
