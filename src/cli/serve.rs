//! `promptarena serve` command — run the comparison API server.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use promptarena::api::start_server;
use promptarena::config::Settings;

/// Start the API server, applying any command-line overrides.
pub(crate) async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
) -> Result<()> {
    let mut settings =
        Settings::from_env().with_context(|| "Failed to load settings from environment")?;

    if let Some(h) = host {
        settings.host = h;
    }
    if let Some(p) = port {
        settings.port = p;
    }

    let static_dir = resolve_static_dir(static_dir);

    println!("Prompt Arena API: http://{}", settings.bind_addr());
    println!("  Environment: {}", settings.environment);
    println!("  OpenAI:      {}", key_status(&settings.openai_api_key));
    println!("  Anthropic:   {}", key_status(&settings.anthropic_api_key));
    if settings.openai_api_key.is_none() && settings.anthropic_api_key.is_none() {
        println!();
        println!("No provider API keys configured. /api/compare will report an");
        println!("error for every provider until OPENAI_API_KEY or");
        println!("ANTHROPIC_API_KEY is set.");
    }
    if let Some(dir) = &static_dir {
        println!("  Frontend:    {}", dir.display());
    }
    println!("Press Ctrl+C to stop.");

    start_server(Arc::new(settings), static_dir)
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {e}"))?;

    Ok(())
}

/// Keep a static dir only when it actually holds an index.html.
fn resolve_static_dir(dir: Option<PathBuf>) -> Option<PathBuf> {
    let dir = dir?;
    if dir.join("index.html").exists() {
        Some(dir)
    } else {
        println!(
            "No index.html under {}; starting in API-only mode.",
            dir.display()
        );
        None
    }
}

fn key_status(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "configured"
    } else {
        "not set"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_status_labels() {
        assert_eq!(key_status(&Some("sk-123".to_string())), "configured");
        assert_eq!(key_status(&None), "not set");
    }

    #[test]
    fn test_resolve_static_dir_none_passthrough() {
        assert!(resolve_static_dir(None).is_none());
    }

    #[test]
    fn test_resolve_static_dir_requires_index() {
        // temp_dir has no index.html, so serving falls back to API-only.
        let dir = std::env::temp_dir().join("promptarena-no-such-frontend");
        assert!(resolve_static_dir(Some(dir)).is_none());
    }
}
