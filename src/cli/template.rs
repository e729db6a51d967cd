//! Template command handlers.

use anyhow::Result;
use std::collections::HashMap;

use promptarena::prompts::{render, TemplateLibrary};

use super::TemplateAction;

/// Inspect and render the built-in prompt templates.
pub(crate) fn cmd_templates(action: TemplateAction) -> Result<()> {
    let library = TemplateLibrary::builtin();

    match action {
        TemplateAction::List => {
            println!("Templates:");
            for tpl in library.all() {
                println!("  - {} ({}) — {}", tpl.id, tpl.category, tpl.description);
            }
            println!();
            println!("Categories: {}", library.categories().join(", "));
        }
        TemplateAction::Show { id } => {
            let Some(tpl) = library.get(&id) else {
                anyhow::bail!("Template '{}' not found", id);
            };

            println!("Id:          {}", tpl.id);
            println!("Name:        {}", tpl.name);
            println!("Category:    {}", tpl.category);
            println!("Description: {}", tpl.description);
            println!("Variables:   {}", tpl.variables.join(", "));
            if !tpl.system_prompt.is_empty() {
                println!("System:      {}", tpl.system_prompt);
            }
            println!();
            println!("Template:");
            println!("{}", tpl.template);
            if !tpl.example_values.is_empty() {
                println!();
                println!("Example values:");
                for (key, value) in &tpl.example_values {
                    println!("  {key} = {value}");
                }
            }
        }
        TemplateAction::Render { id, set } => {
            let Some(tpl) = library.get(&id) else {
                anyhow::bail!("Template '{}' not found", id);
            };

            let values = parse_assignments(&set)?;
            for key in values.keys() {
                if !tpl.variables.contains(&key.as_str()) {
                    println!(
                        "Note: '{}' is not a variable of this template (declared: {})",
                        key,
                        tpl.variables.join(", ")
                    );
                }
            }

            println!("{}", render(tpl, &values));
        }
    }

    Ok(())
}

/// Parse repeated `--set KEY=VALUE` arguments into a value map.
///
/// The value may itself contain `=`; only the first one splits.
fn parse_assignments(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("Invalid --set '{}' (expected KEY=VALUE)", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("Invalid --set '{}' (empty key)", pair);
        }
        values.insert(key.to_string(), value.to_string());
    }
    Ok(values)
}
