use anyhow::Result;
use rulecheck::{MessageTemplates, PredicateRegistry};
use serde_json::json;

/// Print the built-in rules with their parameter counts and default messages
pub fn run(json_output: bool) -> Result<()> {
    let registry = PredicateRegistry::with_defaults();
    let templates = MessageTemplates::new();

    if json_output {
        let rules: Vec<_> = registry
            .catalog()
            .into_iter()
            .map(|(name, arity)| {
                json!({
                    "name": name,
                    "params": arity.to_string(),
                    "message": templates.get(name),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    let width = registry
        .catalog()
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, arity) in registry.catalog() {
        println!("{:<width$}  params: {}", name, arity, width = width);
    }
    Ok(())
}
