//! `vidscout tools`: list the tools a task kind offers the model.

use vidscout_agent::TaskKind;
use vidscout_core::provider::ToolDefinition;

pub fn schemas(kind: TaskKind) -> Vec<ToolDefinition> {
    let registry = match kind {
        TaskKind::Interactive => vidscout_tools::interactive_registry(),
        TaskKind::Research => vidscout_tools::research_registry(),
    };
    registry.schemas()
}

pub fn run(kind: TaskKind, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let tools = schemas(kind);

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("{} tools for {kind} tasks:", tools.len());
    for tool in &tools {
        println!("  {:<18} {}", tool.name, tool.description);
    }
    Ok(())
}
