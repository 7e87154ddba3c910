//! Generate JSON Schema for the explorer configuration
//!
//! Usage:
//!   cargo run --features dev-bins --bin generate_schema > explorer-schema.json

use anyhow::Context;
use fresh_explorer::config::Config;

fn main() -> anyhow::Result<()> {
    let mut json = Config::json_schema();

    // Extra drive roots are machine specific; the schema is for validation
    if let Some(roots) = json
        .get_mut("$defs")
        .and_then(|defs| defs.get_mut("ExplorerConfig"))
        .and_then(|explorer| explorer.get_mut("properties"))
        .and_then(|props| props.get_mut("extra_drive_roots"))
        .and_then(|roots| roots.as_object_mut())
    {
        roots.remove("default");
    }

    let output = serde_json::to_string_pretty(&json).context("Failed to serialize schema")?;
    println!("{}", output);
    Ok(())
}
