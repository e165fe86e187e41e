//! `txscope units`: list declared persistence units.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use txscope_infra::config::load_persistence_units;

pub async fn list_units(path: &Path, json: bool) -> Result<()> {
    let units = load_persistence_units(path)
        .await
        .with_context(|| format!("loading {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&units)?);
        return Ok(());
    }

    if units.units.is_empty() {
        println!();
        println!(
            "  {} No persistence units declared in {}.",
            style("i").blue().bold(),
            style(path.display()).cyan(),
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Unit").fg(Color::White),
        Cell::new("Driver").fg(Color::White),
        Cell::new("URL").fg(Color::White),
        Cell::new("Pool").fg(Color::White),
        Cell::new("Migrate").fg(Color::White),
    ]);

    for unit in &units.units {
        table.add_row(vec![
            Cell::new(&unit.name).fg(Color::Cyan),
            Cell::new(&unit.driver),
            Cell::new(unit.url.as_deref().unwrap_or("-")),
            Cell::new(unit.max_connections),
            Cell::new(if unit.migrate { "yes" } else { "no" }),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} unit{}",
        units.units.len(),
        if units.units.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}
