use super::context::SyncContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use flicklist_config::settings::USER_KEY;
use flicklist_config::SettingsStore;
use flicklist_core::CacheStore;
use flicklist_models::FALLBACK_TIMESTAMP;
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_status(output: &Output) -> Result<()> {
    let context = SyncContext::load()?;
    let sync = context.activity_sync();

    let baseline = sync
        .get_activity_baseline()
        .map_err(|e| eyre!("Failed to read the activity baseline: {}", e))?;
    let partitions = context
        .cache
        .partition_keys()
        .map_err(|e| eyre!("Failed to list cache partitions: {}", e))?;
    let user = context
        .settings
        .get(USER_KEY)
        .filter(|user| !user.is_empty() && user != "empty_setting");
    let next_clear = context.settings.next_daily_clear_at();

    if !output.is_human() {
        let baseline_json: serde_json::Map<String, serde_json::Value> = baseline
            .entries()
            .into_iter()
            .map(|(name, ts)| (name, json!(ts)))
            .collect();
        output.json(&json!({
            "type": "status",
            "authenticated": sync.is_authenticated(),
            "user": user,
            "next_daily_clear": next_clear.map(|t| t.to_rfc3339()),
            "partitions": partitions.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            "baseline": baseline_json,
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    let account = match (sync.is_authenticated(), &user) {
        (true, Some(user)) => format!("{} {}", "✓".green(), user),
        (true, None) => format!("{} token stored", "✓".green()),
        (false, _) => format!("{} not authorized", "✗".red()),
    };

    let mut state_table = Table::new();
    state_table.set_header(vec![
        Cell::new("FlickList Sync").fg(Color::Cyan).add_attribute(Attribute::Bold),
    ]);
    state_table.add_row(vec![Cell::new("Account"), Cell::new(account)]);
    state_table.add_row(vec![
        Cell::new("Next daily sweep"),
        Cell::new(
            next_clear
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "on next sync".to_string()),
        ),
    ]);
    state_table.add_row(vec![
        Cell::new("Cached partitions"),
        Cell::new(partitions.len().to_string()),
    ]);
    state_table.add_row(vec![
        Cell::new("Cache directory"),
        Cell::new(context.paths.cache_dir().display().to_string()),
    ]);
    state_table.load_preset(comfy_table::presets::UTF8_FULL);
    state_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", state_table);
    println!();

    let mut baseline_table = Table::new();
    baseline_table.set_header(vec![
        Cell::new("Activity").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new("Last seen").fg(Color::Cyan).add_attribute(Attribute::Bold),
    ]);
    for (name, timestamp) in baseline.entries() {
        let shown = if timestamp == FALLBACK_TIMESTAMP {
            "never".dimmed().to_string()
        } else {
            timestamp.to_string()
        };
        baseline_table.add_row(vec![Cell::new(name), Cell::new(shown)]);
    }
    baseline_table.load_preset(comfy_table::presets::UTF8_FULL);
    baseline_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", baseline_table);

    Ok(())
}
