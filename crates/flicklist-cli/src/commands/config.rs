use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Color, Table};
use flicklist_config::{Config, PathManager};
use owo_colors::OwoColorize;
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match cmd {
        ConfigCommands::Show => show_config(&paths, output),
        ConfigCommands::Init { force } => init_config(&paths, force, output),
    }
}

fn show_config(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let from_file = config_file.exists();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    if !output.is_human() {
        output.json(&json!({
            "type": "config",
            "config_file": config_file.display().to_string(),
            "from_file": from_file,
            "api": {
                "base_url": config.api.base_url,
                "client_id": config.api.client_id,
                "timeout_secs": config.api.timeout_secs,
                "max_rate_limit_retries": config.api.max_rate_limit_retries,
                "default_retry_after_secs": config.api.default_retry_after_secs,
            },
            "sync": {
                "history_page_size": config.sync.history_page_size,
                "transform_workers": config.sync.transform_workers,
                "partition_ttl_hours": config.sync.partition_ttl_hours,
            },
            "scheduler": {
                "schedule": config.scheduler.schedule,
                "run_on_startup": config.scheduler.run_on_startup,
            },
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    if !from_file {
        output.warn(format!(
            "No configuration file at {}; showing defaults. Run 'flicklist config init' to create one.",
            config_file.display()
        ));
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Setting").fg(Color::Cyan).add_attribute(Attribute::Bold),
        Cell::new("Value").fg(Color::Cyan).add_attribute(Attribute::Bold),
    ]);
    let rows = [
        ("api.base_url", config.api.base_url.clone()),
        ("api.client_id", config.api.client_id.clone()),
        ("api.timeout_secs", config.api.timeout_secs.to_string()),
        ("api.max_rate_limit_retries", config.api.max_rate_limit_retries.to_string()),
        ("api.default_retry_after_secs", config.api.default_retry_after_secs.to_string()),
        ("sync.history_page_size", config.sync.history_page_size.to_string()),
        ("sync.transform_workers", config.sync.transform_workers.to_string()),
        ("sync.partition_ttl_hours", config.sync.partition_ttl_hours.to_string()),
        ("scheduler.schedule", config.scheduler.schedule.clone()),
        (
            "scheduler.run_on_startup",
            if config.scheduler.run_on_startup { "✓".green().to_string() } else { "✗".red().to_string() },
        ),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);

    if let Err(e) = config.validate() {
        output.warn(format!("Configuration is invalid: {}", e));
    }
    Ok(())
}

fn init_config(paths: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
        return Ok(());
    }

    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}
