use super::context::SyncContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use flicklist_models::PartitionKey;
use serde_json::json;

pub async fn run_invalidate(key: &str, output: &Output) -> Result<()> {
    let key: PartitionKey = key.parse().map_err(|e| eyre!("{}", e))?;
    let context = SyncContext::load()?;

    context
        .activity_sync()
        .invalidate(&key)
        .map_err(|e| eyre!("Failed to invalidate {}: {}", key, e))?;

    if output.is_human() {
        output.success(format!("Invalidated {}", key));
    } else {
        output.json(&json!({ "type": "invalidate", "key": key.to_string() }));
    }
    Ok(())
}
