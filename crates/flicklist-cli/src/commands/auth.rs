use super::context::SyncContext;
use super::prompts;
use super::sync::run_pass;
use super::sync_ui::is_interactive;
use crate::output::Output;
use crate::AuthCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use flicklist_config::settings::TOKEN_KEY;
use flicklist_config::SettingsStore;

pub async fn run_auth(cmd: AuthCommands, output: &Output) -> Result<()> {
    match cmd {
        AuthCommands::SetToken { token } => set_token(token, output).await,
        AuthCommands::Revoke { yes } => revoke(yes, output).await,
    }
}

fn normalize_token(raw: &str) -> Result<String> {
    let token = raw.trim().trim_start_matches("Bearer ").trim();
    if token.is_empty() {
        return Err(eyre!("Access token cannot be empty"));
    }
    Ok(token.to_string())
}

async fn set_token(token_arg: Option<String>, output: &Output) -> Result<()> {
    let raw = match token_arg {
        Some(token) => token,
        None if is_interactive() => prompts::prompt_secret("FlickList access token")?,
        None => return Err(eyre!("No token given; pass --token when not running in a terminal")),
    };
    let token = normalize_token(&raw)?;

    let context = SyncContext::load()?;
    context
        .settings
        .set(TOKEN_KEY, &token)
        .map_err(|e| eyre!("Failed to store token: {}", e))?;
    output.success("Access token stored");

    // A new account invalidates everything cached for the previous one
    let report = run_pass(&context, true, output).await?;
    output.report(&report);
    Ok(())
}

async fn revoke(yes: bool, output: &Output) -> Result<()> {
    let context = SyncContext::load()?;
    if !context.settings.is_authenticated() {
        output.info("No FlickList authorization stored");
        return Ok(());
    }

    if !yes {
        if !is_interactive() {
            return Err(eyre!("Refusing to revoke without confirmation; pass --yes"));
        }
        if !prompts::prompt_yes_no("Revoke FlickList authorization and clear all cached data?", false)? {
            output.info("Nothing changed");
            return Ok(());
        }
    }

    context
        .activity_sync()
        .revoke()
        .map_err(|e| eyre!("Failed to revoke authorization: {}", e))?;
    output.success("FlickList authorization revoked and cache cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("  abc123 \n").unwrap(), "abc123");
        assert_eq!(normalize_token("Bearer abc123").unwrap(), "abc123");
        assert!(normalize_token("   ").is_err());
        assert!(normalize_token("Bearer ").is_err());
    }
}
