use std::path::{Path, PathBuf};

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::{self, AccountTokens, Config};
use crate::{gcal, sync};

pub async fn run(ics_path: PathBuf, calendar_id: Option<String>, open_browser: bool) -> Result<()> {
    let config = config::load_config()?;

    let stats = match sync_once(&config, &ics_path, calendar_id.as_deref(), open_browser).await {
        // Stored tokens can be revoked or expired beyond refresh. Wipe them
        // and go through the full flow once before giving up.
        Err(err) if err.is::<gcal::AuthError>() => {
            println!(
                "{}",
                "Stored credentials were rejected, authenticating again...".yellow()
            );
            config::delete_tokens()?;
            sync_once(&config, &ics_path, calendar_id.as_deref(), open_browser).await?
        }
        other => other?,
    };

    println!(
        "\nImported {} events ({} deleted, {} cancelled, {} skipped)",
        stats.imported, stats.deleted, stats.cancelled, stats.skipped
    );

    Ok(())
}

async fn sync_once(
    config: &Config,
    ics_path: &Path,
    calendar_id: Option<&str>,
    open_browser: bool,
) -> Result<sync::SyncStats> {
    let tokens = obtain_tokens(config, open_browser).await?;

    sync::run(config, &tokens, ics_path, calendar_id).await
}

async fn obtain_tokens(config: &Config, open_browser: bool) -> Result<AccountTokens> {
    match config::load_tokens()? {
        Some(tokens) => gcal::ensure_fresh(&config.google, tokens).await,
        None => super::authenticate_and_save(config, open_browser).await,
    }
}
