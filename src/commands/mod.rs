pub mod auth;
pub mod edit;
pub mod import;

use anyhow::Result;

use crate::config::{self, AccountTokens, Config};
use crate::gcal;

/// Run the OAuth flow and persist the resulting tokens
pub async fn authenticate_and_save(config: &Config, open_browser: bool) -> Result<AccountTokens> {
    let tokens = gcal::authenticate(&config.google, open_browser).await?;
    config::save_tokens(&tokens)?;

    Ok(tokens)
}
