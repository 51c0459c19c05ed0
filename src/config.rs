use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Name of the calendar that receives imported events
    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,

    /// Import into this existing calendar instead of recreating one by name
    #[serde(default)]
    pub calendar_id: Option<String>,

    /// How many days back the pre-import wipe reaches
    #[serde(default = "default_cutoff_days")]
    pub cutoff_days: i64,

    /// OAuth credentials
    pub google: GoogleConfig,
}

/// OAuth credentials for Google Calendar
#[derive(Debug, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

fn default_calendar_name() -> String {
    "Study".to_string()
}

fn default_cutoff_days() -> i64 {
    30
}

/// Tokens for the authenticated account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Get the config directory path (~/.config/plansync)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("plansync");
    Ok(config_dir)
}

/// Get the config file path (~/.config/plansync/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Get the tokens file path (~/.config/plansync/tokens.json)
pub fn tokens_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tokens.json"))
}

/// Load config from ~/.config/plansync/config.toml
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with your Google OAuth credentials:\n\n\
            calendar_name = \"Study\"\n\
            cutoff_days = 30\n\n\
            [google]\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\n\
            Credentials come from a Google Cloud project with the Calendar API\n\
            enabled: https://console.cloud.google.com/apis/credentials",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Load tokens from ~/.config/plansync/tokens.json, or None if never authenticated
pub fn load_tokens() -> Result<Option<AccountTokens>> {
    let path = tokens_path()?;

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read tokens file at {}", path.display()))?;

    let tokens: AccountTokens = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse tokens file at {}", path.display()))?;

    Ok(Some(tokens))
}

/// Save tokens to ~/.config/plansync/tokens.json
pub fn save_tokens(tokens: &AccountTokens) -> Result<()> {
    let path = tokens_path()?;

    // Ensure config directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory at {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(tokens)
        .context("Failed to serialize tokens")?;

    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write tokens file at {}", path.display()))?;

    // The refresh token grants full calendar access
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict tokens file at {}", path.display()))?;
    }

    Ok(())
}

/// Delete stored tokens so the next command starts a fresh OAuth flow
pub fn delete_tokens() -> Result<()> {
    let path = tokens_path()?;

    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete tokens file at {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            calendar_name = "Uni"
            calendar_id = "abc123@group.calendar.google.com"
            cutoff_days = 7

            [google]
            client_id = "id.apps.googleusercontent.com"
            client_secret = "secret"
            "#,
        )
        .expect("Should parse");

        assert_eq!(config.calendar_name, "Uni");
        assert_eq!(
            config.calendar_id.as_deref(),
            Some("abc123@group.calendar.google.com")
        );
        assert_eq!(config.cutoff_days, 7);
        assert_eq!(config.google.client_id, "id.apps.googleusercontent.com");
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            [google]
            client_id = "id"
            client_secret = "secret"
            "#,
        )
        .expect("Should parse");

        assert_eq!(config.calendar_name, "Study");
        assert_eq!(config.calendar_id, None);
        assert_eq!(config.cutoff_days, 30);
    }
}
