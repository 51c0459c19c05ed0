use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config;
use crate::gcal;

pub async fn run(open_browser: bool) -> Result<()> {
    let config = config::load_config()?;

    println!("Authenticating with Google Calendar...");

    let tokens = super::authenticate_and_save(&config, open_browser).await?;

    let email = gcal::fetch_user_email(&config.google, &tokens).await?;
    println!("\nAuthenticated as: {}", email.green());
    println!("\nRun `plansync import <schedule.ics>` to import your class schedule.");

    Ok(())
}
