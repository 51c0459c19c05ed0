use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use google_calendar::types::{self, EventDateTime, MinAccessRole, OrderBy, SendUpdates};
use google_calendar::Client;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use thiserror::Error;

use plansync_core::{Category, NormalizedEvent};

use crate::config::{self, AccountTokens, GoogleConfig};

const REDIRECT_PORT: u16 = 8085;
const REDIRECT_URI: &str = "http://localhost:8085/callback";

const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

/// Access tokens are refreshed this long before their recorded expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A token failure that a fresh authentication flow can fix
#[derive(Error, Debug)]
#[error("Google Calendar authentication failed: {0}")]
pub struct AuthError(pub String);

/// Create a Google Calendar client from stored tokens
pub fn create_client(config: &GoogleConfig, tokens: &AccountTokens) -> Client {
    Client::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        REDIRECT_URI.to_string(),
        tokens.access_token.clone(),
        tokens.refresh_token.clone(),
    )
}

/// Create a new client for initial authentication (no tokens yet)
fn create_auth_client(config: &GoogleConfig) -> Client {
    Client::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        REDIRECT_URI.to_string(),
        String::new(),
        String::new(),
    )
}

/// Start a local HTTP server to receive the OAuth callback
/// Returns (code, state)
fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", REDIRECT_PORT))
        .with_context(|| format!("Failed to bind to port {}", REDIRECT_PORT))?;

    println!("Waiting for OAuth callback on port {}...", REDIRECT_PORT);

    let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    // Parse the request to get the code and state
    // Request line looks like: GET /callback?code=xxx&state=yyy HTTP/1.1
    let url_part = request_line
        .split_whitespace()
        .nth(1)
        .context("Invalid request")?;

    let url = url::Url::parse(&format!("http://localhost{}", url_part))?;

    let code = url
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.to_string())
        .context("No code in callback")?;

    let state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.to_string())
        .context("No state in callback")?;

    // Send a response to the browser
    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>Authentication successful!</h1>\
        <p>You can close this window and return to the terminal.</p>\
        </body></html>";

    stream.write_all(response.as_bytes())?;
    stream.flush()?;

    Ok((code, state))
}

/// Run the full OAuth authentication flow
pub async fn authenticate(config: &GoogleConfig, open_browser: bool) -> Result<AccountTokens> {
    let mut client = create_auth_client(config);

    // Get the authorization URL
    let scopes: Vec<String> = SCOPES.iter().map(|s| s.to_string()).collect();
    let auth_url = client.user_consent_url(&scopes);

    println!("\nOpen this URL in your browser to authenticate:\n");
    println!("{}\n", auth_url);

    if open_browser && open::that(&auth_url).is_err() {
        println!("(Could not open browser automatically, please copy the URL above)");
    }

    // Wait for the callback
    let (code, state) = wait_for_callback()?;

    println!("\nReceived authorization code, exchanging for tokens...");

    // Exchange code for tokens
    let access_token = client
        .get_access_token(&code, &state)
        .await
        .context("Failed to exchange code for tokens")?;

    println!("Authentication successful!");

    // Calculate expires_at from expires_in
    let expires_at = if access_token.expires_in > 0 {
        Some(Utc::now() + chrono::Duration::seconds(access_token.expires_in))
    } else {
        None
    };

    Ok(AccountTokens {
        access_token: access_token.access_token,
        refresh_token: access_token.refresh_token,
        expires_at,
    })
}

/// Refresh an expired access token
pub async fn refresh_token(config: &GoogleConfig, tokens: &AccountTokens) -> Result<AccountTokens> {
    let client = create_client(config, tokens);

    let access_token = client
        .refresh_access_token()
        .await
        .context("Failed to refresh token")?;

    // Calculate expires_at from expires_in
    let expires_at = if access_token.expires_in > 0 {
        Some(Utc::now() + chrono::Duration::seconds(access_token.expires_in))
    } else {
        None
    };

    // Google typically doesn't return a new refresh_token on refresh responses,
    // so preserve the original one if the response is empty
    let refresh_token = if access_token.refresh_token.is_empty() {
        tokens.refresh_token.clone()
    } else {
        access_token.refresh_token
    };

    Ok(AccountTokens {
        access_token: access_token.access_token,
        refresh_token,
        expires_at,
    })
}

/// Whether the stored access token is expired or about to expire
pub fn tokens_need_refresh(tokens: &AccountTokens) -> bool {
    match tokens.expires_at {
        Some(expires_at) => {
            expires_at <= Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS)
        }
        // No recorded expiry, assume the worst
        None => true,
    }
}

/// Make sure the stored tokens are usable, refreshing and re-saving when needed
///
/// A failed refresh surfaces as [`AuthError`] so callers can fall back to a
/// fresh authentication flow.
pub async fn ensure_fresh(config: &GoogleConfig, tokens: AccountTokens) -> Result<AccountTokens> {
    if !tokens_need_refresh(&tokens) {
        return Ok(tokens);
    }

    let refreshed = refresh_token(config, &tokens)
        .await
        .map_err(|e| AuthError(e.to_string()))?;

    config::save_tokens(&refreshed)?;

    Ok(refreshed)
}

/// Fetch the user's email to verify authentication
pub async fn fetch_user_email(config: &GoogleConfig, tokens: &AccountTokens) -> Result<String> {
    let client = create_client(config, tokens);

    let response = client
        .calendar_list()
        .list_all(MinAccessRole::default(), false, false)
        .await?;

    // The primary calendar's ID is typically the user's email
    for cal in response.body {
        if cal.primary && !cal.id.is_empty() {
            return Ok(cal.id);
        }
    }

    Ok("(unknown email)".to_string())
}

/// A calendar from the user's calendar list
#[derive(Debug)]
pub struct CalendarEntry {
    pub id: String,
    pub name: String,
    pub primary: bool,
}

/// Fetch the list of calendars for the authenticated user
pub async fn fetch_calendars(
    config: &GoogleConfig,
    tokens: &AccountTokens,
) -> Result<Vec<CalendarEntry>> {
    let client = create_client(config, tokens);

    let response = client
        .calendar_list()
        .list_all(MinAccessRole::default(), false, false)
        .await
        .context("Failed to fetch calendars")?;

    Ok(response
        .body
        .into_iter()
        .filter(|c| !c.id.is_empty())
        .map(|c| CalendarEntry {
            id: c.id,
            name: if c.summary.is_empty() {
                "(unnamed)".to_string()
            } else {
                c.summary
            },
            primary: c.primary,
        })
        .collect())
}

/// Create a calendar and return its ID
pub async fn create_calendar(
    config: &GoogleConfig,
    tokens: &AccountTokens,
    name: &str,
) -> Result<String> {
    let client = create_client(config, tokens);

    let response = client
        .calendars()
        .insert(&named_calendar(name))
        .await
        .with_context(|| format!("Failed to create calendar: {}", name))?;

    Ok(response.body.id)
}

/// Request body for a new calendar
///
/// The API type has no Default impl, so every field is spelled out.
fn named_calendar(name: &str) -> types::Calendar {
    types::Calendar {
        conference_properties: None,
        description: String::new(),
        etag: String::new(),
        id: String::new(),
        kind: String::new(),
        location: String::new(),
        summary: name.to_string(),
        time_zone: String::new(),
    }
}

/// Delete a calendar entirely
pub async fn delete_calendar(
    config: &GoogleConfig,
    tokens: &AccountTokens,
    calendar_id: &str,
) -> Result<()> {
    let client = create_client(config, tokens);

    client
        .calendars()
        .delete(calendar_id)
        .await
        .with_context(|| format!("Failed to delete calendar: {}", calendar_id))?;

    Ok(())
}

/// Fetch the account's calendar timezone setting
pub async fn fetch_timezone(config: &GoogleConfig, tokens: &AccountTokens) -> Result<Tz> {
    let client = create_client(config, tokens);

    let response = client
        .settings()
        .get("timezone")
        .await
        .context("Failed to fetch calendar timezone setting")?;

    let value = response.body.value;
    let tz = value
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Unrecognized calendar timezone {:?}: {}", value, e))?;

    Ok(tz)
}

/// List IDs of events starting after the given instant
pub async fn list_event_ids(
    config: &GoogleConfig,
    tokens: &AccountTokens,
    calendar_id: &str,
    after: DateTime<Utc>,
) -> Result<Vec<String>> {
    let client = create_client(config, tokens);

    let time_min = after.to_rfc3339();

    let response = client
        .events()
        .list_all(
            calendar_id,
            "",                 // i_cal_uid
            0,                  // max_attendees
            OrderBy::default(), // order_by
            &[],                // private_extended_property
            "",                 // q (search query)
            &[],                // shared_extended_property
            false,              // show_deleted
            false,              // show_hidden_invitations
            false,              // single_events
            "",                 // time_max (unbounded)
            &time_min,          // time_min
            "",                 // time_zone
            "",                 // updated_min
        )
        .await
        .context("Failed to list events")?;

    Ok(response
        .body
        .into_iter()
        .filter(|e| !e.id.is_empty())
        .map(|e| e.id)
        .collect())
}

/// Delete an event, tolerating ones that are already gone
pub async fn delete_event(
    config: &GoogleConfig,
    tokens: &AccountTokens,
    calendar_id: &str,
    event_id: &str,
) -> Result<()> {
    let client = create_client(config, tokens);

    let result = client
        .events()
        .delete(calendar_id, event_id, false, SendUpdates::None)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            let error_str = e.to_string();
            if error_str.contains("410") || error_str.contains("Gone") {
                Ok(())
            } else {
                Err(e).with_context(|| format!("Failed to delete event: {}", event_id))
            }
        }
    }
}

/// Insert a normalized event into a calendar
pub async fn insert_event(
    config: &GoogleConfig,
    tokens: &AccountTokens,
    calendar_id: &str,
    event: &NormalizedEvent,
) -> Result<()> {
    let client = create_client(config, tokens);

    let google_event = to_google_event(event);

    client
        .events()
        .insert(
            calendar_id,
            0,                 // conference_data_version
            0,                 // max_attendees
            false,             // send_notifications (deprecated)
            SendUpdates::None, // send_updates
            false,             // supports_attachments
            &google_event,
        )
        .await
        .with_context(|| format!("Failed to create event: {}", event.summary))?;

    Ok(())
}

/// Convert a normalized event to a Google Calendar API Event
fn to_google_event(event: &NormalizedEvent) -> types::Event {
    types::Event {
        summary: event.summary.clone(),
        description: event.description.clone(),
        start: Some(zoned_time(event.start)),
        end: Some(zoned_time(event.end)),
        color_id: color_id(&event.category).to_string(),
        // Leave everything else at defaults
        ..Default::default()
    }
}

fn zoned_time(dt: DateTime<Tz>) -> EventDateTime {
    EventDateTime {
        date: None,
        date_time: Some(dt.with_timezone(&Utc)),
        time_zone: dt.timezone().name().to_string(),
    }
}

/// Event color shown in Google Calendar, keyed by class type
pub fn color_id(category: &Category) -> &'static str {
    match category {
        Category::Exam => "11",             // Tomato
        Category::OnlineOrCancelled => "3", // Grape
        Category::Lecture => "8",           // Graphite
        Category::Lab => "7",               // Peacock
        Category::Exercise => "10",         // Basil
        Category::Unclassified => "5",      // Banana
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_colors_by_category() {
        assert_eq!(color_id(&Category::Exam), "11");
        assert_eq!(color_id(&Category::OnlineOrCancelled), "3");
        assert_eq!(color_id(&Category::Lecture), "8");
        assert_eq!(color_id(&Category::Lab), "7");
        assert_eq!(color_id(&Category::Exercise), "10");
        assert_eq!(color_id(&Category::Unclassified), "5");
    }

    #[test]
    fn test_to_google_event_converts_to_utc() {
        let tz: Tz = "Europe/Warsaw".parse().unwrap();
        let event = NormalizedEvent {
            summary: "A 101 Algebra".to_string(),
            description: "Sala: A 101\nGrupy: Wyk".to_string(),
            start: tz.with_ymd_and_hms(2024, 3, 4, 8, 15, 0).unwrap(),
            end: tz.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            category: Category::Lecture,
        };

        let google_event = to_google_event(&event);

        let start = google_event.start.expect("Should have a start");
        assert_eq!(
            start.date_time,
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 7, 15, 0).unwrap())
        );
        assert_eq!(start.time_zone, "Europe/Warsaw");
        assert_eq!(google_event.description, "Sala: A 101\nGrupy: Wyk");
        assert_eq!(google_event.color_id, "8");
    }

    #[test]
    fn test_named_calendar_sets_only_the_summary() {
        let body = named_calendar("Study");

        assert_eq!(body.summary, "Study");
        assert!(body.id.is_empty());
        assert!(body.time_zone.is_empty());
        assert!(body.conference_properties.is_none());
    }

    #[test]
    fn test_fresh_tokens_are_kept() {
        let tokens = AccountTokens {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        };

        assert!(!tokens_need_refresh(&tokens));
    }

    #[test]
    fn test_tokens_near_expiry_need_refresh() {
        let tokens = AccountTokens {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Some(Utc::now() + chrono::Duration::seconds(30)),
        };

        assert!(tokens_need_refresh(&tokens));
    }

    #[test]
    fn test_unknown_expiry_forces_refresh() {
        let tokens = AccountTokens {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: None,
        };

        assert!(tokens_need_refresh(&tokens));
    }
}
