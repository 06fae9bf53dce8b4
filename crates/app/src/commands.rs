//! Command execution.

use std::path::Path;
use std::sync::Arc;

use sea_application::{ApplicationError, TokenStatus};
use sea_domain::{ApiRequest, AuthError, Credentials, User};
use sea_infrastructure::{ConfigError, FileStorage, HttpSetupError, SessionServices, load_settings};
use thiserror::Error;

use crate::cli::{Cli, Command};

/// Errors reported to the user.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Setup(#[from] HttpSetupError),

    /// Request or session failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Login failed.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// No `--storage` given and no platform config directory.
    #[error("no config directory found, pass --storage")]
    NoStoragePath,

    /// `--data` is not valid JSON.
    #[error("request body is not valid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

pub async fn run(cli: Cli) -> Result<(), CommandError> {
    let settings = load_settings(cli.config.as_deref())?;
    let session_file = cli
        .storage
        .or_else(FileStorage::default_path)
        .ok_or(CommandError::NoStoragePath)?;
    let services = SessionServices::new(settings, Arc::new(FileStorage::open(&session_file)))?;
    tracing::debug!(session_file = %session_file.display(), "Session storage opened");

    match cli.command {
        Command::Login { email, password } => login(&services, email, password).await,
        Command::Logout => {
            services.session.logout().await;
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            status(&services, &session_file);
            Ok(())
        }
        Command::Whoami => whoami(&services).await,
        Command::Request {
            path,
            method,
            data,
            raw,
        } => {
            let mut request = ApiRequest::new(method, path);
            if let Some(data) = data {
                request = request.with_body(serde_json::from_str(&data)?);
            }
            if raw {
                request = request.skip_error_handling();
            }
            send(&services, request).await
        }
    }
}

async fn login(
    services: &SessionServices,
    email: String,
    password: String,
) -> Result<(), CommandError> {
    let user = services
        .session
        .login(&Credentials::new(email, password))
        .await?;
    println!("Logged in as {} <{}>", user.display_name(), user.email);
    Ok(())
}

fn status(services: &SessionServices, session_file: &Path) {
    let status = services.tokens.status();
    println!("Session file: {}", session_file.display());
    println!("Access token: {}", status.display_message());
    let idle = services
        .tokens
        .is_session_expired(services.settings.auth.idle_timeout());
    if status != TokenStatus::NotAuthenticated && idle {
        println!(
            "Idle for more than {} minutes, the next command signs out",
            services.settings.auth.idle_timeout_minutes
        );
    }
}

async fn whoami(services: &SessionServices) -> Result<(), CommandError> {
    let user = restore(services).await?;
    services.session.record_activity();
    println!("{} <{}>", user.display_name(), user.email);
    if !user.roles.is_empty() {
        println!("Roles: {}", user.roles.join(", "));
    }
    Ok(())
}

async fn send(services: &SessionServices, request: ApiRequest) -> Result<(), CommandError> {
    restore(services).await?;
    let response = services.client.execute(request).await?;
    services.session.record_activity();

    match serde_json::from_slice::<serde_json::Value>(&response.body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", response.text()),
    }
    if !response.is_success() {
        eprintln!("HTTP {}", response.status);
    }
    Ok(())
}

/// Ends an idle session, then reconciles the stored one with the server.
async fn restore(services: &SessionServices) -> Result<User, CommandError> {
    if services.session.enforce_idle_timeout().await {
        eprintln!("Session expired after inactivity, please log in again");
        return Err(AuthError::NotAuthenticated.into());
    }
    if !services.session.mount().await {
        return Err(AuthError::NotAuthenticated.into());
    }
    services.session.user().ok_or(CommandError::Auth(AuthError::NotAuthenticated))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use sea_application::ports::KeyValueStorage;
    use sea_domain::SeaSettings;
    use sea_infrastructure::MemoryStorage;
    use serde_json::json;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_whoami_counts_as_activity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {"id": "u1", "email": "ada@example.com", "name": "Ada"}
            })))
            .mount(&server)
            .await;
        let mut settings = SeaSettings::default();
        settings.api.base_url = format!("{}/api", server.uri());
        let storage = Arc::new(MemoryStorage::new());
        let services = SessionServices::new(settings, storage.clone()).unwrap();
        services.tokens.set_tokens("a1", "r1", Some(3600)).unwrap();
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        let twenty_minutes_ago = now - Duration::from_secs(20 * 60);
        storage
            .set("sea.last_activity", &twenty_minutes_ago.as_millis().to_string())
            .unwrap();

        whoami(&services).await.unwrap();

        assert!(!services.tokens.is_session_expired(Duration::from_secs(60)));
    }
}
