//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sea_domain::HttpMethod;

#[derive(Debug, Parser)]
#[command(name = "sea")]
#[command(about = "Sign in to a Sea backend and call its API")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML, JSON or YAML); `SEA_*` variables override it
    #[arg(short, long, global = true, env = "SEA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Session file; defaults to `<config dir>/sea/session.json`
    #[arg(short, long, global = true, env = "SEA_SESSION_FILE")]
    pub storage: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(short, long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,
        /// Account password
        #[arg(short, long, env = "SEA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the stored token state without contacting the server
    Status,
    /// Restore the session and print the current user
    Whoami,
    /// Send an authenticated request and print the response body
    #[command(alias = "get")]
    Request {
        /// Path relative to the API base URL
        path: String,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET", value_parser = parse_method)]
        method: HttpMethod,
        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
        /// Print non-success responses instead of failing
        #[arg(long)]
        raw: bool,
    },
}

fn parse_method(value: &str) -> Result<HttpMethod, String> {
    value.parse().map_err(|e: sea_domain::DomainError| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from([
            "sea",
            "--storage",
            "/tmp/s.json",
            "login",
            "-e",
            "ada@example.com",
            "-p",
            "pw",
        ])
        .unwrap();
        assert_eq!(cli.storage, Some(PathBuf::from("/tmp/s.json")));
        let Command::Login { email, password } = cli.command else {
            panic!("expected login");
        };
        assert_eq!(email, "ada@example.com");
        assert_eq!(password, "pw");
    }

    #[test]
    fn test_parse_request_defaults_to_get() {
        let cli = Cli::try_parse_from(["sea", "request", "/projects"]).unwrap();
        let Command::Request {
            path, method, data, raw,
        } = cli.command
        else {
            panic!("expected request");
        };
        assert_eq!(path, "/projects");
        assert_eq!(method, HttpMethod::Get);
        assert_eq!(data, None);
        assert!(!raw);
    }

    #[test]
    fn test_parse_request_method_case_insensitive() {
        let cli =
            Cli::try_parse_from(["sea", "request", "-X", "post", "/projects", "-d", "{}"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Request {
                method: HttpMethod::Post,
                ..
            }
        ));
    }

    #[test]
    fn test_get_alias() {
        let cli = Cli::try_parse_from(["sea", "get", "/projects"]).unwrap();
        assert!(matches!(cli.command, Command::Request { .. }));
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(Cli::try_parse_from(["sea", "request", "-X", "TRACE", "/x"]).is_err());
    }
}
