use anyhow::{Context, Result};
use clap::{Arg, Command};

/// Parsed auth-related arguments.
#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub session_ttl_seconds: i64,
    pub login_ttl_seconds: u64,
    pub totp_issuer: String,
}

impl Options {
    /// Extract auth options from matched arguments.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        Ok(Self {
            frontend_base_url: matches
                .get_one::<String>("frontend-base-url")
                .cloned()
                .context("missing required argument: --frontend-base-url")?,
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .unwrap_or(604_800),
            login_ttl_seconds: matches
                .get_one::<u64>("login-ttl-seconds")
                .copied()
                .unwrap_or(300),
            totp_issuer: matches
                .get_one::<String>("totp-issuer")
                .cloned()
                .unwrap_or_else(|| "Atelier Admin".to_string()),
        })
    }
}

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Admin frontend base URL; drives CORS, cookies, and login redirects")
                .env("KUSTOS_FRONTEND_BASE_URL")
                .default_value("https://atelier.dev"),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session cookie TTL in seconds")
                .env("KUSTOS_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("login-ttl-seconds")
                .long("login-ttl-seconds")
                .help("TTL for in-flight login attempts")
                .env("KUSTOS_LOGIN_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("totp-issuer")
                .long("totp-issuer")
                .help("Issuer label shown in authenticator apps")
                .env("KUSTOS_TOTP_ISSUER")
                .default_value("Atelier Admin"),
        )
}
