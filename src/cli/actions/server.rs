use crate::{api, cli::globals::GlobalArgs};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::{info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub hasura_url: Option<String>,
    pub hasura_admin_secret: Option<SecretString>,
    pub jwt_secret: Option<SecretString>,
    pub environment: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    // Unset configuration is a per-request 500, but a present-and-broken URL
    // is a deployment mistake worth failing on at boot.
    match &args.hasura_url {
        Some(url) => {
            Url::parse(url).with_context(|| format!("Invalid Hasura URL: {url}"))?;
        }
        None => warn!("Hasura URL is not configured; token requests will answer 500"),
    }
    if args.jwt_secret.is_none() {
        warn!("JWT secret is not configured; token requests will answer 500");
    }

    let mut globals = GlobalArgs::new(args.environment);
    globals.hasura_url = args.hasura_url;
    globals.hasura_admin_secret = args.hasura_admin_secret;
    globals.jwt_secret = args.jwt_secret;

    api::new(args.port, globals).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("environment", args.environment.clone()),
        (
            "hasura_url",
            args.hasura_url
                .clone()
                .unwrap_or_else(|| "unset".to_string()),
        ),
        (
            "hasura_admin_secret_set",
            args.hasura_admin_secret.is_some().to_string(),
        ),
        ("jwt_secret_set", args.jwt_secret.is_some().to_string()),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let short_hash = short_commit(crate::GIT_COMMIT_HASH);
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} - {} - {short_hash}\n\n{title}:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
