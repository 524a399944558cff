use crate::cli::actions::{server::Args, Action};
use anyhow::Result;
use secrecy::SecretString;

/// Map parsed CLI matches to the action to run.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let hasura_url = matches.get_one::<String>("hasura-url").cloned();
    let hasura_admin_secret = matches
        .get_one::<String>("hasura-admin-secret")
        .map(|s| SecretString::from(s.clone()));
    let jwt_secret = matches
        .get_one::<String>("jwt-secret")
        .map(|s| SecretString::from(s.clone()));
    let environment = matches
        .get_one::<String>("env")
        .cloned()
        .unwrap_or_else(|| "development".to_string());

    Ok(Action::Server(Args {
        port,
        hasura_url,
        hasura_admin_secret,
        jwt_secret,
        environment,
    }))
}
