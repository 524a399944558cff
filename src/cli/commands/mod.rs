use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    // The Hasura URL, admin secret and JWT secret are deliberately not
    // `required`: a request made while they are unset must answer 500
    // (server configuration failure) instead of the server refusing to boot.
    Command::new("sesame")
        .about("Credential gateway for the studio GraphQL backend")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("SESAME_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("hasura-url")
                .long("hasura-url")
                .help("Hasura GraphQL endpoint, example: https://hasura.tld/v1/graphql")
                .env("HASURA_GRAPHQL_URL"),
        )
        .arg(
            Arg::new("hasura-admin-secret")
                .long("hasura-admin-secret")
                .help("Admin secret sent to the GraphQL endpoint (x-hasura-admin-secret)")
                .env("HASURA_ADMIN_SECRET"),
        )
        .arg(
            Arg::new("jwt-secret")
                .long("jwt-secret")
                .help(r#"JSON-encoded signing secret, example: {"type":"HS256","key":"..."}"#)
                .env("HASURA_GRAPHQL_JWT_SECRET"),
        )
        .arg(
            Arg::new("env")
                .long("env")
                .help("Deployment environment; cookies are only marked Secure in production")
                .default_value("development")
                .env("SESAME_ENV"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("SESAME_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
