use secrecy::SecretString;

/// Read-only configuration shared with every request.
///
/// The backend URL and the two secrets stay optional all the way into the
/// handler: their absence is a server configuration failure that each
/// request reports as a 500.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub hasura_url: Option<String>,
    pub hasura_admin_secret: Option<SecretString>,
    pub jwt_secret: Option<SecretString>,
    pub environment: String,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(environment: String) -> Self {
        Self {
            hasura_url: None,
            hasura_admin_secret: None,
            jwt_secret: None,
            environment,
        }
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
