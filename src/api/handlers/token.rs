//! The authentication endpoint: one `POST` accepting a login or signup
//! request and answering with a signed session token, a user summary and a
//! `Set-Cookie` carrying the token.

use crate::{
    cli::globals::GlobalArgs,
    hasura::{self, HasuraUser},
    session::{self, SigningKey},
};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{future::Future, pin::Pin, sync::Arc};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

// Client-facing messages. Internal detail goes to the log, never to the
// caller; the two bad-credential cases share one message on purpose.
const MSG_SERVER_CONFIG: &str = "Server configuration error.";
const MSG_SERVER_CONFIG_JWT: &str = "Server configuration error (JWT).";
const MSG_JWT_SECRET_MALFORMED: &str = "Server JWT secret is misconfigured.";
const MSG_CREDENTIALS_REQUIRED: &str = "Email and password are required.";
const MSG_BAD_CREDENTIALS: &str = "Incorrect email or password.";
const MSG_RECORD_MISSING_ID: &str = "User record is incomplete (missing ID).";
const MSG_RECORD_MISSING_HASH: &str = "User record is incomplete (missing password).";
const MSG_PASSWORD_MISMATCH: &str = "Password and confirmation do not match.";
const MSG_EMAIL_TAKEN: &str = "Email address is already in use.";
const MSG_UNEXPECTED: &str = "An unexpected error occurred.";

#[derive(ToSchema, Deserialize, Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub roles: Vec<String>,
}

/// Non-authoritative issuance metadata; only present outside production.
#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub server_time: String,
    pub iat: i64,
    pub exp: i64,
    pub env: String,
    pub forwarded_proto: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub user: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    pub message: String,
}

type Reject = (StatusCode, Json<ErrorBody>);
type AuthResult = Result<(StatusCode, CookieJar, Json<TokenResponse>), Reject>;

fn reject(status: StatusCode, message: &str) -> Reject {
    (
        status,
        Json(ErrorBody {
            message: message.to_string(),
        }),
    )
}

/// The user store behind the endpoint. A seam so the flows can be exercised
/// without the GraphQL backend.
trait UserDirectory {
    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<HasuraUser>>> + Send + 'a>>;

    fn create<'a>(
        &'a self,
        email: &'a str,
        password_hash: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

struct HasuraDirectory {
    url: String,
    admin_secret: SecretString,
}

impl UserDirectory for HasuraDirectory {
    fn find_by_email<'a>(
        &'a self,
        email: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<HasuraUser>>> + Send + 'a>> {
        Box::pin(hasura::get_user_by_email(
            &self.url,
            &self.admin_secret,
            email,
        ))
    }

    fn create<'a>(
        &'a self,
        email: &'a str,
        password_hash: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(hasura::insert_user(
            &self.url,
            &self.admin_secret,
            email,
            password_hash,
        ))
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Authenticated; session token issued", body = TokenResponse),
        (status = 400, description = "Malformed input, password mismatch or duplicate email", body = ErrorBody),
        (status = 401, description = "Unknown email or wrong password", body = ErrorBody),
        (status = 500, description = "Server configuration or upstream failure", body = ErrorBody),
    ),
    tag = "auth",
)]
#[instrument(skip(globals, headers, payload))]
pub async fn token(
    Extension(globals): Extension<Arc<GlobalArgs>>,
    headers: HeaderMap,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> AuthResult {
    // Configuration preconditions come first: their absence is a server
    // defect, reported before the body is even looked at.
    let url = globals.hasura_url.clone().ok_or_else(|| {
        error!("FATAL: Missing Hasura URL");
        reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_CONFIG)
    })?;
    let admin_secret = globals.hasura_admin_secret.clone().ok_or_else(|| {
        error!("FATAL: Missing Hasura admin secret");
        reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_CONFIG)
    })?;
    let jwt_secret = globals.jwt_secret.clone().ok_or_else(|| {
        error!("FATAL: Missing JWT Secret");
        reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_SERVER_CONFIG_JWT)
    })?;

    let Json(request) = payload.map_err(|err| {
        error!("Failed to parse request body: {err}");
        reject(StatusCode::BAD_REQUEST, MSG_CREDENTIALS_REQUIRED)
    })?;

    if request.email.is_empty() || request.password.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST, MSG_CREDENTIALS_REQUIRED));
    }

    let directory = HasuraDirectory { url, admin_secret };

    let user = match request.mode {
        AuthMode::Signup => signup(&directory, &request).await?,
        AuthMode::Login => login(&directory, &request.email, &request.password).await?,
    };

    issue_session(
        &user,
        &jwt_secret,
        &globals.environment,
        forwarded_proto(&headers),
    )
}

fn forwarded_proto(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn login<D: UserDirectory>(
    directory: &D,
    email: &str,
    password: &str,
) -> Result<HasuraUser, Reject> {
    let user = directory.find_by_email(email).await.map_err(|err| {
        error!("Failed to fetch user record: {err:#}");
        reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_UNEXPECTED)
    })?;

    let Some(user) = user else {
        return Err(reject(StatusCode::UNAUTHORIZED, MSG_BAD_CREDENTIALS));
    };

    // The record is owned by the backend; an incomplete one is a data
    // integrity failure, not an authentication failure.
    if user.id.is_none() {
        error!("User record found but missing an id: {:?}", user);
        return Err(reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            MSG_RECORD_MISSING_ID,
        ));
    }

    let Some(hash) = user.password_hash.as_deref() else {
        error!("User record found but missing a password hash: {:?}", user);
        return Err(reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            MSG_RECORD_MISSING_HASH,
        ));
    };

    let valid = session::verify_password(password, hash).map_err(|err| {
        error!("Password verification failed: {err:#}");
        reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_UNEXPECTED)
    })?;

    if !valid {
        return Err(reject(StatusCode::UNAUTHORIZED, MSG_BAD_CREDENTIALS));
    }

    Ok(user)
}

async fn signup<D: UserDirectory>(
    directory: &D,
    request: &TokenRequest,
) -> Result<HasuraUser, Reject> {
    // Mismatch is rejected before any data-service call is made.
    if request.confirm_password.as_deref() != Some(request.password.as_str()) {
        return Err(reject(StatusCode::BAD_REQUEST, MSG_PASSWORD_MISMATCH));
    }

    let existing = directory.find_by_email(&request.email).await.map_err(|err| {
        error!("Failed to check for an existing user: {err:#}");
        reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_UNEXPECTED)
    })?;

    if existing.is_some() {
        return Err(reject(StatusCode::BAD_REQUEST, MSG_EMAIL_TAKEN));
    }

    let password_hash = session::hash_password(&request.password).map_err(|err| {
        error!("Failed to hash password: {err:#}");
        reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_UNEXPECTED)
    })?;

    let id = directory
        .create(&request.email, &password_hash)
        .await
        .map_err(|err| {
            error!("Failed to insert user record: {err:#}");
            reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_UNEXPECTED)
        })?;

    Ok(HasuraUser {
        id: Some(id),
        display_name: Some(String::new()),
        email: Some(request.email.clone()),
        password_hash: Some(password_hash),
        roles: Vec::new(),
    })
}

fn issue_session(
    user: &HasuraUser,
    jwt_secret: &SecretString,
    environment: &str,
    forwarded_proto: Option<String>,
) -> AuthResult {
    let signing_key = SigningKey::parse(jwt_secret).map_err(|err| {
        error!("Error parsing signing secret: {err:#}");
        reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            MSG_JWT_SECRET_MALFORMED,
        )
    })?;

    let Some(id) = user.id.as_deref() else {
        error!("Token issuance reached without a user id: {:?}", user);
        return Err(reject(
            StatusCode::INTERNAL_SERVER_ERROR,
            MSG_RECORD_MISSING_ID,
        ));
    };

    let roles: Vec<String> = user.roles.iter().map(|r| r.role.clone()).collect();
    let now = Utc::now().timestamp();
    let claims = session::make_claims(id, &roles, now);

    let token = session::sign(&claims, &signing_key).map_err(|err| {
        error!("Failed to sign session token: {err:#}");
        reject(StatusCode::INTERNAL_SERVER_ERROR, MSG_UNEXPECTED)
    })?;

    let secure = session::cookie_secure(environment, forwarded_proto.as_deref());

    info!(
        "Setting session cookie. secure: {}, forwarded_proto: {:?}",
        secure, forwarded_proto
    );

    let jar = CookieJar::new().add(session::session_cookie(&token, secure));

    let debug = (environment != "production").then(|| DebugInfo {
        server_time: Utc::now().to_rfc3339(),
        iat: claims.iat,
        exp: now + session::TOKEN_TTL,
        env: environment.to_string(),
        forwarded_proto,
    });

    let body = TokenResponse {
        access_token: token,
        user: UserSummary {
            id: id.to_string(),
            display_name: user.display_name.clone().unwrap_or_default(),
            email: user.email.clone().unwrap_or_default(),
            roles: claims.hasura.allowed_roles.clone(),
        },
        debug,
    };

    Ok((StatusCode::OK, jar, Json(body)))
}
