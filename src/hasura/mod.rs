//! Thin client for the Hasura GraphQL backend that owns the user records.
//!
//! The schema (user fields, role rows, `citext` email) is an external
//! contract: this service depends on it but does not own it, so every
//! user-owned field is optional and validated at the call site.

use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

const GET_USER_QUERY: &str = r"
query GetUser($email: citext!) {
  users(where: {email: {_eq: $email}}) {
    id
    displayName
    email
    passwordHash
    roles { role }
  }
}";

const INSERT_USER_MUTATION: &str = r"
mutation InsertUser($object: users_insert_input!) {
  insertUser(object: $object) {
    id
    email
    passwordHash
  }
}";

/// Locale written into freshly created records.
const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Deserialize)]
pub struct UserRole {
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasuraUser {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

fn graphql_error_message(json_response: &Value) -> &str {
    json_response
        .get("errors")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Fetch a user record by email (the backend's `citext` column makes the
/// match case-insensitive).
///
/// # Errors
/// Returns an error if the request fails, the backend answers a non-success
/// status, or the response carries a GraphQL error.
#[instrument(skip(admin_secret))]
pub async fn get_user_by_email(
    url: &str,
    admin_secret: &SecretString,
    email: &str,
) -> Result<Option<HasuraUser>> {
    let data = execute(url, admin_secret, GET_USER_QUERY, json!({ "email": email })).await?;

    let user = data
        .get("users")
        .and_then(Value::as_array)
        .and_then(|users| users.first())
        .cloned();

    match user {
        Some(user) => Ok(Some(serde_json::from_value(user)?)),
        None => Ok(None),
    }
}

/// Insert a new user record and return its id. The roles list starts empty;
/// role rows are managed elsewhere.
///
/// # Errors
/// Returns an error if the request fails, the backend answers a non-success
/// status, the response carries a GraphQL error, or the new id is missing.
#[instrument(skip(admin_secret, password_hash))]
pub async fn insert_user(
    url: &str,
    admin_secret: &SecretString,
    email: &str,
    password_hash: &str,
) -> Result<String> {
    let variables = json!({
        "object": {
            "email": email,
            "passwordHash": password_hash,
            "locale": DEFAULT_LOCALE,
        }
    });

    let data = execute(url, admin_secret, INSERT_USER_MUTATION, variables).await?;

    data.get("insertUser")
        .and_then(|v| v.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Error parsing JSON response: no id found for inserted user"))
}

async fn execute(
    url: &str,
    admin_secret: &SecretString,
    query: &str,
    variables: Value,
) -> Result<Value> {
    let client = Client::builder().user_agent(crate::APP_USER_AGENT).build()?;

    let payload = json!({ "query": query, "variables": variables });

    debug!("GraphQL request to: {}", url);

    let response = client
        .post(url)
        .header("x-hasura-admin-secret", admin_secret.expose_secret())
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let json_response: Value = response.json().await.unwrap_or(Value::Null);

        return Err(anyhow!(
            "{} - {}, {}",
            url,
            status,
            graphql_error_message(&json_response)
        ));
    }

    let json_response: Value = response.json().await?;

    if json_response.get("errors").is_some() {
        return Err(anyhow!(
            "{}",
            graphql_error_message(&json_response).to_string()
        ));
    }

    json_response
        .get("data")
        .cloned()
        .ok_or_else(|| anyhow!("Error parsing JSON response: no data found"))
}
