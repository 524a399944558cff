//! # Sesame
//!
//! `sesame` is a thin credential gateway. It exposes a single authentication
//! endpoint that, depending on the requested mode, either verifies a password
//! against the user record held by a Hasura GraphQL backend (login) or
//! creates a new record with a freshly hashed password (signup). Both paths
//! end in the same place: a short-lived HS256 session token carrying
//! Hasura-style claims, returned in the JSON payload and set as a
//! script-readable cookie for front-end state hydration.
//!
//! The service owns no user data. The GraphQL backend is the system of
//! record; `sesame` only reads and occasionally inserts, authenticated with
//! an admin-level shared secret.

pub mod api;
pub mod cli;
pub mod hasura;
pub mod session;
pub mod validation;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
