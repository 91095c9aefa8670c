//! Credentials from the environment.
//!
//! The settings file deliberately never carries secrets; only the standard
//! environment variables (or a `.env` file loaded at startup) are honored.

use super::client::AwsError;

/// Static credentials for request signing.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    /// Read credentials from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`
    /// (and `AWS_SESSION_TOKEN` when present).
    pub fn from_env() -> Result<Self, AwsError> {
        let access_key_id = require_env("AWS_ACCESS_KEY_ID")?;
        let secret_access_key = require_env("AWS_SECRET_ACCESS_KEY")?;
        let session_token = std::env::var("AWS_SESSION_TOKEN")
            .ok()
            .filter(|v| !v.is_empty());

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }
}

fn require_env(var: &str) -> Result<String, AwsError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AwsError::MissingCredentials(var.to_string()))
}
