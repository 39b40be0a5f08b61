//! Service-account credentials for Google Cloud Storage.
//!
//! The four secret fields come from the process environment (a `.env` file
//! is loaded by the binary before this runs). Nothing here touches the network.

use std::fmt;

use hsm_common::{HsmError, HsmResult};
use serde::Serialize;

pub const PRIVATE_KEY_ID_VAR: &str = "SP_PRIVATE_KEY_ID";
pub const PRIVATE_KEY_VAR: &str = "SP_PRIVATE_KEY";
pub const CLIENT_EMAIL_VAR: &str = "SP_CLIENT_EMAIL";
pub const CLIENT_ID_VAR: &str = "SP_CLIENT_ID";

/// Every variable that must be set for credentialed access.
pub const REQUIRED_VARS: [&str; 4] = [
    PRIVATE_KEY_ID_VAR,
    PRIVATE_KEY_VAR,
    CLIENT_EMAIL_VAR,
    CLIENT_ID_VAR,
];

/// A GCP service account identity.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ServiceAccountCredentials {
    #[serde(rename = "type")]
    account_type: &'static str,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    token_uri: &'static str,
}

impl ServiceAccountCredentials {
    /// Read credentials from the process environment.
    pub fn from_env(project_id: &str) -> HsmResult<Self> {
        Self::from_lookup(project_id, |name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`, which maps a variable name to its value.
    ///
    /// Missing or blank variables are reported together as a configuration
    /// error. Escaped `\n` sequences in the private key become real newlines.
    pub fn from_lookup<F>(project_id: &str, lookup: F) -> HsmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| read(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(HsmError::Configuration(format!(
                "missing service account environment variables: {}",
                missing.join(", ")
            )));
        }

        let value = |name: &str| read(name).unwrap_or_default();
        Ok(Self {
            account_type: "service_account",
            project_id: project_id.to_string(),
            private_key_id: value(PRIVATE_KEY_ID_VAR),
            private_key: value(PRIVATE_KEY_VAR).replace("\\n", "\n"),
            client_email: value(CLIENT_EMAIL_VAR),
            client_id: value(CLIENT_ID_VAR),
            token_uri: "https://oauth2.googleapis.com/token",
        })
    }

    /// The key file JSON Google client libraries expect.
    pub fn to_key_json(&self) -> HsmResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .finish()
    }
}
