//! Credential shapes and the `(type, name)` key every record is addressed by.

use cv_core::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    GitPlatform,
    ApiKey,
    AwsKeys,
    Ssh,
    Generic,
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredentialType::GitPlatform => "git-platform",
            CredentialType::ApiKey => "api-key",
            CredentialType::AwsKeys => "aws-keys",
            CredentialType::Ssh => "ssh",
            CredentialType::Generic => "generic",
        };
        write!(f, "{s}")
    }
}

/// `(type, name)`: the only key a caller ever looks a credential up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialKey {
    pub credential_type: CredentialType,
    pub name: String,
}

impl CredentialKey {
    pub fn new(credential_type: CredentialType, name: impl Into<String>) -> Self {
        Self {
            credential_type,
            name: name.into(),
        }
    }

    /// Stable backend-facing identifier, e.g. `git-platform/github-default`.
    pub fn storage_id(&self) -> String {
        format!("{}/{}", self.credential_type, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMethod {
    Direct,
    HubProxy,
}

/// The full record, including secret material. Only ever materialized by
/// the secret backend; the sidecar only ever sees [`CredentialMetadata`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub key: CredentialKey,
    pub created_at: Timestamp,
    pub last_used: Option<Timestamp>,

    pub token: Option<String>,
    pub api_key: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub platform: Option<String>,
    pub scopes: Vec<String>,
    pub username: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub auth_method: Option<AuthMethod>,
    pub region: Option<String>,
    pub account_id: Option<String>,
}

impl Credential {
    pub fn new(key: CredentialKey, now: Timestamp) -> Self {
        Self {
            id: uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, key.storage_id().as_bytes())
                .to_string(),
            key,
            created_at: now,
            last_used: None,
            token: None,
            api_key: None,
            access_key_id: None,
            secret_access_key: None,
            platform: None,
            scopes: Vec::new(),
            username: None,
            expires_at: None,
            auth_method: None,
            region: None,
            account_id: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn metadata(&self) -> CredentialMetadata {
        CredentialMetadata {
            id: self.id.clone(),
            credential_type: self.key.credential_type,
            name: self.key.name.clone(),
            created_at: self.created_at,
            last_used: self.last_used,
            platform: self.platform.clone(),
            username: self.username.clone(),
            expires_at: self.expires_at,
            region: self.region.clone(),
            account_id: self.account_id.clone(),
            auth_method: self.auth_method,
        }
    }
}

/// Non-sensitive mirror of a [`Credential`], persisted in the sidecar file.
/// Listing and type-first lookups never touch the secret backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialMetadata {
    pub id: String,
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    pub name: String,
    pub created_at: Timestamp,
    pub last_used: Option<Timestamp>,
    pub platform: Option<String>,
    pub username: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub region: Option<String>,
    pub account_id: Option<String>,
    pub auth_method: Option<AuthMethod>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    Keychain,
    File,
}
