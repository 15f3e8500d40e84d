//! Typed, namespaced credential store backing every outbound integration.
//!
//! Backend selection (OS keychain, falling back to a plain file) happens
//! once at [`CredentialStore::init`] and is observable via
//! [`CredentialStore::storage_backend`]. Secrets never leave [`backend`];
//! everything else in the toolkit talks to the sidecar-backed metadata or
//! goes through [`CredentialStore::get_git_platform_token`].

pub mod backend;
pub mod errors;
pub mod model;
pub mod sidecar;
pub mod store;

pub use errors::CredentialError;
pub use model::{AuthMethod, Credential, CredentialKey, CredentialMetadata, CredentialType, StorageBackendKind};
pub use store::{CredentialStore, HubTokenIssuer};
