//! Secret-bearing backends: OS keychain (preferred) and a plain-file
//! fallback with owner-only permissions. Selection is automatic and
//! observable via [`SecretBackend::kind`].

use crate::errors::{CredentialError, Result};
use crate::model::{Credential, CredentialKey, StorageBackendKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

const SERVICE: &str = "cv-git";

pub trait SecretBackend: Send + Sync {
    fn kind(&self) -> StorageBackendKind;
    fn store(&self, cred: &Credential) -> Result<()>;
    fn load(&self, key: &CredentialKey) -> Result<Option<Credential>>;
    fn delete(&self, key: &CredentialKey) -> Result<()>;
}

pub struct KeychainBackend;

impl KeychainBackend {
    /// Probes the OS keychain by round-tripping a throwaway entry. Returns
    /// `None` if the keychain is unavailable on this host.
    pub fn probe() -> Option<Self> {
        let entry = keyring::Entry::new(SERVICE, "__cv_probe__").ok()?;
        match entry.set_password("probe") {
            Ok(()) => {
                let _ = entry.delete_credential();
                Some(Self)
            }
            Err(e) => {
                debug!(%e, "keychain probe failed");
                None
            }
        }
    }

    fn entry(&self, key: &CredentialKey) -> Result<keyring::Entry> {
        keyring::Entry::new(SERVICE, &key.storage_id())
            .map_err(|e| CredentialError::KeychainUnavailable(e.to_string()))
    }
}

impl SecretBackend for KeychainBackend {
    fn kind(&self) -> StorageBackendKind {
        StorageBackendKind::Keychain
    }

    fn store(&self, cred: &Credential) -> Result<()> {
        let payload = serde_json::to_string(cred)?;
        self.entry(&cred.key)?
            .set_password(&payload)
            .map_err(|e| CredentialError::KeychainUnavailable(e.to_string()))
    }

    fn load(&self, key: &CredentialKey) -> Result<Option<Credential>> {
        match self.entry(key)?.get_password() {
            Ok(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::KeychainUnavailable(e.to_string())),
        }
    }

    fn delete(&self, key: &CredentialKey) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::KeychainUnavailable(e.to_string())),
        }
    }
}

/// Plain-file fallback. One JSON file per credential under `base_dir`,
/// written with owner-only read permissions on unix.
pub struct FileBackend {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn default_dir() -> PathBuf {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(".").to_path_buf());
        home.join(".cv-git").join("secrets")
    }

    fn path_for(&self, key: &CredentialKey) -> PathBuf {
        let safe = key.storage_id().replace('/', "__");
        self.base_dir.join(format!("{safe}.json"))
    }

    fn restrict_permissions(path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }
        #[cfg(not(unix))]
        {
            let _ = path;
        }
        Ok(())
    }
}

impl SecretBackend for FileBackend {
    fn kind(&self) -> StorageBackendKind {
        StorageBackendKind::File
    }

    fn store(&self, cred: &Credential) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        fs::create_dir_all(&self.base_dir)?;
        let path = self.path_for(&cred.key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(cred)?)?;
        fs::rename(&tmp, &path)?;
        Self::restrict_permissions(&path)?;
        Ok(())
    }

    fn load(&self, key: &CredentialKey) -> Result<Option<Credential>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn delete(&self, key: &CredentialKey) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Probes the keychain once and returns the backend to use for the rest of
/// the process lifetime. Never fails: worst case is the file backend.
pub fn select_backend() -> Box<dyn SecretBackend> {
    match KeychainBackend::probe() {
        Some(kc) => Box::new(kc),
        None => {
            warn!("OS keychain unavailable, falling back to plain-file credential storage");
            Box::new(FileBackend::new(FileBackend::default_dir()))
        }
    }
}
