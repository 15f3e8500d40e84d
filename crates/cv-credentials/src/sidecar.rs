//! Non-sensitive metadata sidecar: `$HOME/.cv-git/credentials-metadata.json`.
//!
//! Writes are serialized on this file (single-process store, §4.7) and use
//! an atomic temp-file-then-rename so a crash mid-write never leaves a
//! corrupt sidecar.

use crate::errors::Result;
use crate::model::CredentialMetadata;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct SidecarFile {
    #[serde(default)]
    credentials: Vec<CredentialMetadata>,
}

pub struct Sidecar {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Sidecar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn default_path() -> PathBuf {
        let home = dirs_home();
        home.join(".cv-git").join("credentials-metadata.json")
    }

    fn read(&self) -> Result<SidecarFile> {
        if !self.path.exists() {
            return Ok(SidecarFile::default());
        }
        let bytes = fs::read(&self.path)?;
        if bytes.is_empty() {
            return Ok(SidecarFile::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_atomic(&self, file: &SidecarFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(file)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<CredentialMetadata>> {
        Ok(self.read()?.credentials)
    }

    pub fn find(
        &self,
        credential_type: crate::model::CredentialType,
        name: &str,
    ) -> Result<Option<CredentialMetadata>> {
        Ok(self
            .read()?
            .credentials
            .into_iter()
            .find(|m| m.credential_type == credential_type && m.name == name))
    }

    pub fn find_by_type(
        &self,
        credential_type: crate::model::CredentialType,
    ) -> Result<Vec<CredentialMetadata>> {
        Ok(self
            .read()?
            .credentials
            .into_iter()
            .filter(|m| m.credential_type == credential_type)
            .collect())
    }

    pub fn upsert(&self, meta: CredentialMetadata) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut file = self.read()?;
        if let Some(existing) = file
            .credentials
            .iter_mut()
            .find(|m| m.credential_type == meta.credential_type && m.name == meta.name)
        {
            *existing = meta;
        } else {
            file.credentials.push(meta);
        }
        self.write_atomic(&file)?;
        debug!("sidecar upserted");
        Ok(())
    }

    pub fn remove(
        &self,
        credential_type: crate::model::CredentialType,
        name: &str,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap();
        let mut file = self.read()?;
        let before = file.credentials.len();
        file.credentials
            .retain(|m| !(m.credential_type == credential_type && m.name == name));
        let removed = file.credentials.len() != before;
        if removed {
            self.write_atomic(&file)?;
        }
        Ok(removed)
    }
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(".").to_path_buf())
}
