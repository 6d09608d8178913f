//! Local credential/identity record: a single JSON object
//! `{"api_key": …, "name": …}` persisted per user. Supplied once, re-read on
//! later launches, and deleted when validation fails or the user resets it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::{Credentials, BASE_URL};

const CONFIG_FILE_NAME: &str = ".assistant-gpt-key.json";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: String,
    pub name: String,
}

impl Config {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.api_key.clone(), BASE_URL)
    }
}

/// Reads and writes the credential file at a fixed path. Assumes a single
/// process; there is no cross-process locking.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the per-user default location, `None` when no home directory
    /// can be determined.
    pub fn from_home() -> Option<Self> {
        Some(Self::new(dirs::home_dir()?.join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when no config has been saved yet; [`Error::LocalStoreCorrupt`]
    /// when the file exists but is not valid JSON.
    pub fn read(&self) -> Result<Option<Config>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents =
            fs::read_to_string(&self.path).map_err(|source| Error::io(&self.path, source))?;
        let config =
            serde_json::from_str(&contents).map_err(|source| Error::corrupt(&self.path, source))?;
        Ok(Some(config))
    }

    pub fn save(&self, config: &Config) -> Result<(), Error> {
        let contents =
            serde_json::to_string(config).map_err(|source| Error::corrupt(&self.path, source))?;
        fs::write(&self.path, contents).map_err(|source| Error::io(&self.path, source))
    }

    /// Deletes the stored credential. A no-op if none was saved.
    pub fn reset(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::io(&self.path, source)),
        }
    }
}
