//! File-backed rule repository.
//!
//! Rules live at `$XDG_CONFIG_HOME/punctd/rules.json`, falling back to
//! `$HOME/.config/punctd/rules.json`. The file holds the full list;
//! every save rewrites it.

use std::fs;
use std::path::{Path, PathBuf};

use super::{PersistError, RulesRepository};

const APP_DIR: &str = "punctd";
const RULES_FILE: &str = "rules.json";

/// Repository storing the rule list in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    /// Repository at an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Repository at the default config location.
    pub fn at_default_location() -> Result<Self, PersistError> {
        Ok(Self::new(default_rules_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Resolve the default rules file path from the environment.
fn default_rules_path() -> Result<PathBuf, PersistError> {
    let config_dir = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => match std::env::var_os("HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home).join(".config"),
            _ => return Err(PersistError::NoConfigDir),
        },
    };
    Ok(config_dir.join(APP_DIR).join(RULES_FILE))
}

impl RulesRepository for FileRepository {
    fn load(&self) -> Result<Option<Vec<u8>>, PersistError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistError::ReadFailed {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistError::MkdirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(&self.path, bytes).map_err(|e| PersistError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}
