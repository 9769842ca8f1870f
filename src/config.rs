//! Project directory layout and configuration.
//!
//! A project lives in `.humidor/` holding the SQLite database, the uploads
//! directory and an optional `config.yaml`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HumidorError, Result};
use crate::photos::DiskPhotoStore;
use crate::storage::SqliteStore;

pub const HUMIDOR_DIR: &str = ".humidor";
pub const DB_FILE: &str = "humidor.db";
pub const CONFIG_FILE: &str = "config.yaml";
pub const BIND_ENV: &str = "HUMIDOR_BIND";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Address for `humidor serve`
    pub bind: String,
    /// Photo directory, relative to `.humidor/` unless absolute
    pub uploads_dir: PathBuf,
    /// Largest request body `humidor serve` accepts, photo included
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            uploads_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Read a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw)
            .map_err(|e| HumidorError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Apply `HUMIDOR_BIND` if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(bind) = env::var(BIND_ENV) {
            if !bind.trim().is_empty() {
                self.bind = bind;
            }
        }
        self
    }
}

/// An initialised project directory.
#[derive(Debug, Clone)]
pub struct Project {
    dir: PathBuf,
    config: Config,
}

impl Project {
    /// Create `.humidor/` under `root`.
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(HUMIDOR_DIR);
        if dir.exists() {
            return Err(HumidorError::AlreadyInitialized);
        }
        fs::create_dir_all(&dir)?;

        let config = Config::default();
        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| HumidorError::Config(e.to_string()))?;
        fs::write(dir.join(CONFIG_FILE), yaml)?;

        let project = Self { dir, config };
        fs::create_dir_all(project.uploads_path())?;
        project.open_store()?;
        Ok(project)
    }

    /// Open the project rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(HUMIDOR_DIR);
        if !dir.is_dir() {
            return Err(HumidorError::NotInitialized);
        }
        let config = Config::load(&dir.join(CONFIG_FILE))?.with_env_overrides();
        Ok(Self { dir, config })
    }

    /// Open the nearest project at or above the current directory.
    pub fn discover() -> Result<Self> {
        Self::open(&find_project_root())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.join(DB_FILE)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.dir.join(&self.config.uploads_dir)
    }

    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.db_path())
    }

    pub fn photo_store(&self) -> DiskPhotoStore {
        DiskPhotoStore::new(self.uploads_path())
    }
}

/// Walk up from the current directory looking for `.humidor/`.
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(HUMIDOR_DIR).exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind, "127.0.0.1:3000");
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(&tmp.path().join("nope.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "bind: 0.0.0.0:8080\nmax_upload_bytes: 1048576\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 1_048_576);
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "port: 9\n").unwrap();
        assert!(matches!(Config::load(&path), Err(HumidorError::Config(_))));
    }

    #[test]
    fn test_init_and_open() {
        let tmp = TempDir::new().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert!(project.db_path().exists());
        assert!(project.uploads_path().is_dir());
        assert!(project.dir().join(CONFIG_FILE).exists());

        assert!(matches!(
            Project::init(tmp.path()),
            Err(HumidorError::AlreadyInitialized)
        ));

        let reopened = Project::open(tmp.path()).unwrap();
        assert_eq!(reopened.db_path(), project.db_path());
    }

    #[test]
    fn test_open_without_init() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Project::open(tmp.path()),
            Err(HumidorError::NotInitialized)
        ));
    }
}
