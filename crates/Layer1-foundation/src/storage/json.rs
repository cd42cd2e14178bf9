//! JSON 설정 파일 저장소

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "cachet";
const PROJECT_DIR: &str = ".cachet";

/// A directory of Cachet JSON files (global or per-project)
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config_dir>/cachet`
    pub fn global() -> Result<Self> {
        dirs::config_dir()
            .map(|dir| Self::new(dir.join(APP_DIR)))
            .ok_or_else(|| Error::config("no platform config directory"))
    }

    /// `<root>/.cachet`
    pub fn project(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(PROJECT_DIR))
    }

    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::config(format!("working directory unavailable: {}", e)))?;
        Ok(Self::project(cwd))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// `Ok(None)` when the file does not exist; parse failures are errors
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

/// Parse one JSON file, mapping every failure to [`Error::Config`]
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read(path)
        .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
    serde_json::from_slice(&raw).map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        port: u16,
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let loaded: Option<Sample> = store.read("proxy.json").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_read_existing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("proxy.json"), r#"{"port": 8080}"#).unwrap();
        let store = JsonStore::new(dir.path());

        let loaded: Option<Sample> = store.read("proxy.json").unwrap();
        assert_eq!(loaded, Some(Sample { port: 8080 }));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("proxy.json"), "{ not json").unwrap();
        let store = JsonStore::new(dir.path());

        let err = store.read::<Sample>("proxy.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("proxy.json"));
    }

    #[test]
    fn test_project_dir() {
        let store = JsonStore::project("/srv/app");
        assert_eq!(store.dir(), Path::new("/srv/app/.cachet"));
        assert_eq!(store.path_of("proxy.json"), Path::new("/srv/app/.cachet/proxy.json"));
    }
}
