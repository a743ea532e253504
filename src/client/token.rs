use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("HOME environment variable not set")]
    NoHome,
    #[error("token store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("token store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of the bearer token attached to every API request
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Result<Option<String>, TokenError>;
}

/// Fixed token, mainly for tests and one-off scripts
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Result<Option<String>, TokenError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenDocument {
    token: Option<String>,
}

/// Persistent client storage, a JSON document holding the token under `token`
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub const FILE_NAME: &'static str = "token.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store inside the CLI config directory
    pub fn in_config_dir() -> Result<Self, TokenError> {
        Ok(Self::new(config_dir()?.join(Self::FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &str) -> Result<(), TokenError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let doc = TokenDocument { token: Some(token.to_string()) };
        fs::write(&self.path, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), TokenError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TokenProvider for FileTokenStore {
    fn token(&self) -> Result<Option<String>, TokenError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let doc: TokenDocument = serde_json::from_str(&content)?;
        Ok(doc.token.filter(|t| !t.trim().is_empty()))
    }
}

pub fn config_dir() -> Result<PathBuf, TokenError> {
    if let Ok(custom_dir) = std::env::var("EXPENSE_CLI_CONFIG_DIR") {
        return Ok(PathBuf::from(custom_dir));
    }
    let home = std::env::var("HOME").map_err(|_| TokenError::NoHome)?;
    Ok(PathBuf::from(home).join(".config").join("expense-tracker"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_no_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(FileTokenStore::FILE_NAME));
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn save_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join(FileTokenStore::FILE_NAME));

        store.save("abc.def.ghi").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("abc.def.ghi"));

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token"], "abc.def.ghi");

        store.clear().unwrap();
        assert_eq!(store.token().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn static_token() {
        assert_eq!(StaticToken::new("t").token().unwrap().as_deref(), Some("t"));
        assert_eq!(StaticToken::none().token().unwrap(), None);
    }
}
