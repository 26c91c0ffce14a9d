use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct XtalkConfig {
    /// Path of the crosstalk store file
    pub database: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("xtalkdb.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from("crosstalk.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<XtalkConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: XtalkConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

/// Store path from the command line, else the config file, else the default.
/// A relative path in the config file is taken relative to the file itself.
pub fn resolve_database_path(
    flag: Option<&Path>,
    config: Option<&XtalkConfig>,
    config_path: Option<&Path>,
) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Some(db) = config.and_then(|c| c.database.as_deref()) {
        let db = PathBuf::from(db);
        if db.is_relative() {
            if let Some(dir) = config_path.and_then(Path::parent) {
                return dir.join(db);
            }
        }
        return db;
    }
    default_database_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("xtalkdb.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_database_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xtalkdb.toml");
        std::fs::write(&path, "database = \"data/crosstalk.db\"\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database.as_deref(), Some("data/crosstalk.db"));
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xtalkdb.toml");
        std::fs::write(&path, "database = [unterminated").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_resolution_order() {
        let config = XtalkConfig { database: Some("bot.db".to_string()) };
        let config_path = Path::new("/srv/xtalk/xtalkdb.toml");

        assert_eq!(
            resolve_database_path(Some(Path::new("flag.db")), Some(&config), Some(config_path)),
            PathBuf::from("flag.db")
        );
        assert_eq!(
            resolve_database_path(None, Some(&config), Some(config_path)),
            PathBuf::from("/srv/xtalk/bot.db")
        );
        assert_eq!(resolve_database_path(None, None, None), default_database_path());
    }
}
