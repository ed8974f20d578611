use std::{
    env, fs,
    path::{Path, PathBuf},
};

use dirs::home_dir;

use crate::core::errors::Result;

const DEFAULT_DIR_NAME: &str = ".debtor_core";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const DATA_DIR: &str = "data";
const HOME_ENV: &str = "DEBTOR_CORE_HOME";

/// Resolves the on-disk layout under the application directory.
pub struct PathResolver;

impl PathResolver {
    /// Application directory, `$DEBTOR_CORE_HOME` or `~/.debtor_core`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn config_dir_in(base: &Path) -> PathBuf {
        base.join(CONFIG_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        Self::config_dir_in(base).join(CONFIG_FILE)
    }

    pub fn data_dir_in(base: &Path) -> PathBuf {
        base.join(DATA_DIR)
    }

    /// Database location; relative names live in the data directory.
    pub fn database_file_in(base: &Path, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            Self::data_dir_in(base).join(file)
        }
    }
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_database_names_resolve_under_data_dir() {
        let base = Path::new("/tmp/app");
        assert_eq!(
            PathResolver::database_file_in(base, Path::new("debtors.db")),
            PathBuf::from("/tmp/app/data/debtors.db")
        );
        assert_eq!(
            PathResolver::database_file_in(base, Path::new("/srv/debtors.db")),
            PathBuf::from("/srv/debtors.db")
        );
    }
}
