use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::core::{
    business_days::DEFAULT_RESCHEDULE_BUSINESS_DAYS,
    errors::{DebtorError, Result},
    services::PageSize,
    utils::{ensure_dir, PathResolver},
};
use crate::spreadsheet::ExportFormat;
use crate::storage::cache::DEFAULT_TTL;

const TMP_SUFFIX: &str = "tmp";
const DEFAULT_DATABASE_FILE: &str = "debtors.db";
/// Upper bound for `cache_ttl_secs`; longer lifetimes hide other writers' changes.
pub const MAX_CACHE_TTL_SECS: u64 = 300;

/// Keys accepted by [`Config::set`], in display order.
pub const CONFIG_KEYS: [&str; 6] = [
    "database_file",
    "page_size",
    "cache_ttl_secs",
    "reschedule_business_days",
    "export_format",
    "last_export_dir",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relative names resolve inside the application data directory.
    pub database_file: PathBuf,
    pub page_size: PageSize,
    pub cache_ttl_secs: u64,
    pub reschedule_business_days: u32,
    pub export_format: ExportFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_file: PathBuf::from(DEFAULT_DATABASE_FILE),
            page_size: PageSize::default(),
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            reschedule_business_days: DEFAULT_RESCHEDULE_BUSINESS_DAYS,
            export_format: ExportFormat::default(),
            last_export_dir: None,
        }
    }
}

impl Config {
    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "database_file" => self.database_file.display().to_string(),
            "page_size" => self.page_size().to_string(),
            "cache_ttl_secs" => self.cache_ttl_secs.to_string(),
            "reschedule_business_days" => self.reschedule_business_days.to_string(),
            "export_format" => self.export_format.to_string(),
            "last_export_dir" => self
                .last_export_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }

    /// Parses and assigns a single setting. `last_export_dir` is cleared by an empty value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "database_file" => {
                if value.is_empty() {
                    return Err(DebtorError::Config("database_file cannot be empty".into()));
                }
                self.database_file = PathBuf::from(value);
            }
            "page_size" => self.page_size = value.parse()?,
            "cache_ttl_secs" => {
                let secs: u64 = parse_number(key, value)?;
                if secs > MAX_CACHE_TTL_SECS {
                    return Err(DebtorError::Config(format!(
                        "cache_ttl_secs must be at most {}, got {}",
                        MAX_CACHE_TTL_SECS, secs
                    )));
                }
                self.cache_ttl_secs = secs;
            }
            "reschedule_business_days" => {
                let days: u32 = parse_number(key, value)?;
                if days == 0 {
                    return Err(DebtorError::Config(
                        "reschedule_business_days must be at least 1".into(),
                    ));
                }
                self.reschedule_business_days = days;
            }
            "export_format" => self.export_format = value.parse()?,
            "last_export_dir" => {
                self.last_export_dir = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            other => {
                return Err(DebtorError::Config(format!(
                    "unknown setting `{}`; expected one of {}",
                    other,
                    CONFIG_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| DebtorError::Config(format!("{} expects a whole number, got `{}`", key, value)))
}

/// Loads and atomically persists the operator configuration.
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
            base,
        })
    }

    /// Missing file yields the defaults.
    pub fn load(&self) -> Result<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn database_path(&self, config: &Config) -> PathBuf {
        PathResolver::database_file_in(&self.base, &config.database_file)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.page_size(), PageSize::default());
        assert_eq!(
            manager.database_path(&config),
            dir.path().join("data").join("debtors.db")
        );
    }

    #[test]
    fn save_round_trips_and_leaves_no_tmp_file() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.set("page_size", "all").unwrap();
        config.set("export_format", "csv").unwrap();
        config.set("last_export_dir", "/srv/exports").unwrap();
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.page_size(), PageSize::All);
        assert!(!tmp_path(manager.path()).exists());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("reschedule_business_days", "0").is_err());
        assert!(config.set("cache_ttl_secs", "soon").is_err());
        assert!(config.set("cache_ttl_secs", "86400").is_err());
        assert!(config.set("page_size", "0").is_err());
        assert!(config.set("theme", "dark").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config: Config = serde_json::from_str(r#"{ "page_size": "50" }"#).unwrap();
        assert_eq!(Some(config.page_size()), PageSize::items(50));
        assert_eq!(config.reschedule_business_days, DEFAULT_RESCHEDULE_BUSINESS_DAYS);
    }

    #[test]
    fn unreadable_page_size_fails_to_load() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{ "page_size": "lots" }"#).unwrap();

        let err = manager.load().unwrap_err();
        assert_eq!(err.kind(), crate::core::errors::ErrorKind::Config);
    }

    #[test]
    fn cache_ttl_accepts_values_up_to_the_cap() {
        let mut config = Config::default();
        config.set("cache_ttl_secs", &MAX_CACHE_TTL_SECS.to_string()).unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(MAX_CACHE_TTL_SECS));
    }
}
