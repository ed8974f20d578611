use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;

use crate::{
    config::{Config, ConfigManager},
    core::time::{Clock, SystemClock},
    storage::SqliteStore,
};

use super::commands;
use super::core::CliError;
use super::registry::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub store: SqliteStore,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub clock: Box<dyn Clock>,
    pub theme: ColorfulTheme,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    /// Opens the configured database under the application directory.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new()?;
        Self::with_manager(mode, config_manager, Box::new(SystemClock))
    }

    pub fn open_in(mode: CliMode, base: PathBuf, clock: Box<dyn Clock>) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base)?;
        Self::with_manager(mode, config_manager, clock)
    }

    fn with_manager(
        mode: CliMode,
        config_manager: ConfigManager,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        let database = config_manager.database_path(&config);
        let store = SqliteStore::open(&database, config.cache_ttl())?;

        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        Ok(Self {
            mode,
            registry,
            store,
            config_manager,
            config,
            clock,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
        })
    }

    /// `(name, arguments)` for every command and alias, taken from its usage line.
    pub fn command_usages(&self) -> Vec<(&'static str, &'static str)> {
        self.registry
            .names()
            .filter_map(|name| {
                let entry = self.registry.get(name)?;
                let args = entry.usage.strip_prefix(entry.name).unwrap_or_default();
                Some((name, args.trim_start()))
            })
            .collect()
    }

    pub fn prompt(&self) -> String {
        "debtors> ".to_string()
    }

    pub fn status(&self) -> String {
        format!(
            "ShellContext {{ running: {}, last_command: {:?}, database: {:?} }}",
            self.running,
            self.last_command,
            self.store.path()
        )
    }
}
