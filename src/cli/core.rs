//! Core CLI dispatch, error types and shell context helpers.

use std::io;

use chrono::NaiveDate;
use rustyline::error::ReadlineError;
use strsim::levenshtein;

use crate::core::errors::DebtorError;
use crate::core::services::LifecycleService;

use super::io as cli_io;
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

/// Failures that stop the shell itself.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] DebtorError),
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Command(String),
}

/// Failures of a single command; reported and the shell carries on.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] DebtorError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl ShellContext {
    pub(crate) fn lifecycle(&self) -> LifecycleService<'_> {
        LifecycleService::new(&self.store, self.clock.as_ref())
            .with_reschedule_days(self.config.reschedule_business_days)
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = crate::cli::shell::parse_command_line(line)
            .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
        let Some(first) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&first.to_lowercase(), first, &args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_hint(format!("Did you mean `{}`?", name));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Exit shell?", true).map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(&message);
                cli_io::print_hint("Use `help <command>` for usage details.");
            }
            CommandError::Core(DebtorError::NotFound(id)) => {
                cli_io::print_error(format!("Debtor {} not found.", id));
                cli_io::print_hint("Use `list` to see registered debtors.");
            }
            other => cli_io::print_error(other.to_string()),
        }
        Ok(())
    }
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{}` (use YYYY-MM-DD)", input))
    })
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Input(err.to_string())
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

#[cfg(test)]
pub(crate) fn process_script(
    context: &mut ShellContext,
    lines: &[&str],
) -> Result<(), CommandError> {
    for line in lines {
        if context.process_line(line)? == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::PageSize;
    use crate::core::time::FixedClock;
    use crate::domain::CollectionStatus;
    use crate::storage::DebtorStore;

    fn context() -> (tempfile::TempDir, ShellContext) {
        let dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::ymd(2024, 3, 4).unwrap();
        let context =
            ShellContext::open_in(CliMode::Script, dir.path().to_path_buf(), Box::new(clock))
                .unwrap();
        (dir, context)
    }

    #[test]
    fn script_drives_the_collection_workflow() {
        let (_dir, mut context) = context();
        process_script(
            &mut context,
            &[
                "add \"Ana Silva\" 150.00 5 --person P-1",
                "collect 1",
                "collect 1 2024-03-20",
                "pay 1",
            ],
        )
        .unwrap();
        let debtor = context.store.get_by_id(1).unwrap();
        assert_eq!(debtor.status(), CollectionStatus::Paid);
        assert_eq!(debtor.collection_phase().get(), 3);
        assert_eq!(debtor.payment_date(), NaiveDate::from_ymd_opt(2024, 3, 4));
    }

    #[test]
    fn command_errors_surface_to_the_caller() {
        let (_dir, mut context) = context();
        let err = process_script(&mut context, &["show 99"]).unwrap_err();
        assert!(matches!(err, CommandError::Core(DebtorError::NotFound(99))));
        let err = process_script(&mut context, &["add Bruno zero 1"]).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArguments(_)));
    }

    #[test]
    fn exit_stops_the_script() {
        let (_dir, mut context) = context();
        process_script(&mut context, &["exit", "add Ana 10 1"]).unwrap();
        assert!(context.store.get_all().unwrap().is_empty());
    }

    #[test]
    fn config_changes_are_persisted() {
        let (_dir, mut context) = context();
        process_script(&mut context, &["config page_size 50"]).unwrap();
        let reloaded = context.config_manager.load().unwrap();
        assert_eq!(Some(reloaded.page_size), PageSize::items(50));
    }
}
