use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::config::CONFIG_KEYS;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        "View or change operator settings",
        "config [KEY VALUE] (keys: database_file, page_size, cache_ttl_secs, \
         reschedule_business_days, export_format, last_export_dir)",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => show_config(context),
        [key] => match context.config.get(key) {
            Some(value) => {
                io::print_info(format!("{} = {}", key, value));
                Ok(())
            }
            None => Err(CommandError::InvalidArguments(format!(
                "unknown setting `{}`",
                key
            ))),
        },
        [key, value @ ..] => {
            let value = value.join(" ");
            context.config.set(key, &value)?;
            context.persist_config()?;
            io::print_success(format!("{} set to `{}`.", key, value.trim()));
            if matches!(*key, "database_file" | "cache_ttl_secs") {
                io::print_hint("Restart the shell to apply storage settings.");
            }
            Ok(())
        }
    }
}

fn show_config(context: &ShellContext) -> CommandResult {
    output_section("Configuration");
    for key in CONFIG_KEYS {
        let value = context.config.get(key).unwrap_or_default();
        io::print_info(format!("  {:<26} {}", key, value));
    }
    io::print_info(format!("  {:<26} {}", "config file", context.config_manager.path().display()));
    io::print_info(format!(
        "  {:<26} {}",
        "database",
        context.config_manager.database_path(&context.config).display()
    ));
    Ok(())
}
