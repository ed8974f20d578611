use chrono::Datelike;

use crate::cli::core::{parse_date, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::core::services::{CalendarService, SummaryService};
use crate::storage::DebtorStore;

use super::args::ParsedArgs;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "calendar",
            "Month view of scheduled collections",
            "calendar [YEAR MONTH]",
            cmd_calendar,
        )
        .with_aliases(&["cal"]),
        CommandEntry::new(
            "day",
            "Collections scheduled on a date",
            "day YYYY-MM-DD",
            cmd_day,
        ),
        CommandEntry::new("summary", "Collection dashboard figures", "summary", cmd_summary),
    ]
}

fn cmd_calendar(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let today = context.today();
    let (year, month) = match parsed.positionals.as_slice() {
        [] => (today.year(), today.month()),
        [year, month] => (
            year.parse::<i32>().map_err(|_| invalid("year", year))?,
            month.parse::<u32>().map_err(|_| invalid("month", month))?,
        ),
        _ => {
            return Err(CommandError::InvalidArguments(
                "usage: calendar [YEAR MONTH]".into(),
            ))
        }
    };
    let weeks = CalendarService::month_grid(year, month)?;
    let debtors = context.store.get_all()?;
    let events = CalendarService::events_for_month(&debtors, year, month);
    io::print_info(render::calendar_text(year, month, &weeks, &events, today));
    Ok(())
}

fn cmd_day(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let date = parse_date(parsed.positional(0, "date")?)?;
    let debtors = context.store.get_all()?;
    let due = CalendarService::scheduled_on(&debtors, date);
    output_section(format!("Collections on {}", date.format("%d/%m/%Y")));
    if due.is_empty() {
        io::print_info("No collections scheduled for this day.");
        return Ok(());
    }
    io::print_info(render::debtor_table(&due, 1, render::terminal_width()));
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let debtors = context.store.get_all()?;
    let summary = SummaryService::summarize(&debtors);
    output_section("Collections summary");
    for line in render::summary_lines(&summary) {
        io::print_info(line);
    }
    Ok(())
}

fn invalid(what: &str, raw: &str) -> CommandError {
    CommandError::InvalidArguments(format!("invalid {} `{}`", what, raw))
}
