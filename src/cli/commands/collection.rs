use crate::cli::core::{parse_date, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::core::services::{paginate, ActionService, SortKey, SortOrder};
use crate::storage::DebtorStore;

use super::args::{parse_id, ParsedArgs};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "collect",
            "Record a collection today and schedule the next one",
            "collect ID [YYYY-MM-DD]",
            cmd_collect,
        ),
        CommandEntry::new("pay", "Mark a debtor as paid", "pay ID", cmd_pay),
        CommandEntry::new(
            "actions",
            "Debtors needing collection work today",
            "actions [--search NAME] [--sort id|name|amount|overdue|next] [--desc] [--page N]",
            cmd_actions,
        ),
    ]
}

fn cmd_collect(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let id = parse_id(parsed.positional(0, "debtor id")?)?;
    let explicit = parsed
        .positionals
        .get(1)
        .map(|raw| parse_date(raw))
        .transpose()?;
    let outcome = context
        .lifecycle()
        .record_collection_and_reschedule(id, explicit)?;
    io::print_success(outcome.message);
    Ok(())
}

fn cmd_pay(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let id = parse_id(parsed.positional(0, "debtor id")?)?;
    let outcome = context.lifecycle().mark_paid(id)?;
    io::print_success(outcome.message);
    Ok(())
}

fn cmd_actions(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["--search", "--sort", "--page"], &["--desc"])?;
    if let Some(extra) = parsed.positionals.first() {
        return Err(CommandError::InvalidArguments(format!(
            "unexpected argument `{}`",
            extra
        )));
    }
    let key = parsed.value("--sort").map(str::parse::<SortKey>).transpose()?;
    let order = if parsed.has("--desc") {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };

    let debtors = context.store.get_all()?;
    let today = context.today();
    let due = ActionService::actions_due(
        &debtors,
        today,
        parsed.value("--search"),
        key.unwrap_or_default(),
        order,
    );
    let size = context.config.page_size();
    let page = paginate(&due, parsed.page()?, size);

    output_section(format!(
        "Actions due on {} ({})",
        today.format("%d/%m/%Y"),
        due.len()
    ));
    if page.items.is_empty() {
        io::print_info("Nothing to collect today.");
        return Ok(());
    }
    io::print_info(render::debtor_table(
        page.items,
        page.first_position(size),
        render::terminal_width(),
    ));
    io::print_info(format!("Page {} of {}", page.number, page.total_pages));
    Ok(())
}
