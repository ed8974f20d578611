use crate::cli::core::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::CommandEntry;
use crate::cli::render;
use crate::core::services::{paginate, FilterBounds, FilterService};
use crate::domain::{DebtorChanges, Displayable, NewDebtor};
use crate::storage::DebtorStore;

use super::args::{parse_decimal, parse_id, ParsedArgs, FILTER_FLAGS};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "list",
            "List debtors with filters and pagination",
            "list [--search TEXT] [--amount MIN..MAX] [--overdue MIN..MAX] \
             [--amount-cat small,medium,large] [--overdue-cat starting,moderate,late,critical] \
             [--page N] [--page-size N|all]",
            cmd_list,
        )
        .with_aliases(&["ls"]),
        CommandEntry::new("show", "Show one debtor", "show ID", cmd_show),
        CommandEntry::new(
            "add",
            "Register a debtor",
            "add NAME AMOUNT OVERDUE_DAYS [--phone PHONE] [--person EXTERNAL_ID]",
            cmd_add,
        ),
        CommandEntry::new(
            "edit",
            "Correct a debtor's details",
            "edit ID field=value... (fields: name, amount, overdue, phone, person)",
            cmd_edit,
        ),
        CommandEntry::new("delete", "Delete a debtor permanently", "delete ID [--yes]", cmd_delete)
            .with_aliases(&["rm"]),
    ]
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let mut value_flags = FILTER_FLAGS.to_vec();
    value_flags.extend(["--page", "--page-size"]);
    let parsed = ParsedArgs::parse(args, &value_flags, &[])?;
    if let Some(extra) = parsed.positionals.first() {
        return Err(CommandError::InvalidArguments(format!(
            "unexpected argument `{}`",
            extra
        )));
    }

    let debtors = context.store.get_all()?;
    let bounds = FilterBounds::observe(&debtors);
    let criteria = parsed.filter_criteria(&bounds)?;
    let filtered = FilterService::apply(&debtors, &criteria);
    let size = parsed.page_size(context.config.page_size())?;
    let page = paginate(&filtered, parsed.page()?, size);

    output_section(format!("Debtors ({} of {})", filtered.len(), debtors.len()));
    if page.items.is_empty() {
        io::print_info("No debtors match the current filters.");
        return Ok(());
    }
    let table = render::debtor_table(
        page.items,
        page.first_position(size),
        render::terminal_width(),
    );
    io::print_info(table);
    io::print_info(format!(
        "Page {} of {} ({} per page)",
        page.number, page.total_pages, size
    ));
    if page.has_next() {
        io::print_hint(format!("Next page: --page {}", page.number + 1));
    } else if page.has_previous() {
        io::print_hint(format!("Previous page: --page {}", page.number - 1));
    }
    Ok(())
}

fn cmd_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let id = parse_id(parsed.positional(0, "debtor id")?)?;
    let debtor = context.store.get_by_id(id)?;
    output_section(debtor.display_label());
    for line in render::debtor_detail(&debtor) {
        io::print_info(line);
    }
    Ok(())
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["--phone", "--person"], &[])?;
    let name = parsed.positional(0, "name")?;
    let amount = parse_decimal(parsed.positional(1, "amount")?, "amount")?;
    let overdue = parsed.positional(2, "overdue days")?;
    let overdue: u32 = overdue.parse().map_err(|_| {
        CommandError::InvalidArguments(format!("invalid overdue days `{}`", overdue))
    })?;

    let mut record = NewDebtor::new(name, amount, overdue);
    if let Some(phone) = parsed.value("--phone") {
        record = record.with_phone(phone);
    }
    if let Some(person) = parsed.value("--person") {
        record = record.with_external_id(person);
    }
    let outcome = context.lifecycle().create(record)?;
    io::print_success(format!("{} (id {})", outcome.message, outcome.debtor.id));
    Ok(())
}

fn cmd_edit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &[])?;
    let id = parse_id(parsed.positional(0, "debtor id")?)?;
    let mut changes = DebtorChanges::default();
    for assignment in parsed.positionals.iter().skip(1) {
        let (field, value) = assignment.split_once('=').ok_or_else(|| {
            CommandError::InvalidArguments(format!("expected field=value, got `{}`", assignment))
        })?;
        let optional = || Some(value.trim().to_string()).filter(|text| !text.is_empty());
        match field.trim().to_lowercase().as_str() {
            "name" => changes.name = Some(value.to_string()),
            "amount" => changes.total_owed = Some(parse_decimal(value, "amount")?),
            "overdue" => {
                changes.overdue_days = Some(value.trim().parse().map_err(|_| {
                    CommandError::InvalidArguments(format!("invalid overdue days `{}`", value))
                })?)
            }
            "phone" => changes.phone = Some(optional()),
            "person" => changes.external_person_id = Some(optional()),
            other => {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown field `{}`",
                    other
                )))
            }
        }
    }
    let outcome = context.lifecycle().update_details(id, &changes)?;
    io::print_success(outcome.message);
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &[], &["--yes"])?;
    let id = parse_id(parsed.positional(0, "debtor id")?)?;
    if !parsed.has("--yes") {
        let debtor = context.store.get_by_id(id)?;
        if context.mode == CliMode::Script {
            return Err(CommandError::InvalidArguments(
                "deleting requires confirmation; pass --yes in script mode".into(),
            ));
        }
        let prompt = format!("Delete {} permanently?", debtor.display_label());
        if !io::confirm_action(&context.theme, &prompt, false)? {
            io::print_info("Deletion cancelled.");
            return Ok(());
        }
    }
    let outcome = context.lifecycle().delete(id)?;
    io::print_success(outcome.message);
    Ok(())
}
