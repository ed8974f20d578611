use std::{
    borrow::Cow,
    io::{self, BufRead, Lines, StdinLock},
};

use colored::Colorize;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Cmd, Context as ReadlineContext, Editor, Helper, KeyEvent,
};
use tracing::debug;

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output::{self, OutputPreferences};

const SCRIPT_ENV: &str = "DEBTOR_CORE_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    output::set_preferences(OutputPreferences {
        plain_mode: mode == CliMode::Script,
        quiet_mode: false,
    });

    let mut context = ShellContext::new(mode)?;
    debug!(status = %context.status(), "shell started");

    let mut source = match mode {
        CliMode::Interactive => {
            output::info("Debtor collections shell. Type `help` for commands.");
            LineSource::editor(&context)?
        }
        CliMode::Script => LineSource::Script(io::stdin().lock().lines()),
    };
    drive(&mut context, &mut source)
}

enum Input {
    Line(String),
    Interrupted,
    Finished,
}

/// Terminal editor with history, or plain stdin lines for scripts.
enum LineSource {
    Editor(Box<Editor<CommandHelper, DefaultHistory>>),
    Script(Lines<StdinLock<'static>>),
}

impl LineSource {
    fn editor(context: &ShellContext) -> Result<Self, CliError> {
        let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(CommandHelper::new(context.command_usages())));
        editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
        Ok(LineSource::Editor(Box::new(editor)))
    }

    fn next(&mut self, prompt: &str) -> Result<Input, CliError> {
        match self {
            LineSource::Editor(editor) => match editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        editor.add_history_entry(trimmed).ok();
                    }
                    Ok(Input::Line(line))
                }
                Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
                Err(ReadlineError::Eof) => {
                    output::info("Exiting shell.");
                    Ok(Input::Finished)
                }
                Err(err) => Err(err.into()),
            },
            LineSource::Script(lines) => match lines.next() {
                Some(line) => Ok(Input::Line(line?)),
                None => Ok(Input::Finished),
            },
        }
    }
}

fn drive(context: &mut ShellContext, source: &mut LineSource) -> Result<(), CliError> {
    while context.running {
        match source.next(&context.prompt())? {
            Input::Line(line) => match handle_line(context, &line) {
                Ok(LoopControl::Continue) => {}
                Ok(LoopControl::Exit) => break,
                Err(err) => context.report_error(err)?,
            },
            Input::Interrupted => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Input::Finished => break,
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(err);
            return Ok(LoopControl::Continue);
        }
    };
    // Blank lines and `#` comments are skipped.
    let Some(raw) = tokens.first().filter(|word| !word.starts_with('#')) else {
        return Ok(LoopControl::Continue);
    };

    let command = raw.to_lowercase();
    let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
    context.last_command = Some(line.trim().to_string());

    let control = context.dispatch(&command, raw, &args)?;
    if control == LoopControl::Exit {
        context.running = false;
    }
    Ok(control)
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, shell_words::ParseError> {
    shell_words::split(input)
}

/// Completes command words and hints their arguments from the registry usage lines.
struct CommandHelper {
    usages: Vec<(&'static str, &'static str)>,
}

impl CommandHelper {
    fn new(mut usages: Vec<(&'static str, &'static str)>) -> Self {
        usages.sort_by_key(|(name, _)| *name);
        usages.dedup_by_key(|(name, _)| *name);
        Self { usages }
    }

    fn matching(&self, prefix: &str) -> impl Iterator<Item = &'static str> + '_ {
        let needle = prefix.to_ascii_lowercase();
        self.usages
            .iter()
            .map(|(name, _)| *name)
            .filter(move |name| name.starts_with(&needle))
    }

    /// Arguments still to type once the command word and a space are in.
    fn usage_hint(&self, line: &str) -> Option<String> {
        let word = line.trim_start().strip_suffix(' ')?;
        if word.is_empty() || word.contains(char::is_whitespace) {
            return None;
        }
        let word = word.to_ascii_lowercase();
        self.usages
            .iter()
            .find(|(name, _)| *name == word)
            .map(|(_, args)| *args)
            .filter(|args| !args.is_empty())
            .map(str::to_string)
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        let trimmed = prefix.trim_start();
        if trimmed.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let candidates = self
            .matching(trimmed)
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();
        Ok((prefix.len() - trimmed.len(), candidates))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &ReadlineContext<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        self.usage_hint(line)
    }
}

impl Highlighter for CommandHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if output::current_preferences().plain_mode {
            Cow::Borrowed(hint)
        } else {
            Cow::Owned(hint.dimmed().to_string())
        }
    }
}

impl Validator for CommandHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> CommandHelper {
        CommandHelper::new(vec![
            ("pay", "ID"),
            ("day", "YYYY-MM-DD"),
            ("add", "NAME AMOUNT DAYS [--phone PHONE]"),
            ("actions", "[--search NAME]"),
            ("summary", ""),
        ])
    }

    #[test]
    fn quoted_arguments_stay_together() {
        let tokens = parse_command_line(r#"add "Ana Silva" 150 5 --phone '11 9999'"#).unwrap();
        assert_eq!(tokens, vec!["add", "Ana Silva", "150", "5", "--phone", "11 9999"]);
        assert!(parse_command_line("add \"unterminated").is_err());
    }

    #[test]
    fn completion_matches_command_prefixes() {
        let helper = helper();
        assert_eq!(helper.matching("A").collect::<Vec<_>>(), vec!["actions", "add"]);
        assert!(helper.matching("z").next().is_none());
    }

    #[test]
    fn usage_hint_follows_the_command_word() {
        let helper = helper();
        assert_eq!(helper.usage_hint("pay "), Some("ID".to_string()));
        assert_eq!(
            helper.usage_hint("  ADD "),
            Some("NAME AMOUNT DAYS [--phone PHONE]".to_string())
        );
        assert_eq!(helper.usage_hint("pay"), None);
        assert_eq!(helper.usage_hint("pay 3 "), None);
        assert_eq!(helper.usage_hint("summary "), None);
        assert_eq!(helper.usage_hint("unknown "), None);
    }
}
