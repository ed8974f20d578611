use std::{collections::HashMap, str::FromStr};

use rust_decimal::Decimal;

use crate::cli::core::CommandError;
use crate::core::services::{
    AmountCategory, FilterBounds, FilterCriteria, OverdueCategory, PageSize, ValueRange,
};
use crate::domain::DebtorId;

/// Flags shared by `list` and `export`.
pub(crate) const FILTER_FLAGS: [&str; 5] =
    ["--search", "--amount", "--overdue", "--amount-cat", "--overdue-cat"];

/// Positional arguments plus `--flag value` pairs and bare `--switch`es.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs {
    pub positionals: Vec<String>,
    values: HashMap<String, String>,
    switches: Vec<String>,
}

impl ParsedArgs {
    /// `value_flags` consume the following token; `switch_flags` stand alone. Anything else
    /// starting with `--` is rejected.
    pub fn parse(
        args: &[&str],
        value_flags: &[&str],
        switch_flags: &[&str],
    ) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if !arg.starts_with("--") {
                parsed.positionals.push(arg.to_string());
                continue;
            }
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag, Some(value.to_string())),
                None => (*arg, None),
            };
            if value_flags.contains(&flag) {
                let value = match inline {
                    Some(value) => value,
                    None => iter.next().map(|value| value.to_string()).ok_or_else(|| {
                        CommandError::InvalidArguments(format!("`{}` expects a value", flag))
                    })?,
                };
                parsed.values.insert(flag.to_string(), value);
            } else if switch_flags.contains(&flag) && inline.is_none() {
                parsed.switches.push(flag.to_string());
            } else {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `{}`",
                    arg
                )));
            }
        }
        Ok(parsed)
    }

    pub fn value(&self, flag: &str) -> Option<&str> {
        self.values.get(flag).map(String::as_str)
    }

    pub fn has(&self, flag: &str) -> bool {
        self.switches.iter().any(|switch| switch == flag)
    }

    pub fn parsed<T: FromStr>(&self, flag: &str) -> Result<Option<T>, CommandError> {
        self.value(flag)
            .map(|raw| {
                raw.parse().map_err(|_| {
                    CommandError::InvalidArguments(format!("invalid value `{}` for {}", raw, flag))
                })
            })
            .transpose()
    }

    pub fn positional(&self, index: usize, name: &str) -> Result<&str, CommandError> {
        self.positionals
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing {}", name)))
    }

    pub fn page(&self) -> Result<usize, CommandError> {
        Ok(self.parsed::<usize>("--page")?.unwrap_or(1))
    }

    pub fn page_size(&self, default: PageSize) -> Result<PageSize, CommandError> {
        Ok(self.parsed::<PageSize>("--page-size")?.unwrap_or(default))
    }

    /// Builds filter criteria; omitted ranges default to the observed bounds.
    pub fn filter_criteria(&self, bounds: &FilterBounds) -> Result<FilterCriteria, CommandError> {
        let mut criteria = bounds.unrestricted();
        if let Some(raw) = self.value("--amount") {
            criteria.amount_range = Some(parse_range::<Decimal>(raw, "--amount")?);
        }
        if let Some(raw) = self.value("--overdue") {
            criteria.overdue_range = Some(parse_range::<u32>(raw, "--overdue")?);
        }
        if let Some(raw) = self.value("--amount-cat") {
            criteria.amount_categories = parse_list::<AmountCategory>(raw)?;
        }
        if let Some(raw) = self.value("--overdue-cat") {
            criteria.overdue_categories = parse_list::<OverdueCategory>(raw)?;
        }
        criteria.search = self.value("--search").map(str::to_string);
        Ok(criteria)
    }
}

pub(crate) fn parse_id(raw: &str) -> Result<DebtorId, CommandError> {
    raw.trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("invalid debtor id `{}`", raw)))
}

pub(crate) fn parse_decimal(raw: &str, what: &str) -> Result<Decimal, CommandError> {
    Decimal::from_str(&raw.trim().replace(',', "."))
        .map_err(|_| CommandError::InvalidArguments(format!("invalid {} `{}`", what, raw)))
}

/// Inclusive `MIN..MAX`; reversed bounds are swapped.
fn parse_range<T>(raw: &str, flag: &str) -> Result<ValueRange<T>, CommandError>
where
    T: FromStr + PartialOrd + Copy,
{
    let invalid =
        || CommandError::InvalidArguments(format!("{} expects MIN..MAX, got `{}`", flag, raw));
    let (min, max) = raw.split_once("..").ok_or_else(invalid)?;
    let min = min.trim().parse::<T>().map_err(|_| invalid())?;
    let max = max.trim().parse::<T>().map_err(|_| invalid())?;
    Ok(ValueRange::new(min, max))
}

fn parse_list<T>(raw: &str) -> Result<Vec<T>, CommandError>
where
    T: FromStr<Err = crate::core::errors::DebtorError>,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<T>().map_err(CommandError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn flags_and_positionals_are_separated() {
        let parsed = ParsedArgs::parse(
            &["Ana", "--page", "2", "--desc", "--sort=amount"],
            &["--page", "--sort"],
            &["--desc"],
        )
        .unwrap();
        assert_eq!(parsed.positionals, vec!["Ana"]);
        assert_eq!(parsed.page().unwrap(), 2);
        assert_eq!(parsed.value("--sort"), Some("amount"));
        assert!(parsed.has("--desc"));
    }

    #[test]
    fn unknown_and_incomplete_flags_fail() {
        assert!(ParsedArgs::parse(&["--bogus"], &[], &[]).is_err());
        assert!(ParsedArgs::parse(&["--page"], &["--page"], &[]).is_err());
    }

    #[test]
    fn ranges_and_categories_build_criteria() {
        let parsed = ParsedArgs::parse(
            &["--amount", "600..100", "--overdue-cat", "late, critical"],
            &FILTER_FLAGS,
            &[],
        )
        .unwrap();
        let bounds = FilterBounds::observe(&[]);
        let criteria = parsed.filter_criteria(&bounds).unwrap();
        assert_eq!(criteria.amount_range, Some(ValueRange::new(dec!(100), dec!(600))));
        assert_eq!(
            criteria.overdue_categories,
            vec![OverdueCategory::Late, OverdueCategory::Critical]
        );
        assert!(parse_range::<u32>("10-20", "--overdue").is_err());
    }
}
