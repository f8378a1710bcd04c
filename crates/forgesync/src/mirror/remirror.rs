//! Remirror policy: when an existing push mirror gets torn down and recreated.
//!
//! A policy is one of the literal modes or a time rule with six fields
//! (year, month, day, hour, minute, second), each either a number or `*`.
//! All fields but the year take exactly two digits:
//!
//! ```text
//! never | no | false       keep existing mirrors
//! always | yes | true      replace mirrors pointing at the destination
//! purge                    delete every mirror on the repository, then create
//! 2024-*-01 00:00:00       replace only when the current time matches
//! * * * * * 00             same rule, whitespace-separated form
//! ```

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDateTime, Timelike};
use regex::Regex;
use thiserror::Error;

static DATETIME_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\*|\d+)-(\*|\d{2})-(\*|\d{2}) (\*|\d{2}):(\*|\d{2}):(\*|\d{2})$",
    )
    .expect("static remirror rule pattern is valid")
});

/// A remirror rule could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid remirror rule {rule:?}: expected never, always, purge or `YYYY-MM-DD HH:MM:SS` with `*` wildcards")]
pub struct RemirrorSyntaxError {
    pub rule: String,
}

impl RemirrorSyntaxError {
    fn new(rule: &str) -> Self {
        Self {
            rule: rule.to_string(),
        }
    }
}

/// What to do with the push mirrors of one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemirrorAction {
    /// Create a mirror only if none points at the destination yet.
    Keep,
    /// Delete mirrors pointing at the destination, then create one.
    Replace,
    /// Delete every mirror on the repository, then create one.
    Purge,
}

/// A date/time pattern; `None` fields are wildcards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRule {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl TimeRule {
    /// Whether every non-wildcard field equals the matching field of `now`.
    pub fn matches(&self, now: NaiveDateTime) -> bool {
        fn field<T: PartialEq>(rule: Option<T>, actual: T) -> bool {
            rule.is_none_or(|expected| expected == actual)
        }

        field(self.year, now.year())
            && field(self.month, now.month())
            && field(self.day, now.day())
            && field(self.hour, now.hour())
            && field(self.minute, now.minute())
            && field(self.second, now.second())
    }

    fn from_fields(rule: &str, fields: &[&str]) -> Result<Self, RemirrorSyntaxError> {
        let [year, month, day, hour, minute, second] = fields else {
            return Err(RemirrorSyntaxError::new(rule));
        };

        Ok(Self {
            year: parse_field(rule, year, None)?,
            month: parse_field(rule, month, Some(2))?,
            day: parse_field(rule, day, Some(2))?,
            hour: parse_field(rule, hour, Some(2))?,
            minute: parse_field(rule, minute, Some(2))?,
            second: parse_field(rule, second, Some(2))?,
        })
    }
}

fn parse_field<T: std::str::FromStr>(
    rule: &str,
    field: &str,
    width: Option<usize>,
) -> Result<Option<T>, RemirrorSyntaxError> {
    if field == "*" {
        return Ok(None);
    }
    if field.is_empty()
        || !field.bytes().all(|b| b.is_ascii_digit())
        || width.is_some_and(|width| field.len() != width)
    {
        return Err(RemirrorSyntaxError::new(rule));
    }
    field
        .parse()
        .map(Some)
        .map_err(|_| RemirrorSyntaxError::new(rule))
}

impl std::str::FromStr for TimeRule {
    type Err = RemirrorSyntaxError;

    fn from_str(rule: &str) -> Result<Self, Self::Err> {
        if let Some(caps) = DATETIME_RULE.captures(rule) {
            let fields: Vec<&str> = caps
                .iter()
                .skip(1)
                .map(|m| m.map_or("", |m| m.as_str()))
                .collect();
            return Self::from_fields(rule, &fields);
        }

        let fields: Vec<&str> = rule.split_whitespace().collect();
        Self::from_fields(rule, &fields)
    }
}

impl std::fmt::Display for TimeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn field<T: std::fmt::Display>(value: Option<T>, width: usize) -> String {
            match value {
                Some(value) => format!("{:0width$}", value, width = width),
                None => "*".to_string(),
            }
        }

        write!(
            f,
            "{}-{}-{} {}:{}:{}",
            field(self.year, 4),
            field(self.month, 2),
            field(self.day, 2),
            field(self.hour, 2),
            field(self.minute, 2),
            field(self.second, 2),
        )
    }
}

/// Remirror policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Remirror {
    #[default]
    Never,
    Always,
    Purge,
    /// Replace while the current time matches the rule, keep otherwise.
    Schedule(TimeRule),
}

impl Remirror {
    /// Action to take at `now`.
    pub fn action_at(&self, now: NaiveDateTime) -> RemirrorAction {
        match self {
            Remirror::Never => RemirrorAction::Keep,
            Remirror::Always => RemirrorAction::Replace,
            Remirror::Purge => RemirrorAction::Purge,
            Remirror::Schedule(rule) if rule.matches(now) => RemirrorAction::Replace,
            Remirror::Schedule(_) => RemirrorAction::Keep,
        }
    }
}

impl std::str::FromStr for Remirror {
    type Err = RemirrorSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rule = s.trim();
        match rule.to_lowercase().as_str() {
            "never" | "no" | "false" => Ok(Remirror::Never),
            "always" | "yes" | "true" => Ok(Remirror::Always),
            "purge" => Ok(Remirror::Purge),
            _ => rule
                .parse::<TimeRule>()
                .map(Remirror::Schedule)
                .map_err(|_| RemirrorSyntaxError::new(s)),
        }
    }
}

impl std::fmt::Display for Remirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remirror::Never => write!(f, "never"),
            Remirror::Always => write!(f, "always"),
            Remirror::Purge => write!(f, "purge"),
            Remirror::Schedule(rule) => write!(f, "{}", rule),
        }
    }
}

/// Whether `rule` asks for existing mirrors to be recreated at `now`.
pub fn should_remirror(rule: &str, now: NaiveDateTime) -> Result<bool, RemirrorSyntaxError> {
    let remirror: Remirror = rule.parse()?;
    Ok(remirror.action_at(now) != RemirrorAction::Keep)
}
