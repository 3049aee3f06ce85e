//! Declarative option parsing for subcommands.
//!
//! Each command describes its options as a table of [`OptionDefinition`]s.
//! The table is checked once when it is turned into an [`OptionSchema`], and
//! the schema then splits raw arguments into [`ParsedOptions`] plus the
//! positional arguments that follow them.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use thiserror::Error;

/// How many values an option takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Presence flag, no value
    Flag,
    /// Exactly one value, may be given once
    Single,
    /// One value per occurrence, may be repeated
    Repeated,
}

/// A single option accepted by a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDefinition {
    pub name: &'static str,
    pub arity: Arity,
    pub required: bool,
    pub synopsis: &'static str,
}

impl OptionDefinition {
    pub const fn flag(name: &'static str, synopsis: &'static str) -> Self {
        Self {
            name,
            arity: Arity::Flag,
            required: false,
            synopsis,
        }
    }

    pub const fn single(name: &'static str, synopsis: &'static str) -> Self {
        Self {
            name,
            arity: Arity::Single,
            required: false,
            synopsis,
        }
    }

    pub const fn repeated(name: &'static str, synopsis: &'static str) -> Self {
        Self {
            name,
            arity: Arity::Repeated,
            required: false,
            synopsis,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Problems with an option table itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("option name cannot be empty")]
    EmptyName,

    #[error("option '{0}' must not include leading dashes or '='")]
    InvalidName(String),

    #[error("option '{0}' is defined more than once")]
    Duplicate(String),

    #[error("flag option '{0}' cannot be required")]
    RequiredFlag(String),
}

/// Problems with the arguments a user supplied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("missing required option: --{0}")]
    MissingRequiredOption(String),

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("option --{0} requires an argument")]
    MissingArgument(String),

    #[error("option --{0} may only be specified once")]
    RepeatedOption(String),

    #[error("option --{name} is a flag and does not accept value '{value}'")]
    InvalidFlagValue { name: String, value: String },

    #[error("invalid value '{value}' for option --{name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Validated option table
#[derive(Debug, Clone)]
pub struct OptionSchema {
    definitions: Vec<OptionDefinition>,
}

impl OptionSchema {
    pub fn new(definitions: Vec<OptionDefinition>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for definition in &definitions {
            if definition.name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if definition.name.starts_with('-') || definition.name.contains('=') {
                return Err(SchemaError::InvalidName(definition.name.to_string()));
            }
            if !seen.insert(definition.name) {
                return Err(SchemaError::Duplicate(definition.name.to_string()));
            }
            if definition.required && definition.arity == Arity::Flag {
                return Err(SchemaError::RequiredFlag(definition.name.to_string()));
            }
        }
        Ok(Self { definitions })
    }

    fn lookup(&self, name: &str) -> Option<&OptionDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Split `args` into options and positional arguments.
    ///
    /// Options must come first; the first token that is not an option, or a
    /// bare `--`, ends option parsing.
    pub fn parse(&self, args: &[String]) -> Result<(ParsedOptions, Vec<String>), OptionError> {
        let mut parsed = ParsedOptions::default();
        let mut index = 0;

        while index < args.len() {
            let token = args[index].as_str();
            if token == "--" {
                index += 1;
                break;
            }
            let Some(body) = option_body(token) else {
                break;
            };

            let (name, inline_value) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };
            let definition = self
                .lookup(name)
                .ok_or_else(|| OptionError::UnknownOption(token.to_string()))?;

            let value = match definition.arity {
                Arity::Flag => match inline_value {
                    None | Some("true") => "true".to_string(),
                    Some("false") => "false".to_string(),
                    Some(other) => {
                        return Err(OptionError::InvalidFlagValue {
                            name: name.to_string(),
                            value: other.to_string(),
                        })
                    }
                },
                Arity::Single | Arity::Repeated => match inline_value {
                    Some(value) => value.to_string(),
                    None => {
                        index += 1;
                        args.get(index)
                            .cloned()
                            .ok_or_else(|| OptionError::MissingArgument(name.to_string()))?
                    }
                },
            };

            let values = parsed.values.entry(definition.name.to_string()).or_default();
            if definition.arity != Arity::Repeated && !values.is_empty() {
                return Err(OptionError::RepeatedOption(name.to_string()));
            }
            values.push(value);
            index += 1;
        }

        for definition in &self.definitions {
            if definition.required && !parsed.values.contains_key(definition.name) {
                return Err(OptionError::MissingRequiredOption(definition.name.to_string()));
            }
        }

        Ok((parsed, args[index..].to_vec()))
    }

    /// Whether a help flag appears where an option is expected.
    ///
    /// Values of options that take one are skipped, so `--description -h`
    /// sets a description.
    pub fn help_requested(&self, args: &[String]) -> bool {
        let mut tokens = args.iter();
        while let Some(token) = tokens.next() {
            if is_help(token) {
                return true;
            }
            let Some(body) = option_body(token) else {
                return false;
            };
            if body.contains('=') {
                continue;
            }
            if self.lookup(body).is_some_and(|d| d.arity != Arity::Flag) {
                tokens.next();
            }
        }
        false
    }
}

/// `-h`, `--help` and `-help` ask for a command's help
pub fn is_help(token: &str) -> bool {
    matches!(token, "-h" | "--help" | "-help")
}

/// `--name`, `--name=value` and `-name` are options; `-` alone is not
fn option_body(token: &str) -> Option<&str> {
    let body = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))?;
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

/// Option values keyed by option name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    values: HashMap<String, Vec<String>>,
}

impl ParsedOptions {
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Whether a flag was given and not explicitly set to false
    pub fn flag(&self, name: &str) -> bool {
        self.value(name).is_some_and(|v| v == "true")
    }

    /// Last value supplied for `name`
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parse the value of `name` with [`FromStr`]
    pub fn parsed<T>(&self, name: &str) -> Result<Option<T>, OptionError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.value(name)
            .map(|value| {
                value.parse::<T>().map_err(|e| OptionError::InvalidValue {
                    name: name.to_string(),
                    value: value.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}
