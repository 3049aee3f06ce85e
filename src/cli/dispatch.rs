use crate::cli::context::Context;
use crate::cli::optparser::{Arity, OptionDefinition, OptionSchema, ParsedOptions};
use crate::domain::error::{TharsisError, TharsisResult};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A subcommand such as `workspace create`
#[async_trait]
pub trait Command: Send + Sync {
    /// Space separated command path
    fn name(&self) -> &'static str;

    /// One line summary shown in command listings
    fn synopsis(&self) -> &'static str;

    /// Arguments shown after the command path in the usage line
    fn usage(&self) -> &'static str {
        "[options]"
    }

    /// Longer description for the help text
    fn description(&self) -> &'static str {
        self.synopsis()
    }

    fn options(&self) -> Vec<OptionDefinition> {
        Vec::new()
    }

    fn schema(&self) -> TharsisResult<OptionSchema> {
        Ok(OptionSchema::new(self.options())?)
    }

    /// Parse `args` against this command's options
    fn parse(&self, args: &[String]) -> TharsisResult<(ParsedOptions, Vec<String>)> {
        Ok(self.schema()?.parse(args)?)
    }

    fn help(&self) -> String {
        let mut help = format!(
            "Usage: tharsis [global options] {} {}\n\n   {}\n",
            self.name(),
            self.usage(),
            self.description()
        );
        let options = self.options();
        if !options.is_empty() {
            help.push_str("\nOptions:\n\n");
            for option in options {
                let mut flag = format!("--{}", option.name);
                if option.arity != Arity::Flag {
                    flag.push_str(" <value>");
                }
                let mut notes = Vec::new();
                if option.required {
                    notes.push("required");
                }
                if option.arity == Arity::Repeated {
                    notes.push("repeatable");
                }
                let notes = if notes.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", notes.join(", "))
                };
                help.push_str(&format!("   {:<28} {}{}\n", flag, option.synopsis, notes));
            }
        }
        help
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()>;
}

/// Require exactly one positional argument
pub fn single_argument(positional: Vec<String>, what: &str) -> TharsisResult<String> {
    let mut positional = positional.into_iter();
    match (positional.next(), positional.next()) {
        (Some(arg), None) => Ok(arg),
        (None, _) => Err(TharsisError::Argument(format!("missing {} argument", what))),
        (Some(_), Some(extra)) => Err(TharsisError::Argument(format!(
            "unexpected argument '{}', expected a single {}",
            extra, what
        ))),
    }
}

/// Require that no positional arguments were given
pub fn no_arguments(positional: Vec<String>) -> TharsisResult<()> {
    match positional.first() {
        None => Ok(()),
        Some(extra) => Err(TharsisError::Argument(format!("unexpected argument '{}'", extra))),
    }
}

pub type CommandFactory = fn() -> Box<dyn Command>;

/// Maps command paths to factories
#[derive(Default)]
pub struct CommandRegistry {
    factories: BTreeMap<&'static str, CommandFactory>,
    groups: BTreeMap<&'static str, &'static str>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, factory: CommandFactory) -> &mut Self {
        self.factories.insert(name, factory);
        self
    }

    /// Describe a noun whose verbs are registered separately
    pub fn register_group(&mut self, name: &'static str, synopsis: &'static str) -> &mut Self {
        self.groups.insert(name, synopsis);
        self
    }

    /// Check every command's option table and registered name
    pub fn validate(&self) -> TharsisResult<()> {
        for (name, factory) in &self.factories {
            let command = factory();
            if command.name() != *name {
                return Err(TharsisError::Argument(format!(
                    "command registered as '{}' reports name '{}'",
                    name,
                    command.name()
                )));
            }
            command.schema()?;
        }
        Ok(())
    }

    /// Find the longest registered command path that prefixes `tokens`
    pub fn resolve<'a>(&self, tokens: &'a [String]) -> Option<(Box<dyn Command>, &'a [String])> {
        (1..=tokens.len()).rev().find_map(|depth| {
            let key = tokens[..depth].join(" ");
            self.factories
                .get(key.as_str())
                .map(|factory| (factory(), &tokens[depth..]))
        })
    }

    pub fn is_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Commands nested directly below `prefix`
    pub fn subcommands(&self, prefix: &str) -> Vec<Box<dyn Command>> {
        self.factories
            .iter()
            .filter(|(name, _)| {
                name.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix(' '))
                    .is_some_and(|rest| !rest.contains(' '))
            })
            .map(|(_, factory)| factory())
            .collect()
    }

    /// Listing of the top level commands
    pub fn overview(&self) -> String {
        let mut entries: BTreeMap<&str, &str> = self.groups.clone();
        for (name, factory) in &self.factories {
            if !name.contains(' ') {
                entries.insert(*name, factory().synopsis());
            }
        }
        let mut text = String::from(
            "Usage: tharsis [global options] <command> [args]\n\nAvailable commands:\n",
        );
        for (name, synopsis) in entries {
            text.push_str(&format!("    {:<28} {}\n", name, synopsis));
        }
        text
    }

    /// Listing of the verbs of a noun such as `workspace`
    pub fn group_help(&self, name: &str) -> String {
        let mut text = format!(
            "Usage: tharsis [global options] {} <subcommand> [args]\n\n   {}\n\nSubcommands:\n",
            name,
            self.groups.get(name).copied().unwrap_or_default()
        );
        for command in self.subcommands(name) {
            let verb = command.name().rsplit(' ').next().unwrap_or_default();
            text.push_str(&format!("    {:<28} {}\n", verb, command.synopsis()));
        }
        text
    }
}
