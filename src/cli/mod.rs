// CLI module - Command line interface
pub mod args;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod optparser;
pub mod output;

pub use args::Args;
pub use context::Context;
pub use output::OutputWriter;

use crate::cli::dispatch::CommandRegistry;
use crate::cli::optparser::is_help;
use crate::domain::error::TharsisError;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::settings::SettingsManager;
use tracing::debug;

/// A command error together with the help text to show after it
#[derive(Debug)]
pub struct CommandFailure {
    pub error: TharsisError,
    pub help: Option<String>,
}

impl From<TharsisError> for CommandFailure {
    fn from(error: TharsisError) -> Self {
        Self { error, help: None }
    }
}

/// Resolve `tokens` to a command and run it
pub async fn execute(
    registry: &CommandRegistry,
    ctx: &Context,
    tokens: &[String],
) -> Result<(), CommandFailure> {
    let Some((command, args)) = registry.resolve(tokens) else {
        return match tokens {
            [] => Err(CommandFailure {
                error: TharsisError::Argument("missing command".to_string()),
                help: Some(registry.overview()),
            }),
            [noun, rest @ ..] if registry.is_group(noun) => {
                if rest.first().is_some_and(|t| is_help(t)) {
                    ctx.output
                        .write_message(&registry.group_help(noun))
                        .map_err(TharsisError::from)?;
                    return Ok(());
                }
                let error = match rest.first() {
                    Some(verb) => TharsisError::UnknownCommand(format!("{} {}", noun, verb)),
                    None => TharsisError::Argument(format!("missing subcommand for '{}'", noun)),
                };
                Err(CommandFailure {
                    error,
                    help: Some(registry.group_help(noun)),
                })
            }
            [first, ..] if is_help(first) => {
                ctx.output
                    .write_message(&registry.overview())
                    .map_err(TharsisError::from)?;
                Ok(())
            }
            [first, ..] => Err(CommandFailure {
                error: TharsisError::UnknownCommand(first.clone()),
                help: Some(registry.overview()),
            }),
        };
    };

    if command.schema()?.help_requested(args) {
        ctx.output
            .write_message(&command.help())
            .map_err(TharsisError::from)?;
        return Ok(());
    }

    debug!(command = command.name(), "running command");
    command.run(ctx, args).await.map_err(|error| {
        let help = error.is_argument_error().then(|| command.help());
        CommandFailure { error, help }
    })
}

/// Run the CLI and return the process exit code
pub async fn run(args: Args) -> i32 {
    match try_run(args).await {
        Ok(()) => 0,
        Err(failure) => {
            eprintln!("Error: {}", failure.error);
            if let Some(help) = failure.help {
                eprintln!();
                eprint!("{}", help);
            }
            1
        }
    }
}

async fn try_run(args: Args) -> Result<(), CommandFailure> {
    let settings_manager = match &args.config {
        Some(path) => SettingsManager::with_path(path),
        None => SettingsManager::new()?,
    };
    let settings = settings_manager.load()?;

    if !args.quiet {
        if let Err(e) = init_logging(&settings.log_level, args.verbose) {
            eprintln!("Warning: {}", e);
        }
    }

    let registry = commands::registry();
    registry.validate()?;

    let ctx = Context::new(args.profile, settings_manager, settings, OutputWriter::stdout());
    execute(&registry, &ctx, &args.command).await
}
