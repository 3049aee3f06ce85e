use crate::domain::settings::DEFAULT_PROFILE;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments for the Tharsis CLI
#[derive(Parser, Debug)]
#[command(
    name = "tharsis",
    version = env!("CARGO_PKG_VERSION"),
    about = "Command line client for the Tharsis API",
    long_about = "Command line client for the Tharsis API: manage groups, workspaces, \
                  managed identities and provider registry versions.",
    after_help = concat!(
        "Commands:\n",
        "    configure           Create or update a profile.\n",
        "    group               Manage groups.\n",
        "    workspace           Manage workspaces.\n",
        "    managed-identity    Manage managed identities.\n",
        "    provider            Manage Terraform providers in the registry.\n",
        "    version             Show the CLI version.\n",
        "\n",
        "Run 'tharsis <command> --help' for the options of a command."
    )
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not install a log subscriber
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings profile to use
    #[arg(short, long, env = "THARSIS_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Settings file path
    #[arg(short, long, env = "THARSIS_SETTINGS_FILE")]
    pub config: Option<PathBuf>,

    /// Command, subcommand and their arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_options_then_command() {
        let args = Args::try_parse_from([
            "tharsis", "-v", "--profile", "prod", "workspace", "get", "--json", "top/ws",
        ])
        .unwrap();
        assert!(args.verbose);
        assert_eq!(args.profile, "prod");
        assert_eq!(args.command, vec!["workspace", "get", "--json", "top/ws"]);
    }

    #[test]
    fn test_command_options_are_not_global() {
        let args = Args::try_parse_from([
            "tharsis",
            "configure",
            "--profile",
            "x",
            "--endpoint-url",
            "http://h",
        ])
        .unwrap();
        assert_eq!(args.profile, "default");
        assert_eq!(args.command[..3], ["configure", "--profile", "x"]);
    }

    #[test]
    fn test_empty_command() {
        let args = Args::try_parse_from(["tharsis", "-q"]).unwrap();
        assert!(args.quiet);
        assert!(args.command.is_empty());
    }
}
