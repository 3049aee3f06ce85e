use crate::cli::commands::JSON_OPTION;
use crate::cli::context::Context;
use crate::cli::dispatch::{no_arguments, single_argument, Command};
use crate::cli::optparser::OptionDefinition;
use crate::domain::error::{TharsisError, TharsisResult};
use crate::domain::settings::Profile;
use async_trait::async_trait;
use tracing::info;

/// `configure`: create or update a connection profile
pub struct Configure;

#[async_trait]
impl Command for Configure {
    fn name(&self) -> &'static str {
        "configure"
    }

    fn synopsis(&self) -> &'static str {
        "Create or update a profile."
    }

    fn description(&self) -> &'static str {
        "Create or update a connection profile in the settings file. The profile \
         defaults to the one selected with the global --profile option."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![
            OptionDefinition::single("profile", "Name of the profile to write."),
            OptionDefinition::single("endpoint-url", "Base URL of the Tharsis API.").required(),
        ]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        no_arguments(positional)?;

        let name = options.value("profile").unwrap_or(ctx.profile_name.as_str());
        let endpoint = options.value("endpoint-url").unwrap_or_default();
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| {
            TharsisError::Validation(format!("invalid endpoint URL '{}': {}", endpoint, e))
        })?;

        // Keep a token written by an earlier login
        let token = ctx.settings.profiles.get(name).and_then(|p| p.token.clone());
        ctx.settings_manager.upsert_profile(
            name,
            Profile {
                endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
                token,
            },
        )?;

        info!(profile = name, endpoint = %endpoint, "profile saved");
        ctx.output.write_message(&format!(
            "Profile '{}' saved to {}",
            name,
            ctx.settings_manager.settings_path().display()
        ))?;
        Ok(())
    }
}

/// `configure list`
pub struct ConfigureList;

#[async_trait]
impl Command for ConfigureList {
    fn name(&self) -> &'static str {
        "configure list"
    }

    fn synopsis(&self) -> &'static str {
        "Show all profiles."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![JSON_OPTION]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        no_arguments(positional)?;
        ctx.output.write_profiles(&ctx.settings, options.flag("json"))?;
        Ok(())
    }
}

/// `configure delete <name>`
pub struct ConfigureDelete;

#[async_trait]
impl Command for ConfigureDelete {
    fn name(&self) -> &'static str {
        "configure delete"
    }

    fn synopsis(&self) -> &'static str {
        "Remove a profile."
    }

    fn usage(&self) -> &'static str {
        "<profile-name>"
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (_, positional) = self.parse(args)?;
        let name = single_argument(positional, "profile name")?;
        ctx.settings_manager.remove_profile(&name)?;
        ctx.output.write_message(&format!("Profile '{}' deleted", name))?;
        Ok(())
    }
}
