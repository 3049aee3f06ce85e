use crate::cli::commands::{FORCE_OPTION, JSON_OPTION};
use crate::cli::context::Context;
use crate::cli::dispatch::{single_argument, Command};
use crate::cli::optparser::OptionDefinition;
use crate::core::trn::ResourceType;
use crate::core::validate::resource_identifier;
use crate::domain::error::TharsisResult;
use async_trait::async_trait;

/// `managed-identity get <managed-identity-path>`
pub struct ManagedIdentityGet;

#[async_trait]
impl Command for ManagedIdentityGet {
    fn name(&self) -> &'static str {
        "managed-identity get"
    }

    fn synopsis(&self) -> &'static str {
        "Get a single managed identity."
    }

    fn usage(&self) -> &'static str {
        "[options] <managed-identity-path>"
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![JSON_OPTION]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let id = resource_identifier(
            &single_argument(positional, "managed identity path")?,
            ResourceType::ManagedIdentity,
        )?;
        let identity = ctx.client()?.get_managed_identity(&id).await?;
        ctx.output.write_managed_identity(&identity, options.flag("json"))?;
        Ok(())
    }
}

/// `managed-identity delete <managed-identity-path>`
pub struct ManagedIdentityDelete;

#[async_trait]
impl Command for ManagedIdentityDelete {
    fn name(&self) -> &'static str {
        "managed-identity delete"
    }

    fn synopsis(&self) -> &'static str {
        "Delete a managed identity."
    }

    fn usage(&self) -> &'static str {
        "[options] <managed-identity-path>"
    }

    fn description(&self) -> &'static str {
        "Delete a managed identity. --force also removes it when it is still \
         assigned to workspaces."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![FORCE_OPTION]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let id = resource_identifier(
            &single_argument(positional, "managed identity path")?,
            ResourceType::ManagedIdentity,
        )?;
        ctx.client()?
            .delete_managed_identity(&id, options.flag("force"))
            .await?;
        ctx.output.write_message(&format!("Managed identity {} deleted", id))?;
        Ok(())
    }
}
