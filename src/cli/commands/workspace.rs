use crate::cli::commands::{
    found, list_options, CURSOR_OPTION, FORCE_OPTION, IF_NOT_EXISTS_OPTION, JSON_OPTION,
    LIMIT_OPTION,
};
use crate::cli::context::Context;
use crate::cli::dispatch::{no_arguments, single_argument, Command};
use crate::cli::optparser::OptionDefinition;
use crate::core::labels::{apply_label_operations, parse_label_operations, LabelOperation};
use crate::core::trn::{ResourceIdentifier, ResourceType};
use crate::core::validate::{group_identifier, resource_identifier, split_resource_path};
use crate::domain::error::{TharsisError, TharsisResult};
use crate::domain::model::CreateWorkspaceInput;
use async_trait::async_trait;
use tracing::{debug, info};

fn workspace_identifier(arg: &str) -> TharsisResult<ResourceIdentifier> {
    resource_identifier(arg, ResourceType::Workspace)
}

/// `workspace get <workspace-path>`
pub struct WorkspaceGet;

#[async_trait]
impl Command for WorkspaceGet {
    fn name(&self) -> &'static str {
        "workspace get"
    }

    fn synopsis(&self) -> &'static str {
        "Get a single workspace."
    }

    fn usage(&self) -> &'static str {
        "[options] <workspace-path>"
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![JSON_OPTION]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let id = workspace_identifier(&single_argument(positional, "workspace path")?)?;
        let workspace = ctx.client()?.get_workspace(&id).await?;
        ctx.output.write_workspace(&workspace, options.flag("json"))?;
        Ok(())
    }
}

/// `workspace list`
pub struct WorkspaceList;

#[async_trait]
impl Command for WorkspaceList {
    fn name(&self) -> &'static str {
        "workspace list"
    }

    fn synopsis(&self) -> &'static str {
        "Retrieve a paginated list of workspaces."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![
            OptionDefinition::single("group-path", "Only list workspaces directly in this group."),
            CURSOR_OPTION,
            LIMIT_OPTION,
            JSON_OPTION,
        ]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        no_arguments(positional)?;

        let group = options.value("group-path").map(group_identifier).transpose()?;
        let page = ctx
            .client()?
            .list_workspaces(group.as_ref().map(ResourceIdentifier::path), &list_options(&options)?)
            .await?;
        ctx.output.write_workspaces(&page, options.flag("json"))?;
        Ok(())
    }
}

/// `workspace create <workspace-path>`
pub struct WorkspaceCreate;

#[async_trait]
impl Command for WorkspaceCreate {
    fn name(&self) -> &'static str {
        "workspace create"
    }

    fn synopsis(&self) -> &'static str {
        "Create a new workspace."
    }

    fn usage(&self) -> &'static str {
        "[options] <workspace-path>"
    }

    fn description(&self) -> &'static str {
        "Create a workspace at <group path>/<name>. The group must already exist."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![
            OptionDefinition::single("description", "Description for the new workspace."),
            OptionDefinition::single(
                "terraform-version",
                "Terraform version for the new workspace.",
            ),
            OptionDefinition::repeated("label", "Label to attach, as key=value."),
            IF_NOT_EXISTS_OPTION,
            JSON_OPTION,
        ]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let path = single_argument(positional, "workspace path")?;
        let (group_path, name) = split_resource_path(&path)?;
        let operations = parse_label_operations(options.values("label"), false)?;
        let removal = operations
            .iter()
            .find(|op| matches!(op, LabelOperation::Remove { .. }));
        if let Some(removal) = removal {
            return Err(TharsisError::Argument(format!(
                "cannot remove label '{}' from a workspace that does not exist yet",
                removal.key()
            )));
        }
        let client = ctx.client()?;

        if options.flag("if-not-exists") {
            let id = ResourceIdentifier::Path(path.clone());
            if let Some(workspace) = found(client.get_workspace(&id).await)? {
                info!(path = %path, "workspace already exists");
                ctx.output.write_workspace(&workspace, options.flag("json"))?;
                return Ok(());
            }
        }

        let workspace = client
            .create_workspace(&CreateWorkspaceInput {
                name: name.to_string(),
                group_path: group_path.to_string(),
                description: options.value("description").unwrap_or_default().to_string(),
                terraform_version: options.value("terraform-version").map(str::to_string),
                labels: apply_label_operations(&[], &operations, false),
            })
            .await?;
        info!(path = %workspace.full_path, id = %workspace.id, "workspace created");
        ctx.output.write_workspace(&workspace, options.flag("json"))?;
        Ok(())
    }
}

/// `workspace delete <workspace-path>`
pub struct WorkspaceDelete;

#[async_trait]
impl Command for WorkspaceDelete {
    fn name(&self) -> &'static str {
        "workspace delete"
    }

    fn synopsis(&self) -> &'static str {
        "Delete a workspace."
    }

    fn usage(&self) -> &'static str {
        "[options] <workspace-path>"
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![FORCE_OPTION]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let id = workspace_identifier(&single_argument(positional, "workspace path")?)?;
        ctx.client()?.delete_workspace(&id, options.flag("force")).await?;
        ctx.output.write_message(&format!("Workspace {} deleted", id))?;
        Ok(())
    }
}

/// `workspace label <workspace-path> <key=value | key->...`
pub struct WorkspaceLabel;

#[async_trait]
impl Command for WorkspaceLabel {
    fn name(&self) -> &'static str {
        "workspace label"
    }

    fn synopsis(&self) -> &'static str {
        "Add, update or remove workspace labels."
    }

    fn usage(&self) -> &'static str {
        "[options] <workspace-path> <key=value | key->..."
    }

    fn description(&self) -> &'static str {
        "Apply label operations to a workspace. key=value sets a label and key- \
         removes one. With --overwrite the existing labels are discarded and \
         replaced by the given ones."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![
            OptionDefinition::flag("overwrite", "Replace all existing labels."),
            JSON_OPTION,
        ]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let Some((workspace, tokens)) = positional.split_first() else {
            return Err(TharsisError::Argument("missing workspace path argument".to_string()));
        };
        if tokens.is_empty() {
            return Err(TharsisError::Argument(
                "at least one label operation is required".to_string(),
            ));
        }
        let overwrite = options.flag("overwrite");
        let operations = parse_label_operations(tokens, overwrite)?;
        let id = workspace_identifier(workspace)?;

        let client = ctx.client()?;
        let current = client.get_workspace(&id).await?;
        let labels = apply_label_operations(&current.labels, &operations, overwrite);
        debug!(workspace = %id, labels = labels.len(), "updating labels");
        let updated = client.update_workspace_labels(&id, &labels).await?;
        ctx.output.write_workspace(&updated, options.flag("json"))?;
        Ok(())
    }
}
