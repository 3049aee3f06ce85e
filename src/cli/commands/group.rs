use crate::cli::commands::{
    found, list_options, CURSOR_OPTION, FORCE_OPTION, IF_NOT_EXISTS_OPTION, JSON_OPTION,
    LIMIT_OPTION,
};
use crate::cli::context::Context;
use crate::cli::dispatch::{no_arguments, single_argument, Command};
use crate::cli::optparser::OptionDefinition;
use crate::core::trn::ResourceIdentifier;
use crate::core::validate::{group_identifier, validate_namespace_path};
use crate::domain::error::TharsisResult;
use crate::domain::model::CreateGroupInput;
use async_trait::async_trait;
use tracing::info;

/// `group get <group-path>`
pub struct GroupGet;

#[async_trait]
impl Command for GroupGet {
    fn name(&self) -> &'static str {
        "group get"
    }

    fn synopsis(&self) -> &'static str {
        "Get a single group."
    }

    fn usage(&self) -> &'static str {
        "[options] <group-path>"
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![JSON_OPTION]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let id = group_identifier(&single_argument(positional, "group path")?)?;
        let group = ctx.client()?.get_group(&id).await?;
        ctx.output.write_group(&group, options.flag("json"))?;
        Ok(())
    }
}

/// `group list`
pub struct GroupList;

#[async_trait]
impl Command for GroupList {
    fn name(&self) -> &'static str {
        "group list"
    }

    fn synopsis(&self) -> &'static str {
        "Retrieve a paginated list of groups."
    }

    fn description(&self) -> &'static str {
        "List the top-level groups, or the direct children of --parent-path."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![
            OptionDefinition::single("parent-path", "Only list groups directly below this group."),
            CURSOR_OPTION,
            LIMIT_OPTION,
            JSON_OPTION,
        ]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        no_arguments(positional)?;

        let parent = options
            .value("parent-path")
            .map(group_identifier)
            .transpose()?;
        let page = ctx
            .client()?
            .list_groups(parent.as_ref().map(ResourceIdentifier::path), &list_options(&options)?)
            .await?;
        ctx.output.write_groups(&page, options.flag("json"))?;
        Ok(())
    }
}

/// `group create <group-path>`
pub struct GroupCreate;

#[async_trait]
impl Command for GroupCreate {
    fn name(&self) -> &'static str {
        "group create"
    }

    fn synopsis(&self) -> &'static str {
        "Create a new group."
    }

    fn usage(&self) -> &'static str {
        "[options] <group-path>"
    }

    fn description(&self) -> &'static str {
        "Create a group. The last path segment is the new group's name; any \
         preceding segments name its parent, which must already exist."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![
            OptionDefinition::single("description", "Description for the new group."),
            IF_NOT_EXISTS_OPTION,
            JSON_OPTION,
        ]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let path = single_argument(positional, "group path")?;
        validate_namespace_path(&path)?;
        let client = ctx.client()?;

        if options.flag("if-not-exists") {
            let id = ResourceIdentifier::Path(path.clone());
            if let Some(group) = found(client.get_group(&id).await)? {
                info!(path = %path, "group already exists");
                ctx.output.write_group(&group, options.flag("json"))?;
                return Ok(());
            }
        }

        let (parent_path, name) = match path.rsplit_once('/') {
            Some((parent, name)) => (Some(parent.to_string()), name.to_string()),
            None => (None, path.clone()),
        };
        let group = client
            .create_group(&CreateGroupInput {
                name,
                parent_path,
                description: options.value("description").unwrap_or_default().to_string(),
            })
            .await?;
        info!(path = %group.full_path, id = %group.id, "group created");
        ctx.output.write_group(&group, options.flag("json"))?;
        Ok(())
    }
}

/// `group delete <group-path>`
pub struct GroupDelete;

#[async_trait]
impl Command for GroupDelete {
    fn name(&self) -> &'static str {
        "group delete"
    }

    fn synopsis(&self) -> &'static str {
        "Delete a group."
    }

    fn usage(&self) -> &'static str {
        "[options] <group-path>"
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![FORCE_OPTION]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let id = group_identifier(&single_argument(positional, "group path")?)?;
        ctx.client()?.delete_group(&id, options.flag("force")).await?;
        ctx.output.write_message(&format!("Group {} deleted", id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing::{args, Harness};
    use crate::domain::error::TharsisError;
    use crate::infrastructure::client::memory::{Call, MemoryClient};

    #[tokio::test]
    async fn test_get_accepts_trn() {
        let harness = Harness::new(MemoryClient::new().with_group("top/infra"));
        GroupGet
            .run(&harness.ctx, &args(&["--json", "trn:group:top/infra"]))
            .await
            .unwrap();
        assert_eq!(harness.json()["fullPath"], "top/infra");
    }

    #[tokio::test]
    async fn test_get_rejects_other_resource_type() {
        let harness = Harness::new(MemoryClient::new().with_group("top"));
        let err = GroupGet
            .run(&harness.ctx, &args(&["trn:workspace:top/ws"]))
            .await
            .unwrap_err();
        assert!(matches!(err, TharsisError::Identifier(_)));
    }

    #[tokio::test]
    async fn test_get_missing_group_is_not_found() {
        let harness = Harness::new(MemoryClient::new());
        let err = GroupGet.run(&harness.ctx, &args(&["nope"])).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_nested_group() {
        let harness = Harness::new(MemoryClient::new().with_group("top"));
        GroupCreate
            .run(&harness.ctx, &args(&["--description", "Infra", "top/infra"]))
            .await
            .unwrap();
        let group = harness.client.group("top/infra").unwrap();
        assert_eq!(group.description, "Infra");
        assert!(harness.output.contents().contains("top/infra"));
    }

    #[tokio::test]
    async fn test_create_if_not_exists_is_idempotent() {
        let harness = Harness::new(MemoryClient::new().with_group("top"));
        for _ in 0..2 {
            GroupCreate
                .run(&harness.ctx, &args(&["--if-not-exists", "top/infra"]))
                .await
                .unwrap();
        }
        assert_eq!(harness.client.calls(), vec![Call::CreateGroup("top/infra".to_string())]);
    }

    #[tokio::test]
    async fn test_create_twice_without_flag_conflicts() {
        let harness = Harness::new(MemoryClient::new().with_group("top"));
        let err = GroupCreate.run(&harness.ctx, &args(&["top"])).await.unwrap_err();
        assert!(err.to_string().contains("conflict"));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_segment() {
        let harness = Harness::new(MemoryClient::new());
        let err = GroupCreate.run(&harness.ctx, &args(&["top//infra"])).await.unwrap_err();
        assert!(matches!(err, TharsisError::Validation(_)));
        assert!(harness.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_children() {
        let harness = Harness::new(
            MemoryClient::new()
                .with_group("top")
                .with_group("top/a")
                .with_group("top/b")
                .with_group("other"),
        );
        GroupList
            .run(&harness.ctx, &args(&["--parent-path", "top", "--limit", "1", "--json"]))
            .await
            .unwrap();
        let page = harness.json();
        assert_eq!(page["totalCount"], 2);
        assert_eq!(page["items"][0]["fullPath"], "top/a");
        assert_eq!(page["nextCursor"], "1");
    }

    #[tokio::test]
    async fn test_list_rejects_positional() {
        let harness = Harness::new(MemoryClient::new());
        let err = GroupList.run(&harness.ctx, &args(&["top"])).await.unwrap_err();
        assert!(err.is_argument_error());
    }

    #[tokio::test]
    async fn test_delete() {
        let harness = Harness::new(MemoryClient::new().with_group("top"));
        GroupDelete.run(&harness.ctx, &args(&["--force", "top"])).await.unwrap();
        assert!(harness.client.group("top").is_none());
    }
}
