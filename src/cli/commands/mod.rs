// Commands module - Subcommands of the tharsis CLI
pub mod configure;
pub mod group;
pub mod managed_identity;
pub mod provider;
pub mod version;
pub mod workspace;

use crate::cli::dispatch::CommandRegistry;
use crate::cli::optparser::{OptionDefinition, ParsedOptions};
use crate::domain::error::{ApiError, TharsisResult};
use crate::domain::model::ListOptions;

pub const JSON_OPTION: OptionDefinition =
    OptionDefinition::flag("json", "Show final output as JSON.");
pub const IF_NOT_EXISTS_OPTION: OptionDefinition = OptionDefinition::flag(
    "if-not-exists",
    "Return the existing resource instead of failing when it already exists.",
);
pub const FORCE_OPTION: OptionDefinition =
    OptionDefinition::flag("force", "Delete even when the resource still has dependents.");
pub const CURSOR_OPTION: OptionDefinition =
    OptionDefinition::single("cursor", "Cursor returned by a previous listing.");
pub const LIMIT_OPTION: OptionDefinition =
    OptionDefinition::single("limit", "Maximum number of results to return.");

/// Every command the CLI knows about
pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry
        .register("configure", || Box::new(configure::Configure))
        .register("configure list", || Box::new(configure::ConfigureList))
        .register("configure delete", || Box::new(configure::ConfigureDelete))
        .register_group("group", "Manage groups.")
        .register("group get", || Box::new(group::GroupGet))
        .register("group list", || Box::new(group::GroupList))
        .register("group create", || Box::new(group::GroupCreate))
        .register("group delete", || Box::new(group::GroupDelete))
        .register_group("workspace", "Manage workspaces.")
        .register("workspace get", || Box::new(workspace::WorkspaceGet))
        .register("workspace list", || Box::new(workspace::WorkspaceList))
        .register("workspace create", || Box::new(workspace::WorkspaceCreate))
        .register("workspace delete", || Box::new(workspace::WorkspaceDelete))
        .register("workspace label", || Box::new(workspace::WorkspaceLabel))
        .register_group("managed-identity", "Manage managed identities.")
        .register("managed-identity get", || Box::new(managed_identity::ManagedIdentityGet))
        .register("managed-identity delete", || Box::new(managed_identity::ManagedIdentityDelete))
        .register_group("provider", "Manage Terraform providers in the registry.")
        .register("provider upload-version", || Box::new(provider::UploadVersion))
        .register("version", || Box::new(version::Version));
    registry
}

/// Pagination options shared by list commands
pub fn list_options(options: &ParsedOptions) -> TharsisResult<ListOptions> {
    Ok(ListOptions {
        cursor: options.value("cursor").map(str::to_string),
        limit: options.parsed::<u32>("limit")?,
    })
}

/// Treat a remote "not found" as absence
pub fn found<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ApiError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::cli::context::Context;
    use crate::cli::output::{OutputWriter, SharedBuffer};
    use crate::domain::settings::Settings;
    use crate::infrastructure::client::memory::MemoryClient;
    use crate::infrastructure::settings::SettingsManager;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Context wired to an in-memory API and a captured output buffer
    pub struct Harness {
        pub ctx: Context,
        pub output: SharedBuffer,
        pub client: Arc<MemoryClient>,
        _dir: TempDir,
    }

    impl Harness {
        pub fn new(client: MemoryClient) -> Self {
            let dir = TempDir::new().unwrap();
            let output = SharedBuffer::default();
            let client = Arc::new(client);
            let ctx = Context::new(
                "default",
                SettingsManager::with_path(dir.path().join("settings.toml")),
                Settings::default(),
                OutputWriter::new(Box::new(output.clone())),
            )
            .with_client(client.clone());
            Self {
                ctx,
                output,
                client,
                _dir: dir,
            }
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.output.contents()).unwrap()
        }
    }

    pub fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}
