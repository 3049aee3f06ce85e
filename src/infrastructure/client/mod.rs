// Client module - Remote Tharsis API
pub mod http;
#[cfg(test)]
pub mod memory;

pub use http::HttpClient;

use crate::core::trn::ResourceIdentifier;
use crate::domain::error::ApiError;
use crate::domain::model::{
    CreateGroupInput, CreateProviderPlatformInput, CreateProviderVersionInput, CreateWorkspaceInput,
    Group, Label, ListOptions, ManagedIdentity, Page, ProviderPlatform, ProviderVersion, Workspace,
};
use async_trait::async_trait;
use tokio::fs::File;

/// Operations the CLI needs from the Tharsis API
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get_group(&self, id: &ResourceIdentifier) -> Result<Group, ApiError>;

    /// List groups below `parent_path`, or top-level groups when it is `None`
    async fn list_groups(
        &self,
        parent_path: Option<&str>,
        options: &ListOptions,
    ) -> Result<Page<Group>, ApiError>;

    async fn create_group(&self, input: &CreateGroupInput) -> Result<Group, ApiError>;

    async fn delete_group(&self, id: &ResourceIdentifier, force: bool) -> Result<(), ApiError>;

    async fn get_workspace(&self, id: &ResourceIdentifier) -> Result<Workspace, ApiError>;

    async fn list_workspaces(
        &self,
        group_path: Option<&str>,
        options: &ListOptions,
    ) -> Result<Page<Workspace>, ApiError>;

    async fn create_workspace(&self, input: &CreateWorkspaceInput) -> Result<Workspace, ApiError>;

    /// Replace the complete label set of a workspace
    async fn update_workspace_labels(
        &self,
        id: &ResourceIdentifier,
        labels: &[Label],
    ) -> Result<Workspace, ApiError>;

    async fn delete_workspace(&self, id: &ResourceIdentifier, force: bool) -> Result<(), ApiError>;

    async fn get_managed_identity(
        &self,
        id: &ResourceIdentifier,
    ) -> Result<ManagedIdentity, ApiError>;

    async fn delete_managed_identity(
        &self,
        id: &ResourceIdentifier,
        force: bool,
    ) -> Result<(), ApiError>;

    async fn create_provider_version(
        &self,
        input: &CreateProviderVersionInput,
    ) -> Result<ProviderVersion, ApiError>;

    async fn upload_provider_readme(&self, version_id: &str, file: File) -> Result<(), ApiError>;

    async fn upload_provider_checksums(&self, version_id: &str, file: File) -> Result<(), ApiError>;

    async fn upload_provider_checksum_signature(
        &self,
        version_id: &str,
        file: File,
    ) -> Result<(), ApiError>;

    async fn create_provider_platform(
        &self,
        input: &CreateProviderPlatformInput,
    ) -> Result<ProviderPlatform, ApiError>;

    async fn upload_provider_platform_binary(
        &self,
        platform_id: &str,
        file: File,
    ) -> Result<(), ApiError>;
}
