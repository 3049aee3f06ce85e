use crate::core::trn::ResourceIdentifier;
use crate::domain::error::ApiError;
use crate::domain::model::{
    CreateGroupInput, CreateProviderPlatformInput, CreateProviderVersionInput, CreateWorkspaceInput,
    Group, Label, ListOptions, ManagedIdentity, Page, ProviderPlatform, ProviderVersion, Workspace,
};
use crate::infrastructure::client::ApiClient;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Calls recorded by [`MemoryClient`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateGroup(String),
    CreateWorkspace(String),
    UpdateLabels(String),
    CreateProviderVersion(String),
    UploadReadme(String),
    UploadChecksums(String),
    UploadSignature(String),
    CreatePlatform(String),
    UploadBinary(String),
}

#[derive(Default)]
struct State {
    groups: BTreeMap<String, Group>,
    workspaces: BTreeMap<String, Workspace>,
    managed_identities: BTreeMap<String, ManagedIdentity>,
    uploads: BTreeMap<String, Vec<u8>>,
    calls: Vec<Call>,
    next_id: u64,
    fail_on: Option<&'static str>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", prefix, self.next_id)
    }

    fn check_failure(&self, operation: &'static str) -> Result<(), ApiError> {
        if self.fail_on == Some(operation) {
            return Err(ApiError::Remote(format!("{} failed", operation)));
        }
        Ok(())
    }
}

/// In-process stand-in for the Tharsis API
#[derive(Default)]
pub struct MemoryClient {
    state: Mutex<State>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(self, path: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id("G");
            let name = path.rsplit('/').next().unwrap_or(path).to_string();
            state.groups.insert(
                path.to_string(),
                Group {
                    id,
                    name,
                    description: String::new(),
                    full_path: path.to_string(),
                },
            );
        }
        self
    }

    pub fn with_managed_identity(self, identity: ManagedIdentity) -> Self {
        self.state
            .lock()
            .unwrap()
            .managed_identities
            .insert(identity.resource_path.clone(), identity);
        self
    }

    /// Make the named operation fail with a remote error
    pub fn failing_on(self, operation: &'static str) -> Self {
        self.state.lock().unwrap().fail_on = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn uploaded(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().uploads.get(key).cloned()
    }

    pub fn workspace(&self, path: &str) -> Option<Workspace> {
        self.state.lock().unwrap().workspaces.get(path).cloned()
    }

    pub fn group(&self, path: &str) -> Option<Group> {
        self.state.lock().unwrap().groups.get(path).cloned()
    }

    async fn store_upload(
        &self,
        operation: &'static str,
        key: String,
        call: Call,
        mut file: File,
    ) -> Result<(), ApiError> {
        self.state.lock().unwrap().check_failure(operation)?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .await
            .map_err(|e| ApiError::Remote(e.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state.uploads.insert(key, content);
        state.calls.push(call);
        Ok(())
    }
}

fn paginate<T: Clone>(items: Vec<T>, options: &ListOptions) -> Page<T> {
    let total_count = items.len();
    let start = options
        .cursor
        .as_deref()
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(0);
    let limit = options.limit.map(|l| l as usize).unwrap_or(total_count);
    let end = (start + limit).min(total_count);
    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        next_cursor: (end < total_count).then(|| end.to_string()),
        total_count,
    }
}

#[async_trait]
impl ApiClient for MemoryClient {
    async fn get_group(&self, id: &ResourceIdentifier) -> Result<Group, ApiError> {
        self.state
            .lock()
            .unwrap()
            .groups
            .get(id.path())
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn list_groups(
        &self,
        parent_path: Option<&str>,
        options: &ListOptions,
    ) -> Result<Page<Group>, ApiError> {
        let state = self.state.lock().unwrap();
        let groups = state
            .groups
            .values()
            .filter(|g| {
                let parent = g.full_path.rsplit_once('/').map(|(p, _)| p);
                parent == parent_path
            })
            .cloned()
            .collect();
        Ok(paginate(groups, options))
    }

    async fn create_group(&self, input: &CreateGroupInput) -> Result<Group, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("create_group")?;
        let full_path = match &input.parent_path {
            Some(parent) if !state.groups.contains_key(parent) => {
                return Err(ApiError::NotFound(format!("group {}", parent)))
            }
            Some(parent) => format!("{}/{}", parent, input.name),
            None => input.name.clone(),
        };
        if state.groups.contains_key(&full_path) {
            return Err(ApiError::Conflict(format!("group {} already exists", full_path)));
        }
        let group = Group {
            id: state.next_id("G"),
            name: input.name.clone(),
            description: input.description.clone(),
            full_path: full_path.clone(),
        };
        state.groups.insert(full_path.clone(), group.clone());
        state.calls.push(Call::CreateGroup(full_path));
        Ok(group)
    }

    async fn delete_group(&self, id: &ResourceIdentifier, _force: bool) -> Result<(), ApiError> {
        self.state
            .lock()
            .unwrap()
            .groups
            .remove(id.path())
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn get_workspace(&self, id: &ResourceIdentifier) -> Result<Workspace, ApiError> {
        self.workspace(id.path())
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn list_workspaces(
        &self,
        group_path: Option<&str>,
        options: &ListOptions,
    ) -> Result<Page<Workspace>, ApiError> {
        let state = self.state.lock().unwrap();
        let workspaces = state
            .workspaces
            .values()
            .filter(|w| group_path.map_or(true, |g| w.group_path() == g))
            .cloned()
            .collect();
        Ok(paginate(workspaces, options))
    }

    async fn create_workspace(&self, input: &CreateWorkspaceInput) -> Result<Workspace, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("create_workspace")?;
        if !state.groups.contains_key(&input.group_path) {
            return Err(ApiError::NotFound(format!("group {}", input.group_path)));
        }
        let full_path = format!("{}/{}", input.group_path, input.name);
        if state.workspaces.contains_key(&full_path) {
            return Err(ApiError::Conflict(format!("workspace {} already exists", full_path)));
        }
        let workspace = Workspace {
            id: state.next_id("W"),
            name: input.name.clone(),
            description: input.description.clone(),
            full_path: full_path.clone(),
            terraform_version: input.terraform_version.clone(),
            labels: input.labels.clone(),
        };
        state.workspaces.insert(full_path.clone(), workspace.clone());
        state.calls.push(Call::CreateWorkspace(full_path));
        Ok(workspace)
    }

    async fn update_workspace_labels(
        &self,
        id: &ResourceIdentifier,
        labels: &[Label],
    ) -> Result<Workspace, ApiError> {
        let mut state = self.state.lock().unwrap();
        let workspace = state
            .workspaces
            .get_mut(id.path())
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        workspace.labels = labels.to_vec();
        let updated = workspace.clone();
        state.calls.push(Call::UpdateLabels(id.path().to_string()));
        Ok(updated)
    }

    async fn delete_workspace(
        &self,
        id: &ResourceIdentifier,
        _force: bool,
    ) -> Result<(), ApiError> {
        self.state
            .lock()
            .unwrap()
            .workspaces
            .remove(id.path())
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn get_managed_identity(
        &self,
        id: &ResourceIdentifier,
    ) -> Result<ManagedIdentity, ApiError> {
        self.state
            .lock()
            .unwrap()
            .managed_identities
            .get(id.path())
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn delete_managed_identity(
        &self,
        id: &ResourceIdentifier,
        _force: bool,
    ) -> Result<(), ApiError> {
        self.state
            .lock()
            .unwrap()
            .managed_identities
            .remove(id.path())
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn create_provider_version(
        &self,
        input: &CreateProviderVersionInput,
    ) -> Result<ProviderVersion, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("create_provider_version")?;
        let id = state.next_id("PV");
        state
            .calls
            .push(Call::CreateProviderVersion(format!("{}@{}", input.provider_id, input.version)));
        Ok(ProviderVersion {
            id,
            version: input.version.clone(),
            protocols: input.protocols.clone(),
            readme_uploaded: false,
            sha_sums_uploaded: false,
            sha_sums_signature_uploaded: false,
        })
    }

    async fn upload_provider_readme(&self, version_id: &str, file: File) -> Result<(), ApiError> {
        self.store_upload(
            "upload_provider_readme",
            format!("{}/readme", version_id),
            Call::UploadReadme(version_id.to_string()),
            file,
        )
        .await
    }

    async fn upload_provider_checksums(
        &self,
        version_id: &str,
        file: File,
    ) -> Result<(), ApiError> {
        self.store_upload(
            "upload_provider_checksums",
            format!("{}/checksums", version_id),
            Call::UploadChecksums(version_id.to_string()),
            file,
        )
        .await
    }

    async fn upload_provider_checksum_signature(
        &self,
        version_id: &str,
        file: File,
    ) -> Result<(), ApiError> {
        self.store_upload(
            "upload_provider_checksum_signature",
            format!("{}/signature", version_id),
            Call::UploadSignature(version_id.to_string()),
            file,
        )
        .await
    }

    async fn create_provider_platform(
        &self,
        input: &CreateProviderPlatformInput,
    ) -> Result<ProviderPlatform, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.check_failure("create_provider_platform")?;
        let id = state.next_id("PP");
        state
            .calls
            .push(Call::CreatePlatform(format!("{}_{}", input.os, input.arch)));
        Ok(ProviderPlatform {
            id,
            os: input.os.clone(),
            arch: input.arch.clone(),
            sha_sum: input.sha_sum.clone(),
            filename: input.filename.clone(),
            binary_uploaded: false,
        })
    }

    async fn upload_provider_platform_binary(
        &self,
        platform_id: &str,
        file: File,
    ) -> Result<(), ApiError> {
        self.store_upload(
            "upload_provider_platform_binary",
            format!("{}/binary", platform_id),
            Call::UploadBinary(platform_id.to_string()),
            file,
        )
        .await
    }
}
