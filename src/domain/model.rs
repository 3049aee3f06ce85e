use serde::{Deserialize, Serialize};

/// A group is a namespace that contains sub-groups, workspaces and registry resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub full_path: String,
}

/// Key/value pair attached to a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub full_path: String,
    #[serde(default)]
    pub terraform_version: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Workspace {
    /// Path of the group that owns this workspace
    pub fn group_path(&self) -> &str {
        self.full_path
            .rsplit_once('/')
            .map(|(group, _)| group)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagedIdentityType {
    AwsFederated,
    AzureFederated,
    TharsisFederated,
}

impl std::fmt::Display for ManagedIdentityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManagedIdentityType::AwsFederated => write!(f, "aws_federated"),
            ManagedIdentityType::AzureFederated => write!(f, "azure_federated"),
            ManagedIdentityType::TharsisFederated => write!(f, "tharsis_federated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub identity_type: ManagedIdentityType,
    pub group_path: String,
    pub resource_path: String,
    #[serde(default)]
    pub is_alias: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderVersion {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub protocols: Vec<String>,
    #[serde(default)]
    pub readme_uploaded: bool,
    #[serde(default)]
    pub sha_sums_uploaded: bool,
    #[serde(default)]
    pub sha_sums_signature_uploaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPlatform {
    pub id: String,
    pub os: String,
    pub arch: String,
    pub sha_sum: String,
    pub filename: String,
    #[serde(default)]
    pub binary_uploaded: bool,
}

/// One page of a cursor-paginated listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    pub name: String,
    pub parent_path: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceInput {
    pub name: String,
    pub group_path: String,
    pub description: String,
    pub terraform_version: Option<String>,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProviderVersionInput {
    pub provider_id: String,
    pub version: String,
    pub protocols: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProviderPlatformInput {
    pub provider_version_id: String,
    pub os: String,
    pub arch: String,
    pub sha_sum: String,
    pub filename: String,
}
