use crate::core::trn::{ResourceIdentifier, ResourceType};
use crate::domain::error::ApiError;
use crate::domain::model::{
    CreateGroupInput, CreateProviderPlatformInput, CreateProviderVersionInput, CreateWorkspaceInput,
    Group, Label, ListOptions, ManagedIdentity, Page, ProviderPlatform, ProviderVersion, Workspace,
};
use crate::domain::settings::Profile;
use crate::infrastructure::client::ApiClient;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tokio::fs::File;
use tracing::debug;
use uuid::Uuid;

const GET_GROUP: &str = r#"query GetGroup($id: String!) {
  node(id: $id) { ... on Group { id name description fullPath } }
}"#;

const LIST_GROUPS: &str = r#"query ListGroups($parentPath: String, $first: Int, $after: String) {
  groups(parentPath: $parentPath, first: $first, after: $after) {
    totalCount
    pageInfo { hasNextPage endCursor }
    edges { node { id name description fullPath } }
  }
}"#;

const CREATE_GROUP: &str = r#"mutation CreateGroup($input: CreateGroupInput!) {
  createGroup(input: $input) {
    group { id name description fullPath }
    problems { message type }
  }
}"#;

const DELETE_GROUP: &str = r#"mutation DeleteGroup($input: DeleteGroupInput!) {
  deleteGroup(input: $input) { problems { message type } }
}"#;

const GET_WORKSPACE: &str = r#"query GetWorkspace($id: String!) {
  node(id: $id) {
    ... on Workspace { id name description fullPath terraformVersion labels { key value } }
  }
}"#;

const LIST_WORKSPACES: &str = r#"query ListWorkspaces($groupPath: String, $first: Int, $after: String) {
  workspaces(groupPath: $groupPath, first: $first, after: $after) {
    totalCount
    pageInfo { hasNextPage endCursor }
    edges { node { id name description fullPath terraformVersion labels { key value } } }
  }
}"#;

const CREATE_WORKSPACE: &str = r#"mutation CreateWorkspace($input: CreateWorkspaceInput!) {
  createWorkspace(input: $input) {
    workspace { id name description fullPath terraformVersion labels { key value } }
    problems { message type }
  }
}"#;

const UPDATE_WORKSPACE: &str = r#"mutation UpdateWorkspace($input: UpdateWorkspaceInput!) {
  updateWorkspace(input: $input) {
    workspace { id name description fullPath terraformVersion labels { key value } }
    problems { message type }
  }
}"#;

const DELETE_WORKSPACE: &str = r#"mutation DeleteWorkspace($input: DeleteWorkspaceInput!) {
  deleteWorkspace(input: $input) { problems { message type } }
}"#;

const GET_MANAGED_IDENTITY: &str = r#"query GetManagedIdentity($id: String!) {
  node(id: $id) {
    ... on ManagedIdentity { id name description type groupPath resourcePath isAlias }
  }
}"#;

const DELETE_MANAGED_IDENTITY: &str = r#"mutation DeleteManagedIdentity($input: DeleteManagedIdentityInput!) {
  deleteManagedIdentity(input: $input) { problems { message type } }
}"#;

const CREATE_PROVIDER_VERSION: &str = r#"mutation CreateProviderVersion($input: CreateTerraformProviderVersionInput!) {
  createTerraformProviderVersion(input: $input) {
    providerVersion { id version protocols readmeUploaded shaSumsUploaded shaSumsSignatureUploaded }
    problems { message type }
  }
}"#;

const CREATE_PROVIDER_PLATFORM: &str = r#"mutation CreateProviderPlatform($input: CreateTerraformProviderPlatformInput!) {
  createTerraformProviderPlatform(input: $input) {
    providerPlatform { id os arch shaSum filename binaryUploaded }
    problems { message type }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorExtensions {
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Problem {
    message: String,
    #[serde(rename = "type")]
    problem_type: String,
}

/// `{ <entity>: ..., problems: [...] }` as returned by every mutation
#[derive(Debug, Deserialize)]
struct MutationPayload {
    #[serde(default)]
    problems: Vec<Problem>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl MutationPayload {
    fn into_entity<T: DeserializeOwned>(mut self, field: &str) -> Result<T, ApiError> {
        check_problems(self.problems)?;
        let value = self
            .fields
            .remove(field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ApiError::Decode(format!("mutation returned no {}", field)))?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(format!("{}: {}", field, e)))
    }

    fn into_unit(self) -> Result<(), ApiError> {
        check_problems(self.problems)
    }
}

#[derive(Debug, Deserialize)]
struct NodeResponse<T> {
    node: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    total_count: usize,
    page_info: PageInfo,
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

impl<T> From<Connection<T>> for Page<T> {
    fn from(connection: Connection<T>) -> Self {
        let next_cursor = if connection.page_info.has_next_page {
            connection.page_info.end_cursor
        } else {
            None
        };
        Self {
            items: connection.edges.into_iter().map(|edge| edge.node).collect(),
            next_cursor,
            total_count: connection.total_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    groups: Connection<Group>,
}

#[derive(Debug, Deserialize)]
struct WorkspacesResponse {
    workspaces: Connection<Workspace>,
}

fn check_problems(problems: Vec<Problem>) -> Result<(), ApiError> {
    let Some(problem) = problems.into_iter().next() else {
        return Ok(());
    };
    Err(match problem.problem_type.as_str() {
        "NOT_FOUND" => ApiError::NotFound(problem.message),
        "CONFLICT" => ApiError::Conflict(problem.message),
        "FORBIDDEN" => ApiError::Forbidden(problem.message),
        "BAD_REQUEST" => ApiError::BadRequest(problem.message),
        _ => ApiError::Remote(problem.message),
    })
}

fn status_error(status: StatusCode, context: &str, body: &str) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(context.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ApiError::Forbidden(format!("{} ({})", context, status))
        }
        _ => ApiError::Remote(format!("{} returned status {}: {}", context, status, body.trim())),
    }
}

fn trn(id: &ResourceIdentifier, resource_type: ResourceType) -> Result<String, ApiError> {
    id.trn_for(resource_type)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// GraphQL client for the Tharsis API
#[derive(Debug, Clone)]
pub struct HttpClient {
    endpoint: Url,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpClient {
    pub fn new(profile: &Profile) -> Result<Self, ApiError> {
        let endpoint = Url::parse(&profile.endpoint)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidEndpoint(profile.endpoint.clone()))?;
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("tharsis-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint,
            token: profile.token.clone(),
            http_client,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(operation, request_id = %request_id, "sending graphql request");

        let request = self
            .http_client
            .post(self.url(&["graphql"])?)
            .header("x-request-id", &request_id)
            .json(&json!({ "query": query, "variables": variables }));
        let response = self.authorize(request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, operation, &body));
        }

        let envelope: GraphqlResponse<T> = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("{}: {}", operation, e)))?;
        if let Some(error) = envelope.errors.into_iter().next() {
            let code = error.extensions.and_then(|ext| ext.code);
            return Err(match code.as_deref() {
                Some("NOT_FOUND") => ApiError::NotFound(error.message),
                Some("UNAUTHORIZED") | Some("FORBIDDEN") => ApiError::Forbidden(error.message),
                _ => ApiError::Remote(error.message),
            });
        }
        envelope
            .data
            .ok_or_else(|| ApiError::Decode(format!("{}: response has no data", operation)))
    }

    async fn node<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        trn: String,
    ) -> Result<T, ApiError> {
        let response: NodeResponse<T> = self.graphql(operation, query, json!({ "id": trn })).await?;
        response.node.ok_or(ApiError::NotFound(trn))
    }

    async fn mutate(
        &self,
        operation: &str,
        field: &str,
        query: &str,
        input: Value,
    ) -> Result<MutationPayload, ApiError> {
        let mut response: HashMap<String, MutationPayload> =
            self.graphql(operation, query, json!({ "input": input })).await?;
        response
            .remove(field)
            .ok_or_else(|| ApiError::Decode(format!("{}: missing {}", operation, field)))
    }

    async fn upload(&self, what: &str, segments: &[&str], file: File) -> Result<(), ApiError> {
        let url = self.url(segments)?;
        debug!(url = %url, what, "uploading file");

        let request = self.http_client.put(url).body(reqwest::Body::from(file));
        let response = self.authorize(request).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, what, &body))
    }
}

fn to_input<T: serde::Serialize>(input: &T) -> Result<Value, ApiError> {
    serde_json::to_value(input).map_err(|e| ApiError::Decode(e.to_string()))
}

fn page_variables(options: &ListOptions) -> (Option<u32>, Option<String>) {
    (options.limit, options.cursor.clone())
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn get_group(&self, id: &ResourceIdentifier) -> Result<Group, ApiError> {
        self.node("GetGroup", GET_GROUP, trn(id, ResourceType::Group)?).await
    }

    async fn list_groups(
        &self,
        parent_path: Option<&str>,
        options: &ListOptions,
    ) -> Result<Page<Group>, ApiError> {
        let (first, after) = page_variables(options);
        let response: GroupsResponse = self
            .graphql(
                "ListGroups",
                LIST_GROUPS,
                json!({ "parentPath": parent_path, "first": first, "after": after }),
            )
            .await?;
        Ok(response.groups.into())
    }

    async fn create_group(&self, input: &CreateGroupInput) -> Result<Group, ApiError> {
        self.mutate("CreateGroup", "createGroup", CREATE_GROUP, to_input(input)?)
            .await?
            .into_entity("group")
    }

    async fn delete_group(&self, id: &ResourceIdentifier, force: bool) -> Result<(), ApiError> {
        let input = json!({ "id": trn(id, ResourceType::Group)?, "force": force });
        self.mutate("DeleteGroup", "deleteGroup", DELETE_GROUP, input)
            .await?
            .into_unit()
    }

    async fn get_workspace(&self, id: &ResourceIdentifier) -> Result<Workspace, ApiError> {
        self.node("GetWorkspace", GET_WORKSPACE, trn(id, ResourceType::Workspace)?).await
    }

    async fn list_workspaces(
        &self,
        group_path: Option<&str>,
        options: &ListOptions,
    ) -> Result<Page<Workspace>, ApiError> {
        let (first, after) = page_variables(options);
        let response: WorkspacesResponse = self
            .graphql(
                "ListWorkspaces",
                LIST_WORKSPACES,
                json!({ "groupPath": group_path, "first": first, "after": after }),
            )
            .await?;
        Ok(response.workspaces.into())
    }

    async fn create_workspace(&self, input: &CreateWorkspaceInput) -> Result<Workspace, ApiError> {
        self.mutate("CreateWorkspace", "createWorkspace", CREATE_WORKSPACE, to_input(input)?)
            .await?
            .into_entity("workspace")
    }

    async fn update_workspace_labels(
        &self,
        id: &ResourceIdentifier,
        labels: &[Label],
    ) -> Result<Workspace, ApiError> {
        let input = json!({ "id": trn(id, ResourceType::Workspace)?, "labels": labels });
        self.mutate("UpdateWorkspace", "updateWorkspace", UPDATE_WORKSPACE, input)
            .await?
            .into_entity("workspace")
    }

    async fn delete_workspace(&self, id: &ResourceIdentifier, force: bool) -> Result<(), ApiError> {
        let input = json!({ "id": trn(id, ResourceType::Workspace)?, "force": force });
        self.mutate("DeleteWorkspace", "deleteWorkspace", DELETE_WORKSPACE, input)
            .await?
            .into_unit()
    }

    async fn get_managed_identity(
        &self,
        id: &ResourceIdentifier,
    ) -> Result<ManagedIdentity, ApiError> {
        self.node(
            "GetManagedIdentity",
            GET_MANAGED_IDENTITY,
            trn(id, ResourceType::ManagedIdentity)?,
        )
        .await
    }

    async fn delete_managed_identity(
        &self,
        id: &ResourceIdentifier,
        force: bool,
    ) -> Result<(), ApiError> {
        let input = json!({ "id": trn(id, ResourceType::ManagedIdentity)?, "force": force });
        self.mutate(
            "DeleteManagedIdentity",
            "deleteManagedIdentity",
            DELETE_MANAGED_IDENTITY,
            input,
        )
        .await?
        .into_unit()
    }

    async fn create_provider_version(
        &self,
        input: &CreateProviderVersionInput,
    ) -> Result<ProviderVersion, ApiError> {
        self.mutate(
            "CreateProviderVersion",
            "createTerraformProviderVersion",
            CREATE_PROVIDER_VERSION,
            to_input(input)?,
        )
        .await?
        .into_entity("providerVersion")
    }

    async fn upload_provider_readme(&self, version_id: &str, file: File) -> Result<(), ApiError> {
        self.upload(
            "README upload",
            &["v1", "provider-registry", "versions", version_id, "readme", "upload"],
            file,
        )
        .await
    }

    async fn upload_provider_checksums(
        &self,
        version_id: &str,
        file: File,
    ) -> Result<(), ApiError> {
        self.upload(
            "checksum upload",
            &["v1", "provider-registry", "versions", version_id, "checksums", "upload"],
            file,
        )
        .await
    }

    async fn upload_provider_checksum_signature(
        &self,
        version_id: &str,
        file: File,
    ) -> Result<(), ApiError> {
        self.upload(
            "checksum signature upload",
            &["v1", "provider-registry", "versions", version_id, "signature", "upload"],
            file,
        )
        .await
    }

    async fn create_provider_platform(
        &self,
        input: &CreateProviderPlatformInput,
    ) -> Result<ProviderPlatform, ApiError> {
        self.mutate(
            "CreateProviderPlatform",
            "createTerraformProviderPlatform",
            CREATE_PROVIDER_PLATFORM,
            to_input(input)?,
        )
        .await?
        .into_entity("providerPlatform")
    }

    async fn upload_provider_platform_binary(
        &self,
        platform_id: &str,
        file: File,
    ) -> Result<(), ApiError> {
        self.upload(
            "platform binary upload",
            &["v1", "provider-registry", "platforms", platform_id, "upload"],
            file,
        )
        .await
    }
}
