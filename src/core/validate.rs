use crate::core::trn::{ResourceIdentifier, ResourceType, TRN_PREFIX};
use crate::domain::error::{TharsisError, TharsisResult};
use tracing::error;

/// Check that `path` names a group: non-empty, no empty segments.
pub fn validate_namespace_path(path: &str) -> TharsisResult<()> {
    if path.starts_with(TRN_PREFIX) {
        return Err(invalid(path, "expected a path, not a resource name"));
    }
    if path.is_empty() {
        return Err(invalid(path, "path cannot be empty"));
    }
    if path.split('/').any(str::is_empty) {
        return Err(invalid(path, "path segments cannot be empty"));
    }
    Ok(())
}

/// Check that `path` names a resource inside a group, i.e. `<group path>/<name>`.
pub fn validate_resource_path(path: &str) -> TharsisResult<()> {
    validate_namespace_path(path)?;
    if !path.contains('/') {
        return Err(invalid(
            path,
            "expected <group path>/<name>, the path must contain at least one '/'",
        ));
    }
    Ok(())
}

/// Parse a group path or group TRN
pub fn group_identifier(arg: &str) -> TharsisResult<ResourceIdentifier> {
    let identifier = ResourceIdentifier::parse_as(arg, ResourceType::Group)?;
    validate_namespace_path(identifier.path())?;
    Ok(identifier)
}

/// Parse a path or TRN for a resource that lives inside a group
pub fn resource_identifier(
    arg: &str,
    resource_type: ResourceType,
) -> TharsisResult<ResourceIdentifier> {
    let identifier = ResourceIdentifier::parse_as(arg, resource_type)?;
    validate_resource_path(identifier.path())?;
    Ok(identifier)
}

/// Split `<group path>/<name>` into its parts
pub fn split_resource_path(path: &str) -> TharsisResult<(&str, &str)> {
    validate_resource_path(path)?;
    path.rsplit_once('/')
        .ok_or_else(|| invalid(path, "expected <group path>/<name>"))
}

fn invalid(path: &str, reason: &str) -> TharsisError {
    error!(path, reason, "rejected path");
    TharsisError::Validation(format!("invalid path '{}': {}", path, reason))
}
