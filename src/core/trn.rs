//! Tharsis Resource Names.
//!
//! Commands accept either a hierarchical path (`group/sub/workspace`) or a
//! resource name of the form `trn:<type>:<path>`. The string helpers
//! [`to_path`] and [`to_trn`] convert between the two spellings, and
//! [`ResourceIdentifier`] is the strict, typed form used at API call sites.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix shared by every resource name
pub const TRN_PREFIX: &str = "trn:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrnError {
    #[error("malformed resource name '{0}': expected trn:<type>:<path>")]
    Malformed(String),

    #[error("unknown resource type '{0}'")]
    UnknownType(String),

    #[error("resource name '{trn}' refers to a {actual}, expected a {expected}")]
    TypeMismatch {
        trn: String,
        expected: ResourceType,
        actual: ResourceType,
    },
}

/// Resource types that can appear in a TRN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Workspace,
    Group,
    ManagedIdentity,
    Variable,
    Run,
    ConfigurationVersion,
    TerraformModule,
    TerraformModuleVersion,
    TerraformProvider,
    TerraformProviderPlatform,
    FederatedRegistry,
}

impl ResourceType {
    pub const ALL: [ResourceType; 11] = [
        ResourceType::Workspace,
        ResourceType::Group,
        ResourceType::ManagedIdentity,
        ResourceType::Variable,
        ResourceType::Run,
        ResourceType::ConfigurationVersion,
        ResourceType::TerraformModule,
        ResourceType::TerraformModuleVersion,
        ResourceType::TerraformProvider,
        ResourceType::TerraformProviderPlatform,
        ResourceType::FederatedRegistry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Workspace => "workspace",
            ResourceType::Group => "group",
            ResourceType::ManagedIdentity => "managed_identity",
            ResourceType::Variable => "variable",
            ResourceType::Run => "run",
            ResourceType::ConfigurationVersion => "configuration_version",
            ResourceType::TerraformModule => "terraform_module",
            ResourceType::TerraformModuleVersion => "terraform_module_version",
            ResourceType::TerraformProvider => "terraform_provider",
            ResourceType::TerraformProviderPlatform => "terraform_provider_platform",
            ResourceType::FederatedRegistry => "federated_registry",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = TrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TrnError::UnknownType(s.to_string()))
    }
}

/// Return the path portion of `id`.
///
/// Anything without the `trn:` prefix is returned unchanged, as is a
/// resource name with fewer than three `:`-separated segments.
pub fn to_path(id: &str) -> String {
    if !id.starts_with(TRN_PREFIX) {
        return id.to_string();
    }
    match id.split(':').nth(2) {
        Some(path) => path.to_string(),
        None => id.to_string(),
    }
}

/// Tag `id` as a resource of `resource_type`.
///
/// An existing resource name is returned unchanged, whatever its type.
pub fn to_trn(id: &str, resource_type: ResourceType) -> String {
    if id.starts_with(TRN_PREFIX) {
        return id.to_string();
    }
    format!("{}{}:{}", TRN_PREFIX, resource_type, id)
}

/// Build a resource name from path segments
pub fn new_resource_trn(resource_type: ResourceType, parts: &[&str]) -> String {
    format!("{}{}:{}", TRN_PREFIX, resource_type, parts.join("/"))
}

/// A resource reference as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceIdentifier {
    Path(String),
    Trn {
        resource_type: ResourceType,
        path: String,
    },
}

impl ResourceIdentifier {
    /// Parse a path or resource name, rejecting malformed resource names
    pub fn parse(id: &str) -> Result<Self, TrnError> {
        let Some(rest) = id.strip_prefix(TRN_PREFIX) else {
            return Ok(Self::Path(id.to_string()));
        };

        let mut segments = rest.split(':');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(resource_type), Some(path), None) if !path.is_empty() => Ok(Self::Trn {
                resource_type: resource_type.parse()?,
                path: path.to_string(),
            }),
            _ => Err(TrnError::Malformed(id.to_string())),
        }
    }

    /// Parse `id` and require that a resource name carries `expected` as its type
    pub fn parse_as(id: &str, expected: ResourceType) -> Result<Self, TrnError> {
        let identifier = Self::parse(id)?;
        identifier.trn_for(expected)?;
        Ok(identifier)
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Trn { path, .. } => path,
        }
    }

    /// Render as a resource name of type `expected`
    pub fn trn_for(&self, expected: ResourceType) -> Result<String, TrnError> {
        match self {
            Self::Path(path) => Ok(new_resource_trn(expected, &[path])),
            Self::Trn {
                resource_type,
                path,
            } if *resource_type == expected => Ok(new_resource_trn(*resource_type, &[path])),
            Self::Trn {
                resource_type,
                path,
            } => Err(TrnError::TypeMismatch {
                trn: new_resource_trn(*resource_type, &[path]),
                expected,
                actual: *resource_type,
            }),
        }
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Trn {
                resource_type,
                path,
            } => write!(f, "{}{}:{}", TRN_PREFIX, resource_type, path),
        }
    }
}
