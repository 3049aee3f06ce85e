use crate::domain::error::{TharsisError, TharsisResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Endpoint used when a service account token is supplied without any profile
pub const DEFAULT_ENDPOINT: &str = "http://localhost:6560";

/// Name of the profile selected when none is given
pub const DEFAULT_PROFILE: &str = "default";

/// Tharsis CLI settings file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Named connection profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// Connection profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Base URL of the Tharsis API
    pub endpoint: String,
    /// Bearer token, usually written by a login flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Resolve the profile a command should talk to.
    ///
    /// A service account token bypasses the settings file: the endpoint then
    /// comes from the override, the named profile if it exists, or
    /// [`DEFAULT_ENDPOINT`].
    pub fn resolve_profile(
        &self,
        name: &str,
        service_account_token: Option<String>,
        endpoint_override: Option<String>,
    ) -> TharsisResult<Profile> {
        if let Some(token) = service_account_token.filter(|t| !t.is_empty()) {
            let endpoint = endpoint_override
                .or_else(|| self.profiles.get(name).map(|p| p.endpoint.clone()))
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
            return Ok(Profile {
                endpoint,
                token: Some(token),
            });
        }

        let mut profile = self
            .profiles
            .get(name)
            .cloned()
            .ok_or_else(|| TharsisError::Settings {
                message: format!(
                    "profile '{}' is not configured; \
                     run 'tharsis configure --profile {} --endpoint-url <url>'",
                    name, name
                ),
            })?;
        if let Some(endpoint) = endpoint_override {
            profile.endpoint = endpoint;
        }
        Ok(profile)
    }
}
