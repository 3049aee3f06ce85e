use crate::cli::output::OutputWriter;
use crate::domain::error::{TharsisError, TharsisResult};
use crate::domain::settings::{Profile, Settings};
use crate::infrastructure::client::{ApiClient, HttpClient};
use crate::infrastructure::settings::SettingsManager;
use std::sync::Arc;

/// Service account token that bypasses the settings file
pub const SERVICE_ACCOUNT_TOKEN_ENV: &str = "THARSIS_SERVICE_ACCOUNT_TOKEN";
/// Endpoint used together with the service account token
pub const ENDPOINT_ENV: &str = "THARSIS_ENDPOINT";

/// Per-invocation state handed to every command
pub struct Context {
    pub profile_name: String,
    pub settings: Settings,
    pub settings_manager: SettingsManager,
    pub output: OutputWriter,
    client: Option<Arc<dyn ApiClient>>,
}

impl Context {
    pub fn new(
        profile_name: impl Into<String>,
        settings_manager: SettingsManager,
        settings: Settings,
        output: OutputWriter,
    ) -> Self {
        Self {
            profile_name: profile_name.into(),
            settings,
            settings_manager,
            output,
            client: None,
        }
    }

    /// Use `client` instead of building one from the selected profile
    pub fn with_client(mut self, client: Arc<dyn ApiClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Profile for this invocation, honoring the service account environment
    pub fn profile(&self) -> TharsisResult<Profile> {
        self.settings.resolve_profile(
            &self.profile_name,
            std::env::var(SERVICE_ACCOUNT_TOKEN_ENV).ok(),
            std::env::var(ENDPOINT_ENV).ok(),
        )
    }

    /// API client for the selected profile
    pub fn client(&self) -> TharsisResult<Arc<dyn ApiClient>> {
        if let Some(client) = &self.client {
            return Ok(Arc::clone(client));
        }
        let profile = self.profile()?;
        tracing::debug!(profile = %self.profile_name, endpoint = %profile.endpoint, "connecting");
        let client = HttpClient::new(&profile).map_err(TharsisError::Api)?;
        Ok(Arc::new(client))
    }
}
