use crate::domain::{
    error::{TharsisError, TharsisResult},
    settings::{Profile, Settings},
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and writes the settings file
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Manager for the default settings location
    pub fn new() -> TharsisResult<Self> {
        Ok(Self {
            settings_path: Self::default_settings_path()?,
        })
    }

    /// Manager for an explicit settings file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: path.into(),
        }
    }

    /// `~/.config/tharsis/settings.toml`
    fn default_settings_path() -> TharsisResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| TharsisError::Settings {
            message: "Could not determine home directory".to_string(),
        })?;

        Ok(home.join(".config").join("tharsis").join("settings.toml"))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load(&self) -> TharsisResult<Settings> {
        if !self.settings_path.exists() {
            debug!(path = %self.settings_path.display(), "settings file not found, using defaults");
            return Ok(Settings::default());
        }

        let path = self.settings_path.display();
        let content = fs::read_to_string(&self.settings_path).map_err(|e| TharsisError::Settings {
            message: format!("Failed to read settings file {}: {}", path, e),
        })?;

        toml::from_str(&content).map_err(|e| TharsisError::Settings {
            message: format!("Failed to parse settings file {}: {}", path, e),
        })
    }

    pub fn save(&self, settings: &Settings) -> TharsisResult<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).map_err(|e| TharsisError::Settings {
                message: format!("Failed to create settings directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(settings).map_err(|e| TharsisError::Settings {
            message: format!("Failed to serialize settings: {}", e),
        })?;

        write_private(&self.settings_path, &content).map_err(|e| TharsisError::Settings {
            message: format!(
                "Failed to write settings file {}: {}",
                self.settings_path.display(),
                e
            ),
        })
    }

    /// Add or replace a profile and persist the result
    pub fn upsert_profile(&self, name: &str, profile: Profile) -> TharsisResult<Settings> {
        let mut settings = self.load()?;
        settings.profiles.insert(name.to_string(), profile);
        self.save(&settings)?;
        Ok(settings)
    }

    /// Remove a profile; fails if it does not exist
    pub fn remove_profile(&self, name: &str) -> TharsisResult<Settings> {
        let mut settings = self.load()?;
        if settings.profiles.remove(name).is_none() {
            return Err(TharsisError::Settings {
                message: format!("profile '{}' does not exist", name),
            });
        }
        self.save(&settings)?;
        Ok(settings)
    }
}

/// Write `content` readable by the owner only; the file holds bearer tokens
fn write_private(path: &Path, content: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // mode only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content.as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn profile(endpoint: &str) -> Profile {
        Profile {
            endpoint: endpoint.to_string(),
            token: None,
        }
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_path(temp_dir.path().join("settings.toml"));
        let settings = manager.load().unwrap();
        assert!(settings.profiles.is_empty());
    }

    #[test]
    fn test_upsert_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.toml");
        let manager = SettingsManager::with_path(&path);

        manager.upsert_profile("default", profile("https://a.example.com")).unwrap();
        manager.upsert_profile("default", profile("https://b.example.com")).unwrap();

        assert!(path.exists());
        let settings = manager.load().unwrap();
        assert_eq!(settings.profiles.len(), 1);
        assert_eq!(settings.profiles["default"].endpoint, "https://b.example.com");
    }

    #[test]
    fn test_remove_profile() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::with_path(temp_dir.path().join("settings.toml"));
        manager.upsert_profile("dev", profile("http://localhost:6560")).unwrap();

        assert!(manager.remove_profile("dev").unwrap().profiles.is_empty());
        assert!(manager.remove_profile("dev").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_settings_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let manager = SettingsManager::with_path(&path);
        let mut secret = profile("https://t.example.com");
        secret.token = Some("token".to_string());
        manager.upsert_profile("prod", secret).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(manager.load().unwrap().profiles["prod"].token.as_deref(), Some("token"));
    }

    #[test]
    fn test_invalid_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "profiles = 3").unwrap();

        let err = SettingsManager::with_path(&path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }
}
