use crate::core::provider_upload::UploadReport;
use crate::domain::model::{Group, Label, ManagedIdentity, Page, ProviderPlatform, Workspace};
use crate::domain::settings::{Profile, Settings};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Mutex;
use tabled::{Table, Tabled};

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::TharsisError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Writes command results as tables or indented JSON
pub struct OutputWriter {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl OutputWriter {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn write_line(&self, text: &str) -> Result<(), OutputError> {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(sink, "{}", text)?;
        sink.flush()?;
        Ok(())
    }

    pub fn write_message(&self, message: &str) -> Result<(), OutputError> {
        self.write_line(message)
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), OutputError> {
        self.write_line(&serde_json::to_string_pretty(value)?)
    }

    pub fn write_table<R: Tabled>(&self, rows: Vec<R>) -> Result<(), OutputError> {
        self.write_line(&Table::new(rows).to_string())
    }

    fn write_page<T: Serialize, R: Tabled>(
        &self,
        page: &Page<T>,
        json: bool,
        row: impl Fn(&T) -> R,
    ) -> Result<(), OutputError> {
        if json {
            return self.write_json(page);
        }
        self.write_table(page.items.iter().map(row).collect())?;
        if let Some(cursor) = &page.next_cursor {
            self.write_line(&format!("More results available, use --cursor {}", cursor))?;
        }
        Ok(())
    }

    pub fn write_group(&self, group: &Group, json: bool) -> Result<(), OutputError> {
        if json {
            return self.write_json(group);
        }
        self.write_table(vec![GroupRow::from(group)])
    }

    pub fn write_groups(&self, page: &Page<Group>, json: bool) -> Result<(), OutputError> {
        self.write_page(page, json, |group| GroupRow::from(group))
    }

    pub fn write_workspace(&self, workspace: &Workspace, json: bool) -> Result<(), OutputError> {
        if json {
            return self.write_json(workspace);
        }
        self.write_table(vec![WorkspaceRow::from(workspace)])
    }

    pub fn write_workspaces(&self, page: &Page<Workspace>, json: bool) -> Result<(), OutputError> {
        self.write_page(page, json, |workspace| WorkspaceRow::from(workspace))
    }

    pub fn write_managed_identity(
        &self,
        identity: &ManagedIdentity,
        json: bool,
    ) -> Result<(), OutputError> {
        if json {
            return self.write_json(identity);
        }
        self.write_table(vec![ManagedIdentityRow::from(identity)])
    }

    pub fn write_profiles(&self, settings: &Settings, json: bool) -> Result<(), OutputError> {
        if json {
            let summaries: BTreeMap<&str, ProfileSummary> = settings
                .profiles
                .iter()
                .map(|(name, profile)| (name.as_str(), ProfileSummary::from(profile)))
                .collect();
            return self.write_json(&summaries);
        }
        self.write_table(
            settings
                .profiles
                .iter()
                .map(|(name, profile)| ProfileRow::new(name, profile))
                .collect(),
        )
    }

    pub fn write_upload_report(
        &self,
        report: &UploadReport,
        json: bool,
    ) -> Result<(), OutputError> {
        if json {
            return self.write_json(report);
        }
        self.write_line(&format!(
            "Uploaded provider version {} ({})",
            report.provider_version.version, report.provider_version.id
        ))?;
        self.write_table(report.platforms.iter().map(PlatformRow::from).collect())
    }
}

fn format_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| format!("{}={}", label.key, label.value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Table row for groups
#[derive(Tabled)]
struct GroupRow {
    id: String,
    name: String,
    #[tabled(rename = "full path")]
    full_path: String,
    description: String,
}

impl From<&Group> for GroupRow {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            full_path: group.full_path.clone(),
            description: group.description.clone(),
        }
    }
}

/// Table row for workspaces
#[derive(Tabled)]
struct WorkspaceRow {
    id: String,
    name: String,
    #[tabled(rename = "full path")]
    full_path: String,
    #[tabled(rename = "terraform version")]
    terraform_version: String,
    labels: String,
}

impl From<&Workspace> for WorkspaceRow {
    fn from(workspace: &Workspace) -> Self {
        Self {
            id: workspace.id.clone(),
            name: workspace.name.clone(),
            full_path: workspace.full_path.clone(),
            terraform_version: workspace.terraform_version.clone().unwrap_or_default(),
            labels: format_labels(&workspace.labels),
        }
    }
}

/// Table row for managed identities
#[derive(Tabled)]
struct ManagedIdentityRow {
    id: String,
    name: String,
    r#type: String,
    #[tabled(rename = "resource path")]
    resource_path: String,
    alias: bool,
}

impl From<&ManagedIdentity> for ManagedIdentityRow {
    fn from(identity: &ManagedIdentity) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.name.clone(),
            r#type: identity.identity_type.to_string(),
            resource_path: identity.resource_path.clone(),
            alias: identity.is_alias,
        }
    }
}

/// Table row for settings profiles
#[derive(Tabled)]
struct ProfileRow {
    name: String,
    endpoint: String,
    token: String,
}

impl ProfileRow {
    fn new(name: &str, profile: &Profile) -> Self {
        Self {
            name: name.to_string(),
            endpoint: profile.endpoint.clone(),
            token: if profile.token.is_some() { "set" } else { "" }.to_string(),
        }
    }
}

/// Profile as shown in JSON; the token itself is never printed
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSummary<'a> {
    endpoint: &'a str,
    token_set: bool,
}

impl<'a> From<&'a Profile> for ProfileSummary<'a> {
    fn from(profile: &'a Profile) -> Self {
        Self {
            endpoint: &profile.endpoint,
            token_set: profile.token.is_some(),
        }
    }
}

/// Table row for uploaded provider platforms
#[derive(Tabled)]
struct PlatformRow {
    id: String,
    os: String,
    arch: String,
    filename: String,
}

impl From<&ProviderPlatform> for PlatformRow {
    fn from(platform: &ProviderPlatform) -> Self {
        Self {
            id: platform.id.clone(),
            os: platform.os.clone(),
            arch: platform.arch.clone(),
            filename: platform.filename.clone(),
        }
    }
}

/// Clonable in-memory sink for capturing output
#[cfg(test)]
#[derive(Clone, Default)]
pub struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
