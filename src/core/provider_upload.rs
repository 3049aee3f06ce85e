//! Provider version upload.
//!
//! Publishes a release built by goreleaser to the provider registry. The
//! release directory must contain `terraform-registry-manifest.json`,
//! `dist/metadata.json` and `dist/artifacts.json`; the artifacts list points
//! at the checksum file, its optional signature and the platform archives.
//!
//! Steps run strictly in order and the first failure aborts the upload.
//! Remote records created before the failure are left in place.

use crate::core::trn::{ResourceIdentifier, ResourceType};
use crate::domain::error::{TharsisError, TharsisResult};
use crate::domain::model::{
    CreateProviderPlatformInput, CreateProviderVersionInput, ProviderPlatform, ProviderVersion,
};
use crate::infrastructure::client::ApiClient;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info};

pub const REGISTRY_MANIFEST_FILE: &str = "terraform-registry-manifest.json";
pub const RELEASE_METADATA_FILE: &str = "dist/metadata.json";
pub const ARTIFACTS_FILE: &str = "dist/artifacts.json";
pub const README_FILE: &str = "README.md";

/// Last step the upload completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Start,
    ManifestsRead,
    VersionCreated,
    ReadmeUploaded,
    ReadmeSkipped,
    ChecksumsUploaded,
    SignatureUploaded,
    ArchivesUploaded(usize),
    Done,
}

impl UploadStage {
    /// Where an upload that failed at this stage stopped
    pub fn abort_point(&self) -> String {
        match self {
            UploadStage::Start => "before reading manifests".to_string(),
            stage => format!("after {}", stage),
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStage::Start => write!(f, "not started"),
            UploadStage::ManifestsRead => write!(f, "reading manifests"),
            UploadStage::VersionCreated => write!(f, "creating the provider version"),
            UploadStage::ReadmeUploaded => write!(f, "uploading the README"),
            UploadStage::ReadmeSkipped => write!(f, "skipping the README"),
            UploadStage::ChecksumsUploaded => write!(f, "uploading checksums"),
            UploadStage::SignatureUploaded => write!(f, "uploading the checksum signature"),
            UploadStage::ArchivesUploaded(count) => {
                write!(f, "uploading {} platform archive(s)", count)
            }
            UploadStage::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryManifest {
    metadata: RegistryManifestMetadata,
}

#[derive(Debug, Deserialize)]
struct RegistryManifestMetadata {
    protocol_versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseMetadata {
    version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ArtifactType {
    Checksum,
    Signature,
    Archive,
    #[serde(other)]
    Other,
}

/// Entry of `dist/artifacts.json`
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub goos: Option<String>,
    #[serde(default)]
    pub goarch: Option<String>,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
}

/// Everything read from the release directory before talking to the API
#[derive(Debug, Clone)]
pub struct ReleaseManifests {
    pub protocols: Vec<String>,
    pub version: String,
    pub artifacts: Vec<Artifact>,
}

impl ReleaseManifests {
    fn first_of(&self, artifact_type: ArtifactType) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.artifact_type == artifact_type)
    }

    fn archives(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts
            .iter()
            .filter(|a| a.artifact_type == ArtifactType::Archive)
    }
}

/// Result of a completed upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub provider_version: ProviderVersion,
    pub readme_uploaded: bool,
    pub signature_uploaded: bool,
    pub platforms: Vec<ProviderPlatform>,
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> TharsisResult<T> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| TharsisError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| TharsisError::Validation(format!("failed to parse {}: {}", path.display(), e)))
}

async fn open(path: &Path) -> TharsisResult<File> {
    File::open(path).await.map_err(|e| TharsisError::io(path, e))
}

/// Read the three release manifests from `directory`
pub async fn read_manifests(directory: &Path) -> TharsisResult<ReleaseManifests> {
    let registry: RegistryManifest = read_json(&directory.join(REGISTRY_MANIFEST_FILE)).await?;
    let release: ReleaseMetadata = read_json(&directory.join(RELEASE_METADATA_FILE)).await?;
    let artifacts: Vec<Artifact> = read_json(&directory.join(ARTIFACTS_FILE)).await?;

    if registry.metadata.protocol_versions.is_empty() {
        return Err(TharsisError::Validation(format!(
            "{} does not list any protocol versions",
            REGISTRY_MANIFEST_FILE
        )));
    }

    Ok(ReleaseManifests {
        protocols: registry.metadata.protocol_versions,
        version: release.version,
        artifacts,
    })
}

/// Parse `<sha256 hex>  <filename>` lines into filename → checksum
pub fn parse_checksums(content: &str) -> TharsisResult<HashMap<String, String>> {
    let mut checksums = HashMap::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(sum), Some(filename), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(TharsisError::Validation(format!(
                "checksum file line {} is not '<sha256>  <filename>'",
                number + 1
            )));
        };
        let digest = hex::decode(sum).map_err(|e| {
            TharsisError::Validation(format!("checksum file line {}: {}", number + 1, e))
        })?;
        if digest.len() != 32 {
            return Err(TharsisError::Validation(format!(
                "checksum file line {}: expected a SHA-256 digest",
                number + 1
            )));
        }
        checksums.insert(filename.to_string(), hex::encode(digest));
    }
    Ok(checksums)
}

/// SHA-256 of a file, hex encoded
pub async fn sha256_file(path: &Path) -> TharsisResult<String> {
    let mut file = open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let read = file
            .read(&mut buffer)
            .await
            .map_err(|e| TharsisError::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Drives a provider version upload through its stages
pub struct ProviderVersionUploader<'a> {
    client: &'a dyn ApiClient,
    stage: UploadStage,
}

impl<'a> ProviderVersionUploader<'a> {
    pub fn new(client: &'a dyn ApiClient) -> Self {
        Self {
            client,
            stage: UploadStage::Start,
        }
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    fn advance(&mut self, stage: UploadStage) {
        debug!(stage = %stage, "provider upload step complete");
        self.stage = stage;
    }

    /// Upload the release in `directory` as a new version of `provider`
    pub async fn upload(
        &mut self,
        provider: &ResourceIdentifier,
        directory: &Path,
    ) -> TharsisResult<UploadReport> {
        match self.run(provider, directory).await {
            Ok(report) => {
                self.advance(UploadStage::Done);
                Ok(report)
            }
            Err(e) => {
                error!(
                    stage = %self.stage,
                    error = %e,
                    "provider version upload aborted, resources created so far were not removed"
                );
                Err(TharsisError::Upload {
                    stage: self.stage.abort_point(),
                    source: Box::new(e),
                })
            }
        }
    }

    async fn run(
        &mut self,
        provider: &ResourceIdentifier,
        directory: &Path,
    ) -> TharsisResult<UploadReport> {
        let manifests = read_manifests(directory).await?;
        self.advance(UploadStage::ManifestsRead);

        let checksum_artifact = manifests
            .first_of(ArtifactType::Checksum)
            .ok_or_else(|| {
                TharsisError::Validation(format!("{} lists no checksum file", ARTIFACTS_FILE))
            })?;
        let checksum_path = directory.join(&checksum_artifact.path);
        let checksums = parse_checksums(
            &fs::read_to_string(&checksum_path)
                .await
                .map_err(|e| TharsisError::io(&checksum_path, e))?,
        )?;

        let version = self
            .client
            .create_provider_version(&CreateProviderVersionInput {
                provider_id: provider.trn_for(ResourceType::TerraformProvider)?,
                version: manifests.version.clone(),
                protocols: manifests.protocols.clone(),
            })
            .await?;
        info!(version = %version.version, id = %version.id, "created provider version");
        self.advance(UploadStage::VersionCreated);

        let readme_path = directory.join(README_FILE);
        let readme_uploaded = match File::open(&readme_path).await {
            Ok(file) => {
                self.client.upload_provider_readme(&version.id, file).await?;
                self.advance(UploadStage::ReadmeUploaded);
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.advance(UploadStage::ReadmeSkipped);
                false
            }
            Err(e) => return Err(TharsisError::io(readme_path, e)),
        };

        self.client
            .upload_provider_checksums(&version.id, open(&checksum_path).await?)
            .await?;
        self.advance(UploadStage::ChecksumsUploaded);

        let signature_uploaded = match manifests.first_of(ArtifactType::Signature) {
            Some(signature) => {
                let file = open(&directory.join(&signature.path)).await?;
                self.client
                    .upload_provider_checksum_signature(&version.id, file)
                    .await?;
                self.advance(UploadStage::SignatureUploaded);
                true
            }
            None => false,
        };

        let mut platforms = Vec::new();
        for archive in manifests.archives() {
            let platform = self
                .upload_archive(&version, archive, &directory.join(&archive.path), &checksums)
                .await?;
            platforms.push(platform);
            self.advance(UploadStage::ArchivesUploaded(platforms.len()));
        }

        Ok(UploadReport {
            provider_version: version,
            readme_uploaded,
            signature_uploaded,
            platforms,
        })
    }

    async fn upload_archive(
        &self,
        version: &ProviderVersion,
        archive: &Artifact,
        path: &Path,
        checksums: &HashMap<String, String>,
    ) -> TharsisResult<ProviderPlatform> {
        let (Some(os), Some(arch)) = (&archive.goos, &archive.goarch) else {
            return Err(TharsisError::Validation(format!(
                "archive '{}' is missing goos/goarch",
                archive.name
            )));
        };
        let expected = checksums.get(&archive.name).ok_or_else(|| {
            TharsisError::Validation(format!("checksum file has no entry for '{}'", archive.name))
        })?;
        let actual = sha256_file(path).await?;
        if &actual != expected {
            return Err(TharsisError::Validation(format!(
                "checksum mismatch for '{}': expected {}, found {}",
                archive.name, expected, actual
            )));
        }

        let platform = self
            .client
            .create_provider_platform(&CreateProviderPlatformInput {
                provider_version_id: version.id.clone(),
                os: os.clone(),
                arch: arch.clone(),
                sha_sum: actual,
                filename: archive.name.clone(),
            })
            .await?;
        self.client
            .upload_provider_platform_binary(&platform.id, open(path).await?)
            .await?;
        info!(os = %platform.os, arch = %platform.arch, "uploaded platform archive");
        Ok(platform)
    }
}

/// goreleaser-style release directory for upload tests
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::fs as std_fs;
    use tempfile::TempDir;

    pub const NAME: &str = "terraform-provider-demo_1.2.3";

    pub fn sha(content: &[u8]) -> String {
        hex::encode(Sha256::digest(content))
    }

    pub struct Release {
        dir: TempDir,
    }

    impl Release {
        pub fn new(with_readme: bool, with_signature: bool) -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path();
            std_fs::create_dir_all(root.join("dist")).unwrap();
            std_fs::write(
                root.join(REGISTRY_MANIFEST_FILE),
                r#"{"version":1,"metadata":{"protocol_versions":["5.0","6.0"]}}"#,
            )
            .unwrap();
            std_fs::write(
                root.join(RELEASE_METADATA_FILE),
                r#"{"project_name":"terraform-provider-demo","tag":"v1.2.3","version":"1.2.3"}"#,
            )
            .unwrap();

            let mut sums = String::new();
            let mut artifacts = Vec::new();
            for (os, arch) in [("linux", "amd64"), ("darwin", "arm64")] {
                let name = format!("{}_{}_{}.zip", NAME, os, arch);
                let content = format!("{}-{}-binary", os, arch);
                std_fs::write(root.join("dist").join(&name), &content).unwrap();
                sums.push_str(&format!("{}  {}\n", sha(content.as_bytes()), name));
                artifacts.push(serde_json::json!({
                    "name": name, "path": format!("dist/{}", name),
                    "goos": os, "goarch": arch, "type": "Archive"
                }));
            }

            let sums_name = format!("{}_SHA256SUMS", NAME);
            std_fs::write(root.join("dist").join(&sums_name), &sums).unwrap();
            artifacts.push(serde_json::json!({
                "name": sums_name, "path": format!("dist/{}", sums_name), "type": "Checksum"
            }));
            artifacts.push(serde_json::json!({
                "name": "metadata.json", "path": "dist/metadata.json", "type": "Metadata"
            }));

            if with_signature {
                let sig_name = format!("{}.sig", sums_name);
                std_fs::write(root.join("dist").join(&sig_name), "signature").unwrap();
                artifacts.push(serde_json::json!({
                    "name": sig_name, "path": format!("dist/{}", sig_name), "type": "Signature"
                }));
            }
            if with_readme {
                std_fs::write(root.join(README_FILE), "# demo provider").unwrap();
            }

            std_fs::write(
                root.join(ARTIFACTS_FILE),
                serde_json::to_string(&artifacts).unwrap(),
            )
            .unwrap();
            Self { dir }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::client::memory::{Call, MemoryClient};
    use super::fixtures::{sha, Release, NAME};
    use tempfile::TempDir;
    use std::fs as std_fs;

    fn provider() -> ResourceIdentifier {
        ResourceIdentifier::Path("top/demo".to_string())
    }

    #[tokio::test]
    async fn test_full_upload_order() {
        let release = Release::new(true, true);
        let client = MemoryClient::new();
        let mut uploader = ProviderVersionUploader::new(&client);

        let report = uploader.upload(&provider(), release.path()).await.unwrap();

        assert_eq!(uploader.stage(), UploadStage::Done);
        assert!(report.readme_uploaded);
        assert!(report.signature_uploaded);
        assert_eq!(report.provider_version.protocols, vec!["5.0", "6.0"]);
        assert_eq!(report.platforms.len(), 2);
        assert_eq!(
            client.calls(),
            vec![
                Call::CreateProviderVersion("trn:terraform_provider:top/demo@1.2.3".to_string()),
                Call::UploadReadme("PV_1".to_string()),
                Call::UploadChecksums("PV_1".to_string()),
                Call::UploadSignature("PV_1".to_string()),
                Call::CreatePlatform("linux_amd64".to_string()),
                Call::UploadBinary("PP_2".to_string()),
                Call::CreatePlatform("darwin_arm64".to_string()),
                Call::UploadBinary("PP_3".to_string()),
            ]
        );
        assert_eq!(client.uploaded("PP_2/binary").unwrap(), b"linux-amd64-binary");
        assert_eq!(report.platforms[0].sha_sum, sha(b"linux-amd64-binary"));
    }

    #[tokio::test]
    async fn test_optional_files_skipped() {
        let release = Release::new(false, false);
        let client = MemoryClient::new();
        let mut uploader = ProviderVersionUploader::new(&client);

        let report = uploader.upload(&provider(), release.path()).await.unwrap();

        assert!(!report.readme_uploaded);
        assert!(!report.signature_uploaded);
        let calls = client.calls();
        assert!(!calls
            .iter()
            .any(|c| matches!(c, Call::UploadReadme(_) | Call::UploadSignature(_))));
        assert_eq!(calls[1], Call::UploadChecksums("PV_1".to_string()));
    }

    #[tokio::test]
    async fn test_checksum_mismatch_aborts_without_rollback() {
        let release = Release::new(false, true);
        std_fs::write(
            release.path().join("dist").join(format!("{}_darwin_arm64.zip", NAME)),
            "tampered",
        )
        .unwrap();
        let client = MemoryClient::new();
        let mut uploader = ProviderVersionUploader::new(&client);

        let err = uploader.upload(&provider(), release.path()).await.unwrap_err();

        assert_eq!(uploader.stage(), UploadStage::ArchivesUploaded(1));
        assert!(err.to_string().contains("checksum mismatch"));
        assert!(matches!(client.calls()[0], Call::CreateProviderVersion(_)));
    }

    #[tokio::test]
    async fn test_upload_failure_stops_sequence() {
        let release = Release::new(true, true);
        let client = MemoryClient::new().failing_on("upload_provider_checksums");
        let mut uploader = ProviderVersionUploader::new(&client);

        let err = uploader.upload(&provider(), release.path()).await.unwrap_err();

        assert!(matches!(
            err,
            TharsisError::Upload { ref stage, .. } if stage == "after uploading the README"
        ));
        assert_eq!(uploader.stage(), UploadStage::ReadmeUploaded);
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let client = MemoryClient::new();
        let mut uploader = ProviderVersionUploader::new(&client);

        let err = uploader.upload(&provider(), dir.path()).await.unwrap_err();

        assert_eq!(uploader.stage(), UploadStage::Start);
        assert!(err.to_string().starts_with("provider upload aborted before reading manifests"));
        match err {
            TharsisError::Upload { source, .. } => {
                assert!(matches!(*source, TharsisError::Io { .. }))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_provider_trn_type() {
        let release = Release::new(false, false);
        let client = MemoryClient::new();
        let mut uploader = ProviderVersionUploader::new(&client);
        let provider = ResourceIdentifier::parse("trn:workspace:top/demo").unwrap();

        assert!(uploader.upload(&provider, release.path()).await.is_err());
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_parse_checksums() {
        let sum = sha(b"x");
        let content = format!("{}  a.zip\n\n{}  b.zip\n", sum, sum.to_uppercase());
        let parsed = parse_checksums(&content).unwrap();
        assert_eq!(parsed["a.zip"], sum);
        assert_eq!(parsed["b.zip"], sum);

        assert!(parse_checksums("abc  a.zip").is_err());
        assert!(parse_checksums(&sum).is_err());
        assert!(parse_checksums(&format!("{}  a.zip extra", sum)).is_err());
        assert!(parse_checksums("zz  a.zip").is_err());
    }
}
