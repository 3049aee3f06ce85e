use crate::cli::commands::JSON_OPTION;
use crate::cli::context::Context;
use crate::cli::dispatch::{single_argument, Command};
use crate::cli::optparser::OptionDefinition;
use crate::core::provider_upload::ProviderVersionUploader;
use crate::core::trn::ResourceType;
use crate::core::validate::resource_identifier;
use crate::domain::error::{TharsisError, TharsisResult};
use async_trait::async_trait;
use std::path::Path;

/// `provider upload-version <provider-path>`
pub struct UploadVersion;

#[async_trait]
impl Command for UploadVersion {
    fn name(&self) -> &'static str {
        "provider upload-version"
    }

    fn synopsis(&self) -> &'static str {
        "Upload a new provider version to the provider registry."
    }

    fn usage(&self) -> &'static str {
        "[options] <provider-path>"
    }

    fn description(&self) -> &'static str {
        "Publish a goreleaser release as a new version of a registry provider. \
         The directory must contain terraform-registry-manifest.json and the \
         dist/ output of goreleaser, including the SHA256SUMS file."
    }

    fn options(&self) -> Vec<OptionDefinition> {
        vec![
            OptionDefinition::single(
                "directory",
                "Release directory (default: current directory).",
            ),
            JSON_OPTION,
        ]
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (options, positional) = self.parse(args)?;
        let provider = resource_identifier(
            &single_argument(positional, "provider path")?,
            ResourceType::TerraformProvider,
        )?;
        let directory = Path::new(options.value("directory").unwrap_or("."));
        if !directory.is_dir() {
            return Err(TharsisError::Validation(format!(
                "release directory '{}' does not exist",
                directory.display()
            )));
        }

        let client = ctx.client()?;
        let report = ProviderVersionUploader::new(client.as_ref())
            .upload(&provider, directory)
            .await?;
        ctx.output.write_upload_report(&report, options.flag("json"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing::{args, Harness};
    use crate::core::provider_upload::fixtures::Release;
    use crate::infrastructure::client::memory::{Call, MemoryClient};

    #[tokio::test]
    async fn test_upload_from_directory() {
        let release = Release::new(true, false);
        let harness = Harness::new(MemoryClient::new());
        let directory = release.path().to_string_lossy().to_string();

        UploadVersion
            .run(&harness.ctx, &args(&["--directory", &directory, "--json", "top/demo"]))
            .await
            .unwrap();

        let report = harness.json();
        assert_eq!(report["providerVersion"]["version"], "1.2.3");
        assert_eq!(report["readmeUploaded"], true);
        assert_eq!(report["signatureUploaded"], false);
        assert_eq!(report["platforms"].as_array().unwrap().len(), 2);
        assert_eq!(
            harness.client.calls()[0],
            Call::CreateProviderVersion("trn:terraform_provider:top/demo@1.2.3".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let harness = Harness::new(MemoryClient::new());
        let err = UploadVersion
            .run(&harness.ctx, &args(&["--directory", "/does/not/exist", "top/demo"]))
            .await
            .unwrap_err();
        assert!(matches!(err, TharsisError::Validation(_)));
        assert!(harness.client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_path_needs_group() {
        let harness = Harness::new(MemoryClient::new());
        let err = UploadVersion.run(&harness.ctx, &args(&["demo"])).await.unwrap_err();
        assert!(matches!(err, TharsisError::Validation(_)));
    }
}
