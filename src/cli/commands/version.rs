use crate::cli::context::Context;
use crate::cli::dispatch::{no_arguments, Command};
use crate::domain::error::TharsisResult;
use async_trait::async_trait;

/// `version`
pub struct Version;

#[async_trait]
impl Command for Version {
    fn name(&self) -> &'static str {
        "version"
    }

    fn synopsis(&self) -> &'static str {
        "Show the CLI version."
    }

    async fn run(&self, ctx: &Context, args: &[String]) -> TharsisResult<()> {
        let (_, positional) = self.parse(args)?;
        no_arguments(positional)?;
        ctx.output
            .write_message(&format!("tharsis {}", env!("CARGO_PKG_VERSION")))?;
        Ok(())
    }
}
