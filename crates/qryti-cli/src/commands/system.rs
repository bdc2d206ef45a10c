//! Health, configuration and version information.

use qryti_config::ConfigSource;
use qryti_core::error::{QrytiError, QrytiResult};

use super::CommandContext;

pub async fn health(ctx: &CommandContext) -> QrytiResult<()> {
    if ctx.client.health_check().await {
        ctx.output
            .success(&format!("{} is healthy", ctx.config.api.base_url));
        Ok(())
    } else {
        Err(QrytiError::Network {
            message: format!("{} did not report healthy", ctx.config.api.base_url),
            source: None,
        })
    }
}

pub async fn show_config(ctx: &CommandContext) -> QrytiResult<()> {
    let rendered = qryti_config::toml::serialize_qryti_toml(&ctx.config)?;
    println!("{}", rendered.trim_end());

    ctx.output.info("");
    ctx.output.info("Sources (later wins):");
    for source in &ctx.sources {
        ctx.output.info(&format!("  {}", describe_source(source)));
    }
    ctx.output.info(&format!("Session file: {}", ctx.session_file));
    Ok(())
}

pub fn describe_source(source: &ConfigSource) -> String {
    match source {
        ConfigSource::Defaults => "built-in defaults".to_string(),
        ConfigSource::Global(path) => format!("global file {}", path),
        ConfigSource::Project(path) => format!("project file {}", path),
        ConfigSource::Environment(key) => format!("environment {}", key),
        ConfigSource::CommandLine => "command-line flags".to_string(),
    }
}

pub async fn show_version(ctx: &CommandContext) -> QrytiResult<()> {
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.field("qryti", env!("CARGO_PKG_VERSION"));
    ctx.output.field("Built", env!("BUILD_DATE"));
    ctx.output.field("Target", &target);
    ctx.output.field("Rust", env!("RUSTC_VERSION"));
    Ok(())
}
