//! Commerce MCP Server: MCP stdio server exposing commerce platform operations as tools
//!
//! Reads credentials from the environment, builds one shared
//! [`CommerceClient`], and serves the tool set over stdin/stdout.
//!
//! # Environment
//!
//! - Credential variables, see [`Credentials::from_env`]
//! - `COMMERCE_HTTP_CONFIG`: optional path to a TOML HTTP client configuration
//! - `LOG_FORMAT`: `json` or `pretty` (default)
//! - `RUST_LOG`: log filter (default `info`)

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and rmcp"
)]

mod observability;
mod tools;

use std::{error::Error, sync::Arc};

use commerce_mcp_bridge::{CommerceClient, Credentials, transport::HttpConfig};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{error, info};

use crate::{
    observability::{LogFormat, init_observability},
    tools::CommerceTools,
};

const ENV_HTTP_CONFIG: &str = "COMMERCE_HTTP_CONFIG";

fn http_config() -> commerce_mcp_bridge::Result<HttpConfig> {
    match std::env::var(ENV_HTTP_CONFIG) {
        Ok(path) if !path.trim().is_empty() => HttpConfig::from_file(path.trim()),
        _ => Ok(HttpConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_observability(LogFormat::from_env());

    let credentials = Credentials::from_env()
        .inspect_err(|e| error!(error = %e, "invalid credential configuration"))?;
    let http_config =
        http_config().inspect_err(|e| error!(error = %e, "invalid HTTP configuration"))?;

    let mode = credentials.mode();
    let client = CommerceClient::with_config(credentials, &http_config)?;
    info!(mode, base_url = %client.base_url(), "starting commerce MCP server on stdio");

    let service = CommerceTools::new(Arc::new(client))
        .serve(stdio())
        .await
        .inspect_err(|e| error!(error = %e, "failed to start MCP session"))?;

    let reason = service.waiting().await?;
    info!(?reason, "MCP session ended");
    Ok(())
}
