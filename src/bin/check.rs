//! `check` entry point: report whether the remote stack has a new version.
//!
//! Reads the resource request from stdin, emits the version list as JSON on
//! stdout. Everything diagnostic goes to stderr; stdout belongs to the
//! protocol.

use cfn_resource_rs::{check, CheckInput, ResourceConfig, RusotoStackBackend, Version};
use std::io::Read;
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let mut raw = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut raw) {
        error!(error = %err, "could not read request from stdin");
        return ExitCode::FAILURE;
    }
    let input: CheckInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(err) => {
            error!(error = %err, "could not parse check request");
            return ExitCode::FAILURE;
        }
    };

    let backend = match RusotoStackBackend::from_source(&input.source) {
        Ok(backend) => backend,
        Err(err) => {
            error!(error = %err, "could not build CloudFormation client");
            return ExitCode::FAILURE;
        }
    };

    let previous = input
        .version
        .map(|version| version.last_updated_time)
        .unwrap_or_default();
    let versions = check(&backend, &ResourceConfig::default(), &input.source.name, &previous).await;

    let response: Vec<Version> = versions
        .into_iter()
        .map(|last_updated_time| Version { last_updated_time })
        .collect();
    match serde_json::to_string(&response) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "could not serialize response");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
