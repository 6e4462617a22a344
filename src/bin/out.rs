//! `out` entry point: converge the stack and report the deployment.
//!
//! Reads the resource request from stdin and the template/parameter/tag
//! files relative to the build directory (argv[1]). Emits the fingerprint
//! version plus arn/timestamp metadata on stdout, and exits non-zero when
//! the stack did not reach a successful terminal status — or when an input
//! file does not parse.

use cfn_resource_rs::inputs::{parse_parameters, parse_tags};
use cfn_resource_rs::{
    put, FingerprintVersion, MetadataField, OutInput, PutResponse, ResourceConfig,
    RusotoStackBackend, StackSpec,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let build_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    info!(dir = %build_dir.display(), "build directory");

    let mut raw = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut raw) {
        error!(error = %err, "could not read request from stdin");
        return ExitCode::FAILURE;
    }
    let input: OutInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(err) => {
            error!(error = %err, "could not parse out request");
            return ExitCode::FAILURE;
        }
    };

    let spec = match build_spec(&build_dir, &input) {
        Ok(spec) => spec,
        Err(()) => return ExitCode::FAILURE,
    };

    let backend = match RusotoStackBackend::from_source(&input.source) {
        Ok(backend) => backend,
        Err(err) => {
            error!(error = %err, "could not build CloudFormation client");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match put(&backend, &ResourceConfig::default(), &spec).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(error = %err, "deployment aborted");
            return ExitCode::FAILURE;
        }
    };

    let response = PutResponse {
        version: FingerprintVersion {
            sha1: outcome.fingerprint,
        },
        metadata: vec![
            MetadataField {
                name: "arn".into(),
                value: outcome.arn,
            },
            MetadataField {
                name: "timestamp".into(),
                value: outcome.timestamp,
            },
        ],
    };
    match serde_json::to_string(&response) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            error!(error = %err, "could not serialize response");
            return ExitCode::FAILURE;
        }
    }

    if outcome.succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Materialize the desired state: template text plus parsed parameter and
/// tag files. Missing paths mean "not provided"; unreadable or unparseable
/// files are fatal.
fn build_spec(build_dir: &Path, input: &OutInput) -> Result<StackSpec, ()> {
    let mut spec = StackSpec::new(input.source.name.as_str())
        .with_capabilities(input.params.capabilities.clone());
    spec.delete = input.params.delete;
    spec.changeset_create = input.params.changeset_create;
    spec.changeset_execute = input.params.changeset_execute;

    if let Some(template) = &input.params.template {
        let path = build_dir.join(template);
        match std::fs::read_to_string(&path) {
            Ok(body) => spec.template_body = body,
            Err(err) => {
                error!(path = %path.display(), error = %err, "could not read template");
                return Err(());
            }
        }
    }

    if let Some(parameters) = &input.params.parameters {
        let path = build_dir.join(parameters);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(path = %path.display(), error = %err, "could not read parameters file");
                return Err(());
            }
        };
        match parse_parameters(&bytes) {
            Ok(parsed) => spec.parameters = parsed,
            Err(err) => {
                error!(path = %path.display(), error = %err, "bad parameters file");
                return Err(());
            }
        }
    }

    if let Some(tags) = &input.params.tags {
        let path = build_dir.join(tags);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(path = %path.display(), error = %err, "could not read tags file");
                return Err(());
            }
        };
        match parse_tags(&bytes) {
            Ok(parsed) => spec.tags = parsed,
            Err(err) => {
                error!(path = %path.display(), error = %err, "bad tags file");
                return Err(());
            }
        }
    }

    Ok(spec)
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
