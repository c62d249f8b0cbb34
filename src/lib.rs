//! rolewire: registry-driven role wiring and governance checks.
//!
//! One role registry (`00-os/role-registry.yml`) is the single source of truth
//! for every role-specific list in a workstation repository: workflow
//! matrices, dispatch choices, shell menus, case mappings and compose
//! services. `rolewire generate` projects the registry into delimited
//! regions of those host files and leaves everything outside the regions
//! byte-for-byte untouched; `--check` reports drift without writing.
//!
//! The validators guard the governance side:
//!
//! - `validate ownership`: governed-repository registry and marker agree
//! - `validate contract`: the pinned upstream contract matches its lock
//! - `validate boundary`: governance-only files stay out of this repository
//!
//! # Examples
//!
//! ```bash
//! # Refresh generated regions
//! rolewire generate
//!
//! # CI drift gate
//! rolewire generate --check
//!
//! # Governance checks
//! rolewire validate ownership --format json
//! rolewire validate contract
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: registry model, region splicing, projections, validators

mod cli;
pub mod core;

use crate::core::{
    boundary, config, contract, error, governance, jobdesc,
    validate::{OutputFormat, ValidationReport},
    wiring,
};
use clap::Parser;
use cli::{Cli, Command, JobDescriptionCli, ValidateCommand};
use std::path::PathBuf;

fn resolve_root(explicit: Option<PathBuf>) -> Result<PathBuf, error::RolewireError> {
    let root = match explicit {
        Some(p) => p,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(error::RolewireError::NotFound(format!(
            "root directory {} does not exist",
            root.display()
        )));
    }
    Ok(root)
}

fn finish(report: ValidationReport, format: OutputFormat) -> Result<(), error::RolewireError> {
    report.print(format)?;
    report.into_result()
}

pub fn run() -> Result<(), error::RolewireError> {
    let cli = Cli::parse();
    let root = resolve_root(cli.root)?;
    let mut config = config::load_config(&root, cli.config.as_deref())?;
    tracing::debug!(root = %root.display(), "resolved repository root");

    match cli.command {
        Command::Generate(args) => {
            if let Some(registry) = args.registry {
                config.registry = registry;
            }
            if let Some(policy) = args.default_service_policy {
                config.default_service_policy = policy;
            }
            let mode = if args.check {
                wiring::Mode::Check
            } else {
                wiring::Mode::Apply
            };
            wiring::run_generate(&root, &config, mode)?;
            Ok(())
        }
        Command::Validate(validate) => match validate.command {
            ValidateCommand::Ownership {
                registry,
                marker,
                format,
            } => {
                let registry = registry.unwrap_or(config.ownership.registry);
                let marker = marker.unwrap_or(config.ownership.marker);
                let report = governance::run_ownership(&root, &registry, &marker)?;
                finish(report, format.format)
            }
            ValidateCommand::Contract { format } => {
                finish(contract::run_contract(&root)?, format.format)
            }
            ValidateCommand::Boundary { format } => {
                finish(boundary::run_boundary(&root)?, format.format)
            }
        },
        Command::JobDescription(JobDescriptionCli {
            role_slug,
            role_name,
            source_ref,
            generated_at_utc,
        }) => {
            let request = jobdesc::JobRequest {
                role_slug,
                role_name,
                source_ref,
                generated_at_utc,
            };
            jobdesc::run_job_description(&root, &request)
        }
    }
}
