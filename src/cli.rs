//! CLI struct definitions for the rolewire command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use crate::core::config::DefaultServicePolicy;
use crate::core::validate::OutputFormat;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "rolewire",
    version = env!("CARGO_PKG_VERSION"),
    about = "Projects the role registry into generated regions of workflow, compose and shell files, and validates governance ownership and contract consumption."
)]
pub(crate) struct Cli {
    /// Repository root (defaults to the current directory).
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,
    /// Config file (defaults to `<root>/rolewire.toml` when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct GenerateCli {
    /// Compare generated regions against the committed files without writing.
    #[clap(long)]
    pub check: bool,
    /// Role registry, relative to the root. Overrides the config.
    #[clap(long)]
    pub registry: Option<PathBuf>,
    /// How to treat several roles without a compose profile.
    #[clap(long, value_enum)]
    pub default_service_policy: Option<DefaultServicePolicy>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct FormatArgs {
    /// Output format: 'text' or 'json'.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ValidateCli {
    #[clap(subcommand)]
    pub command: ValidateCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ValidateCommand {
    /// Governed-repository registry and repository marker
    Ownership {
        /// Registry path, relative to the root
        #[clap(long)]
        registry: Option<PathBuf>,
        /// Marker path, relative to the root
        #[clap(long)]
        marker: Option<PathBuf>,
        #[clap(flatten)]
        format: FormatArgs,
    },
    /// Upstream governance contract against the local lock
    Contract {
        #[clap(flatten)]
        format: FormatArgs,
    },
    /// Governance-only files that must not live here
    Boundary {
        #[clap(flatten)]
        format: FormatArgs,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct JobDescriptionCli {
    /// Role slug, e.g. `compliance-officer`
    #[clap(long)]
    pub role_slug: String,
    /// Display name (derived from the slug when omitted)
    #[clap(long)]
    pub role_name: Option<String>,
    #[clap(long, default_value = "unknown")]
    pub source_ref: String,
    /// Timestamp to stamp into the output (defaults to now, UTC)
    #[clap(long)]
    pub generated_at_utc: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Regenerate registry-derived regions (or verify them with --check)
    #[clap(name = "generate", visible_alias = "gen")]
    Generate(GenerateCli),

    /// Run governance and boundary validators
    #[clap(name = "validate", visible_alias = "v")]
    Validate(ValidateCli),

    /// Assemble an agent job description for a role
    #[clap(name = "job-description")]
    JobDescription(JobDescriptionCli),
}
