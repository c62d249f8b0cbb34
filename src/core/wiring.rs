//! Role wiring generation: registry -> projections -> regions in host files.
//!
//! Targets are processed in table order and each host file is read once,
//! spliced region by region, and written at most once. A marker failure in
//! one file leaves that file untouched; the remaining targets still run and
//! the failure count is reported at the end.
//!
//! Check mode runs the identical pipeline and never writes.

use crate::core::config::{DefaultServicePolicy, RolewireConfig, TargetSpec};
use crate::core::error::RolewireError;
use crate::core::loader;
use crate::core::model::RoleRecord;
use crate::core::output::{self, Tag};
use crate::core::projection::ProjectionKind;
use crate::core::region::Region;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write spliced results back.
    Apply,
    /// Compare only; fail on drift.
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOutcome {
    pub target: PathBuf,
    pub marker: String,
    pub projection: ProjectionKind,
    /// Committed content differs from freshly rendered content.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFailure {
    pub target: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub mode: Mode,
    pub total_targets: usize,
    pub regions: Vec<RegionOutcome>,
    pub failures: Vec<TargetFailure>,
}

impl GenerationReport {
    pub fn changed(&self) -> Vec<&RegionOutcome> {
        self.regions.iter().filter(|r| r.changed).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && (self.mode == Mode::Apply || self.changed().is_empty())
    }
}

/// Registry checks that must hold before anything is rendered.
///
/// Returns policy warnings; duplicate slugs and a denied multi-default
/// registry are fatal.
pub fn preflight(
    roles: &[RoleRecord],
    policy: DefaultServicePolicy,
) -> Result<Vec<String>, RolewireError> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for role in roles {
        *seen.entry(role.slug.as_str()).or_default() += 1;
    }
    let duplicates: Vec<&str> = seen
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(slug, _)| *slug)
        .collect();
    if !duplicates.is_empty() {
        return Err(RolewireError::SchemaError(format!(
            "duplicate role slug(s): {}",
            duplicates.join(", ")
        )));
    }

    let defaults: Vec<&str> = roles
        .iter()
        .filter(|r| r.is_default_service())
        .map(|r| r.slug.as_str())
        .collect();
    if defaults.len() <= 1 {
        return Ok(Vec::new());
    }

    let message = format!(
        "{} roles have no compose profile and would all start by default: {}",
        defaults.len(),
        defaults.join(", ")
    );
    match policy {
        DefaultServicePolicy::Allow => Ok(Vec::new()),
        DefaultServicePolicy::Warn => Ok(vec![message]),
        DefaultServicePolicy::Deny => Err(RolewireError::SchemaError(message)),
    }
}

/// Splice every region of `spec` into `text`. Pure; no file I/O.
pub fn render_target(
    text: &str,
    spec: &TargetSpec,
    roles: &[RoleRecord],
    config: &RolewireConfig,
) -> Result<(String, Vec<RegionOutcome>), RolewireError> {
    let mut current = text.to_string();
    let mut outcomes = Vec::with_capacity(spec.regions.len());

    for region_spec in &spec.regions {
        let region = Region::new(region_spec.marker.as_str());
        let body = region_spec.projection.render(roles, &config.compose);
        let updated = region.splice(&current, &body)?;
        let changed = updated != current;
        tracing::debug!(
            target_file = %spec.path.display(),
            marker = %region_spec.marker,
            projection = %region_spec.projection,
            changed,
            "spliced region"
        );
        outcomes.push(RegionOutcome {
            target: spec.path.clone(),
            marker: region_spec.marker.clone(),
            projection: region_spec.projection,
            changed,
        });
        current = updated;
    }

    Ok((current, outcomes))
}

/// Run every configured target against `root`.
///
/// Problems with one target (unreadable, missing markers, failed write) are
/// recorded as failures for that target only.
pub fn generate(
    root: &Path,
    config: &RolewireConfig,
    roles: &[RoleRecord],
    mode: Mode,
) -> GenerationReport {
    let mut report = GenerationReport {
        mode,
        total_targets: config.targets.len(),
        regions: Vec::new(),
        failures: Vec::new(),
    };

    for spec in &config.targets {
        let path = root.join(&spec.path);
        let outcome = loader::read_document(&path).and_then(|original| {
            let (updated, regions) = render_target(&original, spec, roles, config)?;
            if mode == Mode::Apply && updated != original {
                fs::write(&path, &updated)?;
            }
            Ok(regions)
        });

        match outcome {
            Ok(regions) => report.regions.extend(regions),
            Err(e) => {
                tracing::debug!(target_file = %spec.path.display(), error = %e, "target failed");
                report.failures.push(TargetFailure {
                    target: spec.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

fn describe(region: &RegionOutcome) -> String {
    format!(
        "{} [{} {}]",
        region.target.display(),
        region.marker,
        region.projection
    )
}

/// Print the per-region lines and summary for a finished run.
pub fn print_report(report: &GenerationReport) {
    match report.mode {
        Mode::Apply => {
            for region in &report.regions {
                if region.changed {
                    output::line("generate", Tag::Changed, &describe(region));
                } else {
                    output::line(
                        "generate",
                        Tag::Ok,
                        &format!("{} unchanged", describe(region)),
                    );
                }
            }
        }
        Mode::Check => {
            for region in report.changed() {
                output::line(
                    "generate",
                    Tag::Fail,
                    &format!("{} has uncommitted generated changes", describe(region)),
                );
            }
        }
    }

    for failure in &report.failures {
        output::line(
            "generate",
            Tag::Fail,
            &format!("{}: {}", failure.target.display(), failure.reason),
        );
    }

    let changed = report.changed();
    match report.mode {
        Mode::Apply => println!(
            "generate: complete: {} of {} regions updated",
            changed.len(),
            report.regions.len()
        ),
        Mode::Check if changed.is_empty() => {
            if report.failures.is_empty() {
                println!(
                    "generate: all {} generated regions are up to date",
                    report.regions.len()
                );
            }
        }
        Mode::Check => {
            println!(
                "generate: {} generated regions are out of sync:",
                changed.len()
            );
            for region in &changed {
                println!("  - {}", describe(region));
            }
            println!("generate: run `rolewire generate` to refresh them");
        }
    }
}

/// Convert a finished report into the run's completion signal.
pub fn report_result(report: &GenerationReport) -> Result<(), RolewireError> {
    if report.is_clean() {
        return Ok(());
    }

    let mut problems = Vec::new();
    if report.mode == Mode::Check {
        let stale = report.changed().len();
        if stale > 0 {
            problems.push(format!("{} generated region(s) out of sync", stale));
        }
    }
    if !report.failures.is_empty() {
        problems.push(format!(
            "{} of {} targets failed",
            report.failures.len(),
            report.total_targets
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(RolewireError::ValidationError(problems.join("; ")))
    }
}

/// `rolewire generate [--check]`
pub fn run_generate(
    root: &Path,
    config: &RolewireConfig,
    mode: Mode,
) -> Result<GenerationReport, RolewireError> {
    let registry_path = root.join(&config.registry);
    let roles = loader::load_role_registry(&registry_path)?;
    println!("generate: loaded {} roles from registry", roles.len());

    for warning in preflight(&roles, config.default_service_policy)? {
        tracing::warn!("{}", warning);
        output::line("generate", Tag::Warn, &warning);
    }

    let report = generate(root, config, &roles, mode);
    print_report(&report);
    if !report.failures.is_empty() {
        println!(
            "generate: failures {}: {}",
            report.failures.len(),
            output::preview_messages(
                &report
                    .failures
                    .iter()
                    .map(|f| format!("{}: {}", f.target.display(), f.reason))
                    .collect::<Vec<_>>(),
                2,
                110
            )
        );
    }
    report_result(&report)?;
    Ok(report)
}
