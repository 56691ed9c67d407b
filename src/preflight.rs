//! Preflight checks for pipeline runs.
//!
//! Validates that the host has the required tools before the first stage
//! runs. This prevents cryptic mid-pipeline failures after minutes of
//! building.

use anyhow::{bail, Result};

use crate::process::command_exists;

/// Tools every pipeline run needs, as (command, install hint).
pub const BASE_TOOLS: &[(&str, &str)] = &[("git", "git"), ("fpm", "fpm (gem install fpm)")];

/// Check that specific tools are available.
///
/// Missing tools are reported together with their install hints in a
/// single error.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let mut missing = Vec::new();

    for (tool, package) in tools {
        if !command_exists(tool) {
            missing.push((*tool, *package));
        }
    }

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check the tools a run with the given build tool and target format needs.
///
/// RPM targets additionally require `rpmbuild`, which fpm delegates to.
pub fn check_host_tools(build_tool: &str, needs_rpmbuild: bool) -> Result<()> {
    let mut tools: Vec<(&str, &str)> = BASE_TOOLS.to_vec();
    tools.push((build_tool, build_tool));
    if needs_rpmbuild {
        tools.push(("rpmbuild", "rpm-build"));
    }
    check_required_tools(&tools)
}
