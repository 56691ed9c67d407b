//! Package creation.
//!
//! Selects the platform-native package format from the platform tag and
//! drives `fpm` over the staging tree. Packaging never runs before staging
//! has completed; the orchestrator enforces the ordering.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::platform::PlatformTag;
use crate::process::{Cmd, ToolRunner};

/// Platform-native package format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Deb,
    Rpm,
}

impl PackageKind {
    /// Select the packaging strategy for an identified platform.
    ///
    /// Selection branches purely on the family; any family without a known
    /// strategy is fatal.
    pub fn for_platform(tag: &PlatformTag) -> Result<Self> {
        match tag.family.as_str() {
            "ubuntu" | "debian" => Ok(Self::Deb),
            "centos" | "redhat" => Ok(Self::Rpm),
            _ => bail!("unsupported platform for packaging: {}", tag),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Deb => "deb",
            Self::Rpm => "rpm",
        }
    }

    fn fpm_target(self) -> &'static str {
        self.extension()
    }

    fn init_script_flag(self) -> &'static str {
        match self {
            Self::Deb => "--deb-init",
            Self::Rpm => "--rpm-init",
        }
    }
}

/// Description of one package build.
#[derive(Debug)]
pub struct PackageSpec<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub arch: &'a str,
    pub kind: PackageKind,
    pub staging: &'a Path,
    /// Recommended runtime dependencies; only applied to Debian packages.
    pub depends: &'a [String],
    pub init_script: Option<&'a Path>,
}

/// Deterministic package filename: `{name}_{version}_{arch}.{ext}`.
pub fn package_filename(spec: &PackageSpec<'_>) -> String {
    format!(
        "{}_{}_{}.{}",
        spec.name,
        spec.version,
        spec.arch,
        spec.kind.extension()
    )
}

/// Build the package from the staging tree.
///
/// Returns the path of the produced package file in `output_dir`.
pub fn build_package(
    runner: &dyn ToolRunner,
    spec: &PackageSpec<'_>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let filename = package_filename(spec);
    let package_path = output_dir.join(&filename);

    let mut cmd = Cmd::new("fpm")
        .args(["-s", "dir", "-t", spec.kind.fpm_target()])
        .args(["-n", spec.name])
        .args(["-v", spec.version])
        .args(["-a", spec.arch])
        .arg("-p")
        .arg_path(&package_path)
        .arg("-C")
        .arg_path(spec.staging);

    if spec.kind == PackageKind::Deb {
        for dep in spec.depends {
            cmd = cmd.arg("-d").arg(dep.as_str());
        }
    }
    if let Some(script) = spec.init_script {
        cmd = cmd.arg(spec.kind.init_script_flag()).arg_path(script);
    }
    cmd = cmd
        .arg(".")
        .error_msg(format!("fpm failed to build {}", filename));

    runner
        .run(&cmd)
        .with_context(|| format!("packaging '{}'", filename))?;
    Ok(package_path)
}
