//! Pipeline orchestration.
//!
//! A run is a strict sequence: checkout, build, staged install, package,
//! publish. Every stage is a blocking external-tool invocation; the first
//! failure aborts the run with no rollback, leaving the working tree in
//! place for inspection. Re-running is cheap because checkout reuses an
//! existing working copy.

pub mod build;
pub mod checkout;
pub mod config;
pub mod package;
pub mod publish;
pub mod stage;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::host;
use crate::locator::split_locator;
use crate::manifest::RunManifest;
use crate::platform::{identify_host, PlatformTag};
use crate::preflight;
use crate::process::ToolRunner;
use self::config::PipelineConfig;
use self::package::{PackageKind, PackageSpec};

/// Immutable context for one pipeline run.
///
/// Built once, after platform identification, and handed to every stage;
/// nothing mutates it afterwards.
#[derive(Debug)]
pub struct PipelineContext {
    pub name: String,
    pub version: String,
    pub platform: PlatformTag,
    pub arch: String,
    pub jobs: u32,
    pub source_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Resolved version string for the run.
///
/// With `append_git_hash` set and git metadata present in the working copy,
/// the nominal version gets a `-g<short-hash>` suffix; otherwise it is used
/// verbatim.
pub fn resolve_version(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    source_dir: &Path,
) -> String {
    if config.append_git_hash {
        if let Some(hash) = checkout::short_commit_hash(runner, source_dir) {
            return format!("{}-g{}", config.version, hash);
        }
    }
    config.version.clone()
}

/// Working directory root for a run.
fn workdir_root(config: &PipelineConfig) -> PathBuf {
    if let Some(dir) = &config.workdir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pkgpipe")
}

/// Drive a full run against the given locator.
pub fn run_pipeline(runner: &dyn ToolRunner, config: &PipelineConfig, locator: &str) -> Result<()> {
    let parts = split_locator(locator);
    checkout::ensure_no_fragment(&parts)?;

    let platform = identify_host(runner)?;
    println!("[platform] {}", platform);
    let kind = PackageKind::for_platform(&platform)?;
    preflight::check_host_tools(&config.build_command, kind == PackageKind::Rpm)?;

    let root = workdir_root(config);
    let source_dir = root.join("source");
    let staging_dir = root.join("staging");
    let output_dir = root.join("output");
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory '{}'", output_dir.display()))?;

    println!("[checkout] {}", parts.resource);
    checkout::checkout_source(runner, &parts, &source_dir)?;

    let context = PipelineContext {
        name: config.name.clone(),
        version: resolve_version(runner, config, &source_dir),
        arch: host::detect_arch(runner)?,
        jobs: host::detect_cores(runner) * 2,
        platform,
        source_dir,
        staging_dir,
        output_dir,
    };
    let mut manifest = RunManifest::started(&context.platform)?;

    println!("[build] {} -j {}", config.build_command, context.jobs);
    build::build_tree(runner, config, &context.source_dir, context.jobs)?;
    if let Some(archive) = build::collect_runtime_archive(config, &context.source_dir, &context.output_dir)? {
        println!("  runtime archive: {}", archive.display());
    }

    println!("[stage] {}", context.staging_dir.display());
    stage::stage_install(runner, config, &context.source_dir, &context.staging_dir)?;

    let init_script = match kind {
        PackageKind::Deb => config.deb_init_script.as_deref(),
        PackageKind::Rpm => config.rpm_init_script.as_deref(),
    };
    let spec = PackageSpec {
        name: &context.name,
        version: &context.version,
        arch: &context.arch,
        kind,
        staging: &context.staging_dir,
        depends: &config.deb_depends,
        init_script,
    };
    println!("[package] {}", package::package_filename(&spec));
    let package_path = package::build_package(runner, &spec, &context.output_dir)?;
    publish::write_checksum(&package_path)?;

    let mut published_url = None;
    if let Some(base_url) = &config.publish_base_url {
        println!("[publish] {}", base_url);
        published_url = Some(publish::publish_package(
            base_url,
            &context.platform,
            &package_path,
        )?);
    }

    manifest.finish(&package_path, published_url)?;
    manifest.save(&context.output_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{detect_platform, OsReleaseProbe, PlatformProbe};
    use crate::process::test_support::ScriptedRunner;
    use tempfile::TempDir;

    fn minimal_config() -> PipelineConfig {
        toml::from_str("name = \"myapp\"\nversion = \"1.4.2\"\n").unwrap()
    }

    #[test]
    fn test_resolve_version_appends_git_hash() {
        let runner = ScriptedRunner::new().on("rev-parse", Ok("a1b2c3d\n"));
        let mut config = minimal_config();
        config.append_git_hash = true;
        assert_eq!(
            resolve_version(&runner, &config, Path::new("/tmp/src")),
            "1.4.2-ga1b2c3d"
        );
    }

    #[test]
    fn test_resolve_version_verbatim_without_flag() {
        let runner = ScriptedRunner::new().on("rev-parse", Ok("a1b2c3d\n"));
        let config = minimal_config();
        assert_eq!(
            resolve_version(&runner, &config, Path::new("/tmp/src")),
            "1.4.2"
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_resolve_version_verbatim_without_git_metadata() {
        let runner = ScriptedRunner::new().on("rev-parse", Err("not a git repository"));
        let mut config = minimal_config();
        config.append_git_hash = true;
        assert_eq!(
            resolve_version(&runner, &config, Path::new("/tmp/src")),
            "1.4.2"
        );
    }

    #[test]
    fn test_workdir_root_honors_override() {
        let mut config = minimal_config();
        config.workdir = Some(PathBuf::from("/tmp/custom-work"));
        assert_eq!(workdir_root(&config), PathBuf::from("/tmp/custom-work"));
    }

    #[test]
    fn test_ubuntu_host_selects_debian_strategy_with_runtime_deps() {
        // End to end over the decision glue: structured release file with
        // ID=ubuntu / VERSION_ID=20.04 resolves to ubuntu/20, which selects
        // the Debian path carrying the recommended runtime dependency set.
        let temp = TempDir::new().unwrap();
        let os_release_path = temp.path().join("os-release");
        fs::write(&os_release_path, "ID=ubuntu\nVERSION_ID=\"20.04\"\n").unwrap();

        let os_release = OsReleaseProbe::at(&os_release_path);
        let probes: [&dyn PlatformProbe; 1] = [&os_release];
        let tag = detect_platform(&probes).unwrap();
        assert_eq!(tag.to_string(), "ubuntu/20");

        let kind = PackageKind::for_platform(&tag).unwrap();
        assert_eq!(kind, PackageKind::Deb);

        let config = minimal_config();
        assert!(config.deb_depends.contains(&"libcurl3".to_string()));
        assert!(config
            .deb_depends
            .contains(&"default-jre-headless".to_string()));
    }
}
