//! Pipeline run configuration.
//!
//! Loaded from a TOML file (`pkgpipe.toml` by default). Only the package
//! name and nominal version are required; everything else has a default
//! matching a conventional `make` / `make install` project.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Package name.
    pub name: String,
    /// Nominal version; may get a `-g<short-hash>` suffix at run time.
    pub version: String,
    /// Suffix the version with the working copy's short commit hash.
    #[serde(default)]
    pub append_git_hash: bool,
    /// Build tool invoked in the working copy.
    #[serde(default = "default_build_command")]
    pub build_command: String,
    #[serde(default)]
    pub build_args: Vec<String>,
    /// Install command, run with DESTDIR pointing at the staging tree.
    #[serde(default = "default_build_command")]
    pub install_command: String,
    #[serde(default = "default_install_args")]
    pub install_args: Vec<String>,
    /// Built language-runtime archive, relative to the working copy; copied
    /// to the output directory after a successful build.
    pub runtime_archive: Option<PathBuf>,
    /// Init script shipped in Debian packages.
    pub deb_init_script: Option<PathBuf>,
    /// Init script shipped in RPM packages.
    pub rpm_init_script: Option<PathBuf>,
    /// Recommended runtime dependencies for Debian packages.
    #[serde(default = "default_deb_depends")]
    pub deb_depends: Vec<String>,
    /// Base URL packages are published under; publishing is skipped when
    /// unset.
    pub publish_base_url: Option<String>,
    /// Working directory override.
    pub workdir: Option<PathBuf>,
}

fn default_build_command() -> String {
    "make".to_string()
}

fn default_install_args() -> Vec<String> {
    vec!["install".to_string()]
}

fn default_deb_depends() -> Vec<String> {
    vec!["libcurl3".to_string(), "default-jre-headless".to_string()]
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config '{}'", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("parsing pipeline config '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_applies_defaults() {
        let config: PipelineConfig =
            toml::from_str("name = \"myapp\"\nversion = \"1.4.2\"\n").unwrap();
        assert_eq!(config.name, "myapp");
        assert_eq!(config.version, "1.4.2");
        assert!(!config.append_git_hash);
        assert_eq!(config.build_command, "make");
        assert_eq!(config.install_command, "make");
        assert_eq!(config.install_args, vec!["install".to_string()]);
        assert_eq!(
            config.deb_depends,
            vec!["libcurl3".to_string(), "default-jre-headless".to_string()]
        );
        assert!(config.publish_base_url.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config: PipelineConfig = toml::from_str(
            r#"
            name = "myapp"
            version = "1.4.2"
            append_git_hash = true
            build_command = "rake"
            build_args = ["compile"]
            install_command = "rake"
            install_args = ["install"]
            runtime_archive = "dist/runtime.tar.gz"
            deb_init_script = "pkg/debian/init"
            rpm_init_script = "pkg/redhat/init"
            deb_depends = ["libcurl3"]
            publish_base_url = "https://artifacts.example.org/packages"
            workdir = "/tmp/pkgpipe-work"
            "#,
        )
        .unwrap();
        assert!(config.append_git_hash);
        assert_eq!(config.build_command, "rake");
        assert_eq!(
            config.runtime_archive.as_deref(),
            Some(Path::new("dist/runtime.tar.gz"))
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: std::result::Result<PipelineConfig, _> =
            toml::from_str("name = \"x\"\nversion = \"1\"\nbogus = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let result: std::result::Result<PipelineConfig, _> = toml::from_str("name = \"x\"\n");
        assert!(result.is_err());
    }
}
