//! Host platform identification.
//!
//! Classifies the host into a normalized `family/version` tag by probing a
//! fixed sequence of information sources: the structured os-release file,
//! the legacy Red-Hat-style release file, then the macOS `sw_vers` command.
//! The first source that produces a tag wins; sources are never merged.
//!
//! Each probe reports one of three outcomes: a tag, "not applicable here,
//! try the next source", or a hard error. Note the deliberate asymmetry: a
//! present-but-malformed `/etc/redhat-release` is a hard error rather than a
//! cue to keep probing, because the file's presence is itself a strong
//! platform signal.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::process::{command_exists, Cmd, ToolRunner};

/// Normalized host platform tag, rendered as `family/version`.
///
/// Consumed by packaging-strategy and init-script selection; computed once
/// per run and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTag {
    pub family: String,
    pub version: String,
}

impl PlatformTag {
    /// Build a tag from raw host-reported strings.
    ///
    /// Both fields are lowercased. Version precision is deliberately
    /// reduced: redhat/centos/debian/ubuntu keep only the major component,
    /// macosx keeps major.minor, everything else passes through unchanged.
    pub fn new(family: &str, version: &str) -> Self {
        let mut family = family.to_lowercase();
        if family == "mac os x" {
            // Raw sw_vers product name; same family as the MacOSX token.
            family = "macosx".to_string();
        }
        let raw = version.to_lowercase();
        let version = match family.as_str() {
            "redhat" | "centos" | "debian" | "ubuntu" => match raw.split_once('.') {
                Some((major, _)) => major.to_string(),
                None => raw,
            },
            "macosx" => match raw.rfind('.') {
                Some(idx) => raw[..idx].to_string(),
                None => raw,
            },
            _ => raw,
        };
        Self { family, version }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family, self.version)
    }
}

/// One platform information source.
///
/// `Ok(Some(tag))` means the source succeeded; `Ok(None)` means the source
/// is not present on this host and the next one should be tried; `Err`
/// means the source was present but violated an assumed invariant, which
/// aborts identification entirely.
pub trait PlatformProbe {
    fn name(&self) -> &str;
    fn probe(&self) -> Result<Option<PlatformTag>>;
}

/// Structured key=value release file, `/etc/os-release` on modern hosts.
pub struct OsReleaseProbe {
    path: PathBuf,
}

impl OsReleaseProbe {
    pub fn new() -> Self {
        Self::at("/etc/os-release")
    }

    /// Probe an explicit path instead of the host default.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for OsReleaseProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProbe for OsReleaseProbe {
    fn name(&self) -> &str {
        "os-release"
    }

    fn probe(&self) -> Result<Option<PlatformTag>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("reading release file '{}'", self.path.display()))?;
        let (id, version_id) = parse_os_release(&contents)
            .with_context(|| format!("parsing release file '{}'", self.path.display()))?;
        Ok(Some(PlatformTag::new(&id, &version_id)))
    }
}

fn parse_os_release(contents: &str) -> Result<(String, String)> {
    let mut id = None;
    let mut version_id = None;
    for line in contents.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(unquote(value));
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            version_id = Some(unquote(value));
        }
    }
    match (id, version_id) {
        (Some(id), Some(version_id)) => Ok((id, version_id)),
        _ => bail!("missing ID or VERSION_ID field"),
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches('"').to_string()
}

/// Legacy single-line release file, `/etc/redhat-release`.
///
/// Presence of this file signals a Red-Hat-family host, so a line that does
/// not match `<name> release <version> (<remark>)` is a hard error, not a
/// reason to fall through to the next source.
pub struct RedhatReleaseProbe {
    path: PathBuf,
}

impl RedhatReleaseProbe {
    pub fn new() -> Self {
        Self::at("/etc/redhat-release")
    }

    /// Probe an explicit path instead of the host default.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for RedhatReleaseProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProbe for RedhatReleaseProbe {
    fn name(&self) -> &str {
        "redhat-release"
    }

    fn probe(&self) -> Result<Option<PlatformTag>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("reading release file '{}'", self.path.display()))?;
        let (name, version) = parse_redhat_release(contents.trim())
            .with_context(|| format!("malformed release file '{}'", self.path.display()))?;
        Ok(Some(PlatformTag::new(&name, &version)))
    }
}

/// Parse a `<name> release <version> (<remark>)` line.
///
/// The remark is ignored. A name beginning with `"Red Hat "` normalizes to
/// the family token `RedHat`; any other name passes through verbatim.
fn parse_redhat_release(line: &str) -> Result<(String, String)> {
    let pattern = Regex::new(r"^(.+?)\s+release\s+(\S+)\s+\((.*)\)$")
        .context("compiling release-line pattern")?;
    let captures = pattern.captures(line).with_context(|| {
        format!(
            "expected '<name> release <version> (<remark>)', got '{}'",
            line
        )
    })?;
    let name = captures[1].trim();
    let version = captures[2].to_string();
    let family = if name.starts_with("Red Hat ") {
        "RedHat".to_string()
    } else {
        name.to_string()
    };
    Ok((family, version))
}

/// macOS version-reporting command.
///
/// Only ever applicable where `sw_vers` exists on PATH; a product name other
/// than the literal `"Mac OS X"` indicates an unsupported configuration and
/// is a hard error, not a different platform to probe next.
pub struct SwVersProbe<'a> {
    runner: &'a dyn ToolRunner,
    available: bool,
}

impl<'a> SwVersProbe<'a> {
    pub fn new(runner: &'a dyn ToolRunner) -> Self {
        Self {
            runner,
            available: command_exists("sw_vers"),
        }
    }

    #[cfg(test)]
    fn with_availability(runner: &'a dyn ToolRunner, available: bool) -> Self {
        Self { runner, available }
    }
}

impl PlatformProbe for SwVersProbe<'_> {
    fn name(&self) -> &str {
        "sw_vers"
    }

    fn probe(&self) -> Result<Option<PlatformTag>> {
        if !self.available {
            return Ok(None);
        }
        let product_name = self
            .runner
            .run(&Cmd::new("sw_vers").arg("-productName"))?
            .stdout
            .trim()
            .to_string();
        if product_name != "Mac OS X" {
            bail!(
                "unknown platform: sw_vers reported product name '{}'",
                product_name
            );
        }
        let product_version = self
            .runner
            .run(&Cmd::new("sw_vers").arg("-productVersion"))?
            .stdout
            .trim()
            .to_string();
        Ok(Some(PlatformTag::new("MacOSX", &product_version)))
    }
}

/// Try probes in order; first tag wins.
///
/// All probes reporting "not applicable" is fatal: packaging strategy cannot
/// be chosen without a platform tag.
pub fn detect_platform(probes: &[&dyn PlatformProbe]) -> Result<PlatformTag> {
    for probe in probes {
        if let Some(tag) = probe
            .probe()
            .with_context(|| format!("identifying host platform via {}", probe.name()))?
        {
            return Ok(tag);
        }
    }
    bail!("unable to identify host platform: no identification source succeeded");
}

/// Identify the host using the default probe sequence.
pub fn identify_host(runner: &dyn ToolRunner) -> Result<PlatformTag> {
    let os_release = OsReleaseProbe::new();
    let redhat_release = RedhatReleaseProbe::new();
    let sw_vers = SwVersProbe::new(runner);
    detect_platform(&[&os_release, &redhat_release, &sw_vers])
}
