//! Run manifests.
//!
//! Each run leaves a `run-manifest.json` in the output directory recording
//! what was built, for later inspection.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const RUN_MANIFEST_FILENAME: &str = "run-manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub status: String,
    pub created_at_utc: String,
    pub finished_at_utc: Option<String>,
    pub platform: String,
    pub package: Option<String>,
    pub published_url: Option<String>,
}

impl RunManifest {
    /// Start a manifest for a run on the identified platform.
    pub fn started(platform: &crate::platform::PlatformTag) -> Result<Self> {
        Ok(Self {
            status: "running".to_string(),
            created_at_utc: now_utc()?,
            finished_at_utc: None,
            platform: platform.to_string(),
            package: None,
            published_url: None,
        })
    }

    /// Mark the run successful.
    pub fn finish(&mut self, package: &Path, published_url: Option<String>) -> Result<()> {
        self.status = "success".to_string();
        self.finished_at_utc = Some(now_utc()?);
        self.package = package
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.published_url = published_url;
        Ok(())
    }

    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        let path = manifest_path(output_dir);
        let json = serde_json::to_string_pretty(self).context("serializing run manifest")?;
        fs::write(&path, json)
            .with_context(|| format!("writing run manifest '{}'", path.display()))?;
        Ok(path)
    }

    pub fn load(output_dir: &Path) -> Result<Self> {
        let path = manifest_path(output_dir);
        let bytes = fs::read(&path)
            .with_context(|| format!("reading run manifest '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing run manifest '{}'", path.display()))
    }
}

pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(RUN_MANIFEST_FILENAME)
}

fn now_utc() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("formatting UTC timestamp")
}
