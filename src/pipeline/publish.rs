//! Artifact publication.
//!
//! Writes a sha256 sidecar next to the package and uploads the package
//! bytes with an HTTP PUT to `{base}/{platform-tag}/{filename}`.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::PlatformTag;

/// Hex sha256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)
        .with_context(|| format!("hashing '{}'", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write `<package>.sha256` next to the package.
///
/// Content uses the sha256sum format "<hash>  <filename>" (two spaces,
/// filename only) so users can verify with `sha256sum -c` in the output
/// directory.
pub fn write_checksum(package: &Path) -> Result<PathBuf> {
    let hash = sha256_file(package)?;
    let filename = package_filename(package)?;
    let checksum_path = package.with_file_name(format!("{}.sha256", filename));
    fs::write(&checksum_path, format!("{}  {}\n", hash, filename))
        .with_context(|| format!("writing checksum '{}'", checksum_path.display()))?;
    Ok(checksum_path)
}

/// URL a package is published under.
pub fn publish_url(base_url: &str, tag: &PlatformTag, filename: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), tag, filename)
}

/// Upload the package via HTTP PUT.
///
/// Prints and returns the published URL on success.
pub fn publish_package(base_url: &str, tag: &PlatformTag, package: &Path) -> Result<String> {
    let filename = package_filename(package)?;
    let url = publish_url(base_url, tag, &filename);
    let bytes =
        fs::read(package).with_context(|| format!("reading package '{}'", package.display()))?;

    let client = reqwest::blocking::Client::new();
    let response = client
        .put(&url)
        .body(bytes)
        .send()
        .with_context(|| format!("uploading '{}' to '{}'", filename, url))?;
    if !response.status().is_success() {
        bail!("upload of '{}' failed with {}: {}", filename, response.status(), url);
    }

    println!("{}", url);
    Ok(url)
}

fn package_filename(package: &Path) -> Result<String> {
    Ok(package
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("package path '{}' has no filename", package.display()))?
        .to_string())
}
