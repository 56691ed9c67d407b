//! Staged installation.
//!
//! Installs build outputs into the staging tree that packaging consumes.
//! The install command runs with `DESTDIR` pointing at the staging tree,
//! the conventional seam for `make install`-style tools.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::config::PipelineConfig;
use crate::process::{Cmd, ToolRunner};

/// Install the build into the staging tree.
pub fn stage_install(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    src_dir: &Path,
    staging: &Path,
) -> Result<()> {
    fs::create_dir_all(staging)
        .with_context(|| format!("creating staging directory '{}'", staging.display()))?;

    let destdir = staging.to_string_lossy();
    let cmd = Cmd::new(&config.install_command)
        .args(config.install_args.iter().map(String::as_str))
        .env("DESTDIR", destdir.as_ref())
        .current_dir(src_dir)
        .error_msg(format!(
            "{} {} failed in '{}'",
            config.install_command,
            config.install_args.join(" "),
            src_dir.display()
        ));
    runner
        .run(&cmd)
        .with_context(|| format!("staging install into '{}'", staging.display()))?;
    Ok(())
}

/// Copy a directory tree into `dest`, preserving layout and symlinks.
///
/// Used for auxiliary payloads that the install command does not cover.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry =
            entry.with_context(|| format!("walking source tree '{}'", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("relativizing '{}'", entry.path().display()))?;
        let target = dest.join(rel);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("creating '{}'", target.display()))?;
        } else if file_type.is_symlink() {
            let link_target = fs::read_link(entry.path())
                .with_context(|| format!("reading symlink '{}'", entry.path().display()))?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            std::os::unix::fs::symlink(&link_target, &target)
                .with_context(|| format!("creating symlink '{}'", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "copying '{}' to '{}'",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}
