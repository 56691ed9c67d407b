//! Build stage.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::config::PipelineConfig;
use crate::process::{Cmd, ToolRunner};

/// Run the build tool in the working copy.
///
/// The job count is a sizing hint handed to the build tool; parallelism is
/// owned there, not in this pipeline.
pub fn build_tree(
    runner: &dyn ToolRunner,
    config: &PipelineConfig,
    src_dir: &Path,
    jobs: u32,
) -> Result<()> {
    let cmd = Cmd::new(&config.build_command)
        .args(config.build_args.iter().map(String::as_str))
        .arg("-j")
        .arg(jobs.to_string())
        .current_dir(src_dir)
        .error_msg(format!(
            "{} failed in '{}'",
            config.build_command,
            src_dir.display()
        ));
    runner
        .run(&cmd)
        .with_context(|| format!("building '{}'", src_dir.display()))?;
    Ok(())
}

/// Copy the built language-runtime archive into the output directory.
///
/// Returns the destination path, or `None` when the config names no
/// archive.
pub fn collect_runtime_archive(
    config: &PipelineConfig,
    src_dir: &Path,
    output_dir: &Path,
) -> Result<Option<PathBuf>> {
    let Some(rel) = &config.runtime_archive else {
        return Ok(None);
    };
    let src = src_dir.join(rel);
    let file_name = src
        .file_name()
        .with_context(|| format!("runtime archive path '{}' has no filename", src.display()))?
        .to_os_string();
    let dest = output_dir.join(file_name);
    fs::copy(&src, &dest).with_context(|| {
        format!(
            "copying runtime archive '{}' to '{}'",
            src.display(),
            dest.display()
        )
    })?;
    Ok(Some(dest))
}
