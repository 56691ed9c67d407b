//! Source checkout.
//!
//! Clones the locator's resource and switches to the requested reference.
//! Idempotent by design: an existing working copy is reused as-is so a
//! failed run can be retried without re-cloning.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::locator::LocatorParts;
use crate::process::{Cmd, ToolRunner};

/// Reject locators that carry a fragment.
///
/// The fragment position is reserved; checkout references travel in the
/// query. Rejection happens before anything touches the network.
pub fn ensure_no_fragment(parts: &LocatorParts) -> Result<()> {
    if !parts.fragment.is_empty() {
        bail!(
            "locator fragment '#{}' is not supported; pass the checkout reference in the query instead, e.g. '{}?ref={}'",
            parts.fragment,
            parts.resource,
            parts.fragment
        );
    }
    Ok(())
}

/// Clone into `dest` (unless it already exists) and switch to the locator's
/// checkout reference, if one was given.
pub fn checkout_source(runner: &dyn ToolRunner, parts: &LocatorParts, dest: &Path) -> Result<()> {
    ensure_no_fragment(parts)?;

    if dest.is_dir() {
        println!("  working copy exists, skipping clone: {}", dest.display());
    } else {
        runner
            .run(
                &Cmd::new("git")
                    .arg("clone")
                    .arg(parts.resource.as_str())
                    .arg_path(dest)
                    .error_msg(format!("git clone of '{}' failed", parts.resource)),
            )
            .with_context(|| format!("cloning '{}'", parts.resource))?;
    }

    let reference = parts.checkout_ref();
    if !reference.is_empty() {
        runner
            .run(
                &Cmd::new("git")
                    .args(["checkout", reference])
                    .current_dir(dest)
                    .error_msg(format!("git checkout of '{}' failed", reference)),
            )
            .with_context(|| format!("switching working copy to '{}'", reference))?;
    }

    Ok(())
}

/// Short commit hash of the working copy, if it has git metadata.
///
/// Absence of metadata is not an error; the caller falls back to the
/// nominal version.
pub fn short_commit_hash(runner: &dyn ToolRunner, dest: &Path) -> Option<String> {
    let cmd = Cmd::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .current_dir(dest);
    match runner.run(&cmd) {
        Ok(output) => {
            let hash = output.stdout.trim().to_string();
            if hash.is_empty() {
                None
            } else {
                Some(hash)
            }
        }
        Err(_) => None,
    }
}
