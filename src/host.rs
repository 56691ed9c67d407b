//! Host capacity and architecture detection.

use anyhow::Result;

use crate::process::{Cmd, ToolRunner};

/// Number of CPU cores on the host.
///
/// Tries `nproc`, then the BSD-style `sysctl -n hw.ncpu`. If neither yields
/// a usable count, returns 1 with a warning rather than failing: a wrong
/// core count only degrades build parallelism.
pub fn detect_cores(runner: &dyn ToolRunner) -> u32 {
    let candidates = [
        Cmd::new("nproc"),
        Cmd::new("sysctl").args(["-n", "hw.ncpu"]),
    ];
    for cmd in candidates {
        if let Ok(output) = runner.run(&cmd) {
            if let Ok(count) = output.stdout.trim().parse::<u32>() {
                if count > 0 {
                    return count;
                }
            }
        }
    }
    eprintln!("warning: could not detect core count via nproc or sysctl, assuming 1");
    1
}

/// Host machine architecture as reported by `uname -m`, lowercased.
pub fn detect_arch(runner: &dyn ToolRunner) -> Result<String> {
    let output = runner.run(
        &Cmd::new("uname")
            .arg("-m")
            .error_msg("uname -m failed; cannot determine package architecture"),
    )?;
    Ok(output.stdout.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::test_support::ScriptedRunner;

    #[test]
    fn test_detect_cores_prefers_nproc() {
        let runner = ScriptedRunner::new()
            .on("nproc", Ok("16\n"))
            .on("sysctl", Ok("4\n"));
        assert_eq!(detect_cores(&runner), 16);
        assert!(!runner.invoked("sysctl"));
    }

    #[test]
    fn test_detect_cores_falls_back_to_sysctl() {
        let runner = ScriptedRunner::new()
            .on("nproc", Err("nproc: command not found"))
            .on("sysctl -n hw.ncpu", Ok("8\n"));
        assert_eq!(detect_cores(&runner), 8);
    }

    #[test]
    fn test_detect_cores_defaults_to_one_when_both_fail() {
        let runner = ScriptedRunner::new()
            .on("nproc", Err("unavailable"))
            .on("sysctl", Err("unavailable"));
        assert_eq!(detect_cores(&runner), 1);
    }

    #[test]
    fn test_detect_arch_lowercases_uname_output() {
        let runner = ScriptedRunner::new().on("uname -m", Ok("X86_64\n"));
        assert_eq!(detect_arch(&runner).unwrap(), "x86_64");
    }
}
