use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use pkgpipe::pipeline::config::PipelineConfig;
use pkgpipe::pipeline::run_pipeline;
use pkgpipe::process::HostRunner;

const DEFAULT_CONFIG: &str = "pkgpipe.toml";

fn usage() -> &'static str {
    "Usage:\n  pkgpipe build <locator> [--config <path>] [--version <v>] [--publish <base-url>] [--append-git-hash] [--workdir <dir>]"
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.split_first() {
        Some((command, rest)) if command == "build" => run_build(rest),
        _ => bail!(usage()),
    }
}

fn run_build(args: &[String]) -> Result<()> {
    let Some((locator, flags)) = args.split_first() else {
        bail!(usage());
    };
    if locator.starts_with("--") {
        bail!(usage());
    }

    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut version = None;
    let mut publish_base_url = None;
    let mut workdir = None;
    let mut append_git_hash = false;

    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--config" => config_path = PathBuf::from(take_value(&mut iter, "--config")?),
            "--version" => version = Some(take_value(&mut iter, "--version")?),
            "--publish" => publish_base_url = Some(take_value(&mut iter, "--publish")?),
            "--workdir" => workdir = Some(PathBuf::from(take_value(&mut iter, "--workdir")?)),
            "--append-git-hash" => append_git_hash = true,
            other => bail!("unknown flag '{}'\n{}", other, usage()),
        }
    }

    let mut config = PipelineConfig::load(&config_path)
        .with_context(|| format!("loading pipeline config '{}'", config_path.display()))?;
    if let Some(version) = version {
        config.version = version;
    }
    if let Some(base_url) = publish_base_url {
        config.publish_base_url = Some(base_url);
    }
    if let Some(dir) = workdir {
        config.workdir = Some(dir);
    }
    if append_git_hash {
        config.append_git_hash = true;
    }

    run_pipeline(&HostRunner, &config, locator)
}

fn take_value(iter: &mut std::slice::Iter<'_, String>, flag: &str) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("flag '{}' requires a value", flag))
}
