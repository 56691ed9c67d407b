//! Build-and-packaging pipeline driver.
//!
//! Given a repository locator, pkgpipe clones the project, builds it from
//! source, stages an installation tree, produces a platform-native package
//! (deb or rpm), and optionally publishes it over HTTP.
//!
//! The moving parts:
//!
//! - **Platform identification** ([`platform`]) - classifies the host into
//!   a normalized `family/version` tag by probing system files in a fixed
//!   order; the tag selects the packaging strategy and init-script flavor.
//! - **Locator splitting** ([`locator`]) - splits a repository locator into
//!   resource/query/fragment parts and derives a checkout reference from
//!   the query.
//! - **Pipeline orchestration** ([`pipeline`]) - a strict
//!   checkout, build, stage, package, publish sequence of external-tool
//!   invocations, gated by the two routines above.
//!
//! Everything that touches a host tool goes through
//! [`process::ToolRunner`], so stage logic is testable without spawning
//! processes.
//!
//! # Example
//!
//! ```rust,ignore
//! use pkgpipe::pipeline::{config::PipelineConfig, run_pipeline};
//! use pkgpipe::process::HostRunner;
//!
//! let config = PipelineConfig::load("pkgpipe.toml".as_ref())?;
//! run_pipeline(&HostRunner, &config, "https://host/repo.git?ref=prod7")?;
//! ```

pub mod host;
pub mod locator;
pub mod manifest;
pub mod pipeline;
pub mod platform;
pub mod preflight;
pub mod process;

pub use locator::{split_locator, LocatorParts};
pub use pipeline::config::PipelineConfig;
pub use pipeline::run_pipeline;
pub use platform::{detect_platform, identify_host, PlatformProbe, PlatformTag};
pub use process::{Cmd, HostRunner, ToolRunner};
