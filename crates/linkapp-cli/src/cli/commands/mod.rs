use super::args::PathArgs;
use anyhow::Context;
use linkapp_core::{Config, PathOverrides};
use std::path::Path;

mod dispatch;
pub mod generate;
pub mod list;
pub mod map;
pub mod run;

pub use dispatch::dispatch;

/// Config file values with this invocation's path overrides applied.
pub(crate) fn load_config(config: Option<&Path>, paths: PathArgs) -> anyhow::Result<Config> {
    let base = Config::load(config).context("failed to load configuration")?;
    Ok(base.with_overrides(PathOverrides::from(paths)))
}
