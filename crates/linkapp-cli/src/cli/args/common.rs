//! Shared argument types used across multiple commands.

use clap::ValueEnum;
use linkapp_core::PathOverrides;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// The generator's three path settings.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Application source directory
    #[arg(long, env = "LINKAPP_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Directory holding the compiled application binaries
    #[arg(long, env = "LINKAPP_BINARY_DIR")]
    pub binary_dir: Option<PathBuf>,

    /// Generated assembly file
    #[arg(long, short, env = "LINKAPP_OUTPUT")]
    pub output: Option<PathBuf>,
}

impl From<PathArgs> for PathOverrides {
    fn from(a: PathArgs) -> Self {
        Self {
            source_dir: a.source_dir,
            binary_dir: a.binary_dir,
            output: a.output,
        }
    }
}

/// Parse `0x`-prefixed hex or decimal.
pub fn parse_address(s: &str) -> Result<u64, String> {
    let s = s.trim().replace('_', "");
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}
