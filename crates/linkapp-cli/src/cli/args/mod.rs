use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod common;
pub use common::*;


#[derive(Parser)]
#[command(
    name = "linkapp",
    version,
    about = "Bundle user applications into a linkable kernel data section"
)]
pub struct Cli {
    /// Config file (default: ./linkapp.yaml when present)
    #[arg(long, global = true, env = "LINKAPP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Discover applications and write the bundle assembly
    Generate(GenerateArgs),
    /// Show discovered applications in index order
    List(ListArgs),
    /// Link the bundle on the host and print the resolved layout
    Map(MapArgs),
    /// Generate, build and flatten the kernel, then boot it
    Run(RunArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub paths: PathArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ListArgs {
    /// Application source directory
    #[arg(long, env = "LINKAPP_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct MapArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Load address of the bundle (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0", value_parser = parse_address)]
    pub base: u64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Reuse the existing bundle instead of regenerating it
    #[arg(long)]
    pub skip_generate: bool,

    /// Stop after flattening the kernel image
    #[arg(long)]
    pub no_launch: bool,
}
