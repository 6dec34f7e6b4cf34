use super::load_config;
use crate::cli::args::GenerateArgs;
use crate::exit_codes::EXIT_SUCCESS;
use anyhow::Context;
use std::path::Path;

pub fn run(args: GenerateArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let config = load_config(config, args.paths)?;
    let entries = linkapp_core::generate(&config).with_context(|| {
        format!(
            "failed to generate bundle from {}",
            config.source_dir.display()
        )
    })?;
    eprintln!(
        "Wrote {} application(s) to {}",
        entries.len(),
        config.output.display()
    );
    Ok(EXIT_SUCCESS)
}
