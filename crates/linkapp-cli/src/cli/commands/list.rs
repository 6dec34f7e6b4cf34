use super::load_config;
use crate::cli::args::{ListArgs, OutputFormat, PathArgs};
use crate::exit_codes::EXIT_SUCCESS;
use linkapp_core::discover;
use std::path::Path;

pub fn run(args: ListArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let paths = PathArgs {
        source_dir: args.source_dir,
        ..PathArgs::default()
    };
    let config = load_config(config, paths)?;
    let entries = discover(&config.source_dir)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                eprintln!("No applications in {}", config.source_dir.display());
            }
            for e in &entries {
                println!("{:>3}  {:<24} {}", e.index, e.name, e.source_path.display());
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
