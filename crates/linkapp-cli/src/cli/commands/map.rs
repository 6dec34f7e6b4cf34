use super::load_config;
use crate::cli::args::{MapArgs, OutputFormat};
use crate::exit_codes::EXIT_SUCCESS;
use linkapp_core::bundle::verify_binaries;
use linkapp_core::{discover, Bundle, LinkMap};
use std::path::Path;

pub fn run(args: MapArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let config = load_config(config, args.paths)?;
    let entries = discover(&config.source_dir)?;
    let bundle = Bundle::build(&entries, &config.binary_dir, &config.symbols);
    verify_binaries(&bundle)?;
    let map = LinkMap::build(&bundle, args.base)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&map)?),
        OutputFormat::Text => print_text(&map, &bundle),
    }
    Ok(EXIT_SUCCESS)
}

fn print_text(map: &LinkMap, bundle: &Bundle) {
    println!("base {:#x}  size {}", map.base, map.total_size);
    println!("{:#018x}  {}", map.count_address, bundle.count_symbol);
    println!("{:#018x}  {}", map.names_address, bundle.names_symbol);
    for app in &map.apps {
        println!(
            "{:#018x}  [{}] {} ({} bytes, ends {:#x})",
            app.start, app.index, app.name, app.size, app.end
        );
    }
}
