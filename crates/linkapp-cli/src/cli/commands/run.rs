use super::load_config;
use crate::cli::args::RunArgs;
use crate::exit_codes::EXIT_SUCCESS;
use linkapp_core::pipeline::{Pipeline, Plan, SystemRunner};
use std::path::Path;

pub fn run(args: RunArgs, config: Option<&Path>) -> anyhow::Result<i32> {
    let config = load_config(config, args.paths)?;
    let plan = Plan {
        generate: !args.skip_generate,
        launch: !args.no_launch,
    };
    Pipeline::new(&config).run(&mut SystemRunner, plan)?;
    Ok(EXIT_SUCCESS)
}
