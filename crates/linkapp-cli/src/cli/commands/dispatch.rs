use super::super::args::*;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = cli.config.as_deref();
    match cli.cmd {
        Command::Generate(args) => super::generate::run(args, config),
        Command::List(args) => super::list::run(args, config),
        Command::Map(args) => super::map::run(args, config),
        Command::Run(args) => super::run::run(args, config),
    }
}
