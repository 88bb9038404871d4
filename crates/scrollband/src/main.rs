mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let paths = AppPaths::discover(cli.overrides.config.clone())?;
    let config = || run::resolve_config(&paths, &cli.overrides);

    match cli.command {
        None | Some(Command::Window) => run::run_window(config()?),
        Some(Command::Still(args)) => run::run_still(&config()?, &args),
        Some(Command::Sample(args)) => run::run_sample(&config()?, &args),
        Some(Command::Where) => {
            run::run_where(&paths);
            Ok(())
        }
    }
}
