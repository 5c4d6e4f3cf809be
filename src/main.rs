use clap::Parser;
use scgtree::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{filter, tree, validate},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Tree(_) => "tree",
        Command::Filter(_) => "filter",
        Command::Validate(_) => "validate",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Tree(args) => tree::tree(args)?,
        Command::Filter(args) => filter::filter(args)?,
        Command::Validate(args) => validate::validate(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
