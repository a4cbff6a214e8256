use clap::Parser;
use miette::Result;
use tailor::cli::{Cli, Commands};
use tailor::output::Printer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new().with_verbose(cli.verbose);

    match cli.command {
        Commands::Slice(args) => tailor::cli::slice::run(args, &printer)?,
        Commands::Tailor(args) => tailor::cli::tailor::run(args, &printer)?,
        Commands::Stitch(args) => tailor::cli::stitch::run(args, &printer)?,
        Commands::Run(args) => tailor::cli::run::run(args, &printer)?,
        Commands::Fix(args) => tailor::cli::fix::run(args, &printer)?,
        Commands::Init(args) => tailor::cli::init::run(args, &printer)?,
        Commands::Completions(args) => tailor::cli::completions::run(args)?,
    }

    Ok(())
}
