use clap::Parser;
use log::LevelFilter;

mod app;
mod args;

fn main() {
    let cli = args::Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .expect("logger initializes once");

    if let Err(e) = app::run(cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}
