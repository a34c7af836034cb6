use std::{process, sync::Arc};

use clap::Parser;
use log::{error, info};

use diary::{
    App, Cli, Config, Diary, FileStore, LocalIdentityProvider, LogSink, Result, SharedDisplayMode,
};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    info!("Using data directory {}", config.data_dir.display());

    let storage = Arc::new(FileStore::new(config.data_dir.clone()));
    let diagnostics = Arc::new(LogSink);
    let provider = Arc::new(LocalIdentityProvider::new(
        storage.clone(),
        diagnostics.clone(),
    ));
    let display = SharedDisplayMode::new();

    let diary = Diary::open(storage, provider, Arc::new(display.clone()), diagnostics);

    let mut app = App::new(diary, display, config, cli.verbose);
    let result = app.run(cli.command);
    app.into_diary().close();
    result
}

fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");

    if let Err(e) = run(cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    info!("Application shutting down");
}
