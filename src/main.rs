use app::App;
use clap::Parser;
use config::Config;
use error::Error;
use library::logger::impl_console::{self, LoggerConsole};
use library::logger::interface::Logger;
use shutdown::{install_signal_handler, Shutdown};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod app;
mod cadence;
mod config;
mod control_surface;
mod downstream_action;
mod error;
mod frame_buffer;
mod frame_source;
mod frame_subscriber;
mod image_classifier;
mod inference_scheduler;
mod library;
mod result_store;
mod shutdown;

/// Scores frames from a live image stream and acts on detections.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of the config file.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        match config.log_level() {
            Ok(level) => level,
            Err(err) => {
                eprintln!("{}", err);
                return ExitCode::FAILURE;
            }
        }
    };
    let timezone = match config.log_timezone() {
        Ok(timezone) => timezone,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    impl_console::init(level, timezone);

    let logger: Arc<dyn Logger + Send + Sync> = Arc::new(LoggerConsole::new());

    match run(config, logger.clone()) {
        Ok(()) => {
            logger.info("Shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(err) => {
            logger.error(&format!("Exiting after fatal error: {}", err));
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config, Error> {
    match &args.config {
        Some(path) => Config::load(path),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn run(config: Config, logger: Arc<dyn Logger + Send + Sync>) -> Result<(), Error> {
    let shutdown = Shutdown::new();
    install_signal_handler(shutdown.clone(), logger.clone())?;

    logger.info(&format!(
        "Starting: frames from {:?}, control surface on {}",
        config.subscriber.source, config.control.listen
    ));

    App::new(config, logger, shutdown)?.run()
}
