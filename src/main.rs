//! SimLink daemon
//!
//! Runs the three TCP channels against the headless mock host, for exercising
//! controllers and viewers without a game engine.

use clap::Parser;
use simlink::app::{SimLinkApp, install_signal_handler};
use simlink::config::AppConfig;
use simlink::devices::MockHost;
use simlink::error::Result;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML); built-in defaults if omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Override the command channel port
    #[arg(long)]
    command_port: Option<u16>,

    /// Override the frame stream port
    #[arg(long)]
    frame_port: Option<u16>,

    /// Override the status channel port
    #[arg(long)]
    status_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(port) = self.command_port {
            config.network.command_port = port;
        }
        if let Some(port) = self.frame_port {
            config.network.frame_port = port;
        }
        if let Some(port) = self.status_port {
            config.network.status_port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("SimLink v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        log::info!("Using config: {}", path);
    }

    let mut host = MockHost::new(config.simulation.start_height);
    let mut app = SimLinkApp::start(config)?;
    install_signal_handler(app.shutdown_signal())?;

    log::info!("Press Ctrl+C to stop");
    app.run(&mut host)?;

    log::info!("SimLink stopped");
    Ok(())
}
