pub mod config;
pub mod coordinator;
pub mod error;
pub mod lsw3;
pub mod options;
pub mod prelude;
pub mod scheduler;
pub mod snapshot;
pub mod snapshot_writer;
pub mod summary;
pub mod utils;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;
use crate::scheduler::Scheduler;

use std::io::Write;
use std::time::Duration;
use tokio::sync::broadcast;

fn init_logging(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    let result = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init();

    if let Err(e) = result {
        eprintln!("Failed to initialise logging: {}", e);
    }
}

/// Load the configuration, then either poll once or keep polling until
/// `shutdown_rx` fires.
pub async fn app(shutdown_rx: broadcast::Receiver<()>, options: Options) -> Result<()> {
    let config = Config::new(options.config_file.clone())?;

    init_logging(config.loglevel());
    info!(
        "lsw3-bridge {} starting with config file: {}",
        CARGO_PKG_VERSION, options.config_file
    );
    config.describe();

    let scheduler = Scheduler::new(config)?;

    if options.once {
        let failures = scheduler.poll_once().await;
        if failures > 0 {
            bail!("{} inverter poll(s) failed", failures);
        }
        return Ok(());
    }

    scheduler.start(shutdown_rx).await?;

    info!("Application shutdown complete");
    Ok(())
}

pub async fn run(options: Options) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Set up signal handlers for graceful shutdown
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
        }
        let _ = shutdown_tx_clone.send(());
    });

    if let Some(runtime) = options.runtime {
        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(runtime)).await;
            info!("Runtime limit of {}s reached", runtime);
            let _ = shutdown_tx_clone.send(());
        });
    }

    app(shutdown_rx, options).await
}
