use crate::prelude::*;
use crate::lsw3::registers::RegisterBlock;
use crate::lsw3::transport::TcpTransport;
use crate::snapshot_writer::SnapshotWriter;
use crate::summary::Summary;

use chrono::{DateTime, Local};
use std::sync::Mutex;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

/// Forwards poll progress to the log.
pub struct LogObserver;
impl PollObserver for LogObserver {
    fn block_started(&self, serial: Serial, block: &RegisterBlock) {
        debug!("logger {}: reading {} ({})", serial, block.name, block.range);
    }

    fn block_completed(&self, serial: Serial, block: &RegisterBlock, readings: &Snapshot) {
        debug!("logger {}: {} decoded {} readings", serial, block.name, readings.len());
    }

    fn block_failed(&self, serial: Serial, block: &RegisterBlock, error: &PollError) {
        warn!("logger {}: {} failed: {}", serial, block.name, error);
    }
}

struct Poller {
    coordinator: Coordinator<TcpTransport>,
    writer: Option<SnapshotWriter>,
    last_success: Mutex<Option<DateTime<Local>>>,
}

impl Poller {
    fn new(inverter: &config::Inverter, snapshot_file: Option<&str>) -> Result<Self> {
        let writer = match snapshot_file {
            Some(template) => {
                let path = Self::snapshot_path(template, inverter.serial());
                Some(SnapshotWriter::new(&path)?)
            }
            None => None,
        };

        Ok(Self {
            coordinator: inverter.coordinator()?,
            writer,
            last_success: Mutex::new(None),
        })
    }

    fn snapshot_path(template: &str, serial: Serial) -> String {
        template.replace("{serial}", &serial.to_string())
    }

    async fn poll(&self) -> bool {
        let serial = self.coordinator.serial();
        let transport = self.coordinator.transport();
        info!(
            "logger {}: polling {}:{} (timeout {}s)",
            serial,
            transport.host(),
            transport.port(),
            transport.timeout().as_secs()
        );

        match self.coordinator.poll_all_with(&LogObserver).await {
            Ok(snapshot) => {
                info!("logger {}: {} readings", serial, snapshot.len());
                Summary::new(serial, &snapshot).log();

                if let Some(writer) = &self.writer {
                    match writer.write(serial, &snapshot) {
                        Ok(()) => debug!(
                            "logger {}: {} snapshots exported",
                            serial,
                            writer.snapshots_written()
                        ),
                        Err(e) => error!("logger {}: failed to export snapshot: {}", serial, e),
                    }
                }

                if let Ok(mut last) = self.last_success.lock() {
                    *last = Some(Local::now());
                }
                true
            }
            Err(e) => {
                let last = self.last_success.lock().ok().and_then(|l| *l);
                match last {
                    Some(at) => error!(
                        "logger {}: poll failed, data stale since {}: {}",
                        serial,
                        at.format("%Y-%m-%dT%H:%M:%S"),
                        e
                    ),
                    None => error!("logger {}: poll failed, data unavailable: {}", serial, e),
                }
                if e.is_transport() {
                    info!("logger {}: retrying on next poll", serial);
                }
                false
            }
        }
    }
}

pub struct Scheduler {
    config: Config,
    pollers: Vec<Poller>,
}

impl Scheduler {
    pub fn new(config: Config) -> Result<Self> {
        let pollers = config
            .enabled_inverters()
            .iter()
            .map(|inverter| Poller::new(inverter, config.snapshot_file()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { config, pollers })
    }

    /// Poll every inverter once, one after the other. Returns the number of
    /// inverters whose poll failed.
    pub async fn poll_once(&self) -> usize {
        let mut failures = 0;
        for poller in &self.pollers {
            if !poller.poll().await {
                failures += 1;
            }
        }
        failures
    }

    pub async fn start(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut interval = tokio::time::interval(self.config.scan_interval());
        // a slow cycle pushes the next one back rather than bunching polls up
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Polling {} inverter(s) every {}s",
            self.pollers.len(),
            self.config.scan_interval().as_secs()
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    info!("Scheduler received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    self.poll_once().await;
                }
            }
        }

        Ok(())
    }
}
