use crate::prelude::*;

pub mod commands;

use commands::read_block::ReadBlock;
use crate::lsw3::{
    registers::{self, RegisterBlock, REGISTER_TABLE},
    transport::Transport,
};

/// Receives progress for each block of a poll cycle.
pub trait PollObserver: Send + Sync {
    fn block_started(&self, _serial: Serial, _block: &RegisterBlock) {}
    fn block_completed(&self, _serial: Serial, _block: &RegisterBlock, _readings: &Snapshot) {}
    fn block_failed(&self, _serial: Serial, _block: &RegisterBlock, _error: &PollError) {}
}

pub struct NoopObserver;
impl PollObserver for NoopObserver {}

/// Polls every register block of one logger and merges the results.
///
/// Holds no state between cycles beyond the logger serial and transport. At
/// most one `poll_all` should run per logger at a time; callers serialize.
pub struct Coordinator<T: Transport> {
    serial: Serial,
    transport: T,
    blocks: Vec<RegisterBlock>,
}

impl<T: Transport> Coordinator<T> {
    pub fn new(serial: Serial, transport: T) -> Result<Self> {
        Self::with_blocks(serial, transport, REGISTER_TABLE.to_vec())
    }

    /// Use a custom register table. The table is validated here, once.
    pub fn with_blocks(serial: Serial, transport: T, blocks: Vec<RegisterBlock>) -> Result<Self> {
        registers::validate_table(&blocks)?;

        Ok(Self {
            serial,
            transport,
            blocks,
        })
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn poll_all(&self) -> Result<Snapshot, PollError> {
        self.poll_all_with(&NoopObserver).await
    }

    /// Read all blocks in order. The first failure aborts the cycle and no
    /// partial snapshot is returned.
    pub async fn poll_all_with(&self, observer: &dyn PollObserver) -> Result<Snapshot, PollError> {
        let mut snapshot = Snapshot::new();

        for block in &self.blocks {
            observer.block_started(self.serial, block);

            match ReadBlock::new(&self.transport, self.serial, block).run().await {
                Ok(readings) => {
                    observer.block_completed(self.serial, block, &readings);
                    snapshot.merge(readings);
                }
                Err(e) => {
                    observer.block_failed(self.serial, block, &e);
                    return Err(e);
                }
            }
        }

        Ok(snapshot)
    }
}
