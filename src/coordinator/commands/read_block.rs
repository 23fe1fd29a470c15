use crate::prelude::*;

use crate::lsw3::{
    decoder::RegisterDecoder,
    frame::FrameBuilder,
    registers::RegisterBlock,
    transport::Transport,
};

/// Fetches one register block over its own exchange and decodes every field.
pub struct ReadBlock<'a, T: Transport + ?Sized> {
    transport: &'a T,
    serial: Serial,
    block: &'a RegisterBlock,
}

impl<'a, T: Transport + ?Sized> ReadBlock<'a, T> {
    pub fn new(transport: &'a T, serial: Serial, block: &'a RegisterBlock) -> Self {
        Self {
            transport,
            serial,
            block,
        }
    }

    pub async fn run(&self) -> Result<Snapshot, PollError> {
        let block = self.block.name;

        let frame = FrameBuilder::build(self.serial, self.block.range)
            .map_err(|source| PollError::Frame { block, source })?;

        trace!("logger {}: TX {:?}", self.serial, frame);

        let response = self
            .transport
            .exchange(&frame)
            .await
            .map_err(|source| PollError::Transport { block, source })?;

        trace!(
            "logger {}: RX {} bytes, declared payload {}",
            self.serial,
            response.as_bytes().len(),
            response.declared_length()
        );

        let payload = response.payload();
        let mut readings = Snapshot::new();
        for field in self.block.fields {
            let reading = RegisterDecoder::decode_field(payload, self.block.range.start, field)
                .map_err(|source| PollError::Decode { block, source })?;
            readings.insert(field.name, reading);
        }

        Ok(readings)
    }
}
