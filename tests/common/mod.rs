#![allow(dead_code)]

use async_trait::async_trait;
use bytes::BytesMut;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::codec::Decoder;

use lsw3_bridge::lsw3::frame::{Frame, Serial};
use lsw3_bridge::lsw3::transport::{RawResponse, ResponseDecoder, Transport, LENGTH_OFFSET};
use lsw3_bridge::prelude::*;

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Factory;
impl Factory {
    pub fn serial() -> Serial {
        Serial::new(2734303872)
    }

    /// A response as the logger sends it: 27 header bytes, the payload
    /// length, then the payload.
    pub fn response_bytes(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; LENGTH_OFFSET];
        bytes[0] = 0xA5;
        bytes.push(payload.len() as u8);
        bytes.extend_from_slice(payload);
        bytes
    }

    pub fn response(payload: &[u8]) -> RawResponse {
        let mut buf = BytesMut::from(&Self::response_bytes(payload)[..]);
        match ResponseDecoder::new().decode(&mut buf) {
            Ok(Some(response)) => response,
            other => panic!("test response did not decode: {:?}", other),
        }
    }

    /// Big-endian payload from a list of 16-bit register values.
    pub fn payload(registers: &[u16]) -> Vec<u8> {
        registers.iter().flat_map(|r| r.to_be_bytes()).collect()
    }
}

pub enum Reply {
    Payload(Vec<u8>),
    Timeout,
}

/// Answers frames by their start register and records every frame it sees.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<u16, Reply>>,
    sent: Mutex<Vec<Frame>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, start_register: u16, payload: Vec<u8>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(start_register, Reply::Payload(payload));
        self
    }

    pub fn time_out(self, start_register: u16) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(start_register, Reply::Timeout);
        self
    }

    pub fn sent(&self) -> Vec<Frame> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_registers(&self) -> Vec<u16> {
        self.sent().iter().map(|f| f.start_register()).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn exchange(&self, frame: &Frame) -> Result<RawResponse, TransportError> {
        self.sent.lock().unwrap().push(frame.clone());

        match self.replies.lock().unwrap().get(&frame.start_register()) {
            Some(Reply::Payload(payload)) => Ok(Factory::response(payload)),
            Some(Reply::Timeout) | None => Err(TransportError::Timeout {
                addr: "mock:8899".to_string(),
                after: Duration::from_secs(5),
            }),
        }
    }
}
