use std::time::Duration;
use thiserror::Error;

/// A register range that cannot be encoded into a request frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameBuildError {
    #[error("invalid register range {start:#06x}..={end:#06x}: start is after end")]
    Inverted { start: u16, end: u16 },

    #[error("register range {start:#06x}..={end:#06x} spans {count} registers (max {max})")]
    TooLarge {
        start: u16,
        end: u16,
        count: u32,
        max: u16,
    },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no complete response from {addr} within {}ms", .after.as_millis())]
    Timeout { addr: String, after: Duration },

    #[error("connection closed after {received} bytes, expected {expected}")]
    Closed { received: usize, expected: usize },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// A response payload that does not hold the requested field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(
        "register {register:#06x} needs bytes {offset}..{} but payload has {len}",
        .offset + .width
    )]
    Truncated {
        register: u16,
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("register {register:#06x} is below block origin {origin:#06x}")]
    BeforeOrigin { register: u16, origin: u16 },
}

/// The first sub-read failure of a poll cycle. Nothing from the cycle is kept.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("{block}: {source}")]
    Frame {
        block: &'static str,
        #[source]
        source: FrameBuildError,
    },

    #[error("{block}: {source}")]
    Transport {
        block: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("{block}: {source}")]
    Decode {
        block: &'static str,
        #[source]
        source: DecodeError,
    },
}

impl PollError {
    pub fn block(&self) -> &'static str {
        match self {
            Self::Frame { block, .. }
            | Self::Transport { block, .. }
            | Self::Decode { block, .. } => block,
        }
    }

    /// Transport failures clear up on their own; the next poll may succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
