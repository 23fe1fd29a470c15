use crate::error::TransportError;
use crate::lsw3::frame::Frame;

use {
    async_trait::async_trait,
    bytes::{Bytes, BytesMut},
    log::{debug, trace},
    std::time::Duration,
    tokio::io::{AsyncReadExt, AsyncWriteExt},
    tokio_util::codec::Decoder,
};

/// Bytes preceding the register payload in a response.
pub const HEADER_LEN: usize = 28;
/// Offset of the payload byte count inside the response header.
pub const LENGTH_OFFSET: usize = HEADER_LEN - 1;

pub const DEFAULT_PORT: u16 = 8899;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// RawResponse {{{
/// One response, trimmed to header plus the declared payload.
#[derive(Clone, PartialEq, Eq)]
pub struct RawResponse {
    bytes: Bytes,
}

impl RawResponse {
    pub fn declared_length(&self) -> usize {
        self.bytes[LENGTH_OFFSET] as usize
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("declared_length", &self.declared_length())
            .field("payload", &self.payload())
            .finish()
    }
} // }}}

// ResponseDecoder {{{
/// Frames a response by the length byte at offset 27. The length byte is
/// authoritative; anything received past `HEADER_LEN + length` is dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseDecoder;

impl ResponseDecoder {
    pub fn new() -> Self {
        Self
    }

    fn expected_len(src: &BytesMut) -> Option<usize> {
        src.get(LENGTH_OFFSET)
            .map(|len| HEADER_LEN + *len as usize)
    }
}

impl Decoder for ResponseDecoder {
    type Item = RawResponse;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RawResponse>, TransportError> {
        let expected = match Self::expected_len(src) {
            Some(expected) => expected,
            None => {
                src.reserve(HEADER_LEN - src.len());
                return Ok(None);
            }
        };

        if src.len() < expected {
            src.reserve(expected - src.len());
            return Ok(None);
        }

        let bytes = src.split_to(expected).freeze();
        if !src.is_empty() {
            trace!("ignoring {} trailing response bytes", src.len());
            src.clear();
        }

        Ok(Some(RawResponse { bytes }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<RawResponse>, TransportError> {
        match self.decode(src)? {
            Some(response) => Ok(Some(response)),
            None => Err(TransportError::Closed {
                received: src.len(),
                expected: Self::expected_len(src).unwrap_or(HEADER_LEN),
            }),
        }
    }
} // }}}

/// One request/response round trip against a data logger.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(&self, frame: &Frame) -> Result<RawResponse, TransportError>;
}

/// Opens a fresh TCP connection per exchange and closes it afterwards.
#[derive(Clone, Debug)]
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn round_trip(&self, frame: &Frame) -> Result<RawResponse, TransportError> {
        let mut stream = tokio::net::TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|source| TransportError::Connect {
                addr: self.addr(),
                source,
            })?;

        if let Err(e) = stream.set_nodelay(true) {
            debug!("{}: failed to set TCP_NODELAY: {}", self.addr(), e);
        }

        trace!("{}: TX {:?}", self.addr(), frame);
        stream.write_all(frame.as_bytes()).await?;
        stream.flush().await?;

        let mut buf = BytesMut::with_capacity(HEADER_LEN + u8::MAX as usize);
        let mut decoder = ResponseDecoder::new();

        loop {
            if let Some(response) = decoder.decode(&mut buf)? {
                trace!("{}: RX {:?}", self.addr(), response);
                return Ok(response);
            }

            if stream.read_buf(&mut buf).await? == 0 {
                // decode_eof errors unless the buffer already holds a full response
                return match decoder.decode_eof(&mut buf)? {
                    Some(response) => Ok(response),
                    None => Err(TransportError::Closed {
                        received: buf.len(),
                        expected: HEADER_LEN,
                    }),
                };
            }
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn exchange(&self, frame: &Frame) -> Result<RawResponse, TransportError> {
        match tokio::time::timeout(self.timeout, self.round_trip(frame)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                addr: self.addr(),
                after: self.timeout,
            }),
        }
    }
}
