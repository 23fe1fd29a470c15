use crate::error::FrameBuildError;
use crate::lsw3::checksum::Checksum;

use serde::{Deserialize, Serialize};

pub const FRAME_LEN: usize = 36;

const START_MARKER: u8 = 0xA5;
const END_MARKER: u8 = 0x15;
const LENGTH_MARKER: u16 = 0x1700;
const CONTROL_MARKER: u16 = 0x1045;
const CONTROL_BYTE: u8 = 0x02;
// modbus slave 1, function 3 (read holding registers)
const READ_HOLDING: u16 = 0x0103;

pub const MAX_REGISTER_COUNT: u16 = 0x7FFF;

// Serial {{{
/// Logger serial number. Encoded little-endian at bytes 7..11 of every request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Serial(u32);

impl Serial {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
} // }}}

// RegisterRange {{{
/// Inclusive span of registers requested in one exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterRange {
    pub start: u16,
    pub end: u16,
}

impl RegisterRange {
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn count(&self) -> Result<u16, FrameBuildError> {
        if self.start > self.end {
            return Err(FrameBuildError::Inverted {
                start: self.start,
                end: self.end,
            });
        }

        let count = u32::from(self.end) - u32::from(self.start) + 1;
        if count > u32::from(MAX_REGISTER_COUNT) {
            return Err(FrameBuildError::TooLarge {
                start: self.start,
                end: self.end,
                count,
                max: MAX_REGISTER_COUNT,
            });
        }

        Ok(count as u16)
    }

    pub fn contains(&self, register: u16) -> bool {
        (self.start..=self.end).contains(&register)
    }
}

impl std::fmt::Display for RegisterRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}..={:#06x}", self.start, self.end)
    }
} // }}}

// Frame {{{
#[derive(Clone, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn serial(&self) -> Serial {
        let mut sn = [0u8; 4];
        sn.copy_from_slice(&self.0[7..11]);
        Serial(u32::from_le_bytes(sn))
    }

    pub fn start_register(&self) -> u16 {
        u16::from_be_bytes([self.0[28], self.0[29]])
    }

    pub fn register_count(&self) -> u16 {
        u16::from_be_bytes([self.0[30], self.0[31]])
    }

    pub fn command_crc(&self) -> u16 {
        u16::from_le_bytes([self.0[32], self.0[33]])
    }

    pub fn checksum(&self) -> u8 {
        self.0[34]
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame(")?;
        for b in self.0.iter() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
} // }}}

pub struct FrameBuilder;
impl FrameBuilder {
    pub fn build(serial: Serial, range: RegisterRange) -> Result<Frame, FrameBuildError> {
        let count = range.count()?;

        let mut r = [0u8; FRAME_LEN];

        r[0] = START_MARKER;
        r[1..3].copy_from_slice(&LENGTH_MARKER.to_be_bytes());
        r[3..5].copy_from_slice(&CONTROL_MARKER.to_be_bytes());
        // r[5..7] reserved
        r[7..11].copy_from_slice(&serial.to_le_bytes());
        r[11] = CONTROL_BYTE;
        // r[12..26] unused by this request type, left zeroed

        r[26..28].copy_from_slice(&READ_HOLDING.to_be_bytes());
        r[28..30].copy_from_slice(&range.start.to_be_bytes());
        r[30..32].copy_from_slice(&count.to_be_bytes());

        let crc = Checksum::crc16(&r[26..32]);
        r[32..34].copy_from_slice(&crc.to_le_bytes());

        r[34] = Checksum::frame(&r[1..34]);
        r[35] = END_MARKER;

        Ok(Frame(r))
    }
}
