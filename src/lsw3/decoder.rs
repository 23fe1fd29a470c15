use crate::error::DecodeError;
use crate::utils::Utils;

use nom::{
    combinator::map,
    number::complete::{be_i16, be_u16, be_u32},
    IResult,
};
use serde::Serialize;

// ValueType {{{
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    U16,
    I16,
    U32,
}

impl ValueType {
    /// Width in payload bytes.
    pub fn width(&self) -> usize {
        match self {
            Self::U16 | Self::I16 => 2,
            Self::U32 => 4,
        }
    }

    pub fn registers(&self) -> u16 {
        (self.width() / 2) as u16
    }

    fn parse(self, input: &[u8]) -> IResult<&[u8], i64> {
        match self {
            Self::U16 => map(be_u16, i64::from)(input),
            Self::I16 => map(be_i16, i64::from)(input),
            Self::U32 => map(be_u32, i64::from)(input),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::U16 => "U16",
            Self::I16 => "I16",
            Self::U32 => "U32",
        };
        write!(f, "{}", s)
    }
} // }}}

// Scale {{{
/// Decimal multiplier such as `0.1`. Keeps its decimal places so scaled
/// values can be rounded back onto the decimal grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    factor: f64,
    decimals: u32,
}

impl Scale {
    pub const ONE: Self = Self {
        factor: 1.0,
        decimals: 0,
    };
    pub const TENTH: Self = Self {
        factor: 0.1,
        decimals: 1,
    };
    pub const HUNDREDTH: Self = Self {
        factor: 0.01,
        decimals: 2,
    };

    pub fn apply(&self, raw: i64) -> f64 {
        Utils::round(raw as f64 * self.factor, self.decimals)
    }
} // }}}

// FieldSpec {{{
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub register: u16,
    pub value_type: ValueType,
    /// `None` passes the raw integer through, e.g. for state codes.
    pub scale: Option<Scale>,
    pub unit: &'static str,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        register: u16,
        value_type: ValueType,
        scale: Option<Scale>,
        unit: &'static str,
    ) -> Self {
        Self {
            name,
            register,
            value_type,
            scale,
            unit,
        }
    }

    /// Last register occupied by this field.
    pub fn last_register(&self) -> u32 {
        u32::from(self.register) + u32::from(self.value_type.registers()) - 1
    }
} // }}}

// Reading {{{
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Scaled(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(v) => *v as f64,
            Self::Scaled(v) => *v,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Scaled(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reading {
    pub raw: i64,
    pub value: Value,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub unit: &'static str,
}
// }}}

pub struct RegisterDecoder;
impl RegisterDecoder {
    /// Decode `spec` from a payload whose first register is `origin`.
    pub fn decode_field(
        payload: &[u8],
        origin: u16,
        spec: &FieldSpec,
    ) -> Result<Reading, DecodeError> {
        let index = spec
            .register
            .checked_sub(origin)
            .ok_or(DecodeError::BeforeOrigin {
                register: spec.register,
                origin,
            })?;

        let offset = usize::from(index) * 2;
        let width = spec.value_type.width();
        let truncated = DecodeError::Truncated {
            register: spec.register,
            offset,
            width,
            len: payload.len(),
        };

        if offset + width > payload.len() {
            return Err(truncated);
        }

        let (_, raw) = spec
            .value_type
            .parse(&payload[offset..offset + width])
            .map_err(|_| truncated)?;

        let value = match spec.scale {
            Some(scale) => Value::Scaled(scale.apply(raw)),
            None => Value::Integer(raw),
        };

        Ok(Reading {
            raw,
            value,
            value_type: spec.value_type,
            unit: spec.unit,
        })
    }
}
