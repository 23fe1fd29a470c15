mod common;
use common::*;

use lsw3_bridge::lsw3::decoder::{FieldSpec, RegisterDecoder, Scale, Value, ValueType};
use lsw3_bridge::lsw3::registers::REGISTER_TABLE;
use lsw3_bridge::prelude::*;

#[test]
fn u16_tenth() {
    let spec = FieldSpec::new("voltage", 0x0584, ValueType::U16, Some(Scale::TENTH), "V");
    let reading = RegisterDecoder::decode_field(&[0x00, 0x64], 0x0584, &spec).unwrap();

    assert_eq!(reading.raw, 100);
    assert_eq!(reading.value, Value::Scaled(10.0));
    assert_eq!(reading.unit, "V");
}

#[test]
fn i16_negative() {
    let spec = FieldSpec::new("temperature", 0x0418, ValueType::I16, Some(Scale::ONE), "°C");
    let reading = RegisterDecoder::decode_field(&[0xFF, 0xFF], 0x0418, &spec).unwrap();

    assert_eq!(reading.raw, -1);
    assert_eq!(reading.value.as_f64(), -1.0);
}

#[test]
fn u32_hundredth() {
    let spec = FieldSpec::new("energy", 0x0684, ValueType::U32, Some(Scale::HUNDREDTH), "kWh");
    let reading = RegisterDecoder::decode_field(&[0x00, 0x00, 0x27, 0x10], 0x0684, &spec).unwrap();

    assert_eq!(reading.raw, 10000);
    assert_eq!(reading.value, Value::Scaled(100.0));
}

#[test]
fn unscaled_passthrough() {
    let spec = FieldSpec::new("sys_state", 0x0404, ValueType::U16, None, "");
    let reading = RegisterDecoder::decode_field(&[0x00, 0x02], 0x0404, &spec).unwrap();

    assert_eq!(reading.value, Value::Integer(2));
}

#[test]
fn offset_from_origin() {
    // third register of the block
    let spec = FieldSpec::new("power_pv1", 0x0586, ValueType::U16, Some(Scale::HUNDREDTH), "kW");
    let payload = Factory::payload(&[3005, 520, 156]);
    let reading = RegisterDecoder::decode_field(&payload, 0x0584, &spec).unwrap();

    assert_eq!(reading.value, Value::Scaled(1.56));
}

#[test]
fn truncated_payload() {
    let spec = FieldSpec::new("power_pv1", 0x0586, ValueType::U16, None, "");
    assert_eq!(
        RegisterDecoder::decode_field(&[0u8; 4], 0x0584, &spec),
        Err(DecodeError::Truncated {
            register: 0x0586,
            offset: 4,
            width: 2,
            len: 4
        })
    );

    // half of a U32 is still too short
    let spec = FieldSpec::new("total", 0x0686, ValueType::U32, None, "");
    assert!(RegisterDecoder::decode_field(&[0u8; 6], 0x0684, &spec).is_err());

    let spec = FieldSpec::new("first", 0x0684, ValueType::U16, None, "");
    assert!(RegisterDecoder::decode_field(&[], 0x0684, &spec).is_err());
}

#[test]
fn register_before_origin() {
    let spec = FieldSpec::new("early", 0x0400, ValueType::U16, None, "");
    assert_eq!(
        RegisterDecoder::decode_field(&[0u8; 8], 0x0404, &spec),
        Err(DecodeError::BeforeOrigin {
            register: 0x0400,
            origin: 0x0404
        })
    );
}

#[test]
fn every_field_fits_a_full_block_payload() {
    for block in REGISTER_TABLE {
        let registers = vec![0u16; usize::from(block.range.count().unwrap())];
        let payload = Factory::payload(&registers);

        for field in block.fields {
            assert!(
                RegisterDecoder::decode_field(&payload, block.range.start, field).is_ok(),
                "{} in {}",
                field.name,
                block.name
            );
        }
    }
}
