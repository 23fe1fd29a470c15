mod common;
use common::*;

use lsw3_bridge::lsw3::decoder::Value;
use lsw3_bridge::lsw3::registers::{RegisterBlock, REGISTER_TABLE};
use lsw3_bridge::prelude::*;

use std::sync::Mutex;

fn full_payload(block: &RegisterBlock, registers: &[u16]) -> Vec<u8> {
    let mut all = vec![0u16; usize::from(block.range.count().unwrap())];
    all[..registers.len()].copy_from_slice(registers);
    Factory::payload(&all)
}

fn healthy_transport() -> MockTransport {
    let [energy, pv, grid, system] = REGISTER_TABLE;

    MockTransport::new()
        // pv_generation_today 12.34 kWh, pv_generation_total 5678.9 kWh
        .reply(energy.range.start, full_payload(&energy, &[0, 1234, 0, 56789]))
        .reply(pv.range.start, full_payload(&pv, &[3005, 520, 156, 2990, 480, 143]))
        // frequency 50.01 Hz, export -1.50 kW
        .reply(grid.range.start, full_payload(&grid, &[5001, (-150i16) as u16]))
        .reply(system.range.start, full_payload(&system, &[2]))
}

#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl PollObserver for RecordingObserver {
    fn block_started(&self, _serial: Serial, block: &RegisterBlock) {
        self.events.lock().unwrap().push(format!("start {}", block.name));
    }

    fn block_completed(&self, _serial: Serial, block: &RegisterBlock, readings: &Snapshot) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {} {}", block.name, readings.len()));
    }

    fn block_failed(&self, _serial: Serial, block: &RegisterBlock, _error: &PollError) {
        self.events.lock().unwrap().push(format!("failed {}", block.name));
    }
}

#[tokio::test]
async fn happy_path() {
    common_setup();

    let coordinator = Coordinator::new(Factory::serial(), healthy_transport()).unwrap();
    let snapshot = coordinator.poll_all().await.unwrap();

    assert_eq!(snapshot.len(), 28);
    assert_eq!(snapshot.value("pv_generation_today"), Some(12.34));
    assert_eq!(snapshot.value("pv_generation_total"), Some(5678.9));
    assert_eq!(snapshot.value("frequency_grid"), Some(50.01));
    assert_eq!(snapshot.value("active_power_output_total"), Some(-1.5));
    assert_eq!(snapshot.get("sys_state").map(|r| r.value), Some(Value::Integer(2)));

    // one frame per block, in table order, all for the same logger
    let transport = coordinator.transport();
    assert_eq!(transport.sent_registers(), vec![0x0684, 0x0584, 0x0484, 0x0404]);
    assert!(transport.sent().iter().all(|f| f.serial() == Factory::serial()));
}

#[tokio::test]
async fn pv_output_values() {
    common_setup();

    let coordinator = Coordinator::new(Factory::serial(), healthy_transport()).unwrap();
    let snapshot = coordinator.poll_all().await.unwrap();

    let voltage = snapshot.get("voltage_pv1").unwrap();
    assert_eq!(voltage.raw, 3005);
    assert_eq!(voltage.value, Value::Scaled(300.5));
    assert_eq!(voltage.unit, "V");

    assert_eq!(snapshot.value("current_pv1"), Some(5.2));
    assert_eq!(snapshot.value("power_pv1"), Some(1.56));
    assert_eq!(snapshot.value("voltage_pv2"), Some(299.0));
}

#[tokio::test]
async fn third_block_failure_discards_cycle() {
    common_setup();

    let transport = healthy_transport().time_out(0x0484);
    let coordinator = Coordinator::new(Factory::serial(), transport).unwrap();
    let observer = RecordingObserver::default();

    let err = coordinator.poll_all_with(&observer).await.unwrap_err();

    assert!(matches!(
        err,
        PollError::Transport {
            block: "grid_output",
            source: TransportError::Timeout { .. }
        }
    ));
    assert!(err.is_transport());
    assert!(err.to_string().starts_with("grid_output: "));

    // system_info is never requested
    assert_eq!(coordinator.transport().sent_registers(), vec![0x0684, 0x0584, 0x0484]);

    assert_eq!(
        *observer.events.lock().unwrap(),
        vec![
            "start energy_totals",
            "done energy_totals 8",
            "start pv_output",
            "done pv_output 6",
            "start grid_output",
            "failed grid_output",
        ]
    );
}

#[tokio::test]
async fn short_payload_is_a_decode_error() {
    common_setup();

    // only PV1 voltage and current arrive
    let transport = healthy_transport().reply(0x0584, Factory::payload(&[3005, 520]));
    let coordinator = Coordinator::new(Factory::serial(), transport).unwrap();

    let err = coordinator.poll_all().await.unwrap_err();
    assert!(matches!(
        err,
        PollError::Decode {
            block: "pv_output",
            source: DecodeError::Truncated { register: 0x0586, .. }
        }
    ));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn next_cycle_recovers() {
    common_setup();

    let transport = healthy_transport().time_out(0x0404);
    let coordinator = Coordinator::new(Factory::serial(), transport).unwrap();
    assert!(coordinator.poll_all().await.is_err());

    let coordinator = Coordinator::new(Factory::serial(), healthy_transport()).unwrap();
    assert_eq!(coordinator.poll_all().await.unwrap().len(), 28);
}

#[test]
fn rejects_invalid_table() {
    let [energy, _, _, _] = REGISTER_TABLE;
    let blocks = vec![energy, energy];
    assert!(Coordinator::with_blocks(Factory::serial(), MockTransport::new(), blocks).is_err());
}
