//! Unit tests for FIFO transfers and decoding

use crate::common::{Harness, Operation};
use icm20948_fifo::register::registers::bank0;
use icm20948_fifo::register::Bank;
use icm20948_fifo::DriverConfig;

fn configured() -> Harness {
    let mut h = Harness::new(DriverConfig::default());
    h.driver.configure();
    h
}

#[test]
fn test_fifo_read_count() {
    let mut h = configured();
    h.device.push_doubled_frames(5);
    assert_eq!(h.driver.fifo_read_count(), Ok(70));

    h.device.fail_next_transfers(1);
    assert!(h.driver.fifo_read_count().is_err());
    assert_eq!(h.driver.counters().bad_transfer, 1);
}

#[test]
fn test_fifo_read_decodes_batch() {
    let mut h = configured();
    h.device.push_doubled_frames(4);

    assert!(h.driver.fifo_read(5_000, 4));

    let gyro = h.gyro.batches();
    assert_eq!(gyro.len(), 1);
    assert_eq!(gyro[0].timestamp_sample, 5_000);
    assert_eq!(
        gyro[0].iter().collect::<Vec<_>>(),
        vec![
            [100, -100, -100],
            [101, -101, -101],
            [102, -102, -102],
            [103, -103, -103]
        ]
    );

    let accel = h.accel.batches();
    assert_eq!(accel.len(), 1);
    assert_eq!(accel[0].iter().collect::<Vec<_>>(), vec![[1, -1, -1], [2, -2, -2]]);

    // batch size matches the FIFO: no recount needed
    assert!(!h.driver.interrupt_state().force_fifo_count_check());
    assert_eq!(h.driver.counters().transfers, 1);
}

#[test]
fn test_fifo_read_transfer_size() {
    let mut h = configured();
    h.device.push_doubled_frames(6);
    h.device.clear_operations();

    h.driver.fifo_read(0, 6);

    assert!(h.device.operations().contains(&Operation::Burst {
        bank: Bank::UserBank0,
        reg: bank0::FIFO_COUNTH,
        len: 6 * 14 + 2,
    }));
}

#[test]
fn test_fifo_read_fewer_frames_than_requested() {
    let mut h = configured();
    h.device.push_doubled_frames(2);

    assert!(h.driver.fifo_read(0, 4));

    assert_eq!(h.gyro.batches()[0].samples, 2);
    assert_eq!(h.accel.batches()[0].samples, 1);
    assert!(h.driver.interrupt_state().force_fifo_count_check());
}

#[test]
fn test_fifo_read_behind_forces_recount() {
    let mut h = configured();
    h.device.push_doubled_frames(8);

    assert!(h.driver.fifo_read(0, 4));
    assert!(h.driver.interrupt_state().force_fifo_count_check());
}

#[test]
fn test_fifo_read_misaligned_accel() {
    let mut h = configured();
    for i in 1..=4 {
        h.device.push_frame([i, i, i], [i, i, i]);
    }

    assert!(!h.driver.fifo_read(0, 4));

    // el giroscopio se publica aunque el acelerómetro esté desalineado
    assert_eq!(h.gyro.batches()[0].samples, 4);
    assert_eq!(h.accel.batches()[0].samples, 2);
    assert_eq!(h.driver.counters().bad_transfer, 1);
    assert!(h.driver.interrupt_state().force_fifo_count_check());
}

#[test]
fn test_fifo_read_empty() {
    let mut h = configured();

    assert!(!h.driver.fifo_read(0, 4));
    assert_eq!(h.driver.counters().fifo_empty, 1);
    assert!(h.gyro.batches().is_empty());
    assert!(h.accel.batches().is_empty());
}

#[test]
fn test_fifo_read_overflow_resets() {
    let mut h = configured();
    h.device.push_doubled_frames(4);
    h.device.set_fifo_count_override(Some(520));

    assert!(!h.driver.fifo_read(0, 4));

    assert_eq!(h.driver.counters().fifo_overflow, 1);
    assert_eq!(h.driver.counters().fifo_reset, 1);
    assert_eq!(h.device.fifo_len(), 0);
    assert!(h.gyro.batches().is_empty());
    assert!(h.accel.batches().is_empty());
}

#[test]
fn test_fifo_read_transfer_failure() {
    let mut h = configured();
    h.device.push_doubled_frames(4);
    h.device.fail_next_transfers(1);

    assert!(!h.driver.fifo_read(0, 4));
    assert_eq!(h.driver.counters().bad_transfer, 1);
    assert_eq!(h.driver.counters().transfers, 0);
    assert!(h.gyro.batches().is_empty());
}

#[test]
fn test_fifo_reset_sequence() {
    let mut h = configured();
    h.device.push_doubled_frames(4);
    h.device.clear_operations();

    h.driver.fifo_reset();

    assert_eq!(
        h.device.writes_to(Bank::UserBank0, bank0::FIFO_RST),
        vec![0x1F, 0x00]
    );
    assert_eq!(h.device.fifo_len(), 0);
    assert_eq!(h.driver.interrupt_state().take_watermark(), (0, 0));
}
