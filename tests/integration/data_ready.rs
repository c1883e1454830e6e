//! FIFO draining driven by the data-ready interrupt

use crate::common::{Harness, MockGpio, Operation, ScheduleCall};
use icm20948_fifo::acquisition::DATA_READY_WATCHDOG_US;
use icm20948_fifo::register::registers::bank0;
use icm20948_fifo::register::Bank;
use icm20948_fifo::{DeviceState, DriverConfig};

fn running() -> (Harness, MockGpio) {
    let mut h = Harness::with_data_ready(DriverConfig::default());
    h.bring_up();
    h.device.clear_operations();
    h.scheduler.clear_calls();
    let gpio = h.gpio.clone().unwrap();
    (h, gpio)
}

fn count_reads(ops: &[Operation]) -> usize {
    ops.iter()
        .filter(|op| {
            matches!(
                op,
                Operation::Burst {
                    bank: Bank::UserBank0,
                    reg: bank0::FIFO_COUNTH,
                    len: 2
                }
            )
        })
        .count()
}

#[test]
fn test_interrupt_registered_on_configure() {
    let (h, gpio) = running();
    assert!(gpio.is_enabled());
    assert_eq!(h.driver.timing().fifo_gyro_samples, 12);
}

#[test]
fn test_watermark_wakes_loop() {
    let (h, gpio) = running();

    gpio.fire(11);
    assert!(h.scheduler.calls().is_empty());

    gpio.fire(1);
    assert_eq!(h.scheduler.calls(), vec![ScheduleCall::Now]);
    assert_eq!(h.driver.interrupt_state().data_ready_events(), 12);
}

#[test]
fn test_first_read_recounts_then_trusts_watermark() {
    let (mut h, gpio) = running();
    let samples = h.driver.timing().fifo_gyro_samples as usize;

    // recuento forzado en el primer ciclo
    h.device.push_doubled_frames(samples);
    gpio.fire(samples);
    assert_eq!(h.step(0), DeviceState::FifoRead);

    assert_eq!(count_reads(&h.device.operations()), 1);
    assert_eq!(h.gyro.total_samples(), samples);
    assert_eq!(h.accel.total_samples(), samples / 2);
    assert!(!h.driver.interrupt_state().force_fifo_count_check());
    assert_eq!(
        h.scheduler.calls()[1],
        ScheduleCall::Delayed(DATA_READY_WATCHDOG_US)
    );

    // en sincronía: se usa directamente la marca de agua
    h.device.clear_operations();
    h.device.push_doubled_frames(samples);
    h.clock.advance(100);
    gpio.fire(samples);
    h.step(100);

    assert_eq!(count_reads(&h.device.operations()), 0);
    assert_eq!(h.gyro.total_samples(), 2 * samples);
}

#[test]
fn test_watermark_timestamp_used_for_batch() {
    let (mut h, gpio) = running();
    let samples = h.driver.timing().fifo_gyro_samples as usize;

    h.device.push_doubled_frames(samples);
    h.clock.advance(500);
    gpio.fire(samples);
    let watermark = h.driver.interrupt_state().watermark_timestamp();

    h.step(200);

    assert_eq!(h.gyro.batches()[0].timestamp_sample, watermark);
}

#[test]
fn test_stale_watermark_recounted() {
    let (mut h, gpio) = running();
    let samples = h.driver.timing().fifo_gyro_samples as usize;

    h.device.push_doubled_frames(samples);
    gpio.fire(samples);

    // más de medio intervalo de retraso
    let late = h.driver.timing().fifo_empty_interval_us as u64;
    h.step(late);

    let now = h.driver.interrupt_state().watermark_timestamp() + late;
    assert_eq!(h.gyro.batches()[0].timestamp_sample, now);
    assert!(count_reads(&h.device.operations()) >= 1);
}

#[test]
fn test_watchdog_without_interrupt() {
    let (mut h, _gpio) = running();
    h.device.push_doubled_frames(4);

    // el watchdog despierta al bucle sin marca de agua
    h.step(DATA_READY_WATCHDOG_US);

    assert_eq!(h.gyro.total_samples(), 4);
    assert_eq!(
        h.scheduler.calls()[0],
        ScheduleCall::Delayed(DATA_READY_WATCHDOG_US)
    );
}

#[test]
fn test_overflow_forces_recount_of_next_watermark() {
    let (mut h, gpio) = running();
    let samples = h.driver.timing().fifo_gyro_samples as usize;

    // un ciclo en sincronía deja de forzar el recuento
    h.device.push_doubled_frames(samples);
    gpio.fire(samples);
    h.step(0);
    assert!(!h.driver.interrupt_state().force_fifo_count_check());

    // el watchdog encuentra el FIFO desbordado
    h.device.set_fifo_count_override(Some(14 * 40));
    let before = h.driver.counters();
    h.step(DATA_READY_WATCHDOG_US);

    let after = h.driver.counters();
    assert_eq!(after.fifo_overflow, before.fifo_overflow + 1);
    assert_eq!(after.fifo_reset, before.fifo_reset + 1);
    assert!(h.driver.interrupt_state().force_fifo_count_check());

    // la siguiente marca de agua se confirma con el contador hardware
    h.device.clear_operations();
    h.device.push_doubled_frames(samples);
    gpio.fire(samples);
    h.step(0);

    assert_eq!(count_reads(&h.device.operations()), 1);
    assert_eq!(h.gyro.total_samples(), 2 * samples);
    assert!(!h.driver.interrupt_state().force_fifo_count_check());
}
