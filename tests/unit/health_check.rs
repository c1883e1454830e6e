//! Unit tests for register configuration and the rotating health check

use crate::common::{Harness, Operation};
use icm20948_fifo::register::registers::{bank0, bank2, bank3};
use icm20948_fifo::register::Bank;
use icm20948_fifo::{DriverConfig, RegisterConfig, RegisterSpec};

#[test]
fn test_configure_applies_targets() {
    let mut h = Harness::new(DriverConfig::default());

    // valores de power-on: no cumple
    assert!(!h.driver.configure());

    assert_eq!(h.device.register(Bank::UserBank0, bank0::USER_CTRL), 0x70);
    assert_eq!(h.device.register(Bank::UserBank0, bank0::PWR_MGMT_1), 0x01);
    assert_eq!(h.device.register(Bank::UserBank0, bank0::INT_PIN_CFG), 0x80);
    assert_eq!(h.device.register(Bank::UserBank0, bank0::INT_ENABLE_1), 0x01);
    assert_eq!(h.device.register(Bank::UserBank0, bank0::FIFO_EN_2), 0x1F);
    assert_eq!(h.device.register(Bank::UserBank0, bank0::FIFO_MODE), 0x01);
    assert_eq!(h.device.register(Bank::UserBank2, bank2::GYRO_CONFIG_1), 0x06);
    assert_eq!(h.device.register(Bank::UserBank2, bank2::ACCEL_CONFIG), 0x06);

    // la configuración no cuenta como error de registro
    assert_eq!(h.driver.counters().bad_register, 0);
    assert_eq!(h.accel.errors(), 0);

    assert!(h.driver.configure());
}

#[test]
fn test_configure_reports_scales() {
    let mut h = Harness::new(DriverConfig::default());
    h.driver.configure();

    let accel = h.accel.log.borrow();
    assert!((accel.scale.unwrap() - 9.80665 / 2048.0).abs() < 1e-6);
    assert!((accel.range.unwrap() - 16.0 * 9.80665).abs() < 1e-3);

    let gyro = h.gyro.log.borrow();
    assert!((gyro.range.unwrap() - 2000.0f32.to_radians()).abs() < 1e-3);
}

#[test]
fn test_register_check_idempotent() {
    let mut h = Harness::new(DriverConfig::default());
    h.driver.configure();
    h.device.clear_operations();

    let specs: Vec<RegisterSpec> = h.driver.register_config().iter().copied().collect();
    for _ in 0..3 {
        for spec in &specs {
            assert!(h.driver.register_check(spec, true));
        }
    }

    assert!(!h
        .device
        .operations()
        .iter()
        .any(|op| matches!(op, Operation::Write { .. })));
    assert_eq!(h.driver.counters().bad_register, 0);
    assert_eq!(h.gyro.errors(), 0);
}

#[test]
fn test_register_check_corrects_and_notifies() {
    let mut h = Harness::new(DriverConfig::default());
    h.driver.configure();

    h.device.force_register(Bank::UserBank0, bank0::USER_CTRL, 0xF0);
    let spec = h.driver.register_config().bank0[0];

    assert!(!h.driver.register_check(&spec, true));
    assert_eq!(h.device.register(Bank::UserBank0, bank0::USER_CTRL), 0x70);
    assert_eq!(h.driver.counters().bad_register, 1);
    assert_eq!(h.accel.errors(), 1);
    assert_eq!(h.gyro.errors(), 1);

    assert!(h.driver.register_check(&spec, true));
}

#[test]
fn test_synthetic_table() {
    let table = [RegisterSpec::new(Bank::UserBank0, bank0::INT_PIN_CFG, 0x80, 0x40)];

    let mut h = Harness::new(DriverConfig::default());
    h.driver = h
        .driver
        .with_register_config(RegisterConfig::new(&table, &[], &[]));
    h.device.force_register(Bank::UserBank0, bank0::INT_PIN_CFG, 0x41);

    assert!(!h.driver.configure());
    assert_eq!(h.device.register(Bank::UserBank0, bank0::INT_PIN_CFG), 0x81);
    assert!(h.driver.configure());

    // solo se toca el registro de la tabla
    assert_eq!(h.device.register(Bank::UserBank0, bank0::USER_CTRL), 0x00);
}

#[test]
fn test_health_check_step_rotates() {
    let mut h = Harness::new(DriverConfig::default());
    h.driver.configure();

    let cfg = h.driver.register_config().clone();
    for i in 1..=cfg.bank0.len() {
        assert!(h.driver.health_check_step());
        assert_eq!(h.driver.check_cursor().bank0, i % cfg.bank0.len());
        assert_eq!(h.driver.check_cursor().bank2, i % cfg.bank2.len());
        assert_eq!(h.driver.check_cursor().bank3, i % cfg.bank3.len());
    }
}

#[test]
fn test_health_check_step_stops_at_failure() {
    let mut h = Harness::new(DriverConfig::default());
    h.driver.configure();

    // bank2[0] = GYRO_CONFIG_1
    h.device.force_register(Bank::UserBank2, bank2::GYRO_CONFIG_1, 0x01);
    h.device.clear_operations();

    assert!(!h.driver.health_check_step());
    assert_eq!(h.driver.check_cursor().bank0, 0);

    // el banco 3 no llega a leerse
    assert!(!h.device.operations().iter().any(|op| matches!(
        op,
        Operation::Read {
            bank: Bank::UserBank3,
            ..
        }
    )));
    assert_eq!(h.device.register(Bank::UserBank2, bank2::GYRO_CONFIG_1), 0x06);
}

#[test]
fn test_aux_master_registers_targeted() {
    let mut h = Harness::new(DriverConfig {
        enable_magnetometer: true,
        ..DriverConfig::default()
    });

    assert!(!h.driver.configure());
    assert_eq!(h.device.register(Bank::UserBank3, bank3::I2C_MST_CTRL), 0x17);
    assert_eq!(h.device.register(Bank::UserBank3, bank3::I2C_MST_DELAY_CTRL), 0x0F);
    assert_eq!(h.device.register(Bank::UserBank3, bank3::I2C_SLV4_CTRL), 0x1F);
    assert!(h.driver.configure());
}
