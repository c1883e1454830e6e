//! Unit tests for banked register access

use crate::common::{Harness, Operation};
use icm20948_fifo::register::registers::{bank0, bank2, bank3};
use icm20948_fifo::register::Bank;
use icm20948_fifo::{DriverConfig, Icm20948Error};

fn bank_selects(ops: &[Operation]) -> Vec<Bank> {
    ops.iter()
        .filter_map(|op| match op {
            Operation::BankSelect(bank) => Some(*bank),
            _ => None,
        })
        .collect()
}

#[test]
fn test_bank_select_cached() {
    let mut h = Harness::new(DriverConfig::default());

    assert_eq!(h.driver.register_read(Bank::UserBank0, bank0::WHO_AM_I), Ok(0xEA));
    assert_eq!(h.driver.register_read(Bank::UserBank0, bank0::PWR_MGMT_1), Ok(0x41));
    h.driver
        .register_write(Bank::UserBank2, bank2::ACCEL_CONFIG, 0x06)
        .unwrap();
    h.driver
        .register_write(Bank::UserBank2, bank2::GYRO_CONFIG_1, 0x06)
        .unwrap();

    let ops = h.device.operations();
    assert_eq!(bank_selects(&ops), vec![Bank::UserBank0, Bank::UserBank2]);
    assert_eq!(h.device.register(Bank::UserBank2, bank2::ACCEL_CONFIG), 0x06);
}

#[test]
fn test_typed_access_selects_marker_bank() {
    let mut h = Harness::new(DriverConfig::default());

    h.driver
        .write_reg::<bank3::Bank3>(bank3::I2C_SLV0_REG, 0x11)
        .unwrap();
    assert_eq!(
        h.driver.read_reg::<bank2::Bank2>(bank2::GYRO_CONFIG_1),
        Ok(0x01)
    );

    assert_eq!(
        bank_selects(&h.device.operations()),
        vec![Bank::UserBank3, Bank::UserBank2]
    );
    assert_eq!(h.device.register(Bank::UserBank3, bank3::I2C_SLV0_REG), 0x11);
}

#[test]
fn test_failed_bank_select_invalidates_cache() {
    let mut h = Harness::new(DriverConfig::default());

    h.driver.register_read(Bank::UserBank0, bank0::WHO_AM_I).unwrap();

    h.device.fail_next_transfers(1);
    assert_eq!(
        h.driver.register_read(Bank::UserBank2, bank2::ACCEL_CONFIG),
        Err(Icm20948Error::InterfaceError)
    );

    h.device.clear_operations();
    h.driver.register_read(Bank::UserBank0, bank0::WHO_AM_I).unwrap();

    // el banco real es desconocido: hay que volver a seleccionarlo
    assert_eq!(bank_selects(&h.device.operations()), vec![Bank::UserBank0]);
}

#[test]
fn test_set_and_clear_bits() {
    let mut h = Harness::new(DriverConfig::default());
    h.device.force_register(Bank::UserBank0, bank0::USER_CTRL, 0x81);

    h.driver
        .register_set_and_clear_bits(Bank::UserBank0, bank0::USER_CTRL, 0x40, 0x80)
        .unwrap();

    assert_eq!(h.device.register(Bank::UserBank0, bank0::USER_CTRL), 0x41);
}

#[test]
fn test_probe() {
    let mut h = Harness::new(DriverConfig::default());
    assert_eq!(h.driver.probe(), Ok(()));

    h.device.force_register(Bank::UserBank0, bank0::WHO_AM_I, 0x12);
    assert_eq!(h.driver.probe(), Err(Icm20948Error::WhoAmIError(0x12)));
    assert_eq!(h.driver.init(), Err(Icm20948Error::WhoAmIError(0x12)));
}

#[test]
fn test_probe_bus_failure() {
    let mut h = Harness::new(DriverConfig::default());
    h.device.fail_next_transfers(1);
    assert_eq!(h.driver.probe(), Err(Icm20948Error::InterfaceError));
}
