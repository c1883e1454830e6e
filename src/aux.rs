//! Maestro I2C auxiliar (SLV0) para sensores conectados detrás del ICM20948

use crate::base::TimeSource;
use crate::device::{Icm20948, Icm20948Error};
use crate::interface::Interface;
use crate::register::registers::bank3::{self, Bank3};
use crate::register::registers::bank0;
use crate::register::Bank;
use crate::sink::{AuxI2cMaster, Scheduler};
use crate::types::bits::{DIR_READ, I2C_SLV0_EN, I2C_SLV0_RNW};

/// Bytes disponibles en EXT_SLV_SENS_DATA_00..23
pub const EXT_SENS_DATA_MAX: usize = 24;

impl<I, T, S> Icm20948<I, T, S>
where
    I: Interface,
    T: TimeSource,
    S: Scheduler,
{
    fn slv0_write(&mut self, addr: u8, reg: u8, val: u8) -> Result<(), Icm20948Error> {
        self.write_reg::<Bank3>(bank3::I2C_SLV0_ADDR, addr)?;
        self.write_reg::<Bank3>(bank3::I2C_SLV0_REG, reg)?;
        self.write_reg::<Bank3>(bank3::I2C_SLV0_DO, val)?;
        self.register_set_bits(Bank::UserBank3, bank3::I2C_SLV0_CTRL, I2C_SLV0_EN | 1)
    }

    fn slv0_read_enable(&mut self, addr: u8, reg: u8, size: u8) -> Result<(), Icm20948Error> {
        self.write_reg::<Bank3>(bank3::I2C_SLV0_ADDR, addr | I2C_SLV0_RNW)?;
        self.write_reg::<Bank3>(bank3::I2C_SLV0_REG, reg)?;
        self.write_reg::<Bank3>(bank3::I2C_SLV0_CTRL, size | I2C_SLV0_EN)
    }
}

impl<I, T, S> AuxI2cMaster for Icm20948<I, T, S>
where
    I: Interface,
    T: TimeSource,
    S: Scheduler,
{
    fn slave_register_write(&mut self, addr: u8, reg: u8, val: u8) -> bool {
        match self.slv0_write(addr, reg, val) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("aux write 0x{:02x}/0x{:02x} failed: {:?}", addr, reg, e);
                false
            }
        }
    }

    fn slave_register_start_read(&mut self, addr: u8, reg: u8) -> bool {
        self.external_sensor_data_enable(addr, reg, 1)
    }

    fn external_sensor_data_enable(&mut self, addr: u8, reg: u8, size: u8) -> bool {
        if size as usize > EXT_SENS_DATA_MAX {
            return false;
        }

        match self.slv0_read_enable(addr, reg, size) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("aux read enable 0x{:02x}/0x{:02x} failed: {:?}", addr, reg, e);
                false
            }
        }
    }

    fn external_sensor_data_read(&mut self, buffer: &mut [u8]) -> bool {
        let length = buffer.len();
        if length > EXT_SENS_DATA_MAX {
            return false;
        }

        let mut transfer_buffer = [0u8; EXT_SENS_DATA_MAX + 1];
        transfer_buffer[0] = bank0::EXT_SLV_SENS_DATA_00 | DIR_READ;

        let result = self
            .select_register_bank(Bank::UserBank0)
            .and_then(|_| self.transfer(&mut transfer_buffer[..length + 1]));

        buffer.copy_from_slice(&transfer_buffer[1..length + 1]);

        if result.is_err() {
            self.counters.bad_transfer += 1;
            return false;
        }

        true
    }
}
