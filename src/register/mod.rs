//! Mapa de registros del ICM20948
//!
//! Solo se declaran los registros que usa el controlador de adquisición por FIFO.
//! Las direcciones son relativas a su banco; el banco se selecciona escribiendo
//! `REG_BANK_SEL` (presente en la misma dirección en todos los bancos).

/// Bancos de registros del ICM20948
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Bank {
    /// Banco 0: identificación, energía, interrupciones, FIFO
    UserBank0 = 0,
    /// Banco 1: self-test y offsets (no usado en adquisición)
    UserBank1 = 1,
    /// Banco 2: configuración de giroscopio y acelerómetro
    UserBank2 = 2,
    /// Banco 3: maestro I2C auxiliar
    UserBank3 = 3,
}

impl Bank {
    /// Valor a escribir en `REG_BANK_SEL` (USER_BANK[1:0] en bits 5:4)
    pub const fn select_value(self) -> u8 {
        (self as u8) << 4
    }
}

/// Definición de registros para cada banco
pub mod registers {
    use super::Bank;

    /// Banco asociado a un conjunto de registros
    pub trait RegisterBank {
        const BANK: Bank;
    }

    pub mod bank0 {
        use super::{Bank, RegisterBank};

        /// Registros del Banco 0
        pub struct Bank0;
        impl RegisterBank for Bank0 {
            const BANK: Bank = Bank::UserBank0;
        }

        pub const WHO_AM_I: u8 = 0x00;
        pub const USER_CTRL: u8 = 0x03;
        pub const PWR_MGMT_1: u8 = 0x06;
        pub const INT_PIN_CFG: u8 = 0x0F;
        pub const INT_ENABLE_1: u8 = 0x11;

        pub const TEMP_OUT_H: u8 = 0x39;
        pub const TEMP_OUT_L: u8 = 0x3A;

        pub const EXT_SLV_SENS_DATA_00: u8 = 0x3B;

        // FIFO
        pub const FIFO_EN_2: u8 = 0x67;
        pub const FIFO_RST: u8 = 0x68;
        pub const FIFO_MODE: u8 = 0x69;
        pub const FIFO_COUNTH: u8 = 0x70;
        pub const FIFO_COUNTL: u8 = 0x71;

        pub const REG_BANK_SEL: u8 = 0x7F;
    }

    pub mod bank2 {
        use super::{Bank, RegisterBank};

        /// Registros del Banco 2
        pub struct Bank2;
        impl RegisterBank for Bank2 {
            const BANK: Bank = Bank::UserBank2;
        }

        pub const GYRO_CONFIG_1: u8 = 0x01;
        pub const ACCEL_CONFIG: u8 = 0x14;
    }

    pub mod bank3 {
        use super::{Bank, RegisterBank};

        /// Registros del Banco 3
        pub struct Bank3;
        impl RegisterBank for Bank3 {
            const BANK: Bank = Bank::UserBank3;
        }

        pub const I2C_MST_CTRL: u8 = 0x01;
        pub const I2C_MST_DELAY_CTRL: u8 = 0x02;
        pub const I2C_SLV0_ADDR: u8 = 0x03;
        pub const I2C_SLV0_REG: u8 = 0x04;
        pub const I2C_SLV0_CTRL: u8 = 0x05;
        pub const I2C_SLV0_DO: u8 = 0x06;
        pub const I2C_SLV4_CTRL: u8 = 0x15;
    }
}
