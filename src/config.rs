//! Configuración objetivo de registros y verificación periódica
//!
//! Cada banco tiene una tabla de `RegisterSpec` con los bits que deben estar a
//! 1 y a 0. `configure` aplica las tablas completas; en régimen permanente se
//! comprueba un registro por banco en cada ciclo, rotando por las tablas.

use crate::base::TimeSource;
use crate::conversion::{accel_scale_and_range, gyro_scale_and_range};
use crate::device::Icm20948;
use crate::interface::Interface;
use crate::register::registers::{bank0, bank2, bank3};
use crate::register::Bank;
use crate::sink::Scheduler;
use crate::types::bits;
use crate::types::data_defs::DEFAULT_SAMPLE_RATE;
use crate::types::{AccelFullScale, GyroFullScale};

/// Opciones del controlador
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Tasa de salida pedida (Hz); 0 usa la tasa por defecto
    pub sample_rate_hz: u32,
    /// Arranca el maestro I2C auxiliar para el magnetómetro
    pub enable_magnetometer: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE,
            enable_magnetometer: false,
        }
    }
}

/// Valor objetivo de un registro: bits que deben estar a 1 y bits a 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSpec {
    pub bank: Bank,
    pub reg: u8,
    pub set_bits: u8,
    pub clear_bits: u8,
}

impl RegisterSpec {
    pub const fn new(bank: Bank, reg: u8, set_bits: u8, clear_bits: u8) -> Self {
        Self {
            bank,
            reg,
            set_bits,
            clear_bits,
        }
    }

    /// El valor leído cumple la especificación
    pub fn is_satisfied_by(&self, value: u8) -> bool {
        (value & self.set_bits) == self.set_bits && (value & self.clear_bits) == 0
    }

    /// Valor corregido a partir del leído
    pub fn corrected(&self, value: u8) -> u8 {
        (value | self.set_bits) & !self.clear_bits
    }
}

const BANK0_CFG: [RegisterSpec; 6] = [
    RegisterSpec::new(
        Bank::UserBank0,
        bank0::USER_CTRL,
        bits::FIFO_EN | bits::I2C_MST_EN | bits::I2C_IF_DIS,
        bits::DMP_EN,
    ),
    RegisterSpec::new(
        Bank::UserBank0,
        bank0::PWR_MGMT_1,
        bits::CLKSEL_0,
        bits::DEVICE_RESET | bits::SLEEP,
    ),
    RegisterSpec::new(Bank::UserBank0, bank0::INT_PIN_CFG, bits::INT1_ACTL, 0),
    RegisterSpec::new(Bank::UserBank0, bank0::INT_ENABLE_1, bits::RAW_DATA_0_RDY_EN, 0),
    RegisterSpec::new(
        Bank::UserBank0,
        bank0::FIFO_EN_2,
        bits::ACCEL_FIFO_EN
            | bits::GYRO_Z_FIFO_EN
            | bits::GYRO_Y_FIFO_EN
            | bits::GYRO_X_FIFO_EN
            | bits::TEMP_FIFO_EN,
        0,
    ),
    RegisterSpec::new(Bank::UserBank0, bank0::FIFO_MODE, bits::FIFO_MODE_SNAPSHOT, 0),
];

const BANK2_CFG: [RegisterSpec; 2] = [
    RegisterSpec::new(
        Bank::UserBank2,
        bank2::GYRO_CONFIG_1,
        bits::GYRO_FS_SEL_2000_DPS,
        bits::GYRO_FCHOICE,
    ),
    RegisterSpec::new(
        Bank::UserBank2,
        bank2::ACCEL_CONFIG,
        bits::ACCEL_FS_SEL_16G,
        bits::ACCEL_FCHOICE,
    ),
];

const BANK3_CFG: [RegisterSpec; 3] = [
    RegisterSpec::new(Bank::UserBank3, bank3::I2C_MST_CTRL, 0, 0),
    RegisterSpec::new(Bank::UserBank3, bank3::I2C_MST_DELAY_CTRL, 0, 0),
    RegisterSpec::new(Bank::UserBank3, bank3::I2C_SLV4_CTRL, 0, 0),
];

/// Tablas de registros objetivo por banco
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterConfig {
    pub bank0: Vec<RegisterSpec>,
    pub bank2: Vec<RegisterSpec>,
    pub bank3: Vec<RegisterSpec>,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            bank0: BANK0_CFG.to_vec(),
            bank2: BANK2_CFG.to_vec(),
            bank3: BANK3_CFG.to_vec(),
        }
    }
}

impl RegisterConfig {
    pub fn new(bank0: &[RegisterSpec], bank2: &[RegisterSpec], bank3: &[RegisterSpec]) -> Self {
        Self {
            bank0: bank0.to_vec(),
            bank2: bank2.to_vec(),
            bank3: bank3.to_vec(),
        }
    }

    fn find_mut(&mut self, bank: Bank, reg: u8) -> Option<&mut RegisterSpec> {
        let table = match bank {
            Bank::UserBank0 => &mut self.bank0,
            Bank::UserBank2 => &mut self.bank2,
            Bank::UserBank3 => &mut self.bank3,
            Bank::UserBank1 => return None,
        };
        table.iter_mut().find(|r| r.reg == reg)
    }

    /// Objetivos del banco 3 cuando hay un sensor en el maestro I2C auxiliar
    pub fn enable_aux_i2c_master(&mut self) {
        if let Some(r) = self.find_mut(Bank::UserBank3, bank3::I2C_SLV4_CTRL) {
            r.set_bits = bits::I2C_MST_DLY;
        }
        if let Some(r) = self.find_mut(Bank::UserBank3, bank3::I2C_MST_CTRL) {
            r.set_bits = bits::I2C_MST_P_NSR | bits::I2C_MST_CLK_400_KHZ;
        }
        if let Some(r) = self.find_mut(Bank::UserBank3, bank3::I2C_MST_DELAY_CTRL) {
            r.set_bits = bits::I2C_SLVX_DLY_EN;
        }
    }

    /// Con el host en I2C no se puede desactivar la interfaz I2C del dispositivo
    pub fn keep_i2c_interface(&mut self) {
        if let Some(r) = self.find_mut(Bank::UserBank0, bank0::USER_CTRL) {
            r.set_bits &= !bits::I2C_IF_DIS;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterSpec> + '_ {
        self.bank0.iter().chain(self.bank2.iter()).chain(self.bank3.iter())
    }

    pub fn len(&self) -> usize {
        self.bank0.len() + self.bank2.len() + self.bank3.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Posición de la verificación rotatoria en cada tabla
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheckCursor {
    pub bank0: usize,
    pub bank2: usize,
    pub bank3: usize,
}

impl HealthCheckCursor {
    /// Registros a comprobar en el ciclo actual (uno por banco no vacío)
    pub fn current(&self, config: &RegisterConfig) -> Vec<RegisterSpec> {
        [
            (&config.bank0, self.bank0),
            (&config.bank2, self.bank2),
            (&config.bank3, self.bank3),
        ]
        .into_iter()
        .filter_map(|(table, i)| table.get(i % table.len().max(1)).copied())
        .collect()
    }

    /// Avanza una posición en cada tabla, volviendo al principio al final
    pub fn advanced(self, config: &RegisterConfig) -> Self {
        let next = |i: usize, len: usize| if len == 0 { 0 } else { (i + 1) % len };

        Self {
            bank0: next(self.bank0, config.bank0.len()),
            bank2: next(self.bank2, config.bank2.len()),
            bank3: next(self.bank3, config.bank3.len()),
        }
    }
}

impl<I, T, S> Icm20948<I, T, S>
where
    I: Interface,
    T: TimeSource,
    S: Scheduler,
{
    /// Comprueba un registro y lo corrige si no cumple. Con `notify` el fallo
    /// cuenta como registro incorrecto y como error en ambos sensores.
    pub fn register_check(&mut self, spec: &RegisterSpec, notify: bool) -> bool {
        let value = match self.register_read(spec.bank, spec.reg) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("{:?} 0x{:02x}: read failed: {:?}", spec.bank, spec.reg, e);
                self.counters.bad_transfer += 1;
                return false;
            }
        };

        if spec.is_satisfied_by(value) {
            return true;
        }

        if value & spec.set_bits != spec.set_bits {
            log::debug!(
                "0x{:02x}: 0x{:02x} (0x{:02x} not set)",
                spec.reg,
                value,
                spec.set_bits
            );
        }
        if value & spec.clear_bits != 0 {
            log::debug!(
                "0x{:02x}: 0x{:02x} (0x{:02x} not cleared)",
                spec.reg,
                value,
                spec.clear_bits
            );
        }

        if let Err(e) = self.register_write(spec.bank, spec.reg, spec.corrected(value)) {
            log::debug!("0x{:02x}: correction failed: {:?}", spec.reg, e);
            self.counters.bad_transfer += 1;
        }

        if notify {
            self.counters.bad_register += 1;
            self.accel.increase_error_count();
            self.gyro.increase_error_count();
        }

        false
    }

    /// Aplica todas las tablas y relee las escalas. Devuelve `true` solo si
    /// todos los registros ya cumplían.
    pub fn configure(&mut self) -> bool {
        let specs: Vec<RegisterSpec> = self.register_config.iter().copied().collect();

        let mut success = true;
        for spec in &specs {
            if !self.register_check(spec, false) {
                success = false;
            }
        }

        self.configure_accel();
        self.configure_gyro();

        success
    }

    /// Un paso de la verificación rotatoria. Se detiene en el primer fallo.
    pub fn health_check_step(&mut self) -> bool {
        let specs = self.base_state.check_cursor.current(&self.register_config);

        for spec in &specs {
            if !self.register_check(spec, true) {
                return false;
            }
        }

        self.base_state.check_cursor = self.base_state.check_cursor.advanced(&self.register_config);
        true
    }

    /// Lee la escala del acelerómetro y la propaga al sensor
    pub fn configure_accel(&mut self) {
        match self.read_reg::<bank2::Bank2>(bank2::ACCEL_CONFIG) {
            Ok(value) => {
                let fs = AccelFullScale::from(value & bits::ACCEL_FS_SEL);
                let (scale, range) = accel_scale_and_range(fs);
                self.accel.set_scale(scale);
                self.accel.set_range(range);
                self.base_state.accel_fullscale = fs;
            }
            Err(e) => {
                log::debug!("ACCEL_CONFIG read failed: {:?}", e);
                self.counters.bad_transfer += 1;
            }
        }
    }

    /// Lee la escala del giroscopio y la propaga al sensor
    pub fn configure_gyro(&mut self) {
        match self.read_reg::<bank2::Bank2>(bank2::GYRO_CONFIG_1) {
            Ok(value) => {
                let fs = GyroFullScale::from(value & bits::GYRO_FS_SEL);
                let (scale, range) = gyro_scale_and_range(fs);
                self.gyro.set_scale(scale);
                self.gyro.set_range(range);
                self.base_state.gyro_fullscale = fs;
            }
            Err(e) => {
                log::debug!("GYRO_CONFIG_1 read failed: {:?}", e);
                self.counters.bad_transfer += 1;
            }
        }
    }
}
