use std::sync::Arc;

use crate::acquisition::DeviceState;
use crate::base::TimeSource;
use crate::config::{DriverConfig, HealthCheckCursor, RegisterConfig};
use crate::conversion::temp_raw_to_celsius;
use crate::interface::Interface;
use crate::interrupt::InterruptState;
use crate::register::registers::{bank0, RegisterBank};
use crate::register::Bank;
use crate::sink::{AuxiliarySensor, DataReadyGpio, SampleSink, Scheduler};
use crate::timing::AcquisitionTiming;
use crate::types::bits::DIR_READ;
use crate::types::data_defs::WHOAMI;
use crate::types::{AccelFullScale, GyroFullScale};

// Define the device structure and enums
pub struct Icm20948<I, T, S> {
    pub(crate) interface: I,
    pub(crate) clock: Arc<T>,
    pub(crate) scheduler: Arc<S>,
    pub(crate) accel: Box<dyn SampleSink>,
    pub(crate) gyro: Box<dyn SampleSink>,
    pub(crate) drdy_gpio: Option<Box<dyn DataReadyGpio>>,
    pub(crate) aux_sensor: Option<Box<dyn AuxiliarySensor>>,
    pub(crate) base_state: BaseState,
    pub(crate) register_config: RegisterConfig,
    pub(crate) timing: AcquisitionTiming,
    pub(crate) interrupt: Arc<InterruptState>,
    pub(crate) counters: DriverCounters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icm20948Error {
    InterfaceError,
    InvalidParameter,
    /// WHO_AM_I inesperado (valor leído)
    WhoAmIError(u8),
}

/// Estado base del dispositivo ICM20948
#[derive(Debug, Clone)]
pub struct BaseState {
    pub state: DeviceState,
    /// Último banco seleccionado; `None` cuando se desconoce el banco del dispositivo
    pub last_register_bank: Option<Bank>,
    pub reset_timestamp: u64,
    pub last_config_check_timestamp: u64,
    pub temperature_update_timestamp: u64,
    pub data_ready_interrupt_enabled: bool,
    pub check_cursor: HealthCheckCursor,
    pub gyro_fullscale: GyroFullScale,
    pub accel_fullscale: AccelFullScale,
    pub temperature_c: f32,
}

impl Default for BaseState {
    fn default() -> Self {
        Self {
            state: DeviceState::Reset,
            last_register_bank: None,
            reset_timestamp: 0,
            last_config_check_timestamp: 0,
            temperature_update_timestamp: 0,
            data_ready_interrupt_enabled: false,
            check_cursor: HealthCheckCursor::default(),
            gyro_fullscale: GyroFullScale::default(),
            accel_fullscale: AccelFullScale::default(),
            temperature_c: f32::NAN,
        }
    }
}

/// Contadores de diagnóstico del controlador
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DriverCounters {
    /// Lecturas de FIFO realizadas
    pub transfers: u64,
    /// Registros encontrados fuera de configuración en régimen permanente
    pub bad_register: u64,
    /// Transferencias fallidas o con datos incoherentes
    pub bad_transfer: u64,
    pub fifo_empty: u64,
    pub fifo_overflow: u64,
    pub fifo_reset: u64,
}

impl<I, T, S> Icm20948<I, T, S>
where
    I: Interface,
    T: TimeSource,
    S: Scheduler,
{
    /// Create a new instance of Icm20948
    pub fn new(
        interface: I,
        clock: Arc<T>,
        scheduler: Arc<S>,
        mut accel: Box<dyn SampleSink>,
        mut gyro: Box<dyn SampleSink>,
        config: DriverConfig,
    ) -> Self {
        let timing = AcquisitionTiming::from_sample_rate(config.sample_rate_hz);
        accel.set_update_rate(timing.update_rate_hz());
        gyro.set_update_rate(timing.update_rate_hz());

        let mut register_config = RegisterConfig::default();
        if config.enable_magnetometer {
            register_config.enable_aux_i2c_master();
        }

        Self {
            interface,
            clock,
            scheduler,
            accel,
            gyro,
            drdy_gpio: None,
            aux_sensor: None,
            base_state: BaseState::default(),
            register_config,
            timing,
            interrupt: Arc::new(InterruptState::new(timing.fifo_gyro_samples)),
            counters: DriverCounters::default(),
        }
    }

    /// Usa la línea data-ready para sincronizar las lecturas del FIFO
    pub fn with_data_ready_gpio(mut self, gpio: Box<dyn DataReadyGpio>) -> Self {
        self.drdy_gpio = Some(gpio);
        self
    }

    /// Conecta un sensor auxiliar al maestro I2C y ajusta los registros del banco 3
    pub fn with_aux_sensor(mut self, sensor: Box<dyn AuxiliarySensor>) -> Self {
        self.register_config.enable_aux_i2c_master();
        self.aux_sensor = Some(sensor);
        self
    }

    /// Sustituye la tabla de registros objetivo
    pub fn with_register_config(mut self, register_config: RegisterConfig) -> Self {
        self.register_config = register_config;
        self.base_state.check_cursor = HealthCheckCursor::default();
        self
    }

    pub fn state(&self) -> DeviceState {
        self.base_state.state
    }

    pub fn timing(&self) -> &AcquisitionTiming {
        &self.timing
    }

    pub fn counters(&self) -> DriverCounters {
        self.counters
    }

    pub fn register_config(&self) -> &RegisterConfig {
        &self.register_config
    }

    pub fn interrupt_state(&self) -> &Arc<InterruptState> {
        &self.interrupt
    }

    pub fn check_cursor(&self) -> HealthCheckCursor {
        self.base_state.check_cursor
    }

    pub fn temperature(&self) -> f32 {
        self.base_state.temperature_c
    }

    pub fn accel_fullscale(&self) -> AccelFullScale {
        self.base_state.accel_fullscale
    }

    pub fn gyro_fullscale(&self) -> GyroFullScale {
        self.base_state.gyro_fullscale
    }

    /// Consume el controlador y devuelve la interfaz subyacente
    pub fn release(self) -> I {
        self.interface
    }

    /// Transferencia cruda sobre la interfaz
    pub(crate) fn transfer(&mut self, data: &mut [u8]) -> Result<(), Icm20948Error> {
        self.interface.transfer(data).map_err(|e| {
            log::debug!("transfer failed: {:?}", e);
            Icm20948Error::InterfaceError
        })
    }

    /// Selecciona el banco solo si difiere del último seleccionado
    pub(crate) fn select_register_bank(&mut self, bank: Bank) -> Result<(), Icm20948Error> {
        if self.base_state.last_register_bank == Some(bank) {
            return Ok(());
        }

        let mut cmd = [bank0::REG_BANK_SEL, bank.select_value()];
        match self.transfer(&mut cmd) {
            Ok(()) => {
                self.base_state.last_register_bank = Some(bank);
                Ok(())
            }
            Err(e) => {
                // el banco real es desconocido
                self.base_state.last_register_bank = None;
                Err(e)
            }
        }
    }

    /// Olvida el banco cacheado (p. ej. tras un reset del dispositivo)
    pub(crate) fn invalidate_register_bank(&mut self) {
        self.base_state.last_register_bank = None;
    }

    pub fn register_read(&mut self, bank: Bank, reg: u8) -> Result<u8, Icm20948Error> {
        self.select_register_bank(bank)?;

        let mut cmd = [reg | DIR_READ, 0];
        self.transfer(&mut cmd)?;
        Ok(cmd[1])
    }

    pub fn register_write(&mut self, bank: Bank, reg: u8, value: u8) -> Result<(), Icm20948Error> {
        self.select_register_bank(bank)?;

        let mut cmd = [reg, value];
        self.transfer(&mut cmd)
    }

    /// Lee un registro de un banco específico
    pub fn read_reg<B: RegisterBank>(&mut self, reg: u8) -> Result<u8, Icm20948Error> {
        self.register_read(B::BANK, reg)
    }

    /// Escribe en un registro de un banco específico
    pub fn write_reg<B: RegisterBank>(&mut self, reg: u8, value: u8) -> Result<(), Icm20948Error> {
        self.register_write(B::BANK, reg, value)
    }

    /// Lectura-modificación-escritura: activa `set_bits` y limpia `clear_bits`
    pub fn register_set_and_clear_bits(
        &mut self,
        bank: Bank,
        reg: u8,
        set_bits: u8,
        clear_bits: u8,
    ) -> Result<(), Icm20948Error> {
        let orig = self.register_read(bank, reg)?;
        let value = (orig | set_bits) & !clear_bits;
        self.register_write(bank, reg, value)
    }

    pub fn register_set_bits(&mut self, bank: Bank, reg: u8, set_bits: u8) -> Result<(), Icm20948Error> {
        self.register_set_and_clear_bits(bank, reg, set_bits, 0)
    }

    pub fn register_clear_bits(
        &mut self,
        bank: Bank,
        reg: u8,
        clear_bits: u8,
    ) -> Result<(), Icm20948Error> {
        self.register_set_and_clear_bits(bank, reg, 0, clear_bits)
    }

    /// Get device ID (WHO_AM_I register)
    pub fn get_whoami(&mut self) -> Result<u8, Icm20948Error> {
        self.read_reg::<bank0::Bank0>(bank0::WHO_AM_I)
    }

    /// Comprueba que hay un ICM20948 al otro lado del bus
    pub fn probe(&mut self) -> Result<(), Icm20948Error> {
        let whoami = self.get_whoami()?;

        if whoami != WHOAMI {
            log::debug!("unexpected WHO_AM_I 0x{:02x}", whoami);
            return Err(Icm20948Error::WhoAmIError(whoami));
        }

        Ok(())
    }

    /// Lee la temperatura y la propaga a los sensores
    pub fn update_temperature(&mut self) -> Result<f32, Icm20948Error> {
        let mut buf = [0u8; 3];
        buf[0] = bank0::TEMP_OUT_H | DIR_READ;

        let result = self
            .select_register_bank(Bank::UserBank0)
            .and_then(|_| self.transfer(&mut buf));

        if let Err(e) = result {
            self.counters.bad_transfer += 1;
            return Err(e);
        }

        let temperature = temp_raw_to_celsius(i16::from_be_bytes([buf[1], buf[2]]));

        if temperature.is_finite() {
            self.base_state.temperature_c = temperature;
            self.accel.set_temperature(temperature);
            self.gyro.set_temperature(temperature);

            if let Some(aux) = self.aux_sensor.as_mut() {
                aux.set_temperature(temperature);
            }
        }

        Ok(temperature)
    }

    /// Vuelca el estado de diagnóstico en el log
    pub fn print_status(&self) {
        let interval = self.timing.fifo_empty_interval_us;
        log::info!(
            "FIFO empty interval: {} us ({:.3} Hz)",
            interval,
            self.timing.update_rate_hz()
        );
        log::info!("state: {:?}", self.base_state.state);
        log::info!("transfers: {}", self.counters.transfers);
        log::info!("bad registers: {}", self.counters.bad_register);
        log::info!("bad transfers: {}", self.counters.bad_transfer);
        log::info!("FIFO empty: {}", self.counters.fifo_empty);
        log::info!("FIFO overflow: {}", self.counters.fifo_overflow);
        log::info!("FIFO reset: {}", self.counters.fifo_reset);
        log::info!("data ready interrupts: {}", self.interrupt.data_ready_events());

        self.accel.print_status();
        self.gyro.print_status();

        if let Some(aux) = self.aux_sensor.as_ref() {
            aux.print_info();
        }
    }
}
