//! Máquina de estados de adquisición
//!
//! `run` se invoca cada vez que el planificador dispara. Cada invocación
//! ejecuta un paso del estado actual y deja programada la siguiente.

use crate::base::TimeSource;
use crate::device::{Icm20948, Icm20948Error};
use crate::interface::Interface;
use crate::interrupt::data_ready_callback;
use crate::register::registers::bank0;
use crate::register::Bank;
use crate::sink::Scheduler;
use crate::sync::{plan_fifo_read, samples_from_fifo_count, watermark_is_stale, FifoReadPlan};
use crate::types::bits::DEVICE_RESET;
use crate::types::data_defs::{PWR_MGMT_1_RESET_VALUE, WHOAMI};

/// Espera tras pedir el reset y entre comprobaciones
pub const RESET_POLL_INTERVAL_US: u64 = 10_000;
/// Tiempo máximo para completar un reset
pub const RESET_TIMEOUT_US: u64 = 100_000;
/// Espera antes de reintentar un reset fallido
pub const RESET_RETRY_DELAY_US: u64 = 100_000;
pub const CONFIGURE_RETRY_DELAY_US: u64 = 10_000;
/// Reprogramación de respaldo cuando se usa data-ready
pub const DATA_READY_WATCHDOG_US: u64 = 10_000;
/// Periodo mínimo de la verificación de registros
pub const CONFIG_CHECK_INTERVAL_US: u64 = 10_000;
pub const TEMPERATURE_UPDATE_INTERVAL_US: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Reset,
    WaitForReset,
    Configure,
    FifoRead,
}

impl<I, T, S> Icm20948<I, T, S>
where
    I: Interface,
    T: TimeSource + Send + Sync + 'static,
    S: Scheduler + Send + Sync + 'static,
{
    /// Comprueba el dispositivo y arranca la secuencia de reset
    pub fn init(&mut self) -> Result<(), Icm20948Error> {
        self.probe()?;
        self.reset();
        Ok(())
    }

    /// Reinicia la máquina de estados desde `Reset`
    pub fn reset(&mut self) {
        self.base_state.state = DeviceState::Reset;
        self.scheduler.schedule_clear();
        self.scheduler.schedule_now();
    }

    /// Desactiva la interrupción y cancela cualquier ejecución pendiente
    pub fn exit_and_cleanup(&mut self) {
        self.data_ready_interrupt_disable();
        self.scheduler.schedule_clear();
    }

    /// Un paso de la máquina de estados
    pub fn run(&mut self) {
        match self.base_state.state {
            DeviceState::Reset => self.run_reset(),
            DeviceState::WaitForReset => self.run_wait_for_reset(),
            DeviceState::Configure => self.run_configure(),
            DeviceState::FifoRead => self.run_fifo_read(),
        }
    }

    fn run_reset(&mut self) {
        if let Err(e) = self.register_write(Bank::UserBank0, bank0::PWR_MGMT_1, DEVICE_RESET) {
            log::debug!("device reset write failed: {:?}", e);
        }

        // el reset devuelve el dispositivo al banco 0
        self.invalidate_register_bank();

        self.base_state.reset_timestamp = self.clock.get_timestamp_us();
        self.base_state.state = DeviceState::WaitForReset;
        self.scheduler.schedule_delayed(RESET_POLL_INTERVAL_US);
    }

    fn run_wait_for_reset(&mut self) {
        let whoami = self.register_read(Bank::UserBank0, bank0::WHO_AM_I);
        let pwr_mgmt_1 = self.register_read(Bank::UserBank0, bank0::PWR_MGMT_1);

        if whoami == Ok(WHOAMI) && pwr_mgmt_1 == Ok(PWR_MGMT_1_RESET_VALUE) {
            self.base_state.state = DeviceState::Configure;
            self.scheduler.schedule_delayed(RESET_POLL_INTERVAL_US);
        } else if self.clock.elapsed_us(self.base_state.reset_timestamp) > RESET_TIMEOUT_US {
            log::debug!("Reset failed, retrying");
            self.base_state.state = DeviceState::Reset;
            self.scheduler.schedule_delayed(RESET_RETRY_DELAY_US);
        } else {
            log::debug!("Reset not complete, check again in 10 ms");
            self.scheduler.schedule_delayed(RESET_POLL_INTERVAL_US);
        }
    }

    fn run_configure(&mut self) {
        if !self.configure() {
            log::debug!("Configure failed, retrying");
            self.scheduler.schedule_delayed(CONFIGURE_RETRY_DELAY_US);
            return;
        }

        if let Some(mut aux) = self.aux_sensor.take() {
            aux.reset(self);
            self.aux_sensor = Some(aux);
        }

        self.base_state.state = DeviceState::FifoRead;

        if self.data_ready_interrupt_configure() {
            self.base_state.data_ready_interrupt_enabled = true;
            self.scheduler.schedule_delayed(DATA_READY_WATCHDOG_US);
        } else {
            self.base_state.data_ready_interrupt_enabled = false;
            let interval = self.timing.fifo_empty_interval_us as u64;
            self.scheduler.schedule_on_interval(interval, interval);
        }

        self.fifo_reset();
    }

    /// Muestras en el FIFO según su contador; 0 si no se pudo leer
    fn fifo_samples_from_count(&mut self) -> u16 {
        samples_from_fifo_count(self.fifo_read_count().unwrap_or(0))
    }

    fn run_fifo_read(&mut self) {
        let mut timestamp_sample = 0;
        let mut samples = 0;

        if self.base_state.data_ready_interrupt_enabled {
            self.scheduler.schedule_delayed(DATA_READY_WATCHDOG_US);

            let (watermark_samples, watermark_timestamp) = self.interrupt.take_watermark();
            samples = if self.interrupt.force_fifo_count_check() {
                self.fifo_samples_from_count()
            } else {
                watermark_samples
            };
            timestamp_sample = watermark_timestamp;
        }

        let now = self.clock.get_timestamp_us();
        let interval = self.timing.fifo_empty_interval_us;

        if !self.base_state.data_ready_interrupt_enabled
            || samples == 0
            || watermark_is_stale(now, timestamp_sample, interval)
        {
            timestamp_sample = now;
            samples = self.fifo_samples_from_count();
        }

        let mut failure = false;

        match plan_fifo_read(samples) {
            FifoReadPlan::Overflow => {
                failure = true;
                self.counters.fifo_overflow += 1;
                self.fifo_reset();
            }
            FifoReadPlan::Read(samples) => {
                if !self.fifo_read(timestamp_sample, samples) {
                    failure = true;
                    self.accel.increase_error_count();
                    self.gyro.increase_error_count();
                }
            }
            FifoReadPlan::Empty => {
                failure = true;
                self.counters.fifo_empty += 1;
            }
        }

        if failure
            || self.clock.elapsed_us(self.base_state.last_config_check_timestamp)
                > CONFIG_CHECK_INTERVAL_US
        {
            if self.health_check_step() {
                self.base_state.last_config_check_timestamp = timestamp_sample;
            } else {
                log::debug!("Health check failed, reconfiguring");
                self.base_state.state = DeviceState::Configure;
                self.scheduler.schedule_now();
            }
        } else if self.clock.elapsed_us(self.base_state.temperature_update_timestamp)
            > TEMPERATURE_UPDATE_INTERVAL_US
        {
            // el error ya queda contado
            let _ = self.update_temperature();
            self.base_state.temperature_update_timestamp = timestamp_sample;
        }
    }

    /// Registra el callback de data-ready. `false` si no hay línea disponible.
    pub fn data_ready_interrupt_configure(&mut self) -> bool {
        let callback = data_ready_callback(
            self.interrupt.clone(),
            self.clock.clone(),
            self.scheduler.clone(),
        );

        match self.drdy_gpio.as_mut() {
            Some(gpio) => gpio.enable_falling_edge(callback),
            None => false,
        }
    }

    pub fn data_ready_interrupt_disable(&mut self) -> bool {
        self.base_state.data_ready_interrupt_enabled = false;

        match self.drdy_gpio.as_mut() {
            Some(gpio) => gpio.disable(),
            None => false,
        }
    }
}
