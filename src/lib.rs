//! Controlador de adquisición por FIFO para el IMU InvenSense ICM20948
//!
//! El controlador resetea y configura el dispositivo, vacía el FIFO de forma
//! periódica o sincronizada con la línea data-ready, decodifica las tramas de
//! acelerómetro y giroscopio y vigila que los registros sigan configurados.
//!
//! La publicación de muestras, la planificación y el reloj se delegan en los
//! traits de [`sink`] y [`base`].

use std::sync::Arc;

use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;

// Importaciones internas
pub mod acquisition;
pub mod aux;
pub mod base;
pub mod config;
pub mod conversion;
pub mod device;
pub mod fifo;
pub mod interface;
pub mod interrupt;
pub mod register;
pub mod sink;
pub mod sync;
pub mod timing;
pub mod types;

// Re-exports públicos
pub use acquisition::DeviceState;
pub use base::{ManualTimeSource, MonotonicTimeSource, TimeSource};
pub use config::{DriverConfig, RegisterConfig, RegisterSpec};
pub use device::{DriverCounters, Icm20948, Icm20948Error};
pub use sink::{
    AuxI2cMaster, AuxiliarySensor, DataReadyCallback, DataReadyGpio, FifoSample, SampleSink,
    Scheduler,
};
pub use timing::AcquisitionTiming;
pub use types::{AccelFullScale, GyroFullScale};

use crate::interface::{I2cInterface, SpiInterface};

/// Crea un nuevo dispositivo ICM20948 usando el bus I2C
pub fn new_i2c_device<I2C, T, S>(
    i2c: I2C,
    address: u8,
    clock: Arc<T>,
    scheduler: Arc<S>,
    accel: Box<dyn SampleSink>,
    gyro: Box<dyn SampleSink>,
    config: DriverConfig,
) -> Icm20948<I2cInterface<I2C>, T, S>
where
    I2C: I2c,
    T: TimeSource,
    S: Scheduler,
{
    let interface = I2cInterface::new(i2c, address);

    // con el host en I2C no se puede activar I2C_IF_DIS
    let mut register_config = RegisterConfig::default();
    if config.enable_magnetometer {
        register_config.enable_aux_i2c_master();
    }
    register_config.keep_i2c_interface();

    Icm20948::new(interface, clock, scheduler, accel, gyro, config)
        .with_register_config(register_config)
}

/// Crea un nuevo dispositivo ICM20948 usando un dispositivo SPI
pub fn new_spi_device<SPI, T, S>(
    spi: SPI,
    clock: Arc<T>,
    scheduler: Arc<S>,
    accel: Box<dyn SampleSink>,
    gyro: Box<dyn SampleSink>,
    config: DriverConfig,
) -> Icm20948<SpiInterface<SPI>, T, S>
where
    SPI: SpiDevice,
    T: TimeSource,
    S: Scheduler,
{
    let interface = SpiInterface::new(spi);
    Icm20948::new(interface, clock, scheduler, accel, gyro, config)
}
