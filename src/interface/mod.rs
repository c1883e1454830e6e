//! Módulo de abstracción para interfaces de comunicación con el dispositivo ICM20948
//!
//! El controlador trabaja con transferencias full-duplex al estilo SPI: el primer
//! byte del buffer es la dirección del registro (con `DIR_READ` para lecturas) y la
//! respuesta se escribe sobre el mismo buffer, a partir del byte 1.

use core::fmt::Debug;

use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;

use crate::device::Icm20948Error;
use crate::types::bits::DIR_READ;

/// Error genérico para interfaces de comunicación
#[derive(Debug, Clone)]
pub enum InterfaceError<E> {
    /// Error de comunicación I2C
    I2cError(E),
    /// Error de comunicación SPI
    SpiError(E),
    /// Parámetro inválido
    InvalidParameter,
}

/// Trait para abstraer la comunicación con el dispositivo ICM20948
pub trait Interface {
    /// Tipo de error que puede producir la interfaz
    type Error: Debug;

    /// Transferencia in-place: `data[0]` es el comando, el resto se sobrescribe
    /// con la respuesta del dispositivo.
    fn transfer(&mut self, data: &mut [u8]) -> Result<(), Self::Error>;
}

/// Implementación de Interface para SPI
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    /// Crea una nueva interfaz SPI
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Consume la interfaz y devuelve el dispositivo SPI subyacente
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Interface for SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    type Error = InterfaceError<SPI::Error>;

    fn transfer(&mut self, data: &mut [u8]) -> Result<(), Self::Error> {
        if data.is_empty() {
            return Err(InterfaceError::InvalidParameter);
        }

        self.spi
            .transfer_in_place(data)
            .map_err(InterfaceError::SpiError)
    }
}

/// Implementación de Interface para I2C
///
/// Traduce la transferencia SPI a `write_read` (lecturas) o `write` (escrituras).
pub struct I2cInterface<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C> I2cInterface<I2C>
where
    I2C: I2c,
{
    /// Crea una nueva interfaz I2C
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Consume la interfaz y devuelve el dispositivo I2C subyacente
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Interface for I2cInterface<I2C>
where
    I2C: I2c,
{
    type Error = InterfaceError<I2C::Error>;

    fn transfer(&mut self, data: &mut [u8]) -> Result<(), Self::Error> {
        let Some((cmd, payload)) = data.split_first_mut() else {
            return Err(InterfaceError::InvalidParameter);
        };

        if *cmd & DIR_READ != 0 {
            let reg = *cmd & !DIR_READ;
            self.i2c
                .write_read(self.addr, &[reg], payload)
                .map_err(InterfaceError::I2cError)
        } else {
            self.i2c.write(self.addr, data).map_err(InterfaceError::I2cError)
        }
    }
}

// Implementación que permite convertir errores de la interfaz a Icm20948Error
impl<E: Debug> From<InterfaceError<E>> for Icm20948Error {
    fn from(error: InterfaceError<E>) -> Self {
        match error {
            InterfaceError::I2cError(e) | InterfaceError::SpiError(e) => {
                log::debug!("bus error: {:?}", e);
                Icm20948Error::InterfaceError
            }
            InterfaceError::InvalidParameter => Icm20948Error::InvalidParameter,
        }
    }
}
