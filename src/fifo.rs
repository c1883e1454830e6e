//! Implementación para manejar el FIFO del ICM20948
//!
//! El FIFO contiene tramas de 14 bytes (acelerómetro, giroscopio, temperatura)
//! escritas a la tasa del giroscopio. El acelerómetro va a la mitad de tasa, así
//! que cada lectura suya aparece duplicada en dos tramas consecutivas.

use bytemuck::{Pod, Zeroable};

use crate::base::TimeSource;
use crate::conversion::flu_to_frd;
use crate::device::{Icm20948, Icm20948Error};
use crate::interface::Interface;
use crate::register::registers::bank0;
use crate::register::Bank;
use crate::sink::{FifoSample, Scheduler};
use crate::sync::{fifo_count_check_needed, transfer_size};
use crate::types::bits::{DIR_READ, FIFO_RESET};
use crate::types::data_defs::{FIFO_FRAME_SIZE, FIFO_MAX_SAMPLES, FIFO_SIZE};

/// Comando + FIFO_COUNTH + FIFO_COUNTL
pub const FIFO_HEADER_SIZE: usize = 3;
/// Tamaño del buffer de una lectura completa
pub const FIFO_TRANSFER_BUFFER_SIZE: usize =
    FIFO_HEADER_SIZE + FIFO_MAX_SAMPLES as usize * FIFO_FRAME_SIZE;

/// Trama del FIFO tal como llega del dispositivo (big-endian)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct FifoFrame {
    pub accel: [u8; 6],
    pub gyro: [u8; 6],
    pub temp: [u8; 2],
}

fn combine_xyz(raw: &[u8; 6]) -> [i16; 3] {
    [
        i16::from_be_bytes([raw[0], raw[1]]),
        i16::from_be_bytes([raw[2], raw[3]]),
        i16::from_be_bytes([raw[4], raw[5]]),
    ]
}

impl FifoFrame {
    pub fn accel_raw(&self) -> [i16; 3] {
        combine_xyz(&self.accel)
    }

    pub fn gyro_raw(&self) -> [i16; 3] {
        combine_xyz(&self.gyro)
    }

    /// Mismo contenido de acelerómetro (comparación de bytes)
    pub fn accel_equal(&self, other: &FifoFrame) -> bool {
        self.accel == other.accel
    }
}

/// Buffer de una lectura en ráfaga desde FIFO_COUNTH
pub struct FifoTransferBuffer {
    bytes: [u8; FIFO_TRANSFER_BUFFER_SIZE],
}

impl FifoTransferBuffer {
    pub fn new() -> Self {
        let mut bytes = [0u8; FIFO_TRANSFER_BUFFER_SIZE];
        bytes[0] = bank0::FIFO_COUNTH | DIR_READ;
        Self { bytes }
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Bytes en el FIFO según el contador leído en la misma ráfaga
    pub fn fifo_count(&self) -> u16 {
        u16::from_be_bytes([self.bytes[1], self.bytes[2]])
    }

    pub fn frames(&self) -> &[FifoFrame] {
        bytemuck::cast_slice(&self.bytes[FIFO_HEADER_SIZE..])
    }
}

impl Default for FifoTransferBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Primera trama con acelerómetro "nuevo" dentro del lote.
///
/// Con menos de 4 tramas no se puede decidir y se asume 1. Devuelve `None`
/// si las duplicaciones no siguen ninguno de los dos patrones válidos.
pub fn accel_alignment(frames: &[FifoFrame]) -> Option<usize> {
    if frames.len() < 4 {
        return Some(1);
    }

    if frames[0].accel_equal(&frames[1]) && frames[2].accel_equal(&frames[3]) {
        // A0==A1, A2==A3
        Some(1)
    } else if frames[1].accel_equal(&frames[2]) {
        // A0, A1==A2, A3
        Some(0)
    } else {
        None
    }
}

/// Lote de giroscopio: una muestra por trama
pub fn gyro_batch(timestamp_sample: u64, frames: &[FifoFrame], dt: f32) -> FifoSample {
    let mut gyro = FifoSample::new(timestamp_sample, dt);

    for frame in frames {
        gyro.push(flu_to_frd(frame.gyro_raw()));
    }

    gyro
}

/// Lote de acelerómetro: una de cada dos tramas.
///
/// # Returns
/// `(lote, alineado)`. Con alineación inválida el lote se construye igualmente
/// a partir de la trama 1 y `alineado` es `false`.
pub fn accel_batch(timestamp_sample: u64, frames: &[FifoFrame], dt: f32) -> (FifoSample, bool) {
    let alignment = accel_alignment(frames);
    let first = alignment.unwrap_or(1);

    let mut accel = FifoSample::new(timestamp_sample, dt);

    for frame in frames.iter().skip(first).step_by(2) {
        accel.push(flu_to_frd(frame.accel_raw()));
    }

    (accel, alignment.is_some())
}

impl<I, T, S> Icm20948<I, T, S>
where
    I: Interface,
    T: TimeSource,
    S: Scheduler,
{
    /// Lee FIFO_COUNTH/L en una sola ráfaga
    pub fn fifo_read_count(&mut self) -> Result<u16, Icm20948Error> {
        let mut buf = [bank0::FIFO_COUNTH | DIR_READ, 0, 0];

        let result = self
            .select_register_bank(Bank::UserBank0)
            .and_then(|_| self.transfer(&mut buf));

        if let Err(e) = result {
            self.counters.bad_transfer += 1;
            return Err(e);
        }

        Ok(u16::from_be_bytes([buf[1], buf[2]]))
    }

    /// Lee `samples` tramas y las publica. Devuelve `true` solo si ambos sensores
    /// recibieron un lote correcto.
    pub fn fifo_read(&mut self, timestamp_sample: u64, samples: u16) -> bool {
        let mut buffer = FifoTransferBuffer::new();
        let size = transfer_size(samples, FIFO_HEADER_SIZE, FIFO_SIZE.min(FIFO_TRANSFER_BUFFER_SIZE));

        let result = self
            .select_register_bank(Bank::UserBank0)
            .and_then(|_| self.transfer(&mut buffer.as_mut_bytes()[..size]));

        if result.is_err() {
            self.counters.bad_transfer += 1;
            return false;
        }

        self.counters.transfers += 1;

        let fifo_count_bytes = buffer.fifo_count();
        let fifo_count_samples = fifo_count_bytes / FIFO_FRAME_SIZE as u16;

        if fifo_count_samples == 0 {
            self.counters.fifo_empty += 1;
            return false;
        }

        if fifo_count_bytes as usize >= FIFO_SIZE {
            self.counters.fifo_overflow += 1;
            self.fifo_reset();
            return false;
        }

        let frames_read = ((size - FIFO_HEADER_SIZE) / FIFO_FRAME_SIZE) as u16;
        let valid_samples = samples.min(fifo_count_samples).min(frames_read);

        self.interrupt
            .set_force_fifo_count_check(fifo_count_check_needed(samples, fifo_count_samples));

        if valid_samples > 0 {
            let frames = &buffer.frames()[..valid_samples as usize];

            let gyro = gyro_batch(timestamp_sample, frames, self.timing.gyro_dt_us());
            self.gyro.update_fifo(&gyro);

            let (accel, aligned) = accel_batch(timestamp_sample, frames, self.timing.accel_dt_us());
            self.accel.update_fifo(&accel);

            if aligned {
                return true;
            }

            log::debug!("accel samples misaligned in FIFO");
            self.counters.bad_transfer += 1;
        }

        self.interrupt.set_force_fifo_count_check(true);
        false
    }

    /// Vacía el FIFO hardware y olvida las marcas de agua pendientes
    pub fn fifo_reset(&mut self) {
        self.counters.fifo_reset += 1;

        let result = self
            .register_set_bits(Bank::UserBank0, bank0::FIFO_RST, FIFO_RESET)
            .and_then(|_| self.register_clear_bits(Bank::UserBank0, bank0::FIFO_RST, FIFO_RESET));

        if let Err(e) = result {
            log::debug!("FIFO reset failed: {:?}", e);
            self.counters.bad_transfer += 1;
        }

        self.interrupt.reset();
    }
}
