//! Modelo de temporización de muestras
//!
//! A partir de la tasa de salida pedida calcula cada cuánto hay que vaciar el
//! FIFO y cuántas muestras de giroscopio y acelerómetro trae cada vaciado.

use crate::types::data_defs::{
    ACCEL_RATE, DEFAULT_SAMPLE_RATE, FIFO_MAX_SAMPLES, FIFO_SAMPLE_DT, GYRO_RATE,
    SAMPLES_PER_TRANSFER,
};

/// Temporización de la adquisición por FIFO
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionTiming {
    /// Intervalo entre vaciados del FIFO (us)
    pub fifo_empty_interval_us: u32,
    /// Muestras de giroscopio por vaciado
    pub fifo_gyro_samples: u16,
    /// Muestras de acelerómetro por vaciado
    pub fifo_accel_samples: u16,
}

impl AcquisitionTiming {
    /// Calcula la temporización para `sample_rate_hz` (0 usa la tasa por defecto).
    ///
    /// El intervalo se redondea al múltiplo más cercano de
    /// `SAMPLES_PER_TRANSFER * FIFO_SAMPLE_DT` y nunca es menor que ese mínimo.
    pub fn from_sample_rate(sample_rate_hz: u32) -> Self {
        let sample_rate = if sample_rate_hz == 0 {
            DEFAULT_SAMPLE_RATE
        } else {
            sample_rate_hz
        };

        let min_interval = SAMPLES_PER_TRANSFER as f32 * FIFO_SAMPLE_DT;
        let requested = ((1e6 / sample_rate as f32) / min_interval).round() * min_interval;
        let interval = requested.max(min_interval);

        let gyro_dt = 1e6 / GYRO_RATE;
        let fifo_gyro_samples = (interval / gyro_dt).min(FIFO_MAX_SAMPLES as f32).round() as u16;

        // recalcular el intervalo con el límite real de muestras de giroscopio
        let fifo_empty_interval_us = (fifo_gyro_samples as f32 * gyro_dt) as u32;

        let accel_dt = 1e6 / ACCEL_RATE;
        let fifo_accel_samples = (fifo_empty_interval_us as f32 / accel_dt)
            .min(FIFO_MAX_SAMPLES as f32)
            .round() as u16;

        Self {
            fifo_empty_interval_us,
            fifo_gyro_samples,
            fifo_accel_samples,
        }
    }

    /// Tasa de publicación resultante (Hz), común a ambos sensores
    pub fn update_rate_hz(&self) -> f32 {
        1e6 / self.fifo_empty_interval_us as f32
    }

    /// Separación entre muestras de giroscopio dentro de un lote (us)
    pub fn gyro_dt_us(&self) -> f32 {
        self.fifo_empty_interval_us as f32 / self.fifo_gyro_samples as f32
    }

    /// Separación entre muestras de acelerómetro dentro de un lote (us)
    pub fn accel_dt_us(&self) -> f32 {
        self.fifo_empty_interval_us as f32 / self.fifo_accel_samples as f32
    }
}

impl Default for AcquisitionTiming {
    fn default() -> Self {
        Self::from_sample_rate(0)
    }
}
