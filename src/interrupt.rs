//! Estado compartido entre la interrupción data-ready y el bucle de adquisición
//!
//! El manejador de interrupción solo toca atómicos: cuenta flancos y, al llegar
//! a la marca de agua, publica cuántas muestras hay y cuándo se alcanzó.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::base::TimeSource;
use crate::sink::{DataReadyCallback, Scheduler};

#[derive(Debug)]
pub struct InterruptState {
    /// Flancos desde la última marca de agua
    data_ready_count: AtomicU32,
    /// Muestras publicadas por la última marca de agua (0 = consumidas)
    fifo_read_samples: AtomicU32,
    fifo_watermark_timestamp: AtomicU64,
    /// Muestras de giroscopio que disparan una lectura
    watermark_samples: u32,
    force_fifo_count_check: AtomicBool,
    /// Total de flancos recibidos
    data_ready_events: AtomicU64,
}

impl InterruptState {
    pub fn new(watermark_samples: u16) -> Self {
        Self {
            data_ready_count: AtomicU32::new(0),
            fifo_read_samples: AtomicU32::new(0),
            fifo_watermark_timestamp: AtomicU64::new(0),
            watermark_samples: watermark_samples as u32,
            force_fifo_count_check: AtomicBool::new(true),
            data_ready_events: AtomicU64::new(0),
        }
    }

    /// Manejador del flanco data-ready. Devuelve `true` cuando se alcanza la
    /// marca de agua y hay que despertar al bucle de adquisición.
    pub fn data_ready(&self, now_us: u64) -> bool {
        self.data_ready_events.fetch_add(1, Ordering::Relaxed);

        let watermark = self.watermark_samples;
        let previous = self.data_ready_count.fetch_add(1, Ordering::AcqRel);

        if previous >= watermark.saturating_sub(1) {
            self.data_ready_count.store(0, Ordering::Release);
            self.fifo_watermark_timestamp.store(now_us, Ordering::Release);
            self.fifo_read_samples.store(watermark, Ordering::Release);
            return true;
        }

        false
    }

    /// Toma las muestras publicadas por la última marca de agua.
    ///
    /// # Returns
    /// `(samples, timestamp_us)`; `samples` vale 0 si no hubo marca nueva
    pub fn take_watermark(&self) -> (u16, u64) {
        let samples = self.fifo_read_samples.swap(0, Ordering::AcqRel);
        let timestamp = self.fifo_watermark_timestamp.load(Ordering::Acquire);
        (samples.min(u16::MAX as u32) as u16, timestamp)
    }

    pub fn watermark_timestamp(&self) -> u64 {
        self.fifo_watermark_timestamp.load(Ordering::Acquire)
    }

    pub fn force_fifo_count_check(&self) -> bool {
        self.force_fifo_count_check.load(Ordering::Acquire)
    }

    pub fn set_force_fifo_count_check(&self, force: bool) {
        self.force_fifo_count_check.store(force, Ordering::Release);
    }

    pub fn data_ready_events(&self) -> u64 {
        self.data_ready_events.load(Ordering::Relaxed)
    }

    /// Vuelve al estado posterior a un vaciado completo del FIFO. La primera
    /// lectura tras el vaciado vuelve a contar el FIFO.
    pub fn reset(&self) {
        self.data_ready_count.store(0, Ordering::Release);
        self.fifo_watermark_timestamp.store(0, Ordering::Release);
        self.fifo_read_samples.store(0, Ordering::Release);
        self.force_fifo_count_check.store(true, Ordering::Release);
    }
}

/// Construye el callback que se registra en la línea data-ready
pub fn data_ready_callback<T, S>(
    state: Arc<InterruptState>,
    clock: Arc<T>,
    scheduler: Arc<S>,
) -> DataReadyCallback
where
    T: TimeSource + Send + Sync + 'static,
    S: Scheduler + Send + Sync + 'static,
{
    Box::new(move || {
        if state.data_ready(clock.get_timestamp_us()) {
            scheduler.schedule_now();
        }
    })
}
