//! Decisiones de sincronización entre interrupción, contador del FIFO y lectura
//!
//! Funciones puras: el bucle de adquisición les pasa lo que ha observado y
//! actúa según el resultado.

use crate::types::data_defs::{FIFO_FRAME_SIZE, FIFO_MAX_SAMPLES, SAMPLES_PER_TRANSFER};

/// Tramas completas en el FIFO, redondeadas hacia abajo a múltiplos de
/// `SAMPLES_PER_TRANSFER`
pub fn samples_from_fifo_count(fifo_count_bytes: u16) -> u16 {
    let frames = fifo_count_bytes / FIFO_FRAME_SIZE as u16;
    frames / SAMPLES_PER_TRANSFER * SAMPLES_PER_TRANSFER
}

/// La marca de agua publicada por la interrupción es demasiado antigua para
/// fiarse de ella (más de medio intervalo)
pub fn watermark_is_stale(now_us: u64, watermark_us: u64, fifo_empty_interval_us: u32) -> bool {
    now_us.saturating_sub(watermark_us) > (fifo_empty_interval_us / 2) as u64
}

/// Qué hacer con el número de muestras disponible en este ciclo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoReadPlan {
    /// Más tramas de las que caben: se han perdido datos
    Overflow,
    /// Leer este número de tramas
    Read(u16),
    /// Menos de una transferencia mínima; no se lee nada este ciclo
    Empty,
}

pub fn plan_fifo_read(samples: u16) -> FifoReadPlan {
    if samples > FIFO_MAX_SAMPLES {
        FifoReadPlan::Overflow
    } else if samples >= SAMPLES_PER_TRANSFER {
        FifoReadPlan::Read(samples)
    } else {
        FifoReadPlan::Empty
    }
}

/// Bytes a transferir para `samples` tramas más la cabecera (comando + contador)
pub fn transfer_size(samples: u16, header: usize, max: usize) -> usize {
    (samples as usize * FIFO_FRAME_SIZE + header).min(max)
}

/// Tras una lectura: ¿hay que volver a contar el FIFO en lugar de fiarse de la
/// interrupción? Sí si había menos de lo pedido o al menos una transferencia más.
pub fn fifo_count_check_needed(requested: u16, available: u16) -> bool {
    available < requested || available >= requested + SAMPLES_PER_TRANSFER
}
