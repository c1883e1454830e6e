//! Funcionalidades y traits base para el controlador

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Trait para obtener un timestamp monotónico en microsegundos.
///
/// Se comparte entre el bucle de adquisición y el manejador de interrupción,
/// por eso solo requiere `&self`.
pub trait TimeSource {
    /// Retorna el timestamp (en microsegundos)
    fn get_timestamp_us(&self) -> u64;

    /// Microsegundos transcurridos desde `since`
    fn elapsed_us(&self, since: u64) -> u64 {
        self.get_timestamp_us().saturating_sub(since)
    }
}

/// Reloj monotónico basado en `std::time::Instant`.
pub struct MonotonicTimeSource {
    start: Instant,
}

impl MonotonicTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTimeSource {
    fn get_timestamp_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Reloj controlado manualmente, útil en pruebas y simulación.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now_us: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start_us: u64) -> Self {
        Self {
            now_us: AtomicU64::new(start_us),
        }
    }

    /// Fija el instante actual
    pub fn set(&self, now_us: u64) {
        self.now_us.store(now_us, Ordering::SeqCst);
    }

    /// Avanza el reloj `delta_us` microsegundos
    pub fn advance(&self, delta_us: u64) {
        self.now_us.fetch_add(delta_us, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn get_timestamp_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }
}
