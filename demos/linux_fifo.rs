//! Adquisición por FIFO en Linux sobre spidev
//!
//! Uso: `cargo run --example linux_fifo --features linux -- /dev/spidev0.0 [tasa_hz]`

use icm20948_fifo::{
    self, DriverConfig, FifoSample, MonotonicTimeSource, SampleSink, Scheduler,
};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::SpidevDevice;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Logger mínimo para ver los mensajes del controlador por stderr
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

#[derive(Debug, Clone, Copy)]
enum Plan {
    Once(Instant),
    Interval { next: Instant, period: Duration },
}

/// Planificador de un solo hilo: el bucle principal espera hasta la siguiente
/// ejecución y las interrupciones pueden adelantarla.
#[derive(Default)]
struct ThreadScheduler {
    plan: Mutex<Option<Plan>>,
    wake: Condvar,
}

impl ThreadScheduler {
    fn set(&self, plan: Option<Plan>) {
        if let Ok(mut current) = self.plan.lock() {
            *current = plan;
            self.wake.notify_one();
        }
    }

    /// Espera hasta que toque ejecutar o pase `timeout`. Devuelve `true` si toca.
    fn wait_due(&self, timeout: Duration) -> bool {
        let Ok(mut plan) = self.plan.lock() else {
            return false;
        };

        let deadline = Instant::now() + timeout;

        loop {
            let now = Instant::now();
            let due = match *plan {
                Some(Plan::Once(at)) => at,
                Some(Plan::Interval { next, .. }) => next,
                None => deadline,
            };

            if plan.is_some() && due <= now {
                *plan = match *plan {
                    Some(Plan::Interval { next, period }) => Some(Plan::Interval {
                        next: next + period,
                        period,
                    }),
                    _ => None,
                };
                return true;
            }

            if now >= deadline {
                return false;
            }

            plan = match self.wake.wait_timeout(plan, due.min(deadline) - now) {
                Ok((guard, _)) => guard,
                Err(_) => return false,
            };
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_now(&self) {
        self.set(Some(Plan::Once(Instant::now())));
    }

    fn schedule_delayed(&self, delay_us: u64) {
        self.set(Some(Plan::Once(Instant::now() + Duration::from_micros(delay_us))));
    }

    fn schedule_on_interval(&self, interval_us: u64, delay_us: u64) {
        self.set(Some(Plan::Interval {
            next: Instant::now() + Duration::from_micros(delay_us),
            period: Duration::from_micros(interval_us),
        }));
    }

    fn schedule_clear(&self) {
        self.set(None);
    }
}

/// Sensor que imprime la media de cada lote cada cierto número de lotes
struct PrintSink {
    name: &'static str,
    unit: &'static str,
    scale: f32,
    batches: u64,
    errors: u64,
    every: u64,
}

impl PrintSink {
    fn new(name: &'static str, unit: &'static str, every: u64) -> Self {
        Self {
            name,
            unit,
            scale: 1.0,
            batches: 0,
            errors: 0,
            every,
        }
    }
}

impl SampleSink for PrintSink {
    fn update_fifo(&mut self, sample: &FifoSample) {
        self.batches += 1;
        if self.batches % self.every != 0 || sample.samples == 0 {
            return;
        }

        let n = sample.samples as f32;
        let mut mean = [0.0f32; 3];
        for xyz in sample.iter() {
            for (m, v) in mean.iter_mut().zip(xyz) {
                *m += v as f32 * self.scale / n;
            }
        }

        println!(
            "{:>5} t={:>10} us n={:>2}  x={:>8.3} y={:>8.3} z={:>8.3} {}",
            self.name, sample.timestamp_sample, sample.samples, mean[0], mean[1], mean[2], self.unit
        );
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn set_range(&mut self, range: f32) {
        println!("{}: rango ±{:.2} {}", self.name, range, self.unit);
    }

    fn set_temperature(&mut self, _temperature: f32) {}

    fn set_update_rate(&mut self, rate_hz: f32) {
        println!("{}: {:.1} Hz", self.name, rate_hz);
    }

    fn increase_error_count(&mut self) {
        self.errors += 1;
    }

    fn print_status(&self) {
        println!("{}: {} lotes, {} errores", self.name, self.batches, self.errors);
    }
}

fn main() {
    log::set_logger(&LOGGER).ok();
    log::set_max_level(log::LevelFilter::Info);

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "/dev/spidev0.0".to_string());
    let sample_rate_hz = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);

    println!("ICM20948 - Adquisición por FIFO ({})", path);

    // Flag para controlar la ejecución del programa
    let stop = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, stop.clone()) {
            eprintln!("Error al registrar la señal {}: {:?}", signal, e);
            return;
        }
    }

    let mut spi = match SpidevDevice::open(&path) {
        Ok(spi) => spi,
        Err(e) => {
            eprintln!("Error al abrir dispositivo SPI: {:?}", e);
            return;
        }
    };

    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(7_000_000)
        .mode(SpiModeFlags::SPI_MODE_3)
        .build();
    if let Err(e) = spi.configure(&options) {
        eprintln!("Error al configurar SPI: {:?}", e);
        return;
    }

    let clock = Arc::new(MonotonicTimeSource::new());
    let scheduler = Arc::new(ThreadScheduler::default());

    let mut device = icm20948_fifo::new_spi_device(
        spi,
        clock,
        scheduler.clone(),
        Box::new(PrintSink::new("accel", "m/s²", 250)),
        Box::new(PrintSink::new("gyro", "rad/s", 250)),
        DriverConfig {
            sample_rate_hz,
            ..DriverConfig::default()
        },
    );

    if let Err(e) = device.init() {
        eprintln!("Error al inicializar el dispositivo: {:?}", e);
        return;
    }
    println!("Dispositivo detectado, arrancando adquisición");

    let mut last_status = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        if scheduler.wait_due(Duration::from_millis(100)) {
            device.run();
        }

        if last_status.elapsed() >= Duration::from_secs(5) {
            device.print_status();
            last_status = Instant::now();
        }
    }

    println!("\nDeteniendo el programa...");
    device.exit_and_cleanup();
    device.print_status();
}
