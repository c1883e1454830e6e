//! Colaboradores externos del controlador
//!
//! El controlador no publica muestras ni planifica su propia ejecución: recibe
//! estos traits y los invoca. Cada plataforma aporta su implementación.

use crate::types::data_defs::FIFO_MAX_SAMPLES;

/// Máximo de muestras en un lote publicado
pub const MAX_BATCH_SAMPLES: usize = FIFO_MAX_SAMPLES as usize;

/// Lote de muestras de un sensor extraído de una lectura del FIFO
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FifoSample {
    /// Instante (us) asociado a la última muestra del lote
    pub timestamp_sample: u64,
    /// Separación entre muestras consecutivas (us)
    pub dt: f32,
    /// Número de muestras válidas en `x`, `y`, `z`
    pub samples: u8,
    pub x: [i16; MAX_BATCH_SAMPLES],
    pub y: [i16; MAX_BATCH_SAMPLES],
    pub z: [i16; MAX_BATCH_SAMPLES],
}

impl FifoSample {
    pub fn new(timestamp_sample: u64, dt: f32) -> Self {
        Self {
            timestamp_sample,
            dt,
            samples: 0,
            x: [0; MAX_BATCH_SAMPLES],
            y: [0; MAX_BATCH_SAMPLES],
            z: [0; MAX_BATCH_SAMPLES],
        }
    }

    /// Añade una muestra; devuelve `false` si el lote ya está lleno
    pub fn push(&mut self, xyz: [i16; 3]) -> bool {
        let i = self.samples as usize;
        if i >= MAX_BATCH_SAMPLES {
            return false;
        }
        self.x[i] = xyz[0];
        self.y[i] = xyz[1];
        self.z[i] = xyz[2];
        self.samples += 1;
        true
    }

    /// Muestras válidas como tripletas `[x, y, z]`
    pub fn iter(&self) -> impl Iterator<Item = [i16; 3]> + '_ {
        (0..self.samples as usize).map(move |i| [self.x[i], self.y[i], self.z[i]])
    }
}

/// Destino de las muestras de un sensor (acelerómetro o giroscopio)
pub trait SampleSink {
    /// Publica un lote de muestras
    fn update_fifo(&mut self, sample: &FifoSample);
    /// Unidades de ingeniería por LSB
    fn set_scale(&mut self, scale: f32);
    /// Rango de medida en unidades de ingeniería
    fn set_range(&mut self, range: f32);
    /// Temperatura del sensor (°C)
    fn set_temperature(&mut self, temperature: f32);
    /// Tasa de publicación (Hz)
    fn set_update_rate(&mut self, rate_hz: f32);
    fn increase_error_count(&mut self);
    fn print_status(&self) {}
}

/// Planificador que invoca el bucle de adquisición.
///
/// Cada petición sustituye a la anterior; las peticiones no se encolan.
/// Se usa también desde el contexto de interrupción, por eso solo toma `&self`.
pub trait Scheduler {
    /// Ejecutar lo antes posible
    fn schedule_now(&self);
    /// Ejecutar una vez tras `delay_us`
    fn schedule_delayed(&self, delay_us: u64);
    /// Ejecutar periódicamente cada `interval_us`, empezando tras `delay_us`
    fn schedule_on_interval(&self, interval_us: u64, delay_us: u64);
    /// Cancelar cualquier ejecución pendiente
    fn schedule_clear(&self);
}

/// Callback invocado en el flanco de la línea data-ready
pub type DataReadyCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Registro de la interrupción GPIO de data-ready
pub trait DataReadyGpio {
    /// Registra `callback` en el flanco de bajada. Devuelve `false` si no está disponible.
    fn enable_falling_edge(&mut self, callback: DataReadyCallback) -> bool;
    /// Elimina el callback registrado
    fn disable(&mut self) -> bool;
}

/// Subcontrolador auxiliar conectado al maestro I2C del ICM20948 (magnetómetro)
pub trait AuxiliarySensor {
    /// Arranca la secuencia del sensor auxiliar tras configurar el ICM20948
    fn reset(&mut self, bus: &mut dyn AuxI2cMaster);
    fn print_info(&self);
    fn set_temperature(&mut self, temperature: f32);
}

/// Acceso del sensor auxiliar al maestro I2C interno del ICM20948
pub trait AuxI2cMaster {
    /// Escribe `val` en el registro `reg` del esclavo `addr`
    fn slave_register_write(&mut self, addr: u8, reg: u8, val: u8) -> bool;
    /// Programa una lectura periódica de un byte desde `reg`
    fn slave_register_start_read(&mut self, addr: u8, reg: u8) -> bool;
    /// Programa una lectura periódica de `size` bytes a EXT_SLV_SENS_DATA
    fn external_sensor_data_enable(&mut self, addr: u8, reg: u8, size: u8) -> bool;
    /// Copia hasta 24 bytes de EXT_SLV_SENS_DATA en `buffer`
    fn external_sensor_data_read(&mut self, buffer: &mut [u8]) -> bool;
}
