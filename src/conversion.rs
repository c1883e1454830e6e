//! Funciones de conversión para datos del sensor ICM20948
//!
//! Este módulo traduce las escalas físicas configuradas en el dispositivo a
//! unidades de ingeniería (m/s², rad/s, °C) y aplica el cambio de convenio de
//! ejes del sensor al de publicación.

use crate::types::data_defs::{TEMPERATURE_OFFSET, TEMPERATURE_SENSITIVITY};
use crate::types::gravity::GRAVITY_MSS;
use crate::types::{AccelFullScale, GyroFullScale};

/// Escala (m/s² por LSB) y rango (m/s²) para la escala completa del acelerómetro
///
/// # Returns
/// `(scale, range)`
pub fn accel_scale_and_range(scale: AccelFullScale) -> (f32, f32) {
    match scale {
        AccelFullScale::Fs2G => (GRAVITY_MSS / 16384.0, 2.0 * GRAVITY_MSS),
        AccelFullScale::Fs4G => (GRAVITY_MSS / 8192.0, 4.0 * GRAVITY_MSS),
        AccelFullScale::Fs8G => (GRAVITY_MSS / 4096.0, 8.0 * GRAVITY_MSS),
        AccelFullScale::Fs16G => (GRAVITY_MSS / 2048.0, 16.0 * GRAVITY_MSS),
    }
}

/// Escala (rad/s por LSB) y rango (rad/s) para la escala completa del giroscopio
///
/// # Returns
/// `(scale, range)`
pub fn gyro_scale_and_range(scale: GyroFullScale) -> (f32, f32) {
    let (lsb_per_dps, range_dps): (f32, f32) = match scale {
        GyroFullScale::Fs250Dps => (131.0, 250.0),
        GyroFullScale::Fs500Dps => (65.5, 500.0),
        GyroFullScale::Fs1000Dps => (32.8, 1000.0),
        GyroFullScale::Fs2000Dps => (16.4, 2000.0),
    };

    ((1.0 / lsb_per_dps).to_radians(), range_dps.to_radians())
}

/// Convierte datos brutos de temperatura a grados Celsius
///
/// Temp °C = TEMP_OUT / Temp_Sensitivity + 21°C
pub fn temp_raw_to_celsius(raw: i16) -> f32 {
    raw as f32 / TEMPERATURE_SENSITIVITY + TEMPERATURE_OFFSET
}

/// Niega un eje sin desbordar: `i16::MIN` pasa a `i16::MAX`.
#[inline]
pub fn negate_axis(value: i16) -> i16 {
    if value == i16::MIN {
        i16::MAX
    } else {
        -value
    }
}

/// Pasa del marco del sensor (+x adelante, +y izquierda, +z arriba) al de
/// publicación (+x adelante, +y derecha, +z abajo).
#[inline]
pub fn flu_to_frd(raw: [i16; 3]) -> [i16; 3] {
    [raw[0], negate_axis(raw[1]), negate_axis(raw[2])]
}
