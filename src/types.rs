//! Definiciones de tipos y constantes comunes para el ICM20948

/// Escalas completas disponibles para el giroscopio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GyroFullScale {
    /// ±250 dps
    Fs250Dps = 0,
    /// ±500 dps
    Fs500Dps = 1,
    /// ±1000 dps
    Fs1000Dps = 2,
    /// ±2000 dps
    Fs2000Dps = 3,
}

impl Default for GyroFullScale {
    fn default() -> Self {
        GyroFullScale::Fs2000Dps
    }
}

// GYRO_CONFIG_1: GYRO_FS_SEL[1:0] en bits 2:1
impl From<u8> for GyroFullScale {
    fn from(value: u8) -> Self {
        match (value & bits::GYRO_FS_SEL) >> 1 {
            0 => GyroFullScale::Fs250Dps,
            1 => GyroFullScale::Fs500Dps,
            2 => GyroFullScale::Fs1000Dps,
            _ => GyroFullScale::Fs2000Dps,
        }
    }
}

/// Escalas completas disponibles para el acelerómetro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AccelFullScale {
    /// ±2g
    Fs2G = 0,
    /// ±4g
    Fs4G = 1,
    /// ±8g
    Fs8G = 2,
    /// ±16g
    Fs16G = 3,
}

impl Default for AccelFullScale {
    fn default() -> Self {
        AccelFullScale::Fs16G
    }
}

// ACCEL_CONFIG: ACCEL_FS_SEL[1:0] en bits 2:1
impl From<u8> for AccelFullScale {
    fn from(value: u8) -> Self {
        match (value & bits::ACCEL_FS_SEL) >> 1 {
            0 => AccelFullScale::Fs2G,
            1 => AccelFullScale::Fs4G,
            2 => AccelFullScale::Fs8G,
            _ => AccelFullScale::Fs16G,
        }
    }
}

/// Bits útiles para configuración y control
pub mod bits {
    /// Bit de lectura en el primer byte de una transferencia SPI
    pub const DIR_READ: u8 = 0x80;

    // USER_CTRL
    pub const DMP_EN: u8 = 0x80;
    pub const FIFO_EN: u8 = 0x40;
    pub const I2C_MST_EN: u8 = 0x20;
    pub const I2C_IF_DIS: u8 = 0x10;

    // PWR_MGMT_1
    pub const DEVICE_RESET: u8 = 0x80;
    pub const SLEEP: u8 = 0x40;
    pub const CLKSEL_0: u8 = 0x01;

    // INT_PIN_CFG
    pub const INT1_ACTL: u8 = 0x80;

    // INT_ENABLE_1
    pub const RAW_DATA_0_RDY_EN: u8 = 0x01;

    // FIFO_EN_2
    pub const ACCEL_FIFO_EN: u8 = 0x10;
    pub const GYRO_Z_FIFO_EN: u8 = 0x08;
    pub const GYRO_Y_FIFO_EN: u8 = 0x04;
    pub const GYRO_X_FIFO_EN: u8 = 0x02;
    pub const TEMP_FIFO_EN: u8 = 0x01;

    // FIFO_RST: FIFO_RESET[4:0]
    pub const FIFO_RESET: u8 = 0x1F;

    // FIFO_MODE
    pub const FIFO_MODE_SNAPSHOT: u8 = 0x01;

    // GYRO_CONFIG_1
    pub const GYRO_FS_SEL: u8 = 0x06; // Bits [2:1]
    pub const GYRO_FS_SEL_2000_DPS: u8 = 0x06;
    pub const GYRO_FCHOICE: u8 = 0x01;

    // ACCEL_CONFIG
    pub const ACCEL_FS_SEL: u8 = 0x06; // Bits [2:1]
    pub const ACCEL_FS_SEL_16G: u8 = 0x06;
    pub const ACCEL_FCHOICE: u8 = 0x01;

    // I2C_MST_CTRL
    pub const I2C_MST_P_NSR: u8 = 0x10;
    pub const I2C_MST_CLK_400_KHZ: u8 = 0x07;

    // I2C_MST_DELAY_CTRL: I2C_SLVx_DLY_EN para SLV0..SLV3
    pub const I2C_SLVX_DLY_EN: u8 = 0x0F;

    // I2C_SLV0_ADDR / I2C_SLV0_CTRL
    pub const I2C_SLV0_RNW: u8 = 0x80;
    pub const I2C_SLV0_EN: u8 = 0x80;

    // I2C_SLV4_CTRL: I2C_MST_DLY[4:0]
    pub const I2C_MST_DLY: u8 = 0x1F;
}

/// Valores de aceleración gravitacional en diferentes unidades
pub mod gravity {
    pub const GRAVITY_MSS: f32 = 9.80665;
}

/// Constantes del dispositivo y del formato del FIFO
pub mod data_defs {
    /// Valor esperado en WHO_AM_I
    pub const WHOAMI: u8 = 0xEA;
    /// Valor de PWR_MGMT_1 tras un reset (SLEEP | CLKSEL_0)
    pub const PWR_MGMT_1_RESET_VALUE: u8 = 0x41;

    /// Tasa nativa del giroscopio con el DLPF desactivado (Hz)
    pub const GYRO_RATE: f32 = 9000.0;
    /// Tasa nativa del acelerómetro con el DLPF desactivado (Hz)
    pub const ACCEL_RATE: f32 = 4500.0;
    /// Periodo de una trama del FIFO (us)
    pub const FIFO_SAMPLE_DT: f32 = 1e6 / GYRO_RATE;
    /// Tramas mínimas por lectura: garantiza al menos una muestra nueva de acelerómetro
    pub const SAMPLES_PER_TRANSFER: u16 = 2;

    /// Tamaño del FIFO hardware (bytes)
    pub const FIFO_SIZE: usize = 512;
    /// Tamaño de una trama: acelerómetro (6) + giroscopio (6) + temperatura (2)
    pub const FIFO_FRAME_SIZE: usize = 14;
    /// Máximo de tramas que caben en el FIFO
    pub const FIFO_MAX_SAMPLES: u16 = (FIFO_SIZE / FIFO_FRAME_SIZE) as u16;
    /// Tasa de salida por defecto (Hz)
    pub const DEFAULT_SAMPLE_RATE: u32 = 800;

    pub const TEMPERATURE_SENSITIVITY: f32 = 333.87; // LSB/°C
    pub const TEMPERATURE_OFFSET: f32 = 21.0; // °C
}
