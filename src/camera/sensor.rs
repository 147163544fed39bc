//! Image Sensor Bring-up
//!
//! Identifies the OV2640 over SCCB and loads its register tables. The
//! tables themselves are supplied by the board as a [`SensorProfile`].

use crate::config::{OV2640_PID, OV2640_VERSIONS, SENSOR_RESET_SETTLE_MS};
use crate::error::{Error, Result};
use crate::timing::Clock;

/// OV2640 register addresses used during bring-up
mod reg {
    pub const BANK_SELECT: u8 = 0xFF;
    pub const PID: u8 = 0x0A;
    pub const VER: u8 = 0x0B;
    pub const COM7: u8 = 0x12;
    pub const COM10: u8 = 0x15;

    /// `BANK_SELECT`: sensor register bank
    pub const BANK_SENSOR: u8 = 0x01;
    /// `COM7`: system reset
    pub const COM7_RESET: u8 = 0x80;
}

/// SCCB register bus to the sensor
#[allow(async_fn_in_trait)]
pub trait SensorBus {
    /// Write one register; a NACK is a bus failure
    async fn write_reg(&mut self, reg: u8, value: u8) -> Result<()>;

    /// Read one register
    async fn read_reg(&mut self, reg: u8) -> Result<u8>;
}

/// One (register, value) pair of a configuration table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorReg {
    /// Register address
    pub reg: u8,
    /// Value to write
    pub value: u8,
}

impl SensorReg {
    /// End-of-table marker used by vendor tables
    pub const END: Self = Self::new(0xFF, 0xFF);

    /// Create a pair
    #[must_use]
    pub const fn new(reg: u8, value: u8) -> Self {
        Self { reg, value }
    }
}

/// Register tables that put the sensor in its operating mode
#[derive(Clone, Copy, Debug)]
pub struct SensorProfile {
    /// JPEG engine initialisation
    pub jpeg_init: &'static [SensorReg],
    /// YUV422 output path
    pub yuv422: &'static [SensorReg],
    /// JPEG output
    pub jpeg: &'static [SensorReg],
    /// Output resolution
    pub resolution: &'static [SensorReg],
}

/// Identity read back from the sensor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorId {
    /// Product id
    pub pid: u8,
    /// Version
    pub ver: u8,
}

impl SensorId {
    /// Check against the expected OV2640 identity
    #[must_use]
    pub fn is_ov2640(self) -> bool {
        self.pid == OV2640_PID && OV2640_VERSIONS.contains(&self.ver)
    }
}

/// Write a table in order, stopping at the end marker if present
///
/// # Errors
///
/// Returns the first bus failure.
pub async fn apply_table<B: SensorBus>(bus: &mut B, table: &[SensorReg]) -> Result<usize> {
    let mut written = 0;
    for entry in table.iter().take_while(|&&e| e != SensorReg::END) {
        bus.write_reg(entry.reg, entry.value).await?;
        written += 1;
    }
    Ok(written)
}

/// Identify the sensor, reset it and load `profile`
///
/// # Errors
///
/// Returns [`Error::DeviceMismatch`] with the bytes read if the sensor is
/// not an OV2640, otherwise the first bus failure.
pub async fn bring_up<B, C>(bus: &mut B, clock: &mut C, profile: &SensorProfile) -> Result<SensorId>
where
    B: SensorBus,
    C: Clock,
{
    bus.write_reg(reg::BANK_SELECT, reg::BANK_SENSOR).await?;
    let id = SensorId {
        pid: bus.read_reg(reg::PID).await?,
        ver: bus.read_reg(reg::VER).await?,
    };
    if !id.is_ov2640() {
        return Err(Error::DeviceMismatch {
            vendor: id.pid,
            product: id.ver,
        });
    }

    bus.write_reg(reg::COM7, reg::COM7_RESET).await?;
    clock.pause_ms(SENSOR_RESET_SETTLE_MS).await;

    let mut written = apply_table(bus, profile.jpeg_init).await?;
    written += apply_table(bus, profile.yuv422).await?;
    written += apply_table(bus, profile.jpeg).await?;
    bus.write_reg(reg::BANK_SELECT, reg::BANK_SENSOR).await?;
    bus.write_reg(reg::COM10, 0x00).await?;
    written += apply_table(bus, profile.resolution).await?;

    info!("sensor 0x{:02X}/0x{:02X} up, {} registers", id.pid, id.ver, written);
    Ok(id)
}
