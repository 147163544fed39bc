//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the sensor node.
//! Buffer capacities, wire bytes, timing budgets, camera register values
//! and pin mappings are centralized here.

/// System clock frequency (STM32G474 @ 170MHz)
pub const SYSTEM_CLOCK_HZ: u32 = 170_000_000;

/// Radio module serial rate (must match the module's `BD` setting)
pub const RADIO_BAUD: u32 = 9_600;

/// SPI clock for the camera FIFO controller
pub const CAMERA_SPI_HZ: u32 = 1_000_000;

/// SCCB (I2C) clock for the camera sensor
pub const SCCB_FREQUENCY_HZ: u32 = 100_000;

// ============================================================================
// Buffers
// ============================================================================

/// Receive buffer capacity in bytes
pub const RX_BUFFER_SIZE: usize = 200;

/// Length of each DMA receive transfer armed for one message
pub const RX_ARM_LENGTH: usize = 100;

/// Size of the pipe between the DMA receive task and the receive channel
pub const RX_PIPE_SIZE: usize = 256;

/// Size of the DMA ring the UART receiver writes into
pub const RX_DMA_RING_SIZE: usize = 256;

/// Maximum image payload in bytes (excludes the marker byte)
pub const IMAGE_CAPACITY: usize = 60_000;

/// Image storage including the leading transfer-type marker
pub const IMAGE_FRAME_SIZE: usize = IMAGE_CAPACITY + 1;

/// Longest AT command line (`AT` + mnemonic + parameter + CR)
pub const AT_LINE_MAX: usize = 40;

// ============================================================================
// Radio identity
// ============================================================================

/// PAN identifier length in ASCII hex digits
pub const PAN_ID_LEN: usize = 4;

/// Link/session key length in bytes
pub const SESSION_KEY_LEN: usize = 32;

/// Length of each coordinate field
pub const COORD_LEN: usize = 24;

/// Serial number high word length as reported by `ATSH`
pub const SERIAL_HIGH_LEN: usize = 6;

/// Serial number low word length as reported by `ATSL`
pub const SERIAL_LOW_LEN: usize = 8;

/// PAN the node switches to first so the module leaves its old network
pub const LEAVE_PAN_ID: &[u8; PAN_ID_LEN] = b"2F0A";

/// PAN zero tells the module to join any network
pub const JOIN_ANY_PAN_ID: &[u8; PAN_ID_LEN] = b"0000";

/// `ATOI` response while the module has not joined a network
pub const OI_NOT_JOINED: &[u8; 4] = b"FFFF";

// ============================================================================
// Wire format
// ============================================================================

/// Opcode: session-key / configuration update request
pub const OPCODE_SESSION_KEY: u8 = b'2';

/// Opcode: capture image request
pub const OPCODE_CAPTURE: u8 = b'5';

/// First byte of an outbound image frame
pub const IMAGE_MARKER: u8 = 0x10;

/// Acknowledgement sent back to the coordinator after a configuration update
pub const ACK_TOKEN: &[u8] = b"OK";

/// Number of acknowledgements sent after a configuration update
pub const ACK_REPEAT: usize = 3;

// ============================================================================
// AT command protocol
// ============================================================================

/// Escape sequence that enters command mode
pub const AT_ESCAPE: &[u8] = b"+++";

/// Command terminator
pub const AT_TERMINATOR: u8 = b'\r';

/// Success token (anchored at the terminator)
pub const AT_OK: &[u8; 3] = b"OK\r";

/// Failure token
pub const AT_ERR: &[u8; 3] = b"ERR";

// ============================================================================
// Timing
// ============================================================================

/// Budget for an `OK`/`ERR` or terminator after a command
pub const RESPONSE_TIMEOUT_MS: u32 = 1_000;

/// Budget for the escape sequence reply; the module answers only after its guard time
pub const ESCAPE_TIMEOUT_MS: u32 = 2_000;

/// Silence kept on the link before sending the escape sequence
pub const ESCAPE_GUARD_MS: u32 = 100;

/// Pause between two polls of a wait predicate
pub const POLL_INTERVAL_US: u32 = 1_000;

/// Pause between consecutive AT command sequences
pub const COMMAND_SPACING_MS: u32 = 1_000;

/// Pause between acknowledgements sent to the coordinator
pub const ACK_SPACING_MS: u32 = 1_000;

/// Budget for the rest of a configuration message after its opcode
pub const CONFIG_PAYLOAD_TIMEOUT_MS: u32 = 1_000;

/// Budget for the camera to report capture completion
pub const CAPTURE_TIMEOUT_MS: u32 = 3_000;

/// Pause between polls of the camera status register
pub const CAPTURE_POLL_US: u32 = 100;

/// Number of `ATOI` polls while waiting to join a network
pub const JOIN_POLL_ATTEMPTS: u32 = 30;

/// Sensor bring-up attempts before the node halts
pub const SENSOR_BRINGUP_ATTEMPTS: u32 = 3;

/// Settle time after a sensor soft reset
pub const SENSOR_RESET_SETTLE_MS: u32 = 15;

/// Half-period of the fault blink pattern
pub const FAULT_BLINK_MS: u64 = 100;

// ============================================================================
// Camera
// ============================================================================

/// Value written to the FIFO controller test register to check liveness
pub const FIFO_LIVENESS_SENTINEL: u8 = 0x27;

/// Status bit set by the FIFO controller when a capture is complete
pub const FIFO_CAPTURE_DONE: u8 = 0x08;

/// Width of the FIFO size field
pub const FIFO_SIZE_MASK: u32 = 0x007F_FFFF;

/// OV2640 SCCB address (7-bit)
pub const OV2640_SCCB_ADDR: u8 = 0x30;

/// Expected OV2640 product id (high byte)
pub const OV2640_PID: u8 = 0x26;

/// Accepted OV2640 version bytes
pub const OV2640_VERSIONS: [u8; 2] = [0x41, 0x42];

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the node schematic

    /// Status LED
    pub const LED_STATUS: &str = "PA5";

    /// PIR motion sensor output (EXTI0, pull-up)
    pub const MOTION_IN: &str = "PC0";

    /// Radio UART TX (USART1)
    pub const RADIO_TX: &str = "PA9";

    /// Radio UART RX (USART1)
    pub const RADIO_RX: &str = "PA10";

    /// Camera FIFO SPI clock (SPI1)
    pub const CAM_SCK: &str = "PB3";

    /// Camera FIFO SPI MISO (SPI1)
    pub const CAM_MISO: &str = "PB4";

    /// Camera FIFO SPI MOSI (SPI1)
    pub const CAM_MOSI: &str = "PB5";

    /// Camera FIFO chip select (active low)
    pub const CAM_CS: &str = "PB6";

    /// Camera sensor SCCB clock (I2C1)
    pub const SCCB_SCL: &str = "PB8";

    /// Camera sensor SCCB data (I2C1)
    pub const SCCB_SDA: &str = "PB9";
}

/// DMA channel assignments
pub mod dma {
    //! DMA channel assignments for zero-copy transfers

    /// I2C1 TX DMA channel
    pub const I2C1_TX: u8 = 1;

    /// I2C1 RX DMA channel
    pub const I2C1_RX: u8 = 2;

    /// USART1 TX DMA channel (radio)
    pub const USART1_TX: u8 = 3;

    /// USART1 RX DMA channel (radio receive ring)
    pub const USART1_RX: u8 = 4;

    /// SPI1 TX DMA channel (camera FIFO)
    pub const SPI1_TX: u8 = 5;

    /// SPI1 RX DMA channel (camera FIFO)
    pub const SPI1_RX: u8 = 6;
}

/// Convert milliseconds to the microsecond ticks used by [`crate::timing`]
#[must_use]
pub const fn ms_to_us(ms: u32) -> u64 {
    ms as u64 * 1_000
}
