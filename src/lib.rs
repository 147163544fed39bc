//! Low-Power Camera Node Firmware Library
//!
//! This library provides the core of an STM32G474-based sensor node: a PIR
//! motion input, an ArduCAM-style camera (OV2640 sensor behind a FIFO
//! controller) and an XBee-class mesh radio driven through its AT command
//! mode. On motion, or on request from the coordinator, the node captures a
//! JPEG frame and ships it over the radio; the coordinator can also rotate
//! the node's PAN id and link key.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Capture Orchestrator  │  Provisioning  │  Inbound Protocol  │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     PROTOCOL LAYER                           │
//! │  AT Command Engine  │  FIFO Capture  │  Sensor Bring-up      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       LINK LAYER                             │
//! │  Receive Channel (DMA)  │  Transmitter  │  Motion Latch      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL (embedded only)                        │
//! │  USART  │  SPI  │  I2C/SCCB  │  EXTI  │  embassy-time        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Ports at the hardware seam**: the core is generic over small traits
//!   (`RxDma`, `SerialTx`, `FifoBus`, `SensorBus`, `Clock`) and runs on the
//!   host against test doubles
//! - **Bounded waits**: every poll loop runs against a [`timing::Deadline`]
//! - **Re-arm before parse**: responses are only read from a receive
//!   transfer armed for them
//! - **No unsafe in application code**
//! - **Explicit error handling**: all fallible operations return [`error::Result`]

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(async_fn_in_trait)]

// Must come first so the logging macros are visible everywhere
#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Binds the core's ports to STM32G474 peripherals.
#[cfg(feature = "embedded")]
pub mod hal;

/// Radio Link
///
/// DMA-fed receive channel and the profile-switching transmitter.
pub mod link;

/// Radio Module Control
///
/// AT command set, command engine and provisioning sequences.
pub mod radio;

/// Camera
///
/// FIFO capture handshake and sensor bring-up.
pub mod camera;

/// Node Control
///
/// Motion event source and the capture orchestrator.
pub mod node;

/// Communication Protocols
///
/// Inbound coordinator messages.
pub mod protocol;

/// Deadlines and the clock port
pub mod timing;

/// Error types
pub mod error;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::error::{Error, Result};
    pub use crate::types::*;

    pub use crate::camera::fifo::{CameraCapture, CaptureTiming, FifoBus, ImageBuffer};
    pub use crate::camera::sensor::{bring_up, SensorBus, SensorProfile};
    pub use crate::link::receive::{ReceiveChannel, RxDma};
    pub use crate::link::transmit::{LinkProfile, SerialTx, Transmitter};
    pub use crate::node::motion::{MotionEventSource, MotionLatch};
    pub use crate::node::orchestrator::{Activity, CaptureOrchestrator, NodeState, NodeTiming};
    pub use crate::timing::Clock;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}
