//! Hardware Abstraction Layer
//!
//! Binds the portable core's ports to STM32G474 peripherals through
//! embassy-stm32. Nothing in here is built for host tests.

pub mod gpio;
pub mod i2c;
pub mod spi;
pub mod timer;
pub mod uart;
