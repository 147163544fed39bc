//! Radio Link
//!
//! The half-duplex serial link to the radio module: a DMA-fed receive
//! channel and a transmitter with two timing profiles.

pub mod receive;
pub mod transmit;
