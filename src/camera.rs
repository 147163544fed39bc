//! Camera Subsystem
//!
//! The FIFO controller capture handshake and the image sensor bring-up.
//! Both sit behind small register-bus ports so the sequences can be driven
//! by test doubles.

pub mod fifo;
pub mod ov2640;
pub mod sensor;
