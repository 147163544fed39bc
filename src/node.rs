//! Node Control
//!
//! The motion event source and the capture orchestrator main loop.

pub mod motion;
pub mod orchestrator;
