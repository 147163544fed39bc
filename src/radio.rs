//! Radio Module Control
//!
//! AT-command protocol engine for the mesh radio module, plus the
//! provisioning sequences (network join, identity rotation) built on it.

pub mod command;
pub mod engine;
pub mod provision;
