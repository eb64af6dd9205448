//! # Ports Module
//!
//! Outbound dependency traits of the inbound pipeline.

pub mod outbound;

pub use outbound::*;
