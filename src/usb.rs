//! USB Subsystem
//!
//! CDC ACM virtual serial port facing the host, plus device lifecycle
//! tracking for the status LED.

pub mod cdc;
