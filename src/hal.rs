//! Hardware Abstraction Layer
//!
//! Provides safe abstractions over STM32G474 peripherals.
//! This module isolates hardware-specific code and exposes the non-blocking
//! byte primitives the relay loop runs on.

pub mod gpio;
pub mod pipe;
pub mod uart;
