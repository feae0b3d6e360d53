//! USB Serial Bridge Firmware Library
//!
//! This library provides the core functionality for an STM32G474-based
//! USB-to-serial bridge. The host sees a CDC ACM virtual serial port; every
//! byte it writes is relayed to the local UART and every byte received on the
//! UART is relayed back to the host. Line coding changes requested by the
//! host (baud rate, parity, stop bits, data bits) reconfigure the UART.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Relay Loop  │  Line Encoding Handler  │  Link Status        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      CORE LAYER                              │
//! │  Ring Buffer  │  CDC Protocol  │  Types / Config             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  USART  │  USB CDC ACM  │  GPIO                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Bounded memory**: every queue is a fixed ring over caller storage
//! - **Never block**: each transport call in the relay loop is a poll
//! - **Functional core, imperative shell**: the relay, the register mapping
//!   and the status machine are pure and host-testable; only `hal` and `usb`
//!   touch hardware
//! - **Explicit state**: interface configuration and interface state are
//!   separate values passed to whoever needs them

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;
#[cfg(feature = "embedded")]
pub use embassy_usb;

/// Hardware Abstraction Layer
///
/// UART register shadow, UART pump tasks and the status LED.
#[cfg(feature = "embedded")]
pub mod hal;

/// USB Subsystem
///
/// CDC ACM virtual serial port facing the host.
#[cfg(feature = "embedded")]
pub mod usb;

/// Bounded single-producer/single-consumer byte queue
pub mod ring_buffer;

/// Byte relay between two non-blocking transports
pub mod relay;

/// Serial transceiver register mapping and line encoding handler
pub mod usart;

/// CDC ACM class request payloads
pub mod protocol;

/// USB link status state machine
pub mod status;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;
