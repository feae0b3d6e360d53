//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the bridge hardware.
//! Buffer sizes, endpoint layout, clocks and pin mappings are centralized here.

/// System clock frequency (STM32G474 @ 170MHz)
pub const SYSTEM_CLOCK_HZ: u32 = 170_000_000;

/// Reference clock fed to the USART divisor formula
///
/// The divisor registers are a shadow translated back into a baud rate for
/// the driver, so this is a virtual clock. 18.432 MHz divides every standard
/// rate from 600 to 460800 baud exactly within the 12-bit divisor.
pub const USART_CLOCK_HZ: u32 = 18_432_000;

/// Host to serial relay queue size in bytes
pub const HOST_TO_SERIAL_BUFFER_SIZE: usize = 128;

/// Serial to host relay queue size in bytes
pub const SERIAL_TO_HOST_BUFFER_SIZE: usize = 128;

/// USB CDC ACM data endpoint packet size (bulk IN and OUT)
pub const CDC_TXRX_EPSIZE: u16 = 64;

/// USB CDC ACM notification endpoint packet size
pub const CDC_NOTIFICATION_EPSIZE: u16 = 8;

/// Data IN endpoint address (device to host)
pub const CDC_TX_EPADDR: u8 = 0x83;

/// Data OUT endpoint address (host to device)
pub const CDC_RX_EPADDR: u8 = 0x04;

/// Notification endpoint address
pub const CDC_NOTIFICATION_EPADDR: u8 = 0x82;

/// UART transmit pipe size, the UART's native block size
pub const UART_CHUNK_SIZE: usize = 16;

/// UART driver interrupt-side buffer size
pub const UART_DRIVER_BUFFER_SIZE: usize = 64;

/// Default serial baud rate before the host sets a line coding
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Interval at which the USB task samples the host line coding
pub const LINE_CODING_POLL_MS: u64 = 10;

/// USB VID (use test VID for development)
pub const USB_VID: u16 = 0x1209;

/// USB PID (get from pid.codes for production)
pub const USB_PID: u16 = 0x0002;

/// USB manufacturer string
pub const USB_MANUFACTURER: &str = "USB Serial Bridge";

/// USB product string
pub const USB_PRODUCT: &str = "USB to Serial Converter";

/// USB serial number string
pub const USB_SERIAL_NUMBER: &str = "0001";

/// USB maximum power draw in mA
pub const USB_MAX_POWER_MA: u16 = 100;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Status LED (directly on MCU)
    pub const LED_STATUS: &str = "PA5";

    /// USART1 TX
    pub const USART1_TX: &str = "PA9";

    /// USART1 RX
    pub const USART1_RX: &str = "PA10";

    /// USB D+ (handled by USB peripheral)
    pub const USB_DP: &str = "PA12";

    /// USB D- (handled by USB peripheral)
    pub const USB_DM: &str = "PA11";
}

/// A single USB endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Endpoint address including the direction bit
    pub address: u8,
    /// Maximum packet size in bytes
    pub size: u16,
    /// Number of hardware banks
    pub banks: u8,
}

impl EndpointConfig {
    /// Whether this is a device-to-host endpoint
    #[must_use]
    pub const fn is_in(&self) -> bool {
        self.address & 0x80 != 0
    }

    /// Endpoint number without the direction bit
    #[must_use]
    pub const fn number(&self) -> u8 {
        self.address & 0x0F
    }
}

/// Immutable layout of the CDC ACM interface
///
/// Set once at build time. The mutable half lives in
/// [`crate::types::CdcInterfaceState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CdcInterfaceConfig {
    /// Control (communications) interface number
    pub control_interface: u8,
    /// Data IN endpoint
    pub data_in: EndpointConfig,
    /// Data OUT endpoint
    pub data_out: EndpointConfig,
    /// Notification endpoint
    pub notification: EndpointConfig,
}

/// The bridge's CDC interface
pub const CDC_INTERFACE: CdcInterfaceConfig = CdcInterfaceConfig {
    control_interface: 0,
    data_in: EndpointConfig {
        address: CDC_TX_EPADDR,
        size: CDC_TXRX_EPSIZE,
        banks: 1,
    },
    data_out: EndpointConfig {
        address: CDC_RX_EPADDR,
        size: CDC_TXRX_EPSIZE,
        banks: 1,
    },
    notification: EndpointConfig {
        address: CDC_NOTIFICATION_EPADDR,
        size: CDC_NOTIFICATION_EPSIZE,
        banks: 1,
    },
};

/// Status LED blink timings per link state, in milliseconds (on, off)
pub mod led {
    //! Blink patterns for the single status LED

    /// Not connected: short blip
    pub const NOT_READY: (u64, u64) = (50, 1950);

    /// Enumerating: fast blink
    pub const ENUMERATING: (u64, u64) = (100, 100);

    /// Configured and ready: solid on
    pub const READY: (u64, u64) = (1000, 0);

    /// Endpoint configuration failed: double-rate blink
    pub const ERROR: (u64, u64) = (250, 250);
}
