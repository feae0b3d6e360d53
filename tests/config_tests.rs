//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use usb_serial_bridge::config::*;
use usb_serial_bridge::usart::{double_speed_baud, double_speed_divisor, MAX_DIVISOR};

// =============================================================================
// Buffer Sizes
// =============================================================================

#[test]
fn relay_buffers_hold_several_packets() {
    assert!(HOST_TO_SERIAL_BUFFER_SIZE >= usize::from(CDC_TXRX_EPSIZE));
    assert!(SERIAL_TO_HOST_BUFFER_SIZE >= usize::from(CDC_TXRX_EPSIZE));
}

#[test]
fn chunk_sizes_allow_progress() {
    // The relay sends chunk_limit - 1 bytes per pass
    assert!(CDC_TXRX_EPSIZE >= 2);
    assert!(UART_CHUNK_SIZE >= 2);
}

// =============================================================================
// USB Configuration
// =============================================================================

#[test]
fn usb_packet_sizes_valid() {
    // Full speed bulk endpoints: 8, 16, 32 or 64 bytes
    assert!([8, 16, 32, 64].contains(&CDC_TXRX_EPSIZE));
    assert!(CDC_NOTIFICATION_EPSIZE >= 8);
}

#[test]
fn cdc_interface_endpoints() {
    let iface = CDC_INTERFACE;
    assert!(iface.data_in.is_in());
    assert!(!iface.data_out.is_in());
    assert!(iface.notification.is_in());
    assert_eq!(iface.data_in.size, CDC_TXRX_EPSIZE);
    assert_eq!(iface.data_out.size, CDC_TXRX_EPSIZE);
    assert_eq!(iface.notification.size, CDC_NOTIFICATION_EPSIZE);
}

#[test]
fn cdc_endpoint_numbers_unique() {
    let iface = CDC_INTERFACE;
    let numbers = [
        iface.data_in.number(),
        iface.data_out.number(),
        iface.notification.number(),
    ];
    assert!(numbers.iter().all(|&n| n != 0));
    assert_ne!(numbers[0], numbers[1]);
    assert_ne!(numbers[0], numbers[2]);
    assert_ne!(numbers[1], numbers[2]);
}

#[test]
fn usb_vid_is_pid_codes() {
    assert_eq!(USB_VID, 0x1209);
    assert!(USB_MAX_POWER_MA <= 500);
}

// =============================================================================
// Serial Configuration
// =============================================================================

#[test]
fn default_baud_reachable() {
    let divisor = double_speed_divisor(DEFAULT_BAUD_RATE, USART_CLOCK_HZ);
    assert!(divisor < MAX_DIVISOR);
    let actual = double_speed_baud(divisor, USART_CLOCK_HZ);
    assert!(actual.abs_diff(DEFAULT_BAUD_RATE) * 100 < DEFAULT_BAUD_RATE);
}

#[test]
fn common_baud_rates_within_two_percent() {
    for baud in [
        1200, 2400, 4800, 9600, 19_200, 38_400, 57_600, 115_200, 230_400, 460_800,
    ] {
        let divisor = double_speed_divisor(baud, USART_CLOCK_HZ);
        assert!(divisor < MAX_DIVISOR, "{baud} clamps");
        let actual = double_speed_baud(divisor, USART_CLOCK_HZ);
        assert!(actual.abs_diff(baud) * 50 < baud, "{baud} -> {actual}");
    }
}

#[test]
fn slow_baud_rates_not_clamped() {
    // The slowest reachable rate sits below every standard rate from 600 up
    let slowest = double_speed_baud(MAX_DIVISOR, USART_CLOCK_HZ);
    assert!(slowest < 600, "slowest rate {slowest}");

    for baud in [600, 1200, 2400, 4800] {
        let actual = double_speed_baud(double_speed_divisor(baud, USART_CLOCK_HZ), USART_CLOCK_HZ);
        assert_eq!(actual, baud);
    }
}
