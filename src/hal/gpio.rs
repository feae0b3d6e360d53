//! GPIO Abstractions
//!
//! Status LED driven from the USB link status.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;

use crate::status::LinkStatus;

/// Status LED driver
pub struct StatusLed<P: OutputPin> {
    pin: P,
}

impl<P: OutputPin> StatusLed<P> {
    /// Create a new status LED (initially off)
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin };
        led.off();
        led
    }

    /// Turn LED on
    pub fn on(&mut self) {
        // GPIO writes on this target are infallible
        let _ = self.pin.set_high();
    }

    /// Turn LED off
    pub fn off(&mut self) {
        let _ = self.pin.set_low();
    }

    /// Run one blink period for `status`
    pub async fn blink(&mut self, status: LinkStatus) {
        let (on_ms, off_ms) = status.blink_pattern();
        if on_ms > 0 {
            self.on();
            Timer::after(Duration::from_millis(on_ms)).await;
        }
        if off_ms > 0 {
            self.off();
            Timer::after(Duration::from_millis(off_ms)).await;
        }
    }
}
