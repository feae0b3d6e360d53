//! USB Link Status
//!
//! Tracks the device through connect, enumeration and configuration so the
//! status LED can show where it is. Purely informational; the relay runs
//! regardless.

use crate::config::led;

/// Device lifecycle events delivered by the USB stack
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsbEvent {
    /// Bus power detected / device enabled
    Connect,
    /// Bus power lost / device disabled
    Disconnect,
    /// Bus reset by the host
    Reset,
    /// Host selected a configuration; `ok` is false if endpoint setup failed
    Configured {
        /// Endpoints configured successfully
        ok: bool,
    },
    /// Host deselected the configuration
    Deconfigured,
    /// Bus suspended or resumed
    Suspended(bool),
}

/// Link status shown on the LED
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LinkStatus {
    /// Not attached to a host
    #[default]
    NotReady,
    /// Attached, waiting for the host to configure the device
    Enumerating,
    /// Configured, data flows
    Ready,
    /// Configuration failed
    ///
    /// embassy-usb only reports successful configurations, so the firmware
    /// never enters this state; it stays for USB stacks that report failed
    /// endpoint setup.
    Error,
}

impl LinkStatus {
    /// Next status after `event`
    #[must_use]
    pub const fn on_event(self, event: UsbEvent) -> Self {
        match event {
            UsbEvent::Connect | UsbEvent::Reset | UsbEvent::Deconfigured => Self::Enumerating,
            UsbEvent::Disconnect => Self::NotReady,
            UsbEvent::Configured { ok: true } => Self::Ready,
            UsbEvent::Configured { ok: false } => Self::Error,
            UsbEvent::Suspended(true) => Self::NotReady,
            UsbEvent::Suspended(false) => match self {
                Self::NotReady => Self::Enumerating,
                other => other,
            },
        }
    }

    /// LED (on, off) durations in milliseconds
    #[must_use]
    pub const fn blink_pattern(self) -> (u64, u64) {
        match self {
            Self::NotReady => led::NOT_READY,
            Self::Enumerating => led::ENUMERATING,
            Self::Ready => led::READY,
            Self::Error => led::ERROR,
        }
    }

    /// Whether the host can exchange data
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LinkStatus {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NotReady => defmt::write!(f, "NotReady"),
            Self::Enumerating => defmt::write!(f, "Enumerating"),
            Self::Ready => defmt::write!(f, "Ready"),
            Self::Error => defmt::write!(f, "Error"),
        }
    }
}
