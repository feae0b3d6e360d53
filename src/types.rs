//! Shared types used across the bridge firmware
//!
//! Line encoding values negotiated with the host and the mutable state of the
//! CDC interface.

use core::fmt;

use crate::config::DEFAULT_BAUD_RATE;

/// Parity mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

impl Parity {
    /// Short display name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "N",
            Self::Odd => "O",
            Self::Even => "E",
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Parity {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.as_str());
    }
}

/// Number of stop bits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits
    Two,
}

impl StopBits {
    /// Stop bit count
    #[must_use]
    pub const fn count(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for StopBits {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.count());
    }
}

/// Serial line encoding requested by the host
///
/// Always handled as a whole value. A handler receives a copy and can never
/// observe a half-updated encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEncoding {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Parity
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Data bits; 6, 7 and 8 are supported by the transceiver
    pub data_bits: u8,
}

impl LineEncoding {
    /// Create a line encoding
    #[must_use]
    pub const fn new(baud_rate: u32, parity: Parity, stop_bits: StopBits, data_bits: u8) -> Self {
        Self {
            baud_rate,
            parity,
            stop_bits,
            data_bits,
        }
    }

    /// Whether the transceiver has a mask for the requested data bit count
    #[must_use]
    pub const fn has_supported_data_bits(&self) -> bool {
        matches!(self.data_bits, 6..=8)
    }
}

impl Default for LineEncoding {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE, Parity::None, StopBits::One, 8)
    }
}

impl fmt::Display for LineEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}{}",
            self.baud_rate,
            self.data_bits,
            self.parity.as_str(),
            self.stop_bits.count()
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LineEncoding {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{} {}{}{}",
            self.baud_rate,
            self.data_bits,
            self.parity,
            self.stop_bits
        );
    }
}

/// DTR/RTS control signals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlSignals {
    /// Data Terminal Ready
    pub dtr: bool,
    /// Request To Send
    pub rts: bool,
}

impl ControlSignals {
    /// Check if host has the port open (DTR set)
    #[must_use]
    pub const fn connected(&self) -> bool {
        self.dtr
    }
}

/// Mutable state of the CDC interface
///
/// Owned by the USB side and handed by value to whoever needs a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CdcInterfaceState {
    /// Current host line encoding
    pub line_encoding: LineEncoding,
    /// Current host control lines
    pub control_signals: ControlSignals,
}

impl CdcInterfaceState {
    /// Record a new line encoding, returning it if it differs from the current one
    pub fn update_line_encoding(&mut self, encoding: LineEncoding) -> Option<LineEncoding> {
        if self.line_encoding == encoding {
            None
        } else {
            self.line_encoding = encoding;
            Some(encoding)
        }
    }

    /// Record new control lines, returning true if they changed
    pub fn update_control_signals(&mut self, signals: ControlSignals) -> bool {
        let changed = self.control_signals != signals;
        self.control_signals = signals;
        changed
    }
}
