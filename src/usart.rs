//! Serial Transceiver Configuration
//!
//! Maps a host [`LineEncoding`] onto the transceiver's register set and
//! applies it. The register model is the classic three-control-register
//! USART:
//!
//! ```text
//! A  status / control   U2X (double speed)
//! B  enable / interrupt RXCIE | TXEN | RXEN
//! C  frame format       UPM1 UPM0 | USBS | UCSZ1 UCSZ0
//! BRR                   12-bit baud divisor
//! ```
//!
//! Reconfiguration always clears A, B and C before touching the divisor or
//! the frame format, and sets B last, so nothing is sent or received under a
//! half-applied configuration.

use crate::types::{LineEncoding, Parity, StopBits};

/// Register bit positions
pub mod bits {
    /// Double speed (register A)
    pub const U2X: u8 = 1 << 1;

    /// Receive complete interrupt enable (register B)
    pub const RXCIE: u8 = 1 << 7;
    /// Receiver enable (register B)
    pub const RXEN: u8 = 1 << 4;
    /// Transmitter enable (register B)
    pub const TXEN: u8 = 1 << 3;

    /// Parity mode bit 1 (register C)
    pub const UPM1: u8 = 1 << 5;
    /// Parity mode bit 0 (register C)
    pub const UPM0: u8 = 1 << 4;
    /// Two stop bits (register C)
    pub const USBS: u8 = 1 << 3;
    /// Character size bit 1 (register C)
    pub const UCSZ1: u8 = 1 << 2;
    /// Character size bit 0 (register C)
    pub const UCSZ0: u8 = 1 << 1;
}

/// Largest value the divisor register holds
pub const MAX_DIVISOR: u16 = 0x0FFF;

/// Register B value for a running transceiver
pub const ENABLE_BITS: u8 = bits::RXCIE | bits::TXEN | bits::RXEN;

/// Write access to the transceiver registers
pub trait UsartRegisters {
    /// Write register A (status / double speed)
    fn write_control_a(&mut self, value: u8);
    /// Write register B (enable / interrupt mask)
    fn write_control_b(&mut self, value: u8);
    /// Write register C (frame format)
    fn write_control_c(&mut self, value: u8);
    /// Write the baud divisor
    fn write_divisor(&mut self, value: u16);
}

/// Frame format bits for register C
///
/// Data bit counts other than 6, 7 and 8 contribute no bits.
#[must_use]
pub const fn mode_bits(encoding: &LineEncoding) -> u8 {
    let parity = match encoding.parity {
        Parity::Odd => bits::UPM1 | bits::UPM0,
        Parity::Even => bits::UPM1,
        Parity::None => 0,
    };

    let stop = match encoding.stop_bits {
        StopBits::Two => bits::USBS,
        StopBits::One => 0,
    };

    let data = match encoding.data_bits {
        6 => bits::UCSZ0,
        7 => bits::UCSZ1,
        8 => bits::UCSZ1 | bits::UCSZ0,
        _ => 0,
    };

    parity | stop | data
}

/// Baud divisor in double speed mode
///
/// `((clock / 8) + (baud / 2)) / baud - 1`, rounded to nearest, clamped to
/// `0..=MAX_DIVISOR`. A baud rate of zero selects the slowest rate.
#[must_use]
pub const fn double_speed_divisor(baud_rate: u32, clock_hz: u32) -> u16 {
    if baud_rate == 0 {
        return MAX_DIVISOR;
    }

    let divisor = ((clock_hz / 8) + (baud_rate / 2)) / baud_rate;
    let divisor = divisor.saturating_sub(1);
    if divisor > MAX_DIVISOR as u32 {
        MAX_DIVISOR
    } else {
        divisor as u16
    }
}

/// Baud rate actually produced by a double speed divisor
#[must_use]
pub const fn double_speed_baud(divisor: u16, clock_hz: u32) -> u32 {
    clock_hz / (8 * (divisor as u32 + 1))
}

/// Character size encoded in a register C value
#[must_use]
pub const fn mode_data_bits(mode: u8) -> u8 {
    match mode & (bits::UCSZ1 | bits::UCSZ0) {
        m if m == bits::UCSZ1 | bits::UCSZ0 => 8,
        m if m == bits::UCSZ1 => 7,
        m if m == bits::UCSZ0 => 6,
        _ => 5,
    }
}

/// Word length of a register C value counting the parity bit
///
/// Only 7, 8 and 9 bit words exist on the target USART; anything else
/// yields `None`.
#[must_use]
pub const fn word_length(mode: u8) -> Option<u8> {
    // Both parity modes set UPM1
    let parity_bits = (mode & bits::UPM1) >> 5;
    match mode_data_bits(mode) + parity_bits {
        word @ 7..=9 => Some(word),
        _ => None,
    }
}

/// Register values derived from one line encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UsartConfig {
    /// Register C
    pub mode: u8,
    /// Baud divisor
    pub divisor: u16,
}

impl UsartConfig {
    /// Compute register values for `encoding` against `clock_hz`
    #[must_use]
    pub const fn from_line_encoding(encoding: &LineEncoding, clock_hz: u32) -> Self {
        Self {
            mode: mode_bits(encoding),
            divisor: double_speed_divisor(encoding.baud_rate, clock_hz),
        }
    }

    /// Write this configuration in disable, configure, enable order
    pub fn apply<R: UsartRegisters + ?Sized>(&self, regs: &mut R) {
        regs.write_control_b(0);
        regs.write_control_a(0);
        regs.write_control_c(0);

        regs.write_divisor(self.divisor);

        regs.write_control_c(self.mode);
        regs.write_control_a(bits::U2X);
        regs.write_control_b(ENABLE_BITS);
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for UsartConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "mode={=u8:#x} divisor={=u16}", self.mode, self.divisor);
    }
}

/// Handler state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HandlerState {
    /// Transceiver running with the last applied configuration
    #[default]
    Idle,
    /// Transceiver disabled while registers are rewritten
    Reconfiguring,
}

/// Reacts to host line encoding changes
pub struct LineEncodingHandler {
    clock_hz: u32,
    state: HandlerState,
    last_applied: Option<UsartConfig>,
    reconfigurations: u32,
}

impl LineEncodingHandler {
    /// Create a handler for a transceiver clocked at `clock_hz`
    #[must_use]
    pub const fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            state: HandlerState::Idle,
            last_applied: None,
            reconfigurations: 0,
        }
    }

    /// Reconfigure the transceiver for a new host encoding
    ///
    /// Called exactly once per host change. Never fails: unsupported data
    /// bit counts fall through to an encoding with no character size bits.
    pub fn on_line_encoding_changed<R: UsartRegisters + ?Sized>(
        &mut self,
        regs: &mut R,
        encoding: &LineEncoding,
    ) {
        let config = UsartConfig::from_line_encoding(encoding, self.clock_hz);

        self.state = HandlerState::Reconfiguring;
        config.apply(regs);
        self.state = HandlerState::Idle;

        self.last_applied = Some(config);
        self.reconfigurations = self.reconfigurations.wrapping_add(1);

        #[cfg(feature = "embedded")]
        defmt::info!("line encoding {} -> {}", encoding, config);
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> HandlerState {
        self.state
    }

    /// Last configuration written to the transceiver
    #[must_use]
    pub const fn last_applied(&self) -> Option<UsartConfig> {
        self.last_applied
    }

    /// Number of reconfigurations since start
    #[must_use]
    pub const fn reconfigurations(&self) -> u32 {
        self.reconfigurations
    }

    /// Reference clock used for divisors
    #[must_use]
    pub const fn clock_hz(&self) -> u32 {
        self.clock_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divisor_rounds_to_nearest() {
        // 16 MHz / 8 = 2 MHz; 2_000_000 / 9600 = 208.33 -> 208 - 1
        assert_eq!(double_speed_divisor(9600, 16_000_000), 207);
        // 2_000_000 / 115200 = 17.36 -> 17 - 1
        assert_eq!(double_speed_divisor(115_200, 16_000_000), 16);
    }

    #[test]
    fn divisor_clamps() {
        assert_eq!(double_speed_divisor(0, 16_000_000), MAX_DIVISOR);
        assert_eq!(double_speed_divisor(1, 16_000_000), MAX_DIVISOR);
        assert_eq!(double_speed_divisor(10_000_000, 16_000_000), 0);
    }

    #[test]
    fn produced_baud_close_to_requested() {
        let divisor = double_speed_divisor(115_200, 170_000_000);
        let actual = double_speed_baud(divisor, 170_000_000);
        let error = actual.abs_diff(115_200);
        assert!(error * 100 < 115_200, "error {error} too large");
    }

    #[test]
    fn uart_crystal_clock_is_exact() {
        for baud in [1200, 9600, 115_200, 460_800] {
            let divisor = double_speed_divisor(baud, 18_432_000);
            assert_eq!(double_speed_baud(divisor, 18_432_000), baud);
        }
    }
}
