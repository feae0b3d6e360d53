//! CDC ACM Class Requests
//!
//! Payload formats of the PSTN subclass requests a host uses to drive a
//! virtual serial port: line coding and control line state.

use core::fmt;

use crate::types::{ControlSignals, LineEncoding, Parity, StopBits};

/// `SET_LINE_CODING` request code
pub const SET_LINE_CODING: u8 = 0x20;

/// `GET_LINE_CODING` request code
pub const GET_LINE_CODING: u8 = 0x21;

/// `SET_CONTROL_LINE_STATE` request code
pub const SET_CONTROL_LINE_STATE: u8 = 0x22;

/// `SEND_BREAK` request code
pub const SEND_BREAK: u8 = 0x23;

/// Length of a line coding payload
pub const LINE_CODING_LEN: usize = 7;

/// Control line state bit: Data Terminal Ready
pub const CONTROL_LINE_DTR: u16 = 0x0001;

/// Control line state bit: Request To Send
pub const CONTROL_LINE_RTS: u16 = 0x0002;

/// Protocol decoding errors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload shorter than required
    Truncated {
        /// Bytes required
        expected: usize,
        /// Bytes received
        actual: usize,
    },
    /// `bCharFormat` outside 0..=2
    InvalidCharFormat(u8),
    /// `bParityType` outside 0..=4
    InvalidParity(u8),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { expected, actual } => {
                write!(f, "payload truncated: expected {expected} bytes, got {actual}")
            }
            Self::InvalidCharFormat(v) => write!(f, "invalid char format {v}"),
            Self::InvalidParity(v) => write!(f, "invalid parity type {v}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ProtocolError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Truncated { expected, actual } => {
                defmt::write!(f, "Truncated({}/{})", actual, expected);
            }
            Self::InvalidCharFormat(v) => defmt::write!(f, "InvalidCharFormat({})", v),
            Self::InvalidParity(v) => defmt::write!(f, "InvalidParity({})", v),
        }
    }
}

/// Decode `bCharFormat`
///
/// 1.5 stop bits is accepted and treated as one; the transceiver has no
/// such mode.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidCharFormat`] for values above 2.
pub const fn decode_stop_bits(value: u8) -> Result<StopBits, ProtocolError> {
    match value {
        0 | 1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(ProtocolError::InvalidCharFormat(other)),
    }
}

/// Decode `bParityType`
///
/// Mark and space parity are accepted and treated as no parity.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidParity`] for values above 4.
pub const fn decode_parity(value: u8) -> Result<Parity, ProtocolError> {
    match value {
        0 | 3 | 4 => Ok(Parity::None),
        1 => Ok(Parity::Odd),
        2 => Ok(Parity::Even),
        other => Err(ProtocolError::InvalidParity(other)),
    }
}

/// Decode a `SET_LINE_CODING` payload
///
/// Layout (little endian): `dwDTERate: u32`, `bCharFormat: u8`,
/// `bParityType: u8`, `bDataBits: u8`. Bytes past the seventh are ignored.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the payload is short or a field is out of
/// range. `bDataBits` is passed through unchecked.
pub fn decode_line_coding(payload: &[u8]) -> Result<LineEncoding, ProtocolError> {
    let Some(fields) = payload.get(..LINE_CODING_LEN) else {
        return Err(ProtocolError::Truncated {
            expected: LINE_CODING_LEN,
            actual: payload.len(),
        });
    };

    let baud_rate = u32::from_le_bytes([fields[0], fields[1], fields[2], fields[3]]);
    let stop_bits = decode_stop_bits(fields[4])?;
    let parity = decode_parity(fields[5])?;
    let data_bits = fields[6];

    Ok(LineEncoding::new(baud_rate, parity, stop_bits, data_bits))
}

/// Encode a `GET_LINE_CODING` payload
#[must_use]
pub fn encode_line_coding(encoding: &LineEncoding) -> [u8; LINE_CODING_LEN] {
    let rate = encoding.baud_rate.to_le_bytes();
    let char_format = match encoding.stop_bits {
        StopBits::One => 0,
        StopBits::Two => 2,
    };
    let parity = match encoding.parity {
        Parity::None => 0,
        Parity::Odd => 1,
        Parity::Even => 2,
    };

    [
        rate[0],
        rate[1],
        rate[2],
        rate[3],
        char_format,
        parity,
        encoding.data_bits,
    ]
}

/// Decode the `wValue` of `SET_CONTROL_LINE_STATE`
#[must_use]
pub const fn decode_control_line_state(value: u16) -> ControlSignals {
    ControlSignals {
        dtr: value & CONTROL_LINE_DTR != 0,
        rts: value & CONTROL_LINE_RTS != 0,
    }
}

/// Encode control signals as a `wValue`
#[must_use]
pub const fn encode_control_line_state(signals: ControlSignals) -> u16 {
    let mut value = 0;
    if signals.dtr {
        value |= CONTROL_LINE_DTR;
    }
    if signals.rts {
        value |= CONTROL_LINE_RTS;
    }
    value
}
