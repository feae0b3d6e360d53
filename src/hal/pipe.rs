//! Pipe Endpoints
//!
//! Each physical transport is pumped by its own async task into a small
//! `embassy_sync` pipe sized to the transport's native block. The relay loop
//! only ever touches those pipes through the non-blocking `try_read` /
//! `try_write` calls wrapped here.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;

use crate::relay::{ByteSink, ByteSource, SendError};

/// Pipe shared between a pump task and the relay loop
pub type BytePipe<const N: usize> = Pipe<CriticalSectionRawMutex, N>;

/// Relay source reading from a pipe filled by a receive pump
pub struct PipeSource<const N: usize> {
    pipe: &'static BytePipe<N>,
}

impl<const N: usize> PipeSource<N> {
    /// Wrap `pipe`
    #[must_use]
    pub const fn new(pipe: &'static BytePipe<N>) -> Self {
        Self { pipe }
    }
}

impl<const N: usize> ByteSource for PipeSource<N> {
    fn receive_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.pipe.try_read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }
}

/// Relay sink writing to a pipe drained by a transmit pump
///
/// Ready only once the pump has taken everything from the previous pass,
/// the pipe equivalent of a free endpoint bank.
pub struct PipeSink<const N: usize> {
    pipe: &'static BytePipe<N>,
    chunk_limit: usize,
}

impl<const N: usize> PipeSink<N> {
    /// Wrap `pipe`; `chunk_limit` is the transport's block size
    #[must_use]
    pub const fn new(pipe: &'static BytePipe<N>, chunk_limit: usize) -> Self {
        Self { pipe, chunk_limit }
    }
}

impl<const N: usize> ByteSink for PipeSink<N> {
    fn is_send_ready(&mut self) -> bool {
        self.pipe.is_empty()
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), SendError> {
        match self.pipe.try_write(&[byte]) {
            Ok(1) => Ok(()),
            _ => Err(SendError::NotReady),
        }
    }

    fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }
}
