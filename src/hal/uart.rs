//! UART Transceiver
//!
//! Bridges the register-level reconfiguration model onto embassy's buffered
//! USART driver, and pumps bytes between the driver and the relay pipes.
//!
//! The driver does not expose raw register access, so [`UartShadow`] keeps a
//! shadow copy of the three control registers and the divisor. Clearing
//! register B marks the transceiver disabled; writing the enable bits back
//! translates the shadow into a driver [`Config`] and hands it to both pump
//! tasks, which apply it between transfers.

use embassy_futures::select::{select, Either};
use embassy_stm32::usart::{
    BufferedUartRx, BufferedUartTx, Config, DataBits, Parity as UartParity, StopBits as UartStopBits,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_io_async::{Read, Write};

use crate::config::UART_CHUNK_SIZE;
use crate::hal::pipe::BytePipe;
use crate::usart::{bits, double_speed_baud, word_length, UsartRegisters};

/// Bytes waiting to go out on the UART (host to serial)
pub static UART_TX_PIPE: BytePipe<UART_CHUNK_SIZE> = BytePipe::new();

/// Bytes received on the UART (serial to host)
pub static UART_RX_PIPE: BytePipe<UART_CHUNK_SIZE> = BytePipe::new();

/// Pending configuration for the transmit half
static TX_CONFIG: Signal<CriticalSectionRawMutex, Config> = Signal::new();

/// Pending configuration for the receive half
static RX_CONFIG: Signal<CriticalSectionRawMutex, Config> = Signal::new();

/// Shadow of the transceiver control registers
pub struct UartShadow {
    clock_hz: u32,
    control_a: u8,
    control_b: u8,
    control_c: u8,
    divisor: u16,
}

impl UartShadow {
    /// Create a shadow for a transceiver clocked at `clock_hz`
    #[must_use]
    pub const fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            control_a: 0,
            control_b: 0,
            control_c: 0,
            divisor: 0,
        }
    }

    /// Whether transmitter and receiver are enabled
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.control_b & (bits::TXEN | bits::RXEN) != 0
    }

    /// Translate the shadow registers into a driver configuration
    #[must_use]
    pub fn driver_config(&self) -> Config {
        let mut config = Config::default();

        config.baudrate = if self.control_a & bits::U2X != 0 {
            double_speed_baud(self.divisor, self.clock_hz)
        } else {
            self.clock_hz / (16 * (u32::from(self.divisor) + 1))
        };

        config.parity = match self.control_c & (bits::UPM1 | bits::UPM0) {
            m if m == bits::UPM1 | bits::UPM0 => UartParity::ParityOdd,
            m if m == bits::UPM1 => UartParity::ParityEven,
            _ => UartParity::ParityNone,
        };

        config.stop_bits = if self.control_c & bits::USBS != 0 {
            UartStopBits::STOP2
        } else {
            UartStopBits::STOP1
        };

        config.data_bits = match word_length(self.control_c) {
            Some(7) => DataBits::DataBits7,
            Some(9) => DataBits::DataBits9,
            Some(_) => DataBits::DataBits8,
            None => {
                defmt::warn!(
                    "unsupported frame format {=u8:#x}, using 8 bit words",
                    self.control_c
                );
                DataBits::DataBits8
            }
        };

        config
    }
}

impl UsartRegisters for UartShadow {
    fn write_control_a(&mut self, value: u8) {
        self.control_a = value;
    }

    fn write_control_b(&mut self, value: u8) {
        let was_enabled = self.is_enabled();
        self.control_b = value;

        if self.is_enabled() && !was_enabled {
            let config = self.driver_config();
            TX_CONFIG.signal(config);
            RX_CONFIG.signal(config);
        }
    }

    fn write_control_c(&mut self, value: u8) {
        self.control_c = value;
    }

    fn write_divisor(&mut self, value: u16) {
        self.divisor = value;
    }
}

/// Drain [`UART_TX_PIPE`] into the UART
#[embassy_executor::task]
pub async fn uart_tx_task(mut tx: BufferedUartTx<'static>) {
    let mut buf = [0u8; UART_CHUNK_SIZE];
    loop {
        let event = select(TX_CONFIG.wait(), UART_TX_PIPE.read(&mut buf)).await;
        match event {
            Either::First(config) => {
                if let Err(e) = tx.set_config(&config) {
                    defmt::error!("UART TX reconfigure failed: {}", e);
                }
            }
            Either::Second(n) => {
                if let Err(e) = tx.write_all(&buf[..n]).await {
                    defmt::warn!("UART write error: {}", e);
                }
            }
        }
    }
}

/// Fill [`UART_RX_PIPE`] from the UART
#[embassy_executor::task]
pub async fn uart_rx_task(mut rx: BufferedUartRx<'static>) {
    let mut buf = [0u8; UART_CHUNK_SIZE];
    loop {
        let event = select(RX_CONFIG.wait(), rx.read(&mut buf)).await;
        match event {
            Either::First(config) => {
                if let Err(e) = rx.set_config(&config) {
                    defmt::error!("UART RX reconfigure failed: {}", e);
                }
            }
            Either::Second(Ok(n)) => UART_RX_PIPE.write_all(&buf[..n]).await,
            Either::Second(Err(e)) => defmt::warn!("UART read error: {}", e),
        }
    }
}
