//! USB CDC ACM (Serial) Implementation
//!
//! Provides the virtual serial port the host talks to. Two pump tasks move
//! packets between the CDC endpoints and the relay pipes; the receive pump
//! also samples the host line coding and control lines and raises
//! [`LINE_ENCODING`] when the host changes the serial parameters.

use embassy_futures::join::join;
use embassy_futures::select::{select, Either};
use embassy_stm32::peripherals::USB;
use embassy_stm32::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use embassy_usb::class::cdc_acm::{self, CdcAcmClass, Receiver, Sender, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Handler, UsbDevice};
use static_cell::StaticCell;

use crate::config::{
    CDC_TXRX_EPSIZE, LINE_CODING_POLL_MS, USB_MANUFACTURER, USB_MAX_POWER_MA, USB_PID,
    USB_PRODUCT, USB_SERIAL_NUMBER, USB_VID,
};
use crate::hal::pipe::BytePipe;
use crate::relay::PeriodicTask;
use crate::status::{LinkStatus, UsbEvent};
use crate::types::{CdcInterfaceState, ControlSignals, LineEncoding, Parity, StopBits};
use crate::usart::{LineEncodingHandler, UsartRegisters};

/// CDC packet size as a buffer length
const PACKET_SIZE: usize = CDC_TXRX_EPSIZE as usize;

/// USB driver type for this board
pub type UsbDriver = Driver<'static, USB>;

/// Bytes received from the host (host to serial)
pub static HOST_RX_PIPE: BytePipe<PACKET_SIZE> = BytePipe::new();

/// Bytes waiting to go to the host (serial to host)
pub static HOST_TX_PIPE: BytePipe<PACKET_SIZE> = BytePipe::new();

/// Raised with a snapshot whenever the host changes the line coding
pub static LINE_ENCODING: Signal<CriticalSectionRawMutex, LineEncoding> = Signal::new();

/// Raised whenever the link status changes
pub static LINK_STATUS: Signal<CriticalSectionRawMutex, LinkStatus> = Signal::new();

/// Raised when the host goes away; queued bytes belong to the old session
pub static HOST_DETACHED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Convert embassy's line coding into a [`LineEncoding`]
///
/// Mark and space parity map to no parity, 1.5 stop bits to one.
#[must_use]
pub fn line_encoding_from(coding: &cdc_acm::LineCoding) -> LineEncoding {
    let parity = match coding.parity_type() {
        cdc_acm::ParityType::Odd => Parity::Odd,
        cdc_acm::ParityType::Even => Parity::Even,
        cdc_acm::ParityType::None | cdc_acm::ParityType::Mark | cdc_acm::ParityType::Space => {
            Parity::None
        }
    };
    let stop_bits = match coding.stop_bits() {
        cdc_acm::StopBits::Two => StopBits::Two,
        cdc_acm::StopBits::One | cdc_acm::StopBits::OnePointFive => StopBits::One,
    };

    LineEncoding::new(coding.data_rate(), parity, stop_bits, coding.data_bits())
}

/// Tracks device lifecycle events for the status LED
pub struct StatusHandler {
    status: LinkStatus,
}

impl StatusHandler {
    /// Create a handler in the not-ready state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: LinkStatus::NotReady,
        }
    }

    fn handle(&mut self, event: UsbEvent) {
        let next = self.status.on_event(event);
        if next == self.status {
            return;
        }

        defmt::info!("USB link {} -> {}", self.status, next);
        self.status = next;
        LINK_STATUS.signal(next);
        if next == LinkStatus::NotReady {
            HOST_DETACHED.signal(());
        }
    }
}

impl Default for StatusHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for StatusHandler {
    fn enabled(&mut self, enabled: bool) {
        self.handle(if enabled {
            UsbEvent::Connect
        } else {
            UsbEvent::Disconnect
        });
    }

    fn reset(&mut self) {
        self.handle(UsbEvent::Reset);
    }

    fn configured(&mut self, configured: bool) {
        // Endpoint setup failures are not reported here
        self.handle(if configured {
            UsbEvent::Configured { ok: true }
        } else {
            UsbEvent::Deconfigured
        });
    }

    fn suspended(&mut self, suspended: bool) {
        self.handle(UsbEvent::Suspended(suspended));
    }
}

/// Build the USB device and its CDC ACM class
pub fn init(driver: UsbDriver) -> (UsbDevice<'static, UsbDriver>, CdcAcmClass<'static, UsbDriver>) {
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
    static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();
    static STATUS_HANDLER: StaticCell<StatusHandler> = StaticCell::new();

    let mut config = embassy_usb::Config::new(USB_VID, USB_PID);
    config.manufacturer = Some(USB_MANUFACTURER);
    config.product = Some(USB_PRODUCT);
    config.serial_number = Some(USB_SERIAL_NUMBER);
    config.max_power = USB_MAX_POWER_MA;
    config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    );
    builder.handler(STATUS_HANDLER.init(StatusHandler::new()));

    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), CDC_TXRX_EPSIZE);
    (builder.build(), class)
}

/// Run the USB device state machine
#[embassy_executor::task]
pub async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) {
    usb.run().await;
}

/// Pump packets between the CDC endpoints and the host pipes
#[embassy_executor::task]
pub async fn cdc_task(class: CdcAcmClass<'static, UsbDriver>) {
    let (sender, receiver) = class.split();
    join(receive_pump(receiver), transmit_pump(sender)).await;
}

async fn receive_pump(mut receiver: Receiver<'static, UsbDriver>) {
    let mut state = CdcInterfaceState::default();
    let mut buf = [0u8; PACKET_SIZE];
    let poll = Duration::from_millis(LINE_CODING_POLL_MS);

    loop {
        receiver.wait_connection().await;
        defmt::info!("CDC connected");

        loop {
            let event = select(receiver.read_packet(&mut buf), Timer::after(poll)).await;
            match event {
                Either::First(Ok(n)) => HOST_RX_PIPE.write_all(&buf[..n]).await,
                Either::First(Err(EndpointError::Disabled)) => break,
                Either::First(Err(EndpointError::BufferOverflow)) => {
                    defmt::warn!("CDC packet overflow");
                }
                Either::Second(()) => {}
            }

            let coding = line_encoding_from(&receiver.line_coding());
            if let Some(encoding) = state.update_line_encoding(coding) {
                LINE_ENCODING.signal(encoding);
            }

            let signals = ControlSignals {
                dtr: receiver.dtr(),
                rts: receiver.rts(),
            };
            if state.update_control_signals(signals) {
                defmt::debug!("control lines dtr={} rts={}", signals.dtr, signals.rts);
            }
        }

        defmt::info!("CDC disconnected");
    }
}

async fn transmit_pump(mut sender: Sender<'static, UsbDriver>) {
    // Never a full packet, so no zero-length terminator is ever needed
    let mut buf = [0u8; PACKET_SIZE - 1];

    loop {
        sender.wait_connection().await;

        loop {
            let n = HOST_TX_PIPE.read(&mut buf).await;
            match sender.write_packet(&buf[..n]).await {
                Ok(()) => {}
                Err(EndpointError::Disabled) => break,
                Err(EndpointError::BufferOverflow) => defmt::warn!("CDC write overflow"),
            }
        }
    }
}

/// Per-iteration housekeeping for the bridge loop
///
/// Delivers pending host line coding changes to the [`LineEncodingHandler`]
/// synchronously, from the relay loop's own context.
pub struct LineCodingMonitor<R: UsartRegisters> {
    handler: LineEncodingHandler,
    registers: R,
}

impl<R: UsartRegisters> LineCodingMonitor<R> {
    /// Create a monitor and apply `initial` right away
    pub fn new(clock_hz: u32, mut registers: R, initial: &LineEncoding) -> Self {
        let mut handler = LineEncodingHandler::new(clock_hz);
        handler.on_line_encoding_changed(&mut registers, initial);
        Self { handler, registers }
    }

    /// The line encoding handler
    #[must_use]
    pub const fn handler(&self) -> &LineEncodingHandler {
        &self.handler
    }
}

impl<R: UsartRegisters> PeriodicTask for LineCodingMonitor<R> {
    fn periodic_task(&mut self) {
        if let Some(encoding) = LINE_ENCODING.try_take() {
            self.handler.on_line_encoding_changed(&mut self.registers, &encoding);
        }
    }
}
