//! USB Serial Bridge Main Application
//!
//! Entry point for the STM32G474 USB-to-serial bridge firmware.
//! Initializes hardware, spawns the transport pump tasks and runs the relay
//! loop.

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::usart::{self, BufferedUart};
use embassy_stm32::{bind_interrupts, peripherals, usb};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use usb_serial_bridge::config::{
    CDC_TXRX_EPSIZE, HOST_TO_SERIAL_BUFFER_SIZE, SERIAL_TO_HOST_BUFFER_SIZE, UART_CHUNK_SIZE,
    UART_DRIVER_BUFFER_SIZE, USART_CLOCK_HZ, USB_PID, USB_VID,
};
use usb_serial_bridge::hal::gpio::StatusLed;
use usb_serial_bridge::hal::pipe::{PipeSink, PipeSource};
use usb_serial_bridge::hal::uart::{self as bridge_uart, UartShadow};
use usb_serial_bridge::relay::{PeriodicTask, Relay};
use usb_serial_bridge::status::LinkStatus;
use usb_serial_bridge::types::LineEncoding;
use usb_serial_bridge::usb::cdc::{self, LineCodingMonitor};

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    USB_LP => usb::InterruptHandler<peripherals::USB>;
    USART1 => usart::BufferedInterruptHandler<peripherals::USART1>;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("USB Serial Bridge Firmware v{}", env!("CARGO_PKG_VERSION"));

    // USB needs the 48 MHz clock, trimmed from the USB SOF
    let mut config = embassy_stm32::Config::default();
    {
        use embassy_stm32::rcc::{mux, Hsi48Config};
        config.rcc.hsi48 = Some(Hsi48Config { sync_from_usb: true });
        config.rcc.mux.clk48sel = mux::Clk48sel::HSI48;
    }
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    let led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));

    let driver = usb::Driver::new(p.USB, Irqs, p.PA12, p.PA11);
    let (usb_device, cdc_class) = cdc::init(driver);

    info!("USB CDC ACM initialized ({:04X}:{:04X})", USB_VID, USB_PID);

    static UART_TX_BUF: StaticCell<[u8; UART_DRIVER_BUFFER_SIZE]> = StaticCell::new();
    static UART_RX_BUF: StaticCell<[u8; UART_DRIVER_BUFFER_SIZE]> = StaticCell::new();
    let uart = match BufferedUart::new(
        p.USART1,
        Irqs,
        p.PA10, // RX
        p.PA9,  // TX
        UART_TX_BUF.init([0; UART_DRIVER_BUFFER_SIZE]),
        UART_RX_BUF.init([0; UART_DRIVER_BUFFER_SIZE]),
        usart::Config::default(),
    ) {
        Ok(uart) => uart,
        Err(e) => defmt::panic!("USART1 init failed: {}", e),
    };
    let (uart_tx, uart_rx) = uart.split();

    info!("USART1 initialized");

    spawner.must_spawn(cdc::usb_task(usb_device));
    spawner.must_spawn(cdc::cdc_task(cdc_class));
    spawner.must_spawn(bridge_uart::uart_tx_task(uart_tx));
    spawner.must_spawn(bridge_uart::uart_rx_task(uart_rx));
    spawner.must_spawn(status_led_task(led));

    info!("Tasks spawned, entering relay loop");

    let mut host_to_serial_storage = [0u8; HOST_TO_SERIAL_BUFFER_SIZE];
    let mut serial_to_host_storage = [0u8; SERIAL_TO_HOST_BUFFER_SIZE];
    let mut host_to_serial = Relay::new(&mut host_to_serial_storage);
    let mut serial_to_host = Relay::new(&mut serial_to_host_storage);

    let mut host_rx = PipeSource::new(&cdc::HOST_RX_PIPE);
    let mut host_tx = PipeSink::new(&cdc::HOST_TX_PIPE, usize::from(CDC_TXRX_EPSIZE));
    let mut serial_rx = PipeSource::new(&bridge_uart::UART_RX_PIPE);
    let mut serial_tx = PipeSink::new(&bridge_uart::UART_TX_PIPE, UART_CHUNK_SIZE);

    let mut housekeeping = LineCodingMonitor::new(
        USART_CLOCK_HZ,
        UartShadow::new(USART_CLOCK_HZ),
        &LineEncoding::default(),
    );

    loop {
        host_to_serial.transfer(&mut host_rx, &mut serial_tx);
        serial_to_host.transfer(&mut serial_rx, &mut host_tx);
        housekeeping.periodic_task();

        if cdc::HOST_DETACHED.try_take().is_some() {
            host_to_serial.reset();
            serial_to_host.reset();
            cdc::HOST_TX_PIPE.clear();
        }

        yield_now().await;
    }
}

/// Status LED task - blinks the link status
#[embassy_executor::task]
async fn status_led_task(mut led: StatusLed<Output<'static>>) {
    let mut status = LinkStatus::default();
    loop {
        if let Some(next) = cdc::LINK_STATUS.try_take() {
            status = next;
        }
        led.blink(status).await;
    }
}
