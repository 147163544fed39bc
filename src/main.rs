//! Camera Node Main Application
//!
//! Entry point for the STM32G474-based camera node firmware.
//! Initializes hardware, spawns the receive and motion tasks, brings up the
//! sensor, joins the network and then runs the capture loop.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Async;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, RingBufferedUartRx, Uart};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::pipe::Pipe;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use lpn_firmware::camera::ov2640;
use lpn_firmware::camera::sensor::SensorId;
use lpn_firmware::hal::gpio::{MotionInput, StatusLed};
use lpn_firmware::hal::i2c::{I2cAddress, SccbBus};
use lpn_firmware::hal::spi::ArducamSpi;
use lpn_firmware::hal::timer::SystemClock;
use lpn_firmware::hal::uart::{profile_config, pump_rx, PipeReceiver, RadioUart, RxPipe};
use lpn_firmware::prelude::*;

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

static RX_PIPE: RxPipe = Pipe::new();
static RX_RING: StaticCell<[u8; RX_DMA_RING_SIZE]> = StaticCell::new();
static IMAGE: ConstStaticCell<[u8; IMAGE_FRAME_SIZE]> = ConstStaticCell::new([0; IMAGE_FRAME_SIZE]);
static MOTION: MotionLatch = MotionLatch::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Camera Node Firmware v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(embassy_stm32::Config::default());
    info!("Peripherals initialized");

    let mut led = StatusLed::new(Output::new(p.PA5, Level::Low, Speed::Low));
    let mut clock = SystemClock::new();

    // Radio link on USART1: PA9 = TX, PA10 = RX
    let uart = Uart::new(
        p.USART1,
        p.PA10,
        p.PA9,
        Irqs,
        p.DMA1_CH3,
        p.DMA1_CH4,
        profile_config(LinkProfile::Command),
    )
    .unwrap();
    let (tx, rx) = uart.split();
    let rx = rx.into_ring_buffered(RX_RING.init([0; RX_DMA_RING_SIZE]));
    spawner.spawn(radio_rx_task(rx)).unwrap();
    info!("USART1 initialized at {} baud", RADIO_BAUD);

    // PIR output on PC0
    let motion_in = MotionInput::new(ExtiInput::new(p.PC0, p.EXTI0, Pull::Up));
    spawner.spawn(motion_task(motion_in)).unwrap();

    // Sensor configuration bus: PB8 = SCL, PB9 = SDA
    let i2c = I2c::new(
        p.I2C1,
        p.PB8, // SCL
        p.PB9, // SDA
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        Hertz(SCCB_FREQUENCY_HZ),
        Default::default(),
    );
    let mut sccb = SccbBus::new(i2c, I2cAddress::OV2640);
    if bring_up_sensor(&mut sccb, &mut clock).await.is_none() {
        error!("camera sensor unavailable, halting");
        led.fault().await;
    }

    // Camera FIFO on SPI1: PB3 = SCK, PB4 = MISO, PB5 = MOSI, PB6 = CS
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(CAMERA_SPI_HZ);
    let spi: Spi<'static, Async> = Spi::new(
        p.SPI1, p.PB3, p.PB5, p.PB4, p.DMA1_CH5, p.DMA1_CH6, spi_config,
    );
    let cs = Output::new(p.PB6, Level::High, Speed::VeryHigh);
    let camera = CameraCapture::new(ArducamSpi::new(spi, cs), CaptureTiming::default());

    let image = ImageBuffer::new(IMAGE.take()).unwrap();

    let mut node = CaptureOrchestrator::new(
        ReceiveChannel::new(PipeReceiver::new(&RX_PIPE)),
        Transmitter::new(RadioUart::new(tx)),
        camera,
        MotionEventSource::new(&MOTION),
        clock,
        image,
        NodeTiming::default(),
    );

    // The node is useless until it has a network; keep trying
    loop {
        match node.join().await {
            Ok(address) => {
                info!("Joined network as {}", address);
                break;
            }
            Err(e) => {
                warn!("Join failed: {}", e);
                led.toggle();
            }
        }
    }

    led.on();
    node.run().await;
}

/// Identify and configure the sensor, retrying a few times
async fn bring_up_sensor(
    sccb: &mut SccbBus<I2c<'static, Async>>,
    clock: &mut SystemClock,
) -> Option<SensorId> {
    for attempt in 1..=SENSOR_BRINGUP_ATTEMPTS {
        match bring_up(sccb, clock, &ov2640::JPEG_640X480).await {
            Ok(id) => return Some(id),
            Err(e) => {
                warn!("Sensor bring-up attempt {} failed: {}", attempt, e);
                clock.pause_ms(SENSOR_RESET_SETTLE_MS).await;
            }
        }
    }
    None
}

/// Pump radio bytes from the DMA ring into the receive pipe
#[embassy_executor::task]
async fn radio_rx_task(rx: RingBufferedUartRx<'static>) {
    pump_rx(rx, &RX_PIPE).await;
}

/// Latch PIR edges for the main loop
#[embassy_executor::task]
async fn motion_task(mut input: MotionInput<'static>) {
    input.watch(&MOTION).await;
}
