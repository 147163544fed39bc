//! Camera tests
//!
//! FIFO capture handshake and sensor bring-up against register-level fakes.

mod support;

use embassy_futures::block_on;
use lpn_firmware::camera::fifo::{compose_size, reg, CameraCapture, CaptureTiming, ImageBuffer};
use lpn_firmware::camera::ov2640;
use lpn_firmware::camera::sensor::{apply_table, bring_up, SensorReg};
use lpn_firmware::config::{CAPTURE_TIMEOUT_MS, FIFO_LIVENESS_SENTINEL, IMAGE_MARKER};
use lpn_firmware::error::{Bus, Error};
use lpn_firmware::timing::Clock;
use proptest::prelude::*;
use support::{test_image, FakeFifo, FakeSensor, StepClock};

fn capture(fifo: &FakeFifo, clock: &StepClock, storage: &mut [u8]) -> Result<usize, Error> {
    let mut camera = CameraCapture::new(fifo.clone(), CaptureTiming::default());
    let mut image = ImageBuffer::new(storage).unwrap();
    let mut clock = clock.clone();
    block_on(camera.capture(&mut clock, &mut image))
}

// =============================================================================
// Size Tests
// =============================================================================

#[test]
fn test_compose_size() {
    assert_eq!(compose_size(0x00, 0x10, 0x00, usize::MAX), 4096);
    assert_eq!(compose_size(0x34, 0x12, 0x01, usize::MAX), 0x01_1234);
    // Bit 23 is not part of the size
    assert_eq!(compose_size(0x00, 0x00, 0x80, usize::MAX), 0);
    assert_eq!(compose_size(0xFF, 0xFF, 0xFF, 1_000), 1_000);
}

proptest! {
    #[test]
    fn test_compose_size_bounded(
        low in any::<u8>(),
        mid in any::<u8>(),
        high in any::<u8>(),
        capacity in 0usize..100_000,
    ) {
        let size = compose_size(low, mid, high, capacity);
        prop_assert!(size <= capacity);
        prop_assert!(size <= 0x7F_FFFF);
    }

    #[test]
    fn test_compose_size_exact_below_capacity(
        low in any::<u8>(),
        mid in any::<u8>(),
        high in 0u8..0x80,
    ) {
        let raw = (usize::from(high) << 16) | (usize::from(mid) << 8) | usize::from(low);
        prop_assert_eq!(compose_size(low, mid, high, usize::MAX), raw);
    }
}

// =============================================================================
// Image Buffer Tests
// =============================================================================

#[test]
fn test_image_buffer_needs_payload_room() {
    let mut one = [0u8; 1];
    assert!(ImageBuffer::new(&mut one).is_none());

    let mut two = [0u8; 2];
    assert_eq!(ImageBuffer::new(&mut two).unwrap().capacity(), 1);
}

#[test]
fn test_frame_prepends_marker() {
    let mut storage = [0u8; 8];
    let mut image = ImageBuffer::new(&mut storage).unwrap();
    image.payload_mut()[..3].copy_from_slice(&[0xAA, 0xBB, 0xCC]);

    assert_eq!(image.frame(3), &[IMAGE_MARKER, 0xAA, 0xBB, 0xCC]);
}

#[test]
fn test_frame_clamped_to_capacity() {
    let mut storage = [0u8; 4];
    let mut image = ImageBuffer::new(&mut storage).unwrap();
    assert_eq!(image.frame(100).len(), 4);
}

// =============================================================================
// Capture Tests
// =============================================================================

#[test]
fn test_capture_reads_whole_image() {
    let data = test_image(4096);
    let fifo = FakeFifo::with_image(data.clone());
    let clock = StepClock::new();
    let mut storage = vec![0u8; 8192];

    let size = capture(&fifo, &clock, &mut storage).unwrap();

    assert_eq!(size, 4096);
    assert_eq!(&storage[1..=4096], &data[..]);
    assert_eq!(
        fifo.writes(),
        vec![
            (reg::TEST, FIFO_LIVENESS_SENTINEL),
            (reg::FIFO_CONTROL, reg::CLEAR_DONE),
            (reg::FIFO_CONTROL, reg::START_CAPTURE),
        ]
    );
    assert_eq!(fifo.bursts(), vec![(reg::BURST_FIFO, 4096)]);
}

#[test]
fn test_capture_never_touches_marker_slot() {
    let fifo = FakeFifo::with_image(test_image(16));
    let clock = StepClock::new();
    let mut storage = vec![0x5Au8; 32];

    capture(&fifo, &clock, &mut storage).unwrap();

    assert_eq!(storage[0], 0x5A);
}

#[test]
fn test_capture_clamps_to_capacity() {
    let fifo = FakeFifo::with_image(test_image(64));
    fifo.set_size_regs(0xFF, 0xFF, 0x7F);
    let clock = StepClock::new();
    let mut storage = vec![0u8; 101];

    let size = capture(&fifo, &clock, &mut storage).unwrap();

    assert_eq!(size, 100);
    assert_eq!(fifo.bursts(), vec![(reg::BURST_FIFO, 100)]);
}

#[test]
fn test_dead_fifo_aborts_before_trigger() {
    let fifo = FakeFifo::with_image(test_image(16));
    fifo.set_dead(true);
    let clock = StepClock::new();
    let mut storage = vec![0u8; 32];

    let result = capture(&fifo, &clock, &mut storage);

    assert_eq!(result, Err(Error::CaptureAborted));
    assert!(!fifo
        .writes()
        .contains(&(reg::FIFO_CONTROL, reg::START_CAPTURE)));
}

#[test]
fn test_done_flag_timeout() {
    let fifo = FakeFifo::with_image(test_image(16));
    fifo.set_done_after(None);
    let clock = StepClock::new();
    let mut storage = vec![0u8; 32];

    let result = capture(&fifo, &clock, &mut storage);

    assert_eq!(result, Err(Error::ProtocolTimeout));
    assert!(clock.now_us() >= u64::from(CAPTURE_TIMEOUT_MS) * 1_000);
    assert!(fifo.bursts().is_empty());
}

#[test]
fn test_done_flag_polled() {
    let fifo = FakeFifo::with_image(test_image(16));
    fifo.set_done_after(Some(5));
    let clock = StepClock::new();
    let mut storage = vec![0u8; 32];

    capture(&fifo, &clock, &mut storage).unwrap();

    assert_eq!(fifo.status_polls(), 6);
}

#[test]
fn test_empty_fifo_aborts() {
    let fifo = FakeFifo::with_image(Vec::new());
    let clock = StepClock::new();
    let mut storage = vec![0u8; 32];

    let result = capture(&fifo, &clock, &mut storage);

    assert_eq!(result, Err(Error::CaptureAborted));
    assert!(fifo.bursts().is_empty());
}

#[test]
fn test_bus_failure() {
    let fifo = FakeFifo::with_image(test_image(16));
    fifo.set_fail_bus(true);
    let clock = StepClock::new();
    let mut storage = vec![0u8; 32];

    let result = capture(&fifo, &clock, &mut storage);

    assert_eq!(result, Err(Error::BusTransactionFailure(Bus::CameraFifo)));
}

// =============================================================================
// Sensor Tests
// =============================================================================

#[test]
fn test_sensor_bring_up() {
    let mut sensor = FakeSensor::ov2640();
    let mut clock = StepClock::new();

    let id = block_on(bring_up(&mut sensor, &mut clock, &ov2640::JPEG_640X480)).unwrap();

    assert!(id.is_ov2640());
    let writes = sensor.writes();
    assert_eq!(writes[0], (0xFF, 0x01));
    assert_eq!(writes[1], (0x12, 0x80));
    assert!(!writes.contains(&(SensorReg::END.reg, SensorReg::END.value)));
    assert!(clock.paused_us() > 0);
}

#[test]
fn test_sensor_bring_up_writes_every_table() {
    let mut sensor = FakeSensor::ov2640();
    let mut clock = StepClock::new();
    let profile = ov2640::JPEG_640X480;

    block_on(bring_up(&mut sensor, &mut clock, &profile)).unwrap();

    let tables = profile.jpeg_init.len()
        + profile.yuv422.len()
        + profile.jpeg.len()
        + profile.resolution.len()
        - 4;
    // Bank select, reset, tables, bank select, COM10
    assert_eq!(sensor.writes().len(), 2 + tables + 2);
}

#[test]
fn test_sensor_accepts_both_versions() {
    let mut clock = StepClock::new();
    for ver in [0x41, 0x42] {
        let mut sensor = FakeSensor::new(0x26, ver);
        let id = block_on(bring_up(&mut sensor, &mut clock, &ov2640::JPEG_640X480)).unwrap();
        assert_eq!(id.ver, ver);
    }
}

#[test]
fn test_sensor_mismatch() {
    let mut sensor = FakeSensor::new(0x77, 0x42);
    let mut clock = StepClock::new();

    let result = block_on(bring_up(&mut sensor, &mut clock, &ov2640::JPEG_640X480));

    assert_eq!(
        result,
        Err(Error::DeviceMismatch {
            vendor: 0x77,
            product: 0x42
        })
    );
    // No reset, no tables
    assert_eq!(sensor.writes(), vec![(0xFF, 0x01)]);
}

#[test]
fn test_sensor_nack() {
    let mut sensor = FakeSensor::ov2640();
    sensor.nack_on(0x12);
    let mut clock = StepClock::new();

    let result = block_on(bring_up(&mut sensor, &mut clock, &ov2640::JPEG_640X480));

    assert_eq!(result, Err(Error::BusTransactionFailure(Bus::SensorConfig)));
}

#[test]
fn test_apply_table_stops_at_end_marker() {
    let mut sensor = FakeSensor::ov2640();
    let table = [
        SensorReg::new(0x11, 0x01),
        SensorReg::END,
        SensorReg::new(0x22, 0x02),
    ];

    let written = block_on(apply_table(&mut sensor, &table)).unwrap();

    assert_eq!(written, 1);
    assert_eq!(sensor.writes(), vec![(0x11, 0x01)]);
}

#[test]
fn test_profile_tables_terminated() {
    let profile = ov2640::JPEG_640X480;
    for table in [
        profile.jpeg_init,
        profile.yuv422,
        profile.jpeg,
        profile.resolution,
    ] {
        assert_eq!(table.last(), Some(&SensorReg::END));
        assert_eq!(table.iter().filter(|&&e| e == SensorReg::END).count(), 1);
    }
}
