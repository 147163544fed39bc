//! OV2640 register tables
//!
//! Vendor configuration for JPEG output at 640x480. Each table ends with
//! [`SensorReg::END`].

use super::sensor::{SensorProfile, SensorReg};

const fn r(reg: u8, value: u8) -> SensorReg {
    SensorReg::new(reg, value)
}

// TODO: replace with the complete ArduCAM OV2640_JPEG_INIT table; this is
// only its DSP bank preamble and the JPEG quantisation setup.
const JPEG_INIT: &[SensorReg] = &[
    r(0xFF, 0x00),
    r(0x2C, 0xFF),
    r(0x2E, 0xDF),
    r(0xFF, 0x01),
    r(0x3C, 0x32),
    r(0x11, 0x00),
    r(0x09, 0x02),
    r(0x04, 0x28),
    r(0x13, 0xE5),
    r(0x14, 0x48),
    r(0x2C, 0x0C),
    r(0x33, 0x78),
    r(0x3A, 0x33),
    r(0x3B, 0xFB),
    r(0x3E, 0x00),
    r(0x43, 0x11),
    r(0x16, 0x10),
    r(0x39, 0x92),
    r(0x35, 0xDA),
    r(0x22, 0x1A),
    r(0x37, 0xC3),
    r(0x23, 0x00),
    r(0x34, 0xC0),
    r(0x36, 0x1A),
    r(0x06, 0x88),
    r(0x07, 0xC0),
    r(0x0D, 0x87),
    r(0x0E, 0x41),
    r(0x4C, 0x00),
    r(0xFF, 0x00),
    r(0xE5, 0x7F),
    r(0xF9, 0xC0),
    r(0x41, 0x24),
    r(0xE0, 0x14),
    r(0x76, 0xFF),
    r(0x33, 0xA0),
    r(0x42, 0x20),
    r(0x43, 0x18),
    r(0x4C, 0x00),
    r(0x87, 0xD5),
    r(0x88, 0x3F),
    r(0xD7, 0x03),
    r(0xD9, 0x10),
    r(0xD3, 0x82),
    r(0xC8, 0x08),
    r(0xC9, 0x80),
    r(0xE0, 0x00),
    SensorReg::END,
];

const YUV422: &[SensorReg] = &[
    r(0xFF, 0x00),
    r(0x05, 0x00),
    r(0xDA, 0x10),
    r(0xD7, 0x03),
    r(0xDF, 0x00),
    r(0x33, 0x80),
    r(0x3C, 0x40),
    r(0xE1, 0x77),
    r(0x00, 0x00),
    SensorReg::END,
];

const JPEG: &[SensorReg] = &[
    r(0xE0, 0x14),
    r(0xE1, 0x77),
    r(0xE5, 0x1F),
    r(0xD7, 0x03),
    r(0xDA, 0x10),
    r(0xE0, 0x00),
    r(0xFF, 0x01),
    r(0x04, 0x08),
    SensorReg::END,
];

const RES_640X480: &[SensorReg] = &[
    r(0xFF, 0x01),
    r(0x11, 0x01),
    r(0x12, 0x00),
    r(0x17, 0x11),
    r(0x18, 0x75),
    r(0x32, 0x36),
    r(0x19, 0x01),
    r(0x1A, 0x97),
    r(0x03, 0x0F),
    r(0x37, 0x40),
    r(0x4F, 0xBB),
    r(0x50, 0x9C),
    r(0x5A, 0x57),
    r(0x6D, 0x80),
    r(0x3D, 0x34),
    r(0x39, 0x02),
    r(0x35, 0x88),
    r(0x22, 0x0A),
    r(0x37, 0x40),
    r(0x34, 0xA0),
    r(0x06, 0x02),
    r(0x0D, 0xB7),
    r(0x0E, 0x01),
    r(0xFF, 0x00),
    r(0xE0, 0x04),
    r(0xC0, 0xC8),
    r(0xC1, 0x96),
    r(0x86, 0x3D),
    r(0x50, 0x89),
    r(0x51, 0x90),
    r(0x52, 0x2C),
    r(0x53, 0x00),
    r(0x54, 0x00),
    r(0x55, 0x88),
    r(0x57, 0x00),
    r(0x5A, 0xA0),
    r(0x5B, 0x78),
    r(0x5C, 0x00),
    r(0xD3, 0x04),
    r(0xE0, 0x00),
    SensorReg::END,
];

/// JPEG output, 640x480
pub const JPEG_640X480: SensorProfile = SensorProfile {
    jpeg_init: JPEG_INIT,
    yuv422: YUV422,
    jpeg: JPEG,
    resolution: RES_640X480,
};
