#![allow(dead_code)]

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use ortholay::regions::ToothRegion;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A deterministic non-uniform photograph, so blending mistakes that would
/// vanish on a flat background still show up.
pub fn gradient_photo(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

pub fn opaque_asset(width: u32, height: u32, color: [u8; 3]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([color[0], color[1], color[2], 255]))
}

pub fn transparent_asset(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([200, 50, 50, 0]))
}

/// A region with finite geometry anywhere near (or outside) a photograph.
pub fn arb_region() -> impl Strategy<Value = ToothRegion> {
    (
        -500.0..1500.0f64,
        -500.0..1500.0f64,
        0.5..80.0f64,
        0.5..80.0f64,
        0.0..1.0f64,
    )
        .prop_map(|(cx, cy, w, h, confidence)| {
            ToothRegion::new(cx, cy, w, h).with_confidence(confidence)
        })
}

/// A region whose scaled bracket target rounds to zero pixels.
pub fn arb_degenerate_region() -> impl Strategy<Value = ToothRegion> {
    (0.0..200.0f64, 0.0..200.0f64, 0.0..0.449f64, 0.5..40.0f64).prop_map(|(cx, cy, w, h)| {
        ToothRegion::new(cx, cy, w, h)
    })
}

pub fn arb_regions(max_len: usize) -> impl Strategy<Value = Vec<ToothRegion>> {
    proptest::collection::vec(arb_region(), 0..=max_len)
}
