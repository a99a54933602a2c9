//! Bracket overlay compositing.
//!
//! This module paints a bracket asset over each detected tooth region of a
//! photograph and flattens the result into a single RGB image.
//!
//! The compositing is deliberately two-phase: every resampled bracket is
//! first painted into one transparent overlay layer sized to the
//! photograph, and the finished layer is alpha-blended onto the photograph
//! exactly once. Painting N times and blending once keeps rounding error
//! from compounding and makes the overlap rule a single deterministic
//! pass: regions are painted strictly in input order, so later regions win
//! where brackets overlap.
//!
//! The photograph is never mutated; callers always receive a new image.

use std::fmt;

use image::{imageops, Rgb, RgbImage, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::error::OrtholayError;
use crate::regions::ToothRegion;

/// Scale applied to a region's extent when sizing its bracket.
///
/// Brackets are drawn slightly larger than the detected tooth box so the
/// appliance visually covers the tooth edges.
pub const BRACKET_SCALE: f64 = 1.1;

/// Color used by [`outline_regions`] for region outlines.
const OUTLINE_COLOR: Rgb<u8> = Rgb([173, 216, 230]);

/// The kind of bracket appliance to composite.
///
/// This is a closed set: adding a new appliance means adding a variant and
/// shipping its asset, never changing compositor logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketKind {
    /// Traditional metal bracket.
    Metal,
    /// Tooth-colored ceramic bracket.
    Ceramic,
}

impl BracketKind {
    /// All supported bracket kinds.
    pub const ALL: [BracketKind; 2] = [BracketKind::Metal, BracketKind::Ceramic];

    /// Parses a bracket-type key, e.g. from a CLI flag or request field.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "metal" => Some(BracketKind::Metal),
            "ceramic" => Some(BracketKind::Ceramic),
            _ => None,
        }
    }

    /// Returns the canonical key for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            BracketKind::Metal => "metal",
            BracketKind::Ceramic => "ceramic",
        }
    }

    /// Returns the asset file name for this kind.
    pub fn asset_file_name(&self) -> &'static str {
        match self {
            BracketKind::Metal => "metal.png",
            BracketKind::Ceramic => "ceramic.png",
        }
    }
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The computed placement of one resampled bracket.
///
/// `left`/`top` anchor the bracket so its midpoint coincides with the
/// region's detected center; they may be negative or beyond the photograph
/// bounds, in which case painting clips silently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Resampled bracket width in pixels.
    pub width: u32,
    /// Resampled bracket height in pixels.
    pub height: u32,
    /// X coordinate of the bracket's top-left corner.
    pub left: i64,
    /// Y coordinate of the bracket's top-left corner.
    pub top: i64,
}

impl Placement {
    /// Computes the placement for a region, or `None` when the scaled
    /// target collapses to zero pixels (a degenerate region).
    pub fn for_region(region: &ToothRegion) -> Option<Self> {
        let target_w = (region.width * BRACKET_SCALE).round();
        let target_h = (region.height * BRACKET_SCALE).round();

        // NaN fails this comparison too, so malformed geometry that slipped
        // past normalization is treated as degenerate rather than painted.
        if !(target_w >= 1.0 && target_h >= 1.0) {
            return None;
        }

        let left = (region.center_x - target_w / 2.0).round() as i64;
        let top = (region.center_y - target_h / 2.0).round() as i64;

        Some(Self {
            width: target_w as u32,
            height: target_h as u32,
            left,
            top,
        })
    }

    /// Returns the bracket's visual center in photograph coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            self.left as f64 + self.width as f64 / 2.0,
            self.top as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Per-call counts reported alongside the composited image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CompositeReport {
    /// Regions that received a painted bracket.
    pub painted: usize,
    /// Regions dropped because their scaled target collapsed to zero.
    pub skipped: usize,
}

impl fmt::Display for CompositeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Painted {} bracket(s), skipped {} degenerate region(s)",
            self.painted, self.skipped
        )
    }
}

/// Composites a bracket asset over each region of a photograph.
///
/// For every region, in input order: the asset is resampled to the
/// region's scaled extent (Lanczos, alpha resampled with color), anchored
/// so the bracket center matches the region center, and painted into a
/// transparent overlay layer with straight alpha-over blending. Portions
/// outside the photograph clip silently. After all regions are painted the
/// layer is flattened onto the photograph in a single alpha-over pass.
///
/// Regions whose scaled extent rounds to zero pixels are skipped and
/// counted in the report; they are never fatal.
///
/// # Errors
/// Returns [`OrtholayError::DimensionMismatch`] if the overlay layer and
/// photograph disagree in size. The layer is allocated from the
/// photograph's own dimensions, so this indicates a bug rather than bad
/// input.
///
/// # Example
/// ```
/// use image::{Rgb, RgbImage, Rgba, RgbaImage};
/// use ortholay::compose::composite;
/// use ortholay::regions::ToothRegion;
///
/// let photo = RgbImage::from_pixel(64, 48, Rgb([200, 180, 170]));
/// let asset = RgbaImage::from_pixel(8, 8, Rgba([120, 120, 130, 255]));
/// let regions = vec![ToothRegion::new(32.0, 24.0, 10.0, 12.0)];
///
/// let (preview, report) = composite(&photo, &regions, &asset)?;
/// assert_eq!(preview.dimensions(), photo.dimensions());
/// assert_eq!(report.painted, 1);
/// # Ok::<(), ortholay::OrtholayError>(())
/// ```
pub fn composite(
    photo: &RgbImage,
    regions: &[ToothRegion],
    asset: &RgbaImage,
) -> Result<(RgbImage, CompositeReport), OrtholayError> {
    let (photo_width, photo_height) = photo.dimensions();

    // Fully transparent scratch layer; destroyed when this call returns.
    let mut layer = RgbaImage::new(photo_width, photo_height);
    let mut report = CompositeReport::default();

    for region in regions {
        let Some(placement) = Placement::for_region(region) else {
            report.skipped += 1;
            continue;
        };

        let bracket = imageops::resize(
            asset,
            placement.width,
            placement.height,
            imageops::FilterType::Lanczos3,
        );
        imageops::overlay(&mut layer, &bracket, placement.left, placement.top);
        report.painted += 1;
    }

    let (layer_width, layer_height) = layer.dimensions();
    if (layer_width, layer_height) != (photo_width, photo_height) {
        return Err(OrtholayError::DimensionMismatch {
            photo_width,
            photo_height,
            layer_width,
            layer_height,
        });
    }

    Ok((flatten(photo, &layer), report))
}

/// Alpha-blends the overlay layer onto the photograph, dropping alpha.
///
/// `out = src * a + dst * (1 - a)`, computed in integer arithmetic with
/// rounding. Pixels the layer never touched are copied through bit-exact,
/// so an empty layer is a no-op.
fn flatten(photo: &RgbImage, layer: &RgbaImage) -> RgbImage {
    let mut out = photo.clone();

    for (x, y, src) in layer.enumerate_pixels() {
        let alpha = src[3] as u32;
        if alpha == 0 {
            continue;
        }

        let dst = out.get_pixel_mut(x, y);
        for channel in 0..3 {
            let blended =
                (src[channel] as u32 * alpha + dst[channel] as u32 * (255 - alpha) + 127) / 255;
            dst[channel] = blended as u8;
        }
    }

    out
}

/// Draws region outlines onto a copy of the photograph.
///
/// A diagnostic view of the detector output: each region's bounding box is
/// traced with a two-pixel light-blue outline. Regions with degenerate or
/// non-finite extent are skipped; outlines beyond the photograph clip.
pub fn outline_regions(photo: &RgbImage, regions: &[ToothRegion]) -> RgbImage {
    let mut out = photo.clone();

    for region in regions {
        let width = region.width.round();
        let height = region.height.round();
        if !(width >= 1.0 && height >= 1.0) {
            continue;
        }

        let left = (region.center_x - region.width / 2.0).round() as i32;
        let top = (region.center_y - region.height / 2.0).round() as i32;
        let (width, height) = (width as u32, height as u32);

        draw_hollow_rect_mut(&mut out, Rect::at(left, top).of_size(width, height), OUTLINE_COLOR);
        if width > 2 && height > 2 {
            draw_hollow_rect_mut(
                &mut out,
                Rect::at(left + 1, top + 1).of_size(width - 2, height - 2),
                OUTLINE_COLOR,
            );
        }
    }

    out
}
