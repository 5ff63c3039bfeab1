/// Selection policy - pure functions turning surface capabilities and a request
/// into the concrete presentation parameters
///
/// Nothing here touches the backend: every function is deterministic given its
/// inputs, which is what lets the swap chain re-run them after a surface rebuild.

use crate::error::{Error, Result};
use crate::presentation::types::{
    ColorSpace, Extent2D, Format, PresentMode, QueueFamilies, SharingMode, SurfaceFormat,
};

/// Color format picked when the surface accepts anything
pub const DEFAULT_COLOR_FORMAT: Format = Format::B8G8R8A8_UNORM;

/// Color space paired with `DEFAULT_COLOR_FORMAT`
pub const DEFAULT_COLOR_SPACE: ColorSpace = ColorSpace::SrgbNonlinear;

/// Largest sample count any backend exposes
pub const MAX_SAMPLE_COUNT: u32 = 64;

/// Pick the surface format
///
/// - a single `UNDEFINED` entry means "any": the default format is used
/// - otherwise an exact match of the default (format, color space) wins
/// - otherwise the first entry reported by the surface
pub fn pick_surface_format(formats: &[SurfaceFormat]) -> Result<SurfaceFormat> {
    let default = SurfaceFormat::new(DEFAULT_COLOR_FORMAT, DEFAULT_COLOR_SPACE);

    match formats {
        [] => Err(Error::Configuration(
            "surface reports no supported formats".to_string(),
        )),
        [only] if only.format == Format::UNDEFINED => Ok(default),
        _ => Ok(formats
            .iter()
            .copied()
            .find(|f| *f == default)
            .unwrap_or(formats[0])),
    }
}

/// Pick the present mode for a vsync interval
///
/// Interval 0 asks for unthrottled presentation: mailbox, then immediate.
/// Everything else (and the fallback) is FIFO, which every backend supports.
pub fn pick_present_mode(modes: &[PresentMode], vsync_interval: u32) -> PresentMode {
    if vsync_interval == 0 {
        for preferred in [PresentMode::Mailbox, PresentMode::Immediate] {
            if modes.contains(&preferred) {
                return preferred;
            }
        }
    }
    PresentMode::Fifo
}

/// Clamp the requested extent into `[min, max]`, component-wise
pub fn pick_extent(requested: Extent2D, min: Extent2D, max: Extent2D) -> Extent2D {
    Extent2D::new(
        requested.width.max(min.width).min(max.width.max(min.width)),
        requested.height.max(min.height).min(max.height.max(min.height)),
    )
}

/// Clamp the requested buffer count into `[min, max]` (max 0 = unbounded)
pub fn pick_buffer_count(requested: u32, min: u32, max: u32) -> u32 {
    let upper = if max == 0 { requested } else { requested.min(max) };
    min.max(upper)
}

/// Ordered depth-stencil candidates for the requested bit counts
///
/// Returns an empty list when neither depth nor stencil is requested.
pub fn depth_stencil_preference(depth_bits: u32, stencil_bits: u32) -> Vec<Format> {
    if depth_bits == 0 && stencil_bits == 0 {
        return Vec::new();
    }

    match (depth_bits, stencil_bits) {
        (32, 0) => vec![
            Format::D32_FLOAT,
            Format::D24_UNORM_S8_UINT,
            Format::D16_UNORM_S8_UINT,
            Format::D16_UNORM,
        ],
        (32, _) => vec![
            Format::D32_FLOAT_S8_UINT,
            Format::D24_UNORM_S8_UINT,
            Format::D16_UNORM_S8_UINT,
        ],
        (16, 0) => vec![
            Format::D16_UNORM,
            Format::D24_UNORM_S8_UINT,
            Format::D16_UNORM_S8_UINT,
            Format::D32_FLOAT,
        ],
        _ => vec![
            Format::D24_UNORM_S8_UINT,
            Format::D16_UNORM_S8_UINT,
            Format::D32_FLOAT,
            Format::D16_UNORM,
        ],
    }
}

/// Pick the first supported depth-stencil format
///
/// `is_supported` answers whether the device can use a format as an
/// optimal-tiling depth-stencil attachment. `UNDEFINED` is returned when no
/// depth or stencil is requested.
pub fn pick_depth_stencil_format<F>(
    depth_bits: u32,
    stencil_bits: u32,
    mut is_supported: F,
) -> Result<Format>
where
    F: FnMut(Format) -> bool,
{
    let candidates = depth_stencil_preference(depth_bits, stencil_bits);
    if candidates.is_empty() {
        return Ok(Format::UNDEFINED);
    }

    candidates
        .into_iter()
        .find(|format| is_supported(*format))
        .ok_or_else(|| {
            Error::Configuration(format!(
                "no supported depth-stencil format for {} depth bits and {} stencil bits",
                depth_bits, stencil_bits
            ))
        })
}

/// Pick the sample count
///
/// Clamped to `[1, 64]`, rounded down to a power of two, then limited to the
/// device maximum.
pub fn pick_sample_count(requested: u32, device_max: u32) -> u32 {
    let clamped = requested.clamp(1, MAX_SAMPLE_COUNT);
    let power_of_two = 1u32 << (31 - clamped.leading_zeros());
    power_of_two.min(device_max.max(1))
}

/// Concurrent sharing when the graphics and present families differ
pub fn pick_sharing_mode(families: QueueFamilies) -> SharingMode {
    if families.graphics == families.present {
        SharingMode::Exclusive
    } else {
        SharingMode::Concurrent {
            graphics: families.graphics,
            present: families.present,
        }
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
